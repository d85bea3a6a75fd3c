use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use optoreg::{
    check_channel_distances, fit_landmarks_with,
    formats::{read_elc, read_pp},
    io::write_positions,
    DistanceCheck, FitConfig,
};

#[derive(Parser)]
#[command(name = "coreg", about = "Register digitized fNIRS optodes onto a standard montage")]
struct Args {
    /// Template montage (.elc, e.g. MNE's standard_1005.elc)
    #[arg(long)]
    template: PathBuf,

    /// Subject picked-points file (.pp)
    #[arg(long)]
    subject: PathBuf,

    /// registered.safetensors output path
    #[arg(long)]
    output: PathBuf,

    /// Channels to validate, comma-separated (e.g. S1_D1,S1_D2)
    #[arg(long, default_value = "")]
    channels: String,

    /// Expected source–detector distance in mm (default: 30)
    #[arg(long, default_value_t = 30.0)]
    nominal_mm: f64,

    /// Allowed deviation in mm (default: 3)
    #[arg(long, default_value_t = 3.0)]
    tolerance_mm: f64,

    /// Rotation triplets tried before replaying the best (default: 50)
    #[arg(long, default_value_t = 50)]
    max_iterations: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let template = read_elc(&args.template)?;
    let subject = read_pp(&args.subject)?;
    println!("Loaded {} template / {} subject points", template.len(), subject.len());

    let cfg = FitConfig {
        max_iterations: args.max_iterations,
        distance: DistanceCheck {
            nominal_mm: args.nominal_mm,
            tolerance_mm: args.tolerance_mm,
            ..DistanceCheck::default()
        },
        ..FitConfig::default()
    };

    let reg = fit_landmarks_with(&template, &subject, &cfg)?;
    println!(
        "Fitted in {} iterations: landmark error {:.4}, scale {:.4}, inward ratio {:.4}",
        reg.iterations, reg.landmark_error, reg.scale, reg.inward_ratio
    );

    let channels: Vec<&str> = args.channels.split(',').filter(|s| !s.is_empty()).collect();
    if !channels.is_empty() {
        let dists = check_channel_distances(&reg.positions, &subject.labels, &channels, &cfg.distance)?;
        for d in &dists {
            println!("  {:<10} {:6.2} mm", d.channel, d.distance_mm);
        }
        println!("{} of {} channels checked", dists.len(), channels.len());
    }

    write_positions(&args.output, &reg.positions, &subject.labels)?;
    println!("Written → {}", args.output.display());

    Ok(())
}
