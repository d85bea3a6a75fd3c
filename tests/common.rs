/// Shared helpers: a synthetic head montage and rigid/similarity transforms.
use nalgebra::{Rotation3, Vector3};
use ndarray::Array2;
use optoreg::LandmarkSet;

/// Fiducials plus a 3 × 8 ring grid and a vertex point on a 9 cm sphere,
/// in metres.  Neighbouring points are several centimetres apart.
pub fn synthetic_head() -> LandmarkSet {
    let mut points: Vec<(String, [f64; 3])> = vec![
        ("lpa".into(), [-0.080, -0.010, -0.030]),
        ("nas".into(), [0.000, 0.090, -0.035]),
        ("rpa".into(), [0.080, -0.010, -0.030]),
    ];
    let r = 0.09;
    let mut k = 0;
    for elevation in [20.0_f64, 45.0, 70.0] {
        for step in 0..8 {
            let az = (step as f64 * 45.0 + elevation / 2.0).to_radians();
            let el = elevation.to_radians();
            points.push((
                format!("E{k}"),
                [r * el.cos() * az.cos(), r * el.cos() * az.sin(), r * el.sin()],
            ));
            k += 1;
        }
    }
    points.push(("Cz".into(), [0.0, 0.0, r]));

    let refs: Vec<(&str, [f64; 3])> = points.iter().map(|(l, p)| (l.as_str(), *p)).collect();
    LandmarkSet::from_points(&refs)
}

#[allow(unused)]
/// The fiducials of [`synthetic_head`] plus `n` optodes on a Fibonacci
/// spiral over the upper part of a 9 cm sphere, in metres.
pub fn dense_head(n: usize) -> LandmarkSet {
    let head = synthetic_head();
    let mut points: Vec<(String, [f64; 3])> = head.labels[..3]
        .iter()
        .zip(head.positions.rows())
        .map(|(l, p)| (l.clone(), [p[0], p[1], p[2]]))
        .collect();
    let r = 0.09;
    let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    for i in 0..n {
        let z = r * (0.05 + 0.95 * (i as f64 + 0.5) / n as f64);
        let rho = (r * r - z * z).sqrt();
        let az = i as f64 * golden;
        points.push((format!("S{i}"), [rho * az.cos(), rho * az.sin(), z]));
    }

    let refs: Vec<(&str, [f64; 3])> = points.iter().map(|(l, p)| (l.as_str(), *p)).collect();
    LandmarkSet::from_points(&refs)
}

#[allow(unused)]
/// Apply `p' = scale · R · p + t` to every row.
pub fn similarity(
    positions: &Array2<f64>,
    rot: &Rotation3<f64>,
    scale: f64,
    t: &Vector3<f64>,
) -> Array2<f64> {
    let mut out = positions.clone();
    for mut row in out.rows_mut() {
        let p = rot * Vector3::new(row[0], row[1], row[2]) * scale + t;
        row[0] = p.x;
        row[1] = p.y;
        row[2] = p.z;
    }
    out
}

#[allow(unused)]
/// Maximum absolute difference between two arrays.
pub fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0_f64, f64::max)
}

#[allow(unused)]
/// Copy of `set` with its rows in reverse order.
pub fn reversed(set: &LandmarkSet) -> LandmarkSet {
    let order: Vec<usize> = (0..set.len()).rev().collect();
    LandmarkSet {
        positions: set.positions.select(ndarray::Axis(0), &order),
        labels: order.iter().map(|&i| set.labels[i].clone()).collect(),
    }
}
