//! ASA `.elc` electrode position files.
//!
//! ```text
//! # ASA electrode file
//! ReferenceLabel  avg
//! UnitPosition    mm
//! NumberPositions=    346
//! Positions
//! -86.0761 -19.9897 -47.9860
//! Fp1: -29.4367 83.9171 -6.9900     ← inline label form is accepted too
//! Labels
//! LPA
//! ```
//!
//! Positions are converted to metres.  The legacy 10-20 names listed in
//! [`LEGACY_ALIASES`] duplicate positions already present under their 10-10
//! names (`T7`, `T8`, `P7`, `P8`) and are dropped.
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use super::canonical_label;
use crate::landmarks::LandmarkSet;

/// Old 10-20 labels that alias 10-10 positions in MNE's standard montages.
pub const LEGACY_ALIASES: [&str; 4] = ["T3", "T4", "T5", "T6"];

#[derive(Clone, Copy)]
enum Section {
    Header,
    Positions,
    Labels,
}

/// Read and parse an `.elc` file.
pub fn read_elc<P: AsRef<Path>>(path: P) -> Result<LandmarkSet> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_elc(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse the contents of an `.elc` file.
pub fn parse_elc(text: &str) -> Result<LandmarkSet> {
    let mut to_metres = 1e-3;
    let mut declared: Option<usize> = None;
    let mut section = Section::Header;
    let mut coords: Vec<f64> = Vec::new();
    let mut inline_labels: Vec<String> = Vec::new();
    let mut labels: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        if line.eq_ignore_ascii_case("Positions") {
            section = Section::Positions;
            continue;
        }
        if line.eq_ignore_ascii_case("Labels") {
            section = Section::Labels;
            continue;
        }

        match section {
            Section::Header => {
                let mut parts = line
                    .split(|c: char| c.is_whitespace() || c == '=')
                    .filter(|s| !s.is_empty());
                let (Some(key), value) = (parts.next(), parts.next()) else {
                    continue;
                };
                if key.eq_ignore_ascii_case("UnitPosition") {
                    let unit = value.context("UnitPosition without a unit")?;
                    to_metres = unit_to_metres(unit)?;
                } else if key.eq_ignore_ascii_case("NumberPositions") {
                    let n = value.context("NumberPositions without a count")?;
                    declared = Some(n.parse().with_context(|| format!("bad NumberPositions '{n}'"))?);
                }
            }
            Section::Positions => {
                let (label, numbers) = match line.split_once(':') {
                    Some((l, rest)) => (Some(l.trim()), rest),
                    None => (None, line),
                };
                let xyz: Vec<f64> = numbers
                    .split_whitespace()
                    .map(str::parse)
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("bad position line '{line}'"))?;
                if xyz.len() != 3 {
                    bail!("expected 3 coordinates, got {} in '{line}'", xyz.len());
                }
                coords.extend(xyz.iter().map(|v| v * to_metres));
                if let Some(l) = label {
                    inline_labels.push(l.to_string());
                }
            }
            Section::Labels => labels.push(line.to_string()),
        }
    }

    let n = coords.len() / 3;
    if labels.is_empty() {
        labels = inline_labels;
    }
    if labels.len() != n {
        bail!("{n} positions but {} labels", labels.len());
    }
    if let Some(d) = declared {
        if d != n {
            bail!("NumberPositions={d} but {n} positions listed");
        }
    }

    let labels: Vec<String> = labels.iter().map(|l| canonical_label(l)).collect();
    let set = LandmarkSet::new(Array2::from_shape_vec((n, 3), coords)?, &labels)?;
    Ok(set.without(&LEGACY_ALIASES))
}

fn unit_to_metres(unit: &str) -> Result<f64> {
    Ok(match unit.to_ascii_lowercase().as_str() {
        "m" => 1.0,
        "cm" => 1e-2,
        "mm" => 1e-3,
        other => bail!("unsupported UnitPosition '{other}'"),
    })
}
