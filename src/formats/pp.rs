//! MeshLab picked-points (`.pp`) files.
//!
//! Each digitized optode is one `<point …/>` element:
//!
//! ```text
//! <point x="12.31" y="-80.2" z="44.9" active="1" name="T1"/>
//! ```
//!
//! Shimadzu caps label transmitters `T…` and receivers `R…`; these become the
//! usual fNIRS source `S…` and detector `D…` names.  Coordinates are kept in
//! the file's units, the registration rescales them onto the template.
use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::Array2;

use super::canonical_label;
use crate::landmarks::{is_fiducial, LandmarkSet};

/// Read and parse a `.pp` file.
pub fn read_pp<P: AsRef<Path>>(path: P) -> Result<LandmarkSet> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_pp(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Parse the contents of a `.pp` file.
pub fn parse_pp(text: &str) -> Result<LandmarkSet> {
    let mut coords: Vec<f64> = Vec::new();
    let mut labels: Vec<String> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if !line.starts_with("<point") {
            continue;
        }
        for key in ["x", "y", "z"] {
            let raw = attribute(line, key)
                .with_context(|| format!("line {}: missing '{key}'", lineno + 1))?;
            let v: f64 = raw
                .parse()
                .with_context(|| format!("line {}: bad {key}=\"{raw}\"", lineno + 1))?;
            coords.push(v);
        }
        let name = attribute(line, "name")
            .with_context(|| format!("line {}: missing 'name'", lineno + 1))?;
        let label = canonical_label(name);
        labels.push(if is_fiducial(&label) { label } else { shimadzu_label(&label) });
    }

    if labels.is_empty() {
        bail!("no <point> entries");
    }
    let n = labels.len();
    Ok(LandmarkSet::new(Array2::from_shape_vec((n, 3), coords)?, &labels)?)
}

/// `T…` → `S…`, `R…` → `D…`; anything else unchanged.
pub fn shimadzu_label(label: &str) -> String {
    if let Some(rest) = label.strip_prefix('T') {
        format!("S{rest}")
    } else if let Some(rest) = label.strip_prefix('R') {
        format!("D{rest}")
    } else {
        label.to_string()
    }
}

/// Value of `key="…"` in an XML-ish element, requiring whitespace before the
/// key so `x` never matches inside another attribute name.
fn attribute<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let pat = format!("{key}=\"");
    line.match_indices(&pat).find_map(|(at, _)| {
        let preceded_by_space = line[..at].chars().next_back().is_some_and(char::is_whitespace);
        if !preceded_by_space {
            return None;
        }
        let start = at + pat.len();
        let len = line[start..].find('"')?;
        Some(&line[start..start + len])
    })
}
