//! Safetensors I/O for registered positions.
//!
//! Output layout:
//!
//! ```text
//!   positions   [M, 3]  F64   registered coordinates (template frame, metres)
//!   labels      [n]     U8    UTF-8, one label per line, row-aligned
//! ```
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::Path;

use crate::landmarks::LandmarkSet;

// ── Low-level safetensors parser (raw bytes → ndarray, no tensor types) ──────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let n = usize::try_from(u64::from_le_bytes(bytes[..8].try_into()?))
        .context("safetensors header length does not fit in memory")?;
    let Some(data_start) = n.checked_add(8).filter(|&end| end <= bytes.len()) else {
        bail!("safetensors header truncated");
    };
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..data_start])
            .context("failed to parse safetensors header")?;
    Ok((header, data_start))
}

fn tensor_bytes<'a>(
    bytes: &'a [u8],
    data_start: usize,
    entry: &serde_json::Value,
) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"]
        .as_array()
        .context("missing data_offsets")?;
    let (Some(s), Some(e)) = (
        offsets.first().and_then(|v| v.as_u64()),
        offsets.get(1).and_then(|v| v.as_u64()),
    ) else {
        bail!("malformed data_offsets");
    };
    let absolute = |off: u64| usize::try_from(off).ok().and_then(|o| data_start.checked_add(o));
    let (Some(start), Some(end)) = (absolute(s), absolute(e)) else {
        bail!("data_offsets [{s}, {e}] overflow");
    };
    bytes
        .get(start..end)
        .context("tensor data out of bounds")
}

fn shape_of(entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("missing shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("bad shape entry"))
        .collect()
}

// ── Generic safetensors builder ───────────────────────────────────────────────

/// Minimal safetensors writer for F64 and U8 tensors.
///
/// ```rust,no_run
/// use optoreg::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("positions", &[0.0, 0.1, 0.0], &[1, 3]);
/// w.add_u8("labels", b"nas");
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_u8(&mut self, name: &str, data: &[u8]) {
        self.entries.push((name.to_string(), data.to_vec(), "U8", vec![data.len()]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Registered positions ──────────────────────────────────────────────────────

/// Write `positions` and their `labels` to `path`.
pub fn write_positions(path: &Path, positions: &Array2<f64>, labels: &[String]) -> Result<()> {
    if positions.nrows() != labels.len() {
        bail!("{} positions but {} labels", positions.nrows(), labels.len());
    }
    let mut w = StWriter::new();
    w.add_f64_arr2("positions", positions);
    w.add_u8("labels", labels.join("\n").as_bytes());
    w.write(path)
}

/// Load a file written by [`write_positions`].
pub fn read_positions(path: &Path) -> Result<LandmarkSet> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let entry = header.get("positions").context("missing 'positions' key")?;
    if entry["dtype"].as_str() != Some("F64") {
        bail!("'positions' must be F64");
    }
    let shape = shape_of(entry)?;
    if shape.len() != 2 {
        bail!("'positions' must be 2-D, got shape {shape:?}");
    }
    let values: Vec<f64> = tensor_bytes(&bytes, data_start, entry)?
        .chunks_exact(8)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect();
    let positions = Array2::from_shape_vec((shape[0], shape[1]), values)?;

    let entry = header.get("labels").context("missing 'labels' key")?;
    let raw = std::str::from_utf8(tensor_bytes(&bytes, data_start, entry)?)?;
    let labels: Vec<&str> = if raw.is_empty() { vec![] } else { raw.split('\n').collect() };

    Ok(LandmarkSet::new(positions, &labels)?)
}
