//! Source–detector spacing check.
//!
//! fNIRS channels are named `<source>_<detector>` (e.g. `S1_D2`, or
//! `S1_D2 hbo` as MNE names them).  After registration every checked channel
//! must span the nominal inter-optode distance within tolerance; a channel
//! whose optodes were never digitized is skipped.
use ndarray::Array2;
use tracing::{debug, warn};

use crate::config::DistanceCheck;
use crate::error::RegistrationError;
use crate::geometry::{dist_3d, point};

/// Measured length of one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDistance {
    pub channel: String,
    pub distance_mm: f64,
}

/// Split `S1_D2` (or `S1_D2 hbo`) into `("S1", "D2")`.
///
/// Only the first two `_`-separated fields are used, so `S1_D2_x` also
/// yields `("S1", "D2")`.
pub fn split_channel(name: &str) -> Result<(&str, &str), RegistrationError> {
    let invalid = || RegistrationError::InvalidChannelName(name.to_string());
    let mut fields = name.split('_');
    let source = fields.next().ok_or_else(invalid)?;
    let detector = fields
        .next()
        .and_then(|d| d.split_whitespace().next())
        .ok_or_else(invalid)?;
    if source.is_empty() {
        return Err(invalid());
    }
    Ok((source, detector))
}

/// Measure every channel in `channels` and validate it against `cfg`.
///
/// Channels with an endpoint missing from `labels` are skipped with a
/// warning and left out of the result.
///
/// # Errors
///
/// * [`RegistrationError::ChannelDistance`] on the first channel outside
///   `cfg.range_mm()`.
/// * [`RegistrationError::InvalidChannelName`] for a name without `_`.
/// * [`RegistrationError::Shape`] if `positions` is not `[labels.len(), 3]`.
pub fn check_channel_distances<S: AsRef<str>, C: AsRef<str>>(
    positions: &Array2<f64>,
    labels: &[S],
    channels: &[C],
    cfg: &DistanceCheck,
) -> Result<Vec<ChannelDistance>, RegistrationError> {
    if positions.ncols() != 3 || positions.nrows() != labels.len() {
        return Err(RegistrationError::Shape(format!(
            "positions {:?} do not match {} labels",
            positions.dim(),
            labels.len()
        )));
    }
    let find = |label: &str| labels.iter().position(|l| l.as_ref() == label);
    let (lo, hi) = cfg.range_mm();

    let mut out = Vec::with_capacity(channels.len());
    for ch in channels {
        let ch = ch.as_ref();
        let (source, detector) = split_channel(ch)?;
        let (Some(s), Some(d)) = (find(source), find(detector)) else {
            warn!("No 3D registration for channel: {ch}");
            continue;
        };

        let distance_mm = dist_3d(&point(positions, s), &point(positions, d)) * cfg.mm_per_unit;
        if !(lo..=hi).contains(&distance_mm) {
            return Err(RegistrationError::ChannelDistance {
                channel: ch.to_string(),
                distance_mm,
                expected_mm: cfg.nominal_mm,
            });
        }
        debug!(channel = ch, distance_mm, "channel spacing ok");
        out.push(ChannelDistance {
            channel: ch.to_string(),
            distance_mm,
        });
    }
    Ok(out)
}
