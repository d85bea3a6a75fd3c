//! Error type shared by the fitting procedure and the channel-distance check.
//!
//! Every variant aborts the call that produced it; no partial result is ever
//! returned alongside an error.
use std::fmt;

use thiserror::Error;

/// Which of the two landmark sets an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetKind {
    Template,
    Subject,
}

impl fmt::Display for SetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetKind::Template => f.write_str("template"),
            SetKind::Subject => f.write_str("subject"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    /// One of `lpa` / `nas` / `rpa` is absent from a label set.
    #[error("{set} set is missing required landmark '{label}'")]
    MissingLandmark { set: SetKind, label: &'static str },

    /// One of `lpa` / `nas` / `rpa` labels more than one row of a set.
    #[error("{set} set has {count} rows labeled '{label}', expected exactly one")]
    DuplicateLandmark {
        set: SetKind,
        label: &'static str,
        count: usize,
    },

    /// A checked source–detector pair is outside the allowed spacing.
    #[error("CH: {channel} registered distance: {distance_mm:.2} mm expected distance: {expected_mm} mm")]
    ChannelDistance {
        channel: String,
        distance_mm: f64,
        expected_mm: f64,
    },

    /// The reverse transform did not reproduce the template input.
    #[error("reverse transform does not restore the template frame: residual {residual:e} > tolerance {tolerance:e}")]
    SelfCheck { residual: f64, tolerance: f64 },

    /// Channel name not of the form `<source>_<detector>`.
    #[error("channel name '{0}' is not of the form <source>_<detector>")]
    InvalidChannelName(String),

    /// Position array / label list disagree in shape.
    #[error("invalid landmark set: {0}")]
    Shape(String),
}
