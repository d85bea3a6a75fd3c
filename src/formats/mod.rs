//! Position file readers.
//!
//! * [`elc`] — ASA `.elc` electrode files, the format MNE ships its standard
//!   montages in (`standard_1005.elc`).  Used for the template.
//! * [`pp`]  — MeshLab picked-points files written while digitizing a
//!   subject's 3-D head scan.  Used for the subject.
//!
//! Both readers return a [`LandmarkSet`](crate::LandmarkSet) with fiducials
//! relabeled to the canonical `lpa` / `nas` / `rpa`.
//!
//! # Quick start
//! ```no_run
//! use optoreg::formats::{read_elc, read_pp};
//!
//! let template = read_elc("standard_1005.elc").unwrap();
//! let subject  = read_pp("subject01.pp").unwrap();
//! println!("{} template / {} subject points", template.len(), subject.len());
//! ```
pub mod elc;
pub mod pp;

pub use elc::{parse_elc, read_elc, LEGACY_ALIASES};
pub use pp::{parse_pp, read_pp};

use crate::landmarks::{LPA, NAS, RPA};

/// Map the fiducial spellings used by montage and digitizer files onto the
/// canonical labels.  Any other label is returned as-is.
pub fn canonical_label(label: &str) -> String {
    match label.to_ascii_lowercase().as_str() {
        "lpa" | "al" => LPA.to_string(),
        "rpa" | "ar" => RPA.to_string(),
        "nas" | "nz" | "nasion" => NAS.to_string(),
        _ => label.to_string(),
    }
}
