//! # optoreg — fNIRS optode registration in pure Rust
//!
//! `optoreg` maps optode positions digitized on a subject's 3-D head scan
//! onto a standard scalp montage (e.g. MNE's `standard_1005`), so channel
//! locations can be compared across subjects and checked against the nominal
//! source–detector spacing.
//!
//! ## Pipeline overview
//!
//! ```text
//! standard_1005.elc        subject01.pp
//!   │                        │
//!   ├─ formats::read_elc()   ├─ formats::read_pp()    T…→S…, R…→D…
//!   │                        │
//!   └──────────┬─────────────┘
//!              ├─ fit_landmarks_with()   lpa/nas/rpa fit: center, scale,
//!              │                         x/y/z rotation triplets, inward
//!              │                         projection, back to template frame
//!              ├─ check_channel_distances()   30 ± 3 mm per S_D pair
//!              └─ io::write_positions()       registered.safetensors
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use optoreg::{fit_landmarks_with, check_channel_distances, FitConfig};
//! use optoreg::formats::{read_elc, read_pp};
//!
//! let template = read_elc("standard_1005.elc").unwrap();
//! let subject  = read_pp("subject01.pp").unwrap();
//!
//! let cfg = FitConfig::default();
//! let reg = fit_landmarks_with(&template, &subject, &cfg).unwrap();
//! println!("{} iterations, error {:.4}", reg.iterations, reg.landmark_error);
//!
//! let dists = check_channel_distances(
//!     &reg.positions,
//!     &subject.labels,
//!     &["S1_D1", "S1_D2"],
//!     &cfg.distance,
//! ).unwrap();
//! ```
//!
//! ## Array form
//!
//! ```
//! use optoreg::fit_landmarks;
//! use ndarray::array;
//!
//! let pos = array![
//!     [-0.08, -0.01, -0.03],
//!     [ 0.0,   0.09, -0.035],
//!     [ 0.08, -0.01, -0.03],
//!     [ 0.0,   0.0,   0.09],
//! ];
//! let labels = ["lpa", "nas", "rpa", "Cz"];
//! let fitted = fit_landmarks(&pos, &labels, &pos, &labels).unwrap();
//! assert!((&fitted - &pos).iter().all(|d| d.abs() <= 1e-12));
//! ```

pub mod config;
pub mod distance;
pub mod error;
pub mod fit;
pub mod formats;
pub mod geometry;
pub mod io;
pub mod landmarks;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use config::{DistanceCheck, FitConfig};
pub use distance::{check_channel_distances, split_channel, ChannelDistance};
pub use error::{RegistrationError, SetKind};
pub use fit::{fit_landmarks, fit_landmarks_with, Registration};
pub use landmarks::{is_fiducial, FiducialIndex, Fiducials, LandmarkSet, FIDUCIALS, LPA, NAS, RPA};
