//! Optode-to-template coordinate registration.
//!
//! Aligns a subject's digitized positions to a template montage using only
//! the three fiducials, then pulls the remaining optodes onto the template's
//! scalp surface.
//!
//! ```text
//!   subject [M, 3]                     template [N, 3]
//!     │                                  │
//!     ├─ center on lpa/rpa midpoint      ├─ center on lpa/rpa midpoint ─┐ origin kept
//!     │                                  ├─ rotate about x: nas → +y  ──┤ angle kept
//!     ├─ scale  (mean |T_l| / |S_l|)     │                              │
//!     ├─ x / y / z rotation triplets ◄───┤ (best count of 1..=50)       │
//!     ├─ inward projection ◄─────────────┘ (nearest template point)     │
//!     └─ undo x rotation, add origin ◄──────────────────────────────────┘
//!          │
//!          └─→ [M, 3] in the template's native frame
//! ```
use nalgebra::Vector3;
use ndarray::Array2;
use tracing::{debug, error, info};

use crate::config::FitConfig;
use crate::error::{RegistrationError, SetKind};
use crate::geometry::{circular_mean, dist_3d, planar_angle, point, rotate, shift, Axis};
use crate::landmarks::{is_fiducial, FiducialIndex, Fiducials, LandmarkSet};

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    /// `[M, 3]` subject positions in the template's frame, row-aligned with
    /// the subject's labels.
    pub positions: Array2<f64>,
    /// Number of rotation triplets applied (1-based).
    pub iterations: usize,
    /// Summed fiducial distance to the template after `iterations` triplets.
    pub landmark_error: f64,
    /// Uniform scale applied to the subject before rotation fitting.
    pub scale: f64,
    /// Mean inward-projection ratio applied to non-fiducial points.
    pub inward_ratio: f64,
    /// Summed absolute deviation of the round-tripped template.
    pub self_check_residual: f64,
    /// Landmark error recorded after each trial iteration, penalty applied.
    pub error_trace: Vec<f64>,
}

/// Fit `subject` onto `template` with [`FitConfig::default`] and return only
/// the aligned positions.
///
/// # Errors
///
/// * [`RegistrationError::Shape`] if a position array is not `[_, 3]` or its
///   length differs from its labels.
/// * [`RegistrationError::MissingLandmark`] if either label set lacks `lpa`,
///   `nas` or `rpa`.
/// * [`RegistrationError::DuplicateLandmark`] if one of them labels more
///   than one row.
/// * [`RegistrationError::SelfCheck`] if the reverse transform fails to
///   reproduce the template.
pub fn fit_landmarks<S: AsRef<str>, T: AsRef<str>>(
    template_positions: &Array2<f64>,
    template_labels: &[S],
    subject_positions: &Array2<f64>,
    subject_labels: &[T],
) -> Result<Array2<f64>, RegistrationError> {
    let template = LandmarkSet::new(template_positions.clone(), template_labels)?;
    let subject = LandmarkSet::new(subject_positions.clone(), subject_labels)?;
    fit_landmarks_with(&template, &subject, &FitConfig::default()).map(|r| r.positions)
}

/// Fit `subject` onto `template` and report how the fit went.
///
/// Both inputs are left untouched; the result is a fresh array.
pub fn fit_landmarks_with(
    template: &LandmarkSet,
    subject: &LandmarkSet,
    cfg: &FitConfig,
) -> Result<Registration, RegistrationError> {
    let t_idx = template.fiducial_index(SetKind::Template)?;
    let s_idx = subject.fiducial_index(SetKind::Subject)?;

    // 1. Centering.
    let template_origin = t_idx.read(&template.positions).origin();
    let onto_template = template_origin - s_idx.read(&subject.positions).origin();
    let subj = shift(&subject.positions, &onto_template);
    let subj = shift(&subj, &-s_idx.read(&subj).origin());
    let tmpl = shift(&template.positions, &-template_origin);

    // 2. Template nas onto the +y axis.
    let x_angle = nas_to_y_axis(&t_idx.read(&tmpl).nas);
    let tmpl = rotate(&tmpl, Axis::X, x_angle);
    let target = t_idx.read(&tmpl);
    debug!(x_angle, ?template_origin, "template centered and aligned");

    // 3. Scale.
    let scale = scale_factor(&target, &s_idx.read(&subj));
    let subj = subj.mapv(|v| v * scale);
    debug!(scale, "subject scaled");

    // 4. Iterative x/y/z fitting: find the best count, then replay it.
    let error_trace = trial_errors(&subj, &s_idx, &target, cfg);
    let iterations = best_iteration(&error_trace);
    let mut subj = subj;
    for _ in 0..iterations {
        subj = fit_xyz(&subj, &s_idx, &target);
    }
    let landmark_error = s_idx.read(&subj).error_to(&target);
    info!(
        "Iterative fitment ({iterations}x) reached absolute error: {landmark_error:.4}"
    );

    // 5. Pull non-fiducial optodes onto the template surface.
    let (subj, inward_ratio) = project_inward(&subj, &subject.labels, &tmpl);
    debug!(inward_ratio, "non-fiducial points projected");

    // 6. Back into the template's native frame.
    let positions = shift(&rotate(&subj, Axis::X, -x_angle), &template_origin);

    // 7. The same reverse transform must give back the template input.
    let restored = shift(&rotate(&tmpl, Axis::X, -x_angle), &template_origin);
    let self_check_residual = (&template.positions - &restored).mapv(f64::abs).sum();
    if !(self_check_residual <= cfg.self_check_tolerance) {
        error!(
            residual = self_check_residual,
            tolerance = cfg.self_check_tolerance,
            "reverse transform does not restore the template frame"
        );
        return Err(RegistrationError::SelfCheck {
            residual: self_check_residual,
            tolerance: cfg.self_check_tolerance,
        });
    }

    Ok(Registration {
        positions,
        iterations,
        landmark_error,
        scale,
        inward_ratio,
        self_check_residual,
        error_trace,
    })
}

/// Angle about x that brings `nas` onto the +y axis of the y-z plane.
fn nas_to_y_axis(nas: &Vector3<f64>) -> f64 {
    let yz = Axis::X.plane(nas);
    let r = (yz[0] * yz[0] + yz[1] * yz[1]).sqrt();
    planar_angle(yz, [r, 0.0])
}

/// Mean of the template/subject distance-from-origin ratios of the fiducials.
fn scale_factor(template: &Fiducials, subject: &Fiducials) -> f64 {
    let ratio = |t: &Vector3<f64>, s: &Vector3<f64>| t.norm() / s.norm();
    (ratio(&template.lpa, &subject.lpa)
        + ratio(&template.rpa, &subject.rpa)
        + ratio(&template.nas, &subject.nas))
        / 3.0
}

/// One rotation triplet: about x (nas), about y (lpa, rpa), about z (all
/// three fiducials).
///
/// Per-landmark angles are averaged on the unit circle.
pub fn fit_xyz(subj: &Array2<f64>, idx: &FiducialIndex, target: &Fiducials) -> Array2<f64> {
    let angle = |axis: Axis, s: &Vector3<f64>, t: &Vector3<f64>| {
        planar_angle(axis.plane(s), axis.plane(t))
    };

    let s = idx.read(subj);
    let subj = rotate(subj, Axis::X, angle(Axis::X, &s.nas, &target.nas));

    let s = idx.read(&subj);
    let a = circular_mean(&[
        angle(Axis::Y, &s.lpa, &target.lpa),
        angle(Axis::Y, &s.rpa, &target.rpa),
    ]);
    let subj = rotate(&subj, Axis::Y, a);

    let s = idx.read(&subj);
    let a = circular_mean(&[
        angle(Axis::Z, &s.nas, &target.nas),
        angle(Axis::Z, &s.lpa, &target.lpa),
        angle(Axis::Z, &s.rpa, &target.rpa),
    ]);
    rotate(&subj, Axis::Z, a)
}

/// Landmark error after each of `cfg.max_iterations` successive triplets.
fn trial_errors(
    subj: &Array2<f64>,
    idx: &FiducialIndex,
    target: &Fiducials,
    cfg: &FitConfig,
) -> Vec<f64> {
    let mut trial = subj.clone();
    let mut errors = Vec::with_capacity(cfg.max_iterations);
    for i in 0..cfg.max_iterations {
        trial = fit_xyz(&trial, idx, target);
        let err = idx.read(&trial).error_to(target);
        let err = if err.is_finite() { err } else { cfg.non_finite_penalty };
        debug!(iteration = i + 1, error = err, "trial fit");
        errors.push(err);
    }
    errors
}

/// 1-based position of the first strict minimum; `0` for an empty trace.
pub fn best_iteration(errors: &[f64]) -> usize {
    let mut best: Option<(usize, f64)> = None;
    for (i, &e) in errors.iter().enumerate() {
        match best {
            Some((_, b)) if e >= b => {}
            _ => best = Some((i, e)),
        }
    }
    best.map_or(0, |(i, _)| i + 1)
}

/// Scale every point not labeled `lpa`, `nas` or `rpa` by the mean ratio
/// `|nearest template point| / |subject point|`.
///
/// Points at the origin do not contribute to the ratio.  With no
/// contributing point the positions are returned unchanged with ratio `1`.
fn project_inward(
    subj: &Array2<f64>,
    labels: &[String],
    tmpl: &Array2<f64>,
) -> (Array2<f64>, f64) {
    let mut sum = 0.0;
    let mut n = 0usize;
    for (i, _) in labels.iter().enumerate().filter(|(_, l)| !is_fiducial(l)) {
        let p = point(subj, i);
        let norm = p.norm();
        if norm == 0.0 {
            continue;
        }
        if let Some(nearest) = nearest_point(tmpl, &p) {
            sum += nearest.norm() / norm;
            n += 1;
        }
    }
    if n == 0 {
        return (subj.clone(), 1.0);
    }

    let ratio = sum / n as f64;
    let mut out = subj.clone();
    for (mut row, label) in out.rows_mut().into_iter().zip(labels) {
        if !is_fiducial(label) {
            row.mapv_inplace(|v| v * ratio);
        }
    }
    (out, ratio)
}

/// First point of `set` closest to `p`.
fn nearest_point(set: &Array2<f64>, p: &Vector3<f64>) -> Option<Vector3<f64>> {
    let mut best: Option<(f64, Vector3<f64>)> = None;
    for i in 0..set.nrows() {
        let q = point(set, i);
        let d = dist_3d(&q, p);
        match best {
            Some((b, _)) if d >= b => {}
            _ => best = Some((d, q)),
        }
    }
    best.map(|(_, q)| q)
}
