mod common;
use common::{dense_head, max_abs_diff, reversed, similarity, synthetic_head};
use nalgebra::{Rotation3, Vector3};
use optoreg::{fit_landmarks, fit_landmarks_with, FitConfig, LandmarkSet, RegistrationError, SetKind, FIDUCIALS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn fit(template: &LandmarkSet, subject: &LandmarkSet) -> Result<optoreg::Registration, RegistrationError> {
    fit_landmarks_with(template, subject, &FitConfig::default())
}

// ── Preconditions ─────────────────────────────────────────────────────────────

#[test]
fn fiducials_accepted_in_any_order() {
    let head = synthetic_head();
    assert!(fit(&head, &reversed(&head)).is_ok());
    assert!(fit(&reversed(&head), &head).is_ok());

    let fiducials_only = LandmarkSet::from_points(&[
        ("rpa", [0.080, -0.010, -0.030]),
        ("lpa", [-0.080, -0.010, -0.030]),
        ("nas", [0.000, 0.090, -0.035]),
    ]);
    assert_eq!(fiducials_only.len(), 3);
    let reg = fit(&head, &fiducials_only).unwrap();
    assert_eq!(reg.inward_ratio, 1.0);
}

#[test]
fn each_missing_fiducial_is_reported() {
    let head = synthetic_head();
    for label in FIDUCIALS {
        let partial = head.without(&[label]);

        match fit(&head, &partial) {
            Err(RegistrationError::MissingLandmark { set, label: l }) => {
                assert_eq!(set, SetKind::Subject);
                assert_eq!(l, label);
            }
            other => panic!("subject without {label}: {other:?}"),
        }
        match fit(&partial, &head) {
            Err(RegistrationError::MissingLandmark { set, label: l }) => {
                assert_eq!(set, SetKind::Template);
                assert_eq!(l, label);
            }
            other => panic!("template without {label}: {other:?}"),
        }
    }
}

#[test]
fn repeated_fiducial_is_reported_for_either_set() {
    let head = synthetic_head();
    let mut points: Vec<(&str, [f64; 3])> = head
        .labels
        .iter()
        .zip(head.positions.rows())
        .map(|(l, p)| (l.as_str(), [p[0], p[1], p[2]]))
        .collect();
    points.push(("nas", [0.0, 0.05, 0.08]));
    let doubled = LandmarkSet::from_points(&points);

    match fit(&head, &doubled) {
        Err(RegistrationError::DuplicateLandmark { set, label, count }) => {
            assert_eq!(set, SetKind::Subject);
            assert_eq!(label, "nas");
            assert_eq!(count, 2);
        }
        other => panic!("subject with two nas rows: {other:?}"),
    }
    match fit(&doubled, &head) {
        Err(RegistrationError::DuplicateLandmark { set, label, count }) => {
            assert_eq!(set, SetKind::Template);
            assert_eq!(label, "nas");
            assert_eq!(count, 2);
        }
        other => panic!("template with two nas rows: {other:?}"),
    }
}

#[test]
fn array_form_checks_shapes() {
    let head = synthetic_head();
    let err = fit_landmarks(&head.positions, &head.labels[1..], &head.positions, &head.labels)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Shape(_)));
}

// ── Fitting ───────────────────────────────────────────────────────────────────

#[test]
fn identity_fit_returns_template() {
    let head = synthetic_head();
    let reg = fit(&head, &head).unwrap();

    let tol = FitConfig::default().self_check_tolerance;

    assert_eq!(reg.iterations, 1);
    assert!(reg.error_trace[0] <= tol, "first iteration error {:.2e}", reg.error_trace[0]);
    assert!(reg.landmark_error <= tol);
    approx::assert_abs_diff_eq!(reg.scale, 1.0, epsilon = 1e-12);
    let err = max_abs_diff(&reg.positions, &head.positions);
    assert!(err <= tol, "max deviation {err:.2e}");

    let arr = fit_landmarks(&head.positions, &head.labels, &head.positions, &head.labels).unwrap();
    assert_eq!(arr, reg.positions);
}

#[test]
fn similarity_copy_is_recovered() {
    let head = synthetic_head();
    let rot = Rotation3::from_euler_angles(0.05, -0.07, 0.09);
    let subject = LandmarkSet {
        positions: similarity(&head.positions, &rot, 1.15, &Vector3::new(0.01, -0.02, 0.03)),
        labels: head.labels.clone(),
    };

    let reg = fit(&head, &subject).unwrap();
    assert!(reg.landmark_error < 1e-6, "landmark error {:.2e}", reg.landmark_error);
    approx::assert_abs_diff_eq!(reg.scale, 1.0 / 1.15, epsilon = 1e-9);
    approx::assert_abs_diff_eq!(reg.inward_ratio, 1.0, epsilon = 1e-6);
    let err = max_abs_diff(&reg.positions, &head.positions);
    assert!(err < 1e-5, "max deviation {err:.2e}");
}

#[test]
fn self_check_holds_for_random_subjects() {
    let head = synthetic_head();
    let cfg = FitConfig::default();
    let mut rng = StdRng::seed_from_u64(42);

    for trial in 0..100 {
        let rot = Rotation3::from_euler_angles(
            rng.gen_range(-0.15..0.15),
            rng.gen_range(-0.15..0.15),
            rng.gen_range(-0.15..0.15),
        );
        let scale = rng.gen_range(0.7..1.4);
        let t = Vector3::new(
            rng.gen_range(-0.05..0.05),
            rng.gen_range(-0.05..0.05),
            rng.gen_range(-0.05..0.05),
        );
        let mut positions = similarity(&head.positions, &rot, scale, &t);
        positions.mapv_inplace(|v| v + rng.gen_range(-0.002..0.002));
        let subject = LandmarkSet { positions, labels: head.labels.clone() };

        let reg = fit_landmarks_with(&head, &subject, &cfg)
            .unwrap_or_else(|e| panic!("trial {trial}: {e}"));
        assert!(
            reg.self_check_residual <= cfg.self_check_tolerance,
            "trial {trial}: residual {:.2e}",
            reg.self_check_residual
        );
        assert!((1..=cfg.max_iterations).contains(&reg.iterations));
        assert_eq!(reg.error_trace.len(), cfg.max_iterations);
        // The replayed fit reproduces the selected trial exactly.
        assert_eq!(reg.landmark_error, reg.error_trace[reg.iterations - 1]);
        assert!(reg.error_trace.iter().all(|&e| reg.landmark_error <= e));
        assert!(reg.positions.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn self_check_tolerance_covers_dense_montage() {
    // Round-off of the template round trip grows with the point count: a
    // few hundred optodes already leave more than 1e-15 behind.
    let head = dense_head(337);
    assert_eq!(head.len(), 340);
    let cfg = FitConfig::default();
    let mut rng = StdRng::seed_from_u64(7);

    let mut worst = 0.0_f64;
    for trial in 0..100 {
        let rot = Rotation3::from_euler_angles(
            rng.gen_range(-0.3..0.3),
            rng.gen_range(-0.3..0.3),
            rng.gen_range(-0.3..0.3),
        );
        let t = Vector3::new(
            rng.gen_range(-0.05..0.05),
            rng.gen_range(-0.05..0.05),
            rng.gen_range(-0.05..0.05),
        );
        let subject = LandmarkSet {
            positions: similarity(&head.positions, &rot, rng.gen_range(0.7..1.4), &t),
            labels: head.labels.clone(),
        };
        let reg = fit_landmarks_with(&head, &subject, &cfg)
            .unwrap_or_else(|e| panic!("trial {trial}: {e}"));
        assert!(reg.self_check_residual <= cfg.self_check_tolerance);
        worst = worst.max(reg.self_check_residual);
    }
    assert!(worst > 1e-15, "worst residual {worst:.2e}");

    let strict = FitConfig { self_check_tolerance: 1e-15, ..cfg };
    assert!(matches!(
        fit_landmarks_with(&head, &head, &strict),
        Err(RegistrationError::SelfCheck { .. })
    ));
}

#[test]
fn self_check_failure_is_fatal() {
    let head = synthetic_head();
    let cfg = FitConfig { self_check_tolerance: -1.0, ..FitConfig::default() };
    match fit_landmarks_with(&head, &head, &cfg) {
        Err(RegistrationError::SelfCheck { residual, tolerance }) => {
            assert!(residual >= 0.0);
            assert_eq!(tolerance, -1.0);
        }
        other => panic!("expected SelfCheck, got {other:?}"),
    }
}

#[test]
fn uniform_subject_scaling_does_not_change_error() {
    let head = synthetic_head();
    let rot = Rotation3::from_euler_angles(-0.04, 0.06, 0.03);
    let mut positions = similarity(&head.positions, &rot, 1.0, &Vector3::new(0.0, 0.01, -0.01));
    // Digitization noise on the fiducials so the fit has a non-zero floor.
    for (row, d) in [(0, [0.002, -0.001, 0.0015]), (1, [-0.001, 0.002, 0.0]), (2, [0.0, 0.0015, -0.002])] {
        for k in 0..3 {
            positions[[row, k]] += d[k];
        }
    }
    let subject = LandmarkSet { positions, labels: head.labels.clone() };
    let scaled = LandmarkSet {
        positions: subject.positions.mapv(|v| v * 1.7),
        labels: head.labels.clone(),
    };

    let a = fit(&head, &subject).unwrap();
    let b = fit(&head, &scaled).unwrap();
    assert!(a.landmark_error > 1e-4);
    approx::assert_abs_diff_eq!(a.landmark_error, b.landmark_error, epsilon = 1e-7);
    approx::assert_abs_diff_eq!(a.scale, b.scale * 1.7, epsilon = 1e-9);
    assert!(max_abs_diff(&a.positions, &b.positions) < 1e-6);
}

#[test]
fn non_fiducial_points_pulled_onto_template_surface() {
    let head = synthetic_head();
    // Optodes digitized 5 mm off the scalp: radial offset of every
    // non-fiducial point relative to the head-frame origin.
    let origin = (head.position("lpa").unwrap() + head.position("rpa").unwrap()) / 2.0;
    let mut positions = head.positions.clone();
    for (i, label) in head.labels.iter().enumerate() {
        if optoreg::is_fiducial(label) {
            continue;
        }
        let p = Vector3::new(positions[[i, 0]], positions[[i, 1]], positions[[i, 2]]) - origin;
        let q = origin + p * (1.0 + 0.005 / p.norm());
        positions[[i, 0]] = q.x;
        positions[[i, 1]] = q.y;
        positions[[i, 2]] = q.z;
    }
    let subject = LandmarkSet { positions, labels: head.labels.clone() };

    let reg = fit(&head, &subject).unwrap();
    assert!(reg.inward_ratio < 1.0);
    let before = max_abs_diff(&subject.positions, &head.positions);
    let after = max_abs_diff(&reg.positions, &head.positions);
    assert!(after < before, "after {after:.2e} before {before:.2e}");
}
