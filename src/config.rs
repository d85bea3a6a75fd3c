//! Registration configuration.
//!
//! [`FitConfig`] holds every tunable parameter of the fitting procedure and
//! [`DistanceCheck`] the channel-spacing validation.  All fields have defaults
//! that match the values the registration was calibrated with.

/// Configuration for [`crate::fit_landmarks_with`].
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use optoreg::FitConfig;
///
/// let cfg = FitConfig {
///     max_iterations: 20,
///     ..FitConfig::default()
/// };
/// assert_eq!(cfg.distance.nominal_mm, 30.0);
/// ```
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Number of x/y/z rotation triplets tried before the best count is
    /// replayed.
    ///
    /// Default: `50`.
    pub max_iterations: usize,

    /// Error recorded for an iteration whose landmark error is not finite,
    /// so that it is never selected as the minimum.
    ///
    /// Default: `999.0`.
    pub non_finite_penalty: f64,

    /// Upper bound on the summed absolute difference between the template
    /// input and the template reconstructed through the reverse transform.
    ///
    /// Must be scaled to the coordinate units.  The default assumes metres
    /// and a montage of a few hundred points; a few ulps per coordinate
    /// accumulate well below it, a sign error in the reversed rotation lands
    /// many orders above it.
    ///
    /// Default: `1e-12`.
    pub self_check_tolerance: f64,

    /// Channel-spacing validation used by the `coreg` binary.
    pub distance: DistanceCheck,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            non_finite_penalty: 999.0,
            self_check_tolerance: 1e-12,
            distance: DistanceCheck::default(),
        }
    }
}

/// Parameters of [`crate::check_channel_distances`].
#[derive(Debug, Clone, Copy)]
pub struct DistanceCheck {
    /// Expected source–detector spacing in millimetres.
    ///
    /// Default: `30.0`.
    pub nominal_mm: f64,

    /// Allowed deviation from `nominal_mm`, in millimetres (inclusive).
    ///
    /// Default: `3.0`.
    pub tolerance_mm: f64,

    /// Millimetres per position unit.  Positions are in metres by default.
    ///
    /// Default: `1000.0`.
    pub mm_per_unit: f64,
}

impl Default for DistanceCheck {
    fn default() -> Self {
        Self {
            nominal_mm: 30.0,
            tolerance_mm: 3.0,
            mm_per_unit: 1000.0,
        }
    }
}

impl DistanceCheck {
    /// Inclusive `[min, max]` range in millimetres.
    ///
    /// ```
    /// use optoreg::DistanceCheck;
    /// assert_eq!(DistanceCheck::default().range_mm(), (27.0, 33.0));
    /// ```
    pub fn range_mm(&self) -> (f64, f64) {
        (
            self.nominal_mm - self.tolerance_mm,
            self.nominal_mm + self.tolerance_mm,
        )
    }
}
