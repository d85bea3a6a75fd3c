//! Labeled 3-D position sets and fiducial lookup.
//!
//! A [`LandmarkSet`] pairs an `[M, 3]` position array with `M` labels.  The
//! three fiducials `lpa` (left preauricular), `nas` (nasion) and `rpa` (right
//! preauricular) define the head coordinate frame and must be present for
//! fitting.  Any other label is an optode or electrode position.
use nalgebra::Vector3;
use ndarray::Array2;

use crate::error::{RegistrationError, SetKind};
use crate::geometry::{dist_3d, midpoint, point};

pub const LPA: &str = "lpa";
pub const NAS: &str = "nas";
pub const RPA: &str = "rpa";

/// The fiducial labels, in the order they are looked up.
pub const FIDUCIALS: [&str; 3] = [LPA, NAS, RPA];

/// `true` for `lpa`, `nas` and `rpa`.
#[inline]
pub fn is_fiducial(label: &str) -> bool {
    FIDUCIALS.contains(&label)
}

/// Labeled positions, one row per point.
#[derive(Debug, Clone)]
pub struct LandmarkSet {
    /// `[M, 3]` positions.
    pub positions: Array2<f64>,
    /// `M` labels, row-aligned with `positions`.
    pub labels: Vec<String>,
}

impl LandmarkSet {
    /// Pair `positions` with `labels`, checking that the shapes agree.
    pub fn new<S: AsRef<str>>(
        positions: Array2<f64>,
        labels: &[S],
    ) -> Result<Self, RegistrationError> {
        if positions.ncols() != 3 {
            return Err(RegistrationError::Shape(format!(
                "positions must have 3 columns, got {}",
                positions.ncols()
            )));
        }
        if positions.nrows() != labels.len() {
            return Err(RegistrationError::Shape(format!(
                "{} positions but {} labels",
                positions.nrows(),
                labels.len()
            )));
        }
        let labels = labels.iter().map(|l| l.as_ref().to_string()).collect();
        Ok(Self { positions, labels })
    }

    /// Build a set from `(label, [x, y, z])` pairs.
    ///
    /// ```
    /// use optoreg::LandmarkSet;
    /// let set = LandmarkSet::from_points(&[("nas", [0.0, 0.1, 0.0]), ("S1", [0.0, 0.0, 0.1])]);
    /// assert_eq!(set.len(), 2);
    /// assert_eq!(set.index_of("S1"), Some(1));
    /// ```
    pub fn from_points(points: &[(&str, [f64; 3])]) -> Self {
        let mut positions = Array2::zeros((points.len(), 3));
        for (i, (_, p)) in points.iter().enumerate() {
            positions.row_mut(i).assign(&ndarray::ArrayView1::from(&p[..]));
        }
        let labels = points.iter().map(|(l, _)| l.to_string()).collect();
        Self { positions, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row of the first point labeled `label`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn position(&self, label: &str) -> Option<Vector3<f64>> {
        self.index_of(label).map(|i| point(&self.positions, i))
    }

    /// Locate the three fiducials, each of which must label exactly one row.
    ///
    /// # Errors
    ///
    /// * [`RegistrationError::MissingLandmark`] if a fiducial is absent.
    /// * [`RegistrationError::DuplicateLandmark`] if it labels several rows.
    pub fn fiducial_index(&self, set: SetKind) -> Result<FiducialIndex, RegistrationError> {
        let find = |label: &'static str| {
            let mut rows = self.labels.iter().enumerate().filter(|(_, l)| *l == label);
            let first = rows.next().map(|(i, _)| i);
            match (first, rows.count()) {
                (None, _) => Err(RegistrationError::MissingLandmark { set, label }),
                (Some(i), 0) => Ok(i),
                (Some(_), extra) => Err(RegistrationError::DuplicateLandmark {
                    set,
                    label,
                    count: extra + 1,
                }),
            }
        };
        Ok(FiducialIndex {
            lpa: find(LPA)?,
            nas: find(NAS)?,
            rpa: find(RPA)?,
        })
    }

    /// Drop every point whose label is in `labels`.
    pub fn without(&self, labels: &[&str]) -> Self {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| !labels.contains(&self.labels[i].as_str()))
            .collect();
        Self {
            positions: self.positions.select(ndarray::Axis(0), &keep),
            labels: keep.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }
}

/// Rows of `lpa`, `nas` and `rpa` in a position array.
///
/// Resolved once per set, then used to read the fiducials out of every
/// transformed copy of that set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiducialIndex {
    pub lpa: usize,
    pub nas: usize,
    pub rpa: usize,
}

impl FiducialIndex {
    pub fn read(&self, positions: &Array2<f64>) -> Fiducials {
        Fiducials {
            lpa: point(positions, self.lpa),
            nas: point(positions, self.nas),
            rpa: point(positions, self.rpa),
        }
    }
}

/// Fiducial coordinates of one set at one point in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fiducials {
    pub lpa: Vector3<f64>,
    pub nas: Vector3<f64>,
    pub rpa: Vector3<f64>,
}

impl Fiducials {
    /// Midpoint of `lpa` and `rpa`: the head-frame origin.
    pub fn origin(&self) -> Vector3<f64> {
        midpoint(&self.lpa, &self.rpa)
    }

    /// Summed `nas` + `lpa` + `rpa` distance to `other`.
    pub fn error_to(&self, other: &Fiducials) -> f64 {
        dist_3d(&self.nas, &other.nas) + dist_3d(&self.lpa, &other.lpa) + dist_3d(&self.rpa, &other.rpa)
    }
}
