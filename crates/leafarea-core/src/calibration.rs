//! Calibration: map pixel distances to real-world distances.
//!
//! The user marks two points on a reference object of known length and
//! enters that length. The ratio of the pixel distance to the real
//! distance (pixels per unit) converts pixel counts into real areas.

use serde::{Deserialize, Serialize};

use crate::types::{MeasureError, Point};

/// Points captured while calibrating: zero, one or two.
///
/// Marking a third point restarts the capture with that point alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CalibrationPoints {
    /// Nothing marked yet.
    #[default]
    Empty,
    /// First endpoint marked.
    One(Point),
    /// Both endpoints marked.
    Two(Point, Point),
}

impl CalibrationPoints {
    /// Record a click.
    ///
    /// `Empty -> One`, `One -> Two`, and `Two -> One(point)`: a third click
    /// drops both earlier points and starts over.
    pub const fn start_or_continue(&mut self, point: Point) {
        *self = match *self {
            Self::Empty | Self::Two(..) => Self::One(point),
            Self::One(first) => Self::Two(first, point),
        };
    }

    /// The marked points in click order.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        match *self {
            Self::Empty => Vec::new(),
            Self::One(a) => vec![a],
            Self::Two(a, b) => vec![a, b],
        }
    }

    /// Number of marked points.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
        }
    }

    /// Whether no point is marked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A confirmed pixel-to-unit calibration.
///
/// Invariants: `real_distance > 0`, `pixel_distance > 0` and therefore
/// `ratio > 0`. Only [`commit`] creates values, so area conversion never
/// divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationRepr", into = "CalibrationRepr")]
pub struct Calibration {
    pixel_distance: f64,
    real_distance: f64,
    ratio: f64,
}

impl Calibration {
    fn from_distances(pixel_distance: f64, real_distance: f64) -> Result<Self, MeasureError> {
        if !(real_distance.is_finite() && real_distance > 0.0) {
            return Err(MeasureError::InvalidCalibration(format!(
                "real distance must be positive, got {real_distance}"
            )));
        }
        if !(pixel_distance.is_finite() && pixel_distance > 0.0) {
            return Err(MeasureError::InvalidCalibration(
                "calibration points must be distinct".to_string(),
            ));
        }
        Ok(Self {
            pixel_distance,
            real_distance,
            ratio: pixel_distance / real_distance,
        })
    }

    /// Length of the reference segment in pixels.
    #[must_use]
    pub const fn pixel_distance(&self) -> f64 {
        self.pixel_distance
    }

    /// Length of the reference segment in real units, as entered.
    #[must_use]
    pub const fn real_distance(&self) -> f64 {
        self.real_distance
    }

    /// Pixels per real unit.
    #[must_use]
    pub const fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Convert a pixel count into an area in squared real units.
    ///
    /// Area scales with the square of the linear ratio.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn area_from_pixels(&self, pixel_count: u64) -> f64 {
        pixel_count as f64 / (self.ratio * self.ratio)
    }
}

/// Confirm a calibration from the captured points and the real distance.
///
/// # Errors
///
/// Returns [`MeasureError::InvalidCalibration`] if fewer than two points
/// are marked, if `real_distance` is not a finite positive number, or if
/// the two points coincide.
pub fn commit(points: &CalibrationPoints, real_distance: f64) -> Result<Calibration, MeasureError> {
    let CalibrationPoints::Two(a, b) = *points else {
        return Err(MeasureError::InvalidCalibration(format!(
            "two points are required, {} marked",
            points.len()
        )));
    };
    Calibration::from_distances(a.distance(b), real_distance)
}

/// Serde shape of [`Calibration`]. The ratio is written for readers of
/// the output but recomputed from the two distances on input.
#[derive(Serialize, Deserialize)]
struct CalibrationRepr {
    pixel_distance: f64,
    real_distance: f64,
    ratio: f64,
}

impl TryFrom<CalibrationRepr> for Calibration {
    type Error = MeasureError;

    fn try_from(repr: CalibrationRepr) -> Result<Self, Self::Error> {
        let calibration = Self::from_distances(repr.pixel_distance, repr.real_distance)?;
        let consistent = (repr.ratio - calibration.ratio).abs() <= calibration.ratio * 1e-9;
        if !consistent {
            return Err(MeasureError::InvalidCalibration(format!(
                "ratio {} does not match {} px over {}",
                repr.ratio, repr.pixel_distance, repr.real_distance
            )));
        }
        Ok(calibration)
    }
}

impl From<Calibration> for CalibrationRepr {
    fn from(calibration: Calibration) -> Self {
        Self {
            pixel_distance: calibration.pixel_distance,
            real_distance: calibration.real_distance,
            ratio: calibration.ratio,
        }
    }
}
