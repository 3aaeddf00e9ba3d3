//! Shared types for the leafarea measurement pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::HslRange;
use crate::session::Mode;

/// Re-export `RgbaImage` so downstream crates can hand decoded pixel
/// buffers to the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A finalized region outline: a closed polygon with at least
/// [`Polygon::MIN_VERTICES`] vertices.
///
/// The last vertex implicitly connects back to the first. Outlines with
/// fewer vertices are drafts and cannot be represented by this type, so
/// they never reach rasterization or area computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Fewest vertices a closed region may have.
    pub const MIN_VERTICES: usize = 3;

    /// Finalize an outline into a polygon.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::DraftPolygon`] if `points` has fewer than
    /// [`Self::MIN_VERTICES`] vertices.
    pub fn new(points: Vec<Point>) -> Result<Self, MeasureError> {
        if points.len() < Self::MIN_VERTICES {
            return Err(MeasureError::DraftPolygon {
                vertices: points.len(),
            });
        }
        Ok(Self(points))
    }

    /// Returns the number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Iterate over the closed edge list `(v[i], v[i+1])`, including the
    /// closing edge from the last vertex back to the first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let next = self.0.iter().cycle().skip(1);
        self.0.iter().copied().zip(next.copied())
    }

    /// Arithmetic mean of the vertices, used for label placement.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Point {
        let n = self.0.len() as f64;
        let (sx, sy) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = MeasureError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(polygon: Polygon) -> Self {
        polygon.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of a decoded image buffer.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle of pixels inside an image.
///
/// `x..x + width` and `y..y + height` are the covered pixel columns and
/// rows. A window produced by [`crate::region::bounding_box`] always has
/// non-zero width and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl PixelWindow {
    /// The window covering a whole image.
    #[must_use]
    pub const fn full(dimensions: Dimensions) -> Self {
        Self {
            x: 0,
            y: 0,
            width: dimensions.width,
            height: dimensions.height,
        }
    }

    /// One past the rightmost column.
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// One past the bottom row.
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Whether the image pixel `(x, y)` lies inside the window.
    #[must_use]
    pub const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Total pixel count.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Identity of an image within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(uuid::Uuid);

impl ImageId {
    /// Generate a fresh random identity.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Computed area of one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaResult {
    /// 1-based position of the region in the image's region set at the
    /// time of computation.
    pub region_id: usize,
    /// Number of region pixels that passed the colour filter.
    pub pixel_count: u64,
    /// Area in squared calibration units (e.g. cm²).
    pub area: f64,
}

/// Session-wide settings.
///
/// All fields have defaults, so a partial JSON object deserializes into a
/// complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Radius, in screen pixels, around a draft's first vertex within which
    /// a click closes the region. Divided by the view scale before it is
    /// compared with image-space distances.
    pub close_tolerance_px: f64,

    /// Colour painted over matching pixels in the preview.
    pub highlight: [u8; 3],

    /// Initial HSL acceptance range.
    pub range: HslRange,
}

impl SessionConfig {
    /// Default click-to-close radius in screen pixels.
    pub const DEFAULT_CLOSE_TOLERANCE_PX: f64 = 20.0;

    /// Default preview highlight (pure green).
    pub const DEFAULT_HIGHLIGHT: [u8; 3] = [0, 255, 0];
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            close_tolerance_px: Self::DEFAULT_CLOSE_TOLERANCE_PX,
            highlight: Self::DEFAULT_HIGHLIGHT,
            range: HslRange::default(),
        }
    }
}

/// Errors that can occur while measuring.
///
/// Every variant is a local, recoverable condition meant to be surfaced
/// to the user; none of them leave session state half-updated.
#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Area computation was requested before the image was calibrated.
    #[error("image is not calibrated")]
    Uncalibrated,

    /// Area computation was requested with no closed regions.
    #[error("no regions have been defined")]
    NoRegions,

    /// Calibration input was rejected.
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    /// A region outline had too few vertices to be closed.
    #[error("region needs at least 3 points, got {vertices}")]
    DraftPolygon {
        /// Number of vertices in the rejected outline.
        vertices: usize,
    },

    /// An HSL range was constructed with out-of-bounds or inverted bands.
    #[error("invalid HSL range: {0}")]
    InvalidRange(String),

    /// The pixel buffer does not match the image record it was supplied for.
    #[error("pixel buffer is {actual}, expected {expected}")]
    DimensionMismatch {
        /// Dimensions recorded when the image was added.
        expected: Dimensions,
        /// Dimensions of the supplied buffer.
        actual: Dimensions,
    },

    /// An operation needed an active image but none is selected.
    #[error("no image is selected")]
    NoActiveImage,

    /// The given image identity is not part of the session.
    #[error("unknown image {0}")]
    UnknownImage(ImageId),

    /// The requested interaction mode is not available yet.
    #[error("mode {0:?} is not available for the current image")]
    ModeUnavailable(Mode),
}
