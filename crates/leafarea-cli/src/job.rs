//! Measurement job files.
//!
//! A job lists the images to measure together with their calibration and
//! region outlines, plus optional session settings:
//!
//! ```json
//! {
//!   "config": { "range": { "hue": [30, 160], "saturation": [15, 100], "lightness": [15, 90] } },
//!   "images": [
//!     { "path": "leaf.png",
//!       "calibration": { "start": {"x": 0, "y": 0}, "end": {"x": 100, "y": 0}, "distance": 10 },
//!       "regions": [[{"x": 0, "y": 0}, {"x": 50, "y": 0}, {"x": 50, "y": 50}]] }
//!   ]
//! }
//! ```
//!
//! Relative image paths are resolved against the job file's directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use leafarea_core::{Channel, HslRange, MeasureError, Point, SessionConfig};
use serde::Deserialize;

/// A parsed job file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    /// Session settings; missing fields take their defaults.
    #[serde(default)]
    pub config: SessionConfig,

    /// Images in measuring order.
    pub images: Vec<JobImage>,
}

/// One image entry of a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobImage {
    /// Image file, absolute after [`Job::parse`].
    pub path: PathBuf,

    /// Reference segment; images without one are listed but not measured.
    #[serde(default)]
    pub calibration: Option<JobCalibration>,

    /// Region outlines in image pixel coordinates.
    #[serde(default)]
    pub regions: Vec<Vec<Point>>,
}

/// Two endpoints of a reference object and its real length.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobCalibration {
    /// First endpoint of the reference segment, in image pixels.
    pub start: Point,
    /// Second endpoint of the reference segment, in image pixels.
    pub end: Point,
    /// Real length of the segment in calibration units.
    pub distance: f64,
}

impl Job {
    /// Parse job JSON, resolving relative image paths against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or does not describe a job.
    pub fn parse(json: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let mut job: Self = serde_json::from_str(json).context("invalid job description")?;
        for image in &mut job.images {
            if image.path.is_relative() {
                image.path = base_dir.join(&image.path);
            }
        }
        Ok(job)
    }

    /// Read and parse a job file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading job file {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&json, base_dir).with_context(|| format!("in job file {}", path.display()))
    }
}

/// Command-line replacements for individual HSL bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct BandOverrides {
    /// Replacement hue band.
    pub hue: Option<(f64, f64)>,
    /// Replacement saturation band.
    pub saturation: Option<(f64, f64)>,
    /// Replacement lightness band.
    pub lightness: Option<(f64, f64)>,
}

impl BandOverrides {
    /// `range` with every overridden band replaced.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidRange`] if an override is out of
    /// scale or inverted.
    pub fn apply(&self, range: HslRange) -> Result<HslRange, MeasureError> {
        HslRange::new(
            self.hue.unwrap_or_else(|| range.band(Channel::Hue)),
            self.saturation
                .unwrap_or_else(|| range.band(Channel::Saturation)),
            self.lightness
                .unwrap_or_else(|| range.band(Channel::Lightness)),
        )
    }
}

/// Parse a `MIN,MAX` band argument.
///
/// # Errors
///
/// Returns a message if the value is not two comma-separated numbers.
pub fn parse_band(value: &str) -> Result<(f64, f64), String> {
    let (min, max) = value
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX, got {value:?}"))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid bound {s:?}: {e}"))
    };
    Ok((parse(min)?, parse(max)?))
}
