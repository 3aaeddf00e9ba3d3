//! Console and JSON summaries of a measured session.

use std::fmt::Write;

use leafarea_core::{AreaResult, Dimensions, ImageRecord, Status};
use leafarea_export::hundredths;
use serde::Serialize;

/// Measurement summary of one image.
#[derive(Debug, Serialize)]
pub struct ImageReport<'a> {
    /// Image file name.
    pub file: &'a str,
    /// Pixel size of the decoded image.
    pub dimensions: Dimensions,
    /// Pixels per unit, if calibrated.
    pub scale: Option<f64>,
    /// Whether the results reflect the current regions and calibration.
    pub ready: bool,
    /// Per-region results of the last computation, in region order.
    pub results: &'a [AreaResult],
    /// Sum of the unrounded region areas.
    pub total_area: f64,
}

impl<'a> ImageReport<'a> {
    /// Summarize one record without copying its results.
    #[must_use]
    pub fn new(record: &'a ImageRecord) -> Self {
        Self {
            file: record.name(),
            dimensions: record.dimensions(),
            scale: record.calibration().map(leafarea_core::Calibration::ratio),
            ready: record.status() == Status::Ready,
            results: record.results(),
            total_area: record.total_area(),
        }
    }
}

/// One report per record, in session order.
#[must_use]
pub fn summarize(records: &[ImageRecord]) -> Vec<ImageReport<'_>> {
    records.iter().map(ImageReport::new).collect()
}

/// Human-readable results table.
#[must_use]
pub fn table(reports: &[ImageReport<'_>], unit: &str) -> String {
    let mut out = String::new();
    let area_header = format!("Area ({unit}²)");
    let _ = writeln!(
        out,
        "{:<24} {:>6} {:>10} {:>14}",
        "File", "Region", "Pixels", area_header
    );
    let _ = writeln!(out, "{}", "-".repeat(57));

    for report in reports {
        if report.results.is_empty() {
            let _ = writeln!(out, "{:<24} {:>6}", report.file, "-");
            continue;
        }
        for result in report.results {
            let _ = writeln!(
                out,
                "{:<24} {:>6} {:>10} {:>14}",
                report.file,
                result.region_id,
                result.pixel_count,
                hundredths(result.area)
            );
        }
        let _ = writeln!(
            out,
            "{:<24} {:>6} {:>10} {:>14}",
            "",
            "total",
            "",
            hundredths(report.total_area)
        );
    }

    out
}
