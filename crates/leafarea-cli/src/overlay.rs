//! Annotated preview images.
//!
//! Draws on top of the segmentation preview so the saved PNG shows what
//! was measured: highlighted leaf pixels, every region outline and the
//! calibration segment.

use image::Rgba;
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use leafarea_core::{CalibrationPoints, MeasureError, Point, Polygon, RgbaImage, Session};

/// Region outline colour.
pub const OUTLINE: Rgba<u8> = Rgba([255, 0, 255, 255]);

/// Calibration segment colour.
pub const CALIBRATION: Rgba<u8> = Rgba([255, 96, 0, 255]);

/// Radius of the calibration endpoint markers, in pixels.
const ENDPOINT_RADIUS: i32 = 3;

#[allow(clippy::cast_possible_truncation)]
fn to_f32(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

/// Draw every polygon's closed outline.
pub fn draw_outlines(image: &mut RgbaImage, regions: &[Polygon], color: Rgba<u8>) {
    for polygon in regions {
        for (a, b) in polygon.edges() {
            draw_line_segment_mut(image, to_f32(a), to_f32(b), color);
        }
    }
}

/// Draw the calibration segment with a dot at each endpoint.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_calibration(image: &mut RgbaImage, points: CalibrationPoints, color: Rgba<u8>) {
    if let CalibrationPoints::Two(a, b) = points {
        draw_line_segment_mut(image, to_f32(a), to_f32(b), color);
    }
    for p in points.points() {
        let center = (p.x.round() as i32, p.y.round() as i32);
        draw_filled_circle_mut(image, center, ENDPOINT_RADIUS, color);
    }
}

/// Preview of the session's active image, with outlines and calibration.
///
/// # Errors
///
/// Returns the errors of [`Session::preview`].
pub fn render(image: &RgbaImage, session: &Session) -> Result<RgbaImage, MeasureError> {
    let mut out = image.clone();
    session.preview(&mut out)?;
    if let Some(record) = session.active() {
        draw_outlines(&mut out, record.regions(), OUTLINE);
        draw_calibration(&mut out, record.calibration_points(), CALIBRATION);
    }
    Ok(out)
}
