//! Colour segmentation: classify masked pixels against an HSL range.
//!
//! One predicate, [`matches`], decides whether a pixel is leaf-coloured.
//! It drives both outputs of this module, so the preview always shows
//! exactly the pixels that would be counted:
//!
//! - [`render_preview`] paints matching pixels in a highlight colour.
//! - [`count_matches`] counts them for area computation.

use image::Rgba;

use crate::color::{HslRange, rgb_to_hsl};
use crate::region::{self, Mask};
use crate::types::{Dimensions, PixelWindow, Polygon, RgbaImage};

/// Whether a pixel's colour lies inside `range`. Alpha is ignored.
#[must_use]
pub fn matches(pixel: Rgba<u8>, range: &HslRange) -> bool {
    let [r, g, b, _] = pixel.0;
    range.contains(rgb_to_hsl(r, g, b))
}

/// The part of the mask window that also lies inside the image, as
/// `(columns, rows)` ranges in image coordinates.
fn scan_bounds(mask: &Mask, dimensions: Dimensions) -> (std::ops::Range<u32>, std::ops::Range<u32>) {
    let window = mask.window();
    let columns = window.x.min(dimensions.width)..window.right().min(dimensions.width);
    let rows = window.y.min(dimensions.height)..window.bottom().min(dimensions.height);
    (columns, rows)
}

/// Paint every included, matching pixel with `highlight`.
///
/// Only the red, green and blue channels are overwritten; alpha is kept.
/// Pixels outside the mask window, or excluded by the mask, are left
/// untouched. Returns the number of highlighted pixels.
pub fn render_preview(
    image: &mut RgbaImage,
    mask: &Mask,
    range: &HslRange,
    highlight: [u8; 3],
) -> u64 {
    let window = mask.window();
    let (columns, rows) = scan_bounds(mask, Dimensions::of(image));
    let mut highlighted = 0;

    for y in rows {
        for x in columns.clone() {
            if !mask.is_included(x - window.x, y - window.y) {
                continue;
            }
            let pixel = image.get_pixel_mut(x, y);
            if matches(*pixel, range) {
                pixel.0[..3].copy_from_slice(&highlight);
                highlighted += 1;
            }
        }
    }

    highlighted
}

/// Count included pixels whose colour matches `range`.
///
/// The scan covers the mask window clipped to the image; a full-image
/// mask of one region yields that region's matching pixel count.
#[must_use]
pub fn count_matches(image: &RgbaImage, mask: &Mask, range: &HslRange) -> u64 {
    let window = mask.window();
    let (columns, rows) = scan_bounds(mask, Dimensions::of(image));
    let mut count = 0;

    for y in rows {
        for x in columns.clone() {
            if mask.is_included(x - window.x, y - window.y) && matches(*image.get_pixel(x, y), range)
            {
                count += 1;
            }
        }
    }

    count
}

/// Highlight matching pixels inside any of `polygons`.
///
/// Rasterizes the union of all polygons over their shared bounding
/// window and previews only that window, so pixels outside it are never
/// read or written. A degenerate window makes this a no-op.
///
/// Returns the bounding window used (if any) and the number of
/// highlighted pixels.
pub fn preview_regions(
    image: &mut RgbaImage,
    polygons: &[Polygon],
    range: &HslRange,
    highlight: [u8; 3],
) -> (Option<PixelWindow>, u64) {
    let Some(window) = region::bounding_box(polygons, Dimensions::of(image)) else {
        log::trace!("preview skipped: degenerate bounding window");
        return (None, 0);
    };
    let mask = region::rasterize(polygons, window);
    let highlighted = render_preview(image, &mask, range, highlight);
    log::debug!(
        "preview highlighted {highlighted} of {} window pixels",
        window.area()
    );
    (Some(window), highlighted)
}
