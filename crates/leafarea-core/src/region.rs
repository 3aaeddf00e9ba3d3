//! Region masks: bounding windows and polygon rasterization.
//!
//! A [`Mask`] is a binary inclusion map over a rectangular
//! [`PixelWindow`] of the image, stored as an 8-bit buffer (255 =
//! included, 0 = excluded) addressed with window-local coordinates.
//!
//! # Fill rule
//!
//! Each polygon is filled with the **nonzero winding** rule, sampling
//! pixel centres: pixel `(x, y)` belongs to a polygon when the point
//! `(x + 0.5, y + 0.5)` has a nonzero winding number. Polygons are filled
//! independently and OR-ed together, so overlapping regions form a single
//! union with no double-exclusion.

use image::{GrayImage, Luma};

use crate::types::{Dimensions, PixelWindow, Polygon};

/// Margin, in pixels, added on every side of a bounding window.
pub const BOUNDING_MARGIN: f64 = 2.0;

const INCLUDED: Luma<u8> = Luma([255]);

/// Compute the window covering every vertex of every polygon.
///
/// - An empty polygon list covers the full image.
/// - Otherwise the minimal axis-aligned rectangle around all vertices is
///   expanded by [`BOUNDING_MARGIN`], rounded outwards to whole pixels and
///   clamped to the image.
///
/// Returns `None` when the result is degenerate (zero width or height),
/// for example when every vertex lies outside the image or the image
/// itself is empty. Callers skip processing in that case.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn bounding_box(polygons: &[Polygon], dimensions: Dimensions) -> Option<PixelWindow> {
    let window = if polygons.is_empty() {
        PixelWindow::full(dimensions)
    } else {
        let (min_x, min_y, max_x, max_y) = polygons
            .iter()
            .flat_map(Polygon::points)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .fold(
                (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                |(min_x, min_y, max_x, max_y), p| {
                    (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
                },
            );
        if !(min_x.is_finite() && max_x.is_finite()) {
            return None;
        }

        let width = f64::from(dimensions.width);
        let height = f64::from(dimensions.height);
        let left = (min_x - BOUNDING_MARGIN).floor().max(0.0);
        let top = (min_y - BOUNDING_MARGIN).floor().max(0.0);
        let right = (max_x + BOUNDING_MARGIN).ceil().min(width);
        let bottom = (max_y + BOUNDING_MARGIN).ceil().min(height);
        if right <= left || bottom <= top {
            return None;
        }

        // All four values are whole numbers within [0, dimension].
        PixelWindow {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    };

    (window.width > 0 && window.height > 0).then_some(window)
}

/// A binary inclusion mask over a window of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    window: PixelWindow,
    pixels: GrayImage,
}

impl Mask {
    /// An all-excluded mask over `window`.
    #[must_use]
    pub fn empty(window: PixelWindow) -> Self {
        Self {
            window,
            pixels: GrayImage::new(window.width, window.height),
        }
    }

    /// The image-space window this mask covers.
    #[must_use]
    pub const fn window(&self) -> PixelWindow {
        self.window
    }

    /// Whether the window-local pixel `(x, y)` is included.
    ///
    /// Coordinates outside the window are excluded.
    #[must_use]
    pub fn is_included(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] != 0)
    }

    /// Number of included pixels.
    #[must_use]
    pub fn included_count(&self) -> u64 {
        self.pixels.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
    }

    /// The raw mask raster (255 = included, 0 = excluded).
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.pixels
    }

    /// OR one polygon into the mask.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn fill(&mut self, polygon: &Polygon) {
        let window = self.window;
        let x0 = f64::from(window.x);
        let mut crossings: Vec<(f64, i32)> = Vec::with_capacity(polygon.len());

        for row in 0..window.height {
            let sample_y = f64::from(window.y + row) + 0.5;

            crossings.clear();
            for (a, b) in polygon.edges() {
                // Half-open in y so a vertex shared by two edges is counted once.
                let upward = a.y <= sample_y && b.y > sample_y;
                let downward = b.y <= sample_y && a.y > sample_y;
                if upward || downward {
                    let t = (sample_y - a.y) / (b.y - a.y);
                    let x = t.mul_add(b.x - a.x, a.x);
                    crossings.push((x, if upward { 1 } else { -1 }));
                }
            }
            if crossings.is_empty() {
                continue;
            }
            crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                let (start, dir) = pair[0];
                let end = pair[1].0;
                winding += dir;
                if winding == 0 {
                    continue;
                }
                // Pixels whose centre c satisfies start <= c < end.
                let first = ((start - x0) - 0.5).ceil().max(0.0);
                let last = ((end - x0) - 0.5).ceil().min(f64::from(window.width));
                if last <= first {
                    continue;
                }
                for col in first as u32..last as u32 {
                    self.pixels.put_pixel(col, row, INCLUDED);
                }
            }
        }
    }
}

/// Rasterize polygons into a mask over `window`.
///
/// The mask starts fully excluded; every polygon's interior is then
/// filled (see the module docs for the fill rule). Mask coordinates are
/// window-local: image pixel `(x, y)` maps to mask pixel
/// `(x - window.x, y - window.y)`.
#[must_use]
pub fn rasterize(polygons: &[Polygon], window: PixelWindow) -> Mask {
    let mut mask = Mask::empty(window);
    for polygon in polygons {
        mask.fill(polygon);
    }
    mask
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use geo::Contains;

    use super::*;
    use crate::types::Point;

    const DIMS: Dimensions = Dimensions {
        width: 100,
        height: 100,
    };

    fn polygon(points: &[(f64, f64)]) -> Polygon {
        Polygon::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    fn triangle() -> Polygon {
        polygon(&[(10.0, 10.0), (50.0, 10.0), (10.0, 50.0)])
    }

    fn square(x: f64, y: f64, size: f64) -> Polygon {
        polygon(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
    }

    // --- bounding_box ---

    #[test]
    fn empty_list_covers_full_image() {
        assert_eq!(bounding_box(&[], DIMS), Some(PixelWindow::full(DIMS)));
    }

    #[test]
    fn triangle_gets_two_pixel_margin() {
        let window = bounding_box(&[triangle()], DIMS).unwrap();
        assert_eq!(
            window,
            PixelWindow {
                x: 8,
                y: 8,
                width: 44,
                height: 44,
            }
        );
        assert!(window.x >= 8 && window.y >= 8);
        assert!(window.right() <= 52 && window.bottom() <= 52);
    }

    #[test]
    fn window_is_clamped_to_image() {
        let window = bounding_box(&[square(-10.0, 90.0, 30.0)], DIMS).unwrap();
        assert_eq!(window.x, 0);
        assert_eq!(window.right(), 22);
        assert_eq!(window.y, 88);
        assert_eq!(window.bottom(), 100);
    }

    #[test]
    fn fractional_vertices_round_outwards() {
        let window = bounding_box(&[square(10.4, 10.6, 5.2)], DIMS).unwrap();
        assert_eq!(window.x, 8);
        assert_eq!(window.y, 8);
        assert_eq!(window.right(), 18);
        assert_eq!(window.bottom(), 18);
    }

    #[test]
    fn window_covers_all_polygons() {
        let window = bounding_box(&[square(5.0, 5.0, 5.0), square(60.0, 70.0, 10.0)], DIMS).unwrap();
        assert_eq!((window.x, window.y), (3, 3));
        assert_eq!((window.right(), window.bottom()), (72, 82));
    }

    #[test]
    fn polygons_outside_image_are_degenerate() {
        assert_eq!(bounding_box(&[square(200.0, 200.0, 10.0)], DIMS), None);
    }

    #[test]
    fn empty_image_is_degenerate() {
        let dims = Dimensions {
            width: 0,
            height: 0,
        };
        assert_eq!(bounding_box(&[], dims), None);
        assert_eq!(bounding_box(&[triangle()], dims), None);
    }

    // --- rasterize ---

    #[test]
    fn square_covers_exact_pixel_count() {
        let mask = rasterize(&[square(0.0, 0.0, 50.0)], PixelWindow::full(DIMS));
        assert_eq!(mask.included_count(), 2500);
        assert!(mask.is_included(0, 0));
        assert!(mask.is_included(49, 49));
        assert!(!mask.is_included(50, 49));
        assert!(!mask.is_included(49, 50));
    }

    #[test]
    fn mask_starts_excluded() {
        let mask = rasterize(&[], PixelWindow::full(DIMS));
        assert_eq!(mask.included_count(), 0);
    }

    #[test]
    fn window_local_coordinates() {
        let poly = square(20.0, 30.0, 10.0);
        let window = bounding_box(std::slice::from_ref(&poly), DIMS).unwrap();
        let mask = rasterize(&[poly], window);
        assert_eq!(mask.window(), window);
        assert_eq!(mask.included_count(), 100);
        // Image pixel (20, 30) is local (2, 2) because of the margin.
        assert!(mask.is_included(2, 2));
        assert!(!mask.is_included(1, 2));
        assert!(mask.is_included(11, 11));
        assert!(!mask.is_included(12, 11));
    }

    #[test]
    fn winding_direction_does_not_matter() {
        let cw = polygon(&[(5.0, 5.0), (40.0, 8.0), (30.0, 45.0), (8.0, 30.0)]);
        let ccw = polygon(&[(8.0, 30.0), (30.0, 45.0), (40.0, 8.0), (5.0, 5.0)]);
        let window = PixelWindow::full(DIMS);
        assert_eq!(rasterize(&[cw], window), rasterize(&[ccw], window));
    }

    #[test]
    fn overlapping_polygons_form_a_union() {
        let a = square(0.0, 0.0, 20.0);
        let b = square(10.0, 10.0, 20.0);
        let mask = rasterize(&[a, b], PixelWindow::full(DIMS));
        // 400 + 400 - 100 overlap.
        assert_eq!(mask.included_count(), 700);
        assert!(mask.is_included(15, 15));
    }

    #[test]
    fn doubly_wound_outline_stays_filled() {
        // The same square traced twice: winding number 2 inside.
        let twice = polygon(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        let mask = rasterize(&[twice], PixelWindow::full(DIMS));
        assert_eq!(mask.included_count(), 100);
    }

    #[test]
    fn polygon_partly_outside_window_is_clipped() {
        let window = PixelWindow {
            x: 10,
            y: 10,
            width: 10,
            height: 10,
        };
        let mask = rasterize(&[square(0.0, 0.0, 15.0)], window);
        assert_eq!(mask.included_count(), 25);
        assert!(mask.is_included(4, 4));
        assert!(!mask.is_included(5, 4));
    }

    #[test]
    fn triangle_matches_point_in_polygon_oracle() {
        let tri = triangle();
        let oracle = geo::Polygon::new(
            geo::LineString::from(
                tri.points()
                    .iter()
                    .map(|p| (p.x, p.y))
                    .collect::<Vec<_>>(),
            ),
            vec![],
        );
        let mask = rasterize(std::slice::from_ref(&tri), PixelWindow::full(DIMS));

        for y in 0..DIMS.height {
            for x in 0..DIMS.width {
                let centre = geo::Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                // Skip centres sitting exactly on the hypotenuse, where the
                // oracle treats the boundary as outside.
                let on_edge = (centre.x() + centre.y() - 60.0).abs() < 1e-9;
                if on_edge {
                    continue;
                }
                assert_eq!(
                    mask.is_included(x, y),
                    oracle.contains(&centre),
                    "mismatch at ({x}, {y})",
                );
            }
        }
    }

    #[test]
    fn strictly_inside_included_and_outside_bbox_excluded() {
        let tri = triangle();
        let mask = rasterize(std::slice::from_ref(&tri), PixelWindow::full(DIMS));
        // Pixel fully inside the triangle.
        assert!(mask.is_included(15, 15));
        // Everything outside the triangle's vertex bounding box.
        for y in 0..DIMS.height {
            for x in 0..DIMS.width {
                let outside = x < 10 || y < 10 || x >= 50 || y >= 50;
                if outside {
                    assert!(!mask.is_included(x, y), "({x}, {y}) should be excluded");
                }
            }
        }
    }

    #[test]
    fn triangle_area_is_close_to_geometric_area() {
        let mask = rasterize(&[triangle()], PixelWindow::full(DIMS));
        let count = mask.included_count() as f64;
        // Geometric area is 800; pixel-centre sampling stays within one
        // edge's worth of pixels.
        assert!((count - 800.0).abs() < 40.0, "count = {count}");
    }
}
