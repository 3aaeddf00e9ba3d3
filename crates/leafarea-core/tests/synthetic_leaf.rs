//! Integration test: measure a synthetic leaf photographed next to a ruler.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_precision_loss)]

use image::{ExtendedColorType, ImageEncoder, Rgba, codecs::png::PngEncoder};
use leafarea_core::{
    ClickOutcome, Dimensions, HslRange, Mode, Point, RgbaImage, Session, Status, decode_rgba,
};

const LEAF: Rgba<u8> = Rgba([46, 125, 50, 255]);
const PAPER: Rgba<u8> = Rgba([245, 245, 240, 255]);
const RULER: Rgba<u8> = Rgba([20, 20, 20, 255]);

/// 160x120 sheet with a round leaf centred at (60, 60) and a ruler mark
/// along the bottom edge from x = 10 to x = 110.
fn photograph() -> RgbaImage {
    RgbaImage::from_fn(160, 120, |x, y| {
        let dx = f64::from(x) + 0.5 - 60.0;
        let dy = f64::from(y) + 0.5 - 60.0;
        if dx.hypot(dy) < 30.0 {
            LEAF
        } else if y >= 110 && (10..110).contains(&x) {
            RULER
        } else {
            PAPER
        }
    })
}

fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

fn leaf_pixels(img: &RgbaImage) -> u64 {
    u64::try_from(img.pixels().filter(|&&p| p == LEAF).count()).unwrap()
}

#[test]
fn leaf_area_from_png_bytes() {
    let image = decode_rgba(&encode_png(&photograph())).expect("png should decode");
    let mut session = Session::default();
    session.add_image("leaf.png", Dimensions::of(&image));

    // 100 px ruler mark is 5 cm long: 20 px/cm.
    session.set_mode(Mode::Calibrating).unwrap();
    session.click(Point::new(10.0, 115.0)).unwrap();
    session.click(Point::new(110.0, 115.0)).unwrap();
    let calibration = session.commit_calibration(5.0).unwrap();
    assert!((calibration.ratio() - 20.0).abs() < 1e-12);

    // Outline the leaf loosely, closing by clicking near the first vertex.
    session.set_mode(Mode::DrawingRegion).unwrap();
    for p in [
        Point::new(25.0, 22.0),
        Point::new(98.0, 25.0),
        Point::new(96.0, 97.0),
        Point::new(24.0, 99.0),
    ] {
        session.click(p).unwrap();
    }
    assert_eq!(
        session.click(Point::new(27.0, 20.0)).unwrap(),
        ClickOutcome::RegionClosed(1)
    );

    let results = session.compute_areas(&image).unwrap();
    let expected_pixels = leaf_pixels(&image);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].pixel_count, expected_pixels);
    let expected_area = expected_pixels as f64 / 400.0;
    assert!((results[0].area - expected_area).abs() < 1e-9);
    // Close to pi * 1.5^2 cm².
    assert!((results[0].area - std::f64::consts::PI * 2.25).abs() < 0.1);

    let record = session.active().unwrap();
    assert_eq!(record.status(), Status::Ready);
    assert!(record.is_current(&HslRange::default()));
}

#[test]
fn preview_matches_measured_pixels() {
    let image = photograph();
    let mut session = Session::default();
    session.add_image("leaf.png", Dimensions::of(&image));
    session.set_mode(Mode::Calibrating).unwrap();
    session.click(Point::new(10.0, 115.0)).unwrap();
    session.click(Point::new(110.0, 115.0)).unwrap();
    session.commit_calibration(5.0).unwrap();

    session.set_mode(Mode::DrawingRegion).unwrap();
    for p in [
        Point::new(20.0, 20.0),
        Point::new(100.0, 20.0),
        Point::new(100.0, 100.0),
        Point::new(20.0, 100.0),
    ] {
        session.click(p).unwrap();
    }
    session.close_region().unwrap();

    let mut preview = image.clone();
    let highlighted = session.preview(&mut preview).unwrap();
    let results = session.compute_areas(&image).unwrap();
    assert_eq!(highlighted, results[0].pixel_count);
    // Ruler and paper are never highlighted.
    assert_eq!(*preview.get_pixel(50, 115), RULER);
    assert_eq!(*preview.get_pixel(5, 5), PAPER);
}
