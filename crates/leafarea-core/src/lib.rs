//! leafarea-core: Leaf-area measurement from calibrated photographs (sans-IO).
//!
//! Measures the real area of leaf-coloured pixels inside user-drawn
//! polygons:
//! decode -> calibrate -> outline regions -> HSL segmentation -> area.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers. File access and report writing live in
//! `leafarea-cli` and `leafarea-export`.

pub mod calibration;
pub mod color;
pub mod decode;
pub mod region;
pub mod segment;
pub mod session;
pub mod types;

pub use calibration::{Calibration, CalibrationPoints};
pub use color::{Channel, Hsl, HslRange, rgb_to_hsl};
pub use decode::decode_rgba;
pub use region::{Mask, bounding_box, rasterize};
pub use session::{ClickOutcome, ImageRecord, Mode, Session, Status};
pub use types::{
    AreaResult, Dimensions, ImageId, MeasureError, PixelWindow, Point, Polygon, RgbaImage,
    SessionConfig,
};
