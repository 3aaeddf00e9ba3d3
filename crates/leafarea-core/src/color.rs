//! Colour model: RGB to HSL conversion and the HSL acceptance range.
//!
//! Pixels are classified as "leaf-coloured" by converting them to
//! hue/saturation/lightness and testing each component against an
//! inclusive band. See [`crate::segment::matches`].

use serde::{Deserialize, Serialize};

use crate::types::MeasureError;

/// A colour in hue/saturation/lightness form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue in degrees, `[0, 360)`.
    pub h: f64,
    /// Saturation in percent, `[0, 100]`.
    pub s: f64,
    /// Lightness in percent, `[0, 100]`.
    pub l: f64,
}

/// Convert an 8-bit RGB triple to HSL.
///
/// Standard max/min formulation. Achromatic input (`r == g == b`) yields
/// `h = 0` and `s = 0`. Total: every input produces finite output.
#[must_use]
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);

    let (rf, gf, bf) = (unit(r), unit(g), unit(b));
    let (maxf, minf) = (unit(max), unit(min));
    let l = (maxf + minf) / 2.0;

    if max == min {
        return Hsl {
            h: 0.0,
            s: 0.0,
            l: l * 100.0,
        };
    }

    let d = maxf - minf;
    let s = if l > 0.5 {
        d / (2.0 - maxf - minf)
    } else {
        d / (maxf + minf)
    };

    let sector = if max == r {
        (gf - bf) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (bf - rf) / d + 2.0
    } else {
        (rf - gf) / d + 4.0
    };

    Hsl {
        h: sector / 6.0 * 360.0,
        s: s * 100.0,
        l: l * 100.0,
    }
}

fn unit(channel: u8) -> f64 {
    f64::from(channel) / 255.0
}

/// One of the three HSL components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Hue, `[0, 360]` degrees.
    Hue,
    /// Saturation, `[0, 100]` percent.
    Saturation,
    /// Lightness, `[0, 100]` percent.
    Lightness,
}

impl Channel {
    /// All channels in H, S, L order.
    pub const ALL: [Self; 3] = [Self::Hue, Self::Saturation, Self::Lightness];

    /// Upper limit of the channel's scale (the lower limit is always 0).
    #[must_use]
    pub const fn limit(self) -> f64 {
        match self {
            Self::Hue => 360.0,
            Self::Saturation | Self::Lightness => 100.0,
        }
    }

    /// Lower-case channel name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Hue => "hue",
            Self::Saturation => "saturation",
            Self::Lightness => "lightness",
        }
    }
}

/// Inclusive `[min, max]` acceptance bands for hue, saturation and
/// lightness.
///
/// `min <= max` holds for every channel at all times: the setters clamp
/// the incoming value to the channel's scale and then against the
/// opposite bound, so the range is never transiently inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HslRangeRepr", into = "HslRangeRepr")]
pub struct HslRange {
    hue: (f64, f64),
    saturation: (f64, f64),
    lightness: (f64, f64),
}

impl HslRange {
    /// Default hue band, tuned for green foliage.
    pub const DEFAULT_HUE: (f64, f64) = (30.0, 160.0);
    /// Default saturation band.
    pub const DEFAULT_SATURATION: (f64, f64) = (15.0, 100.0);
    /// Default lightness band.
    pub const DEFAULT_LIGHTNESS: (f64, f64) = (15.0, 90.0);

    /// A range that accepts every colour.
    pub const ALL: Self = Self {
        hue: (0.0, 360.0),
        saturation: (0.0, 100.0),
        lightness: (0.0, 100.0),
    };

    /// Build a range from explicit `(min, max)` bands.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidRange`] if a bound is not finite,
    /// lies outside its channel's scale, or if `min > max`.
    pub fn new(
        hue: (f64, f64),
        saturation: (f64, f64),
        lightness: (f64, f64),
    ) -> Result<Self, MeasureError> {
        let range = Self {
            hue,
            saturation,
            lightness,
        };
        for channel in Channel::ALL {
            let (min, max) = range.band(channel);
            let limit = channel.limit();
            if !(min.is_finite() && max.is_finite()) {
                return Err(MeasureError::InvalidRange(format!(
                    "{} bounds must be finite",
                    channel.name()
                )));
            }
            if min < 0.0 || max > limit {
                return Err(MeasureError::InvalidRange(format!(
                    "{} band {min}-{max} is outside 0-{limit}",
                    channel.name()
                )));
            }
            if min > max {
                return Err(MeasureError::InvalidRange(format!(
                    "{} minimum {min} exceeds maximum {max}",
                    channel.name()
                )));
            }
        }
        Ok(range)
    }

    /// The `(min, max)` band of a channel.
    #[must_use]
    pub const fn band(&self, channel: Channel) -> (f64, f64) {
        match channel {
            Channel::Hue => self.hue,
            Channel::Saturation => self.saturation,
            Channel::Lightness => self.lightness,
        }
    }

    const fn band_mut(&mut self, channel: Channel) -> &mut (f64, f64) {
        match channel {
            Channel::Hue => &mut self.hue,
            Channel::Saturation => &mut self.saturation,
            Channel::Lightness => &mut self.lightness,
        }
    }

    /// Move a channel's lower bound.
    ///
    /// The value is clamped to the channel's scale and then to at most the
    /// current upper bound. Non-finite values are ignored.
    pub fn set_min(&mut self, channel: Channel, value: f64) {
        if !value.is_finite() {
            return;
        }
        let band = self.band_mut(channel);
        band.0 = value.clamp(0.0, channel.limit()).min(band.1);
    }

    /// Move a channel's upper bound.
    ///
    /// The value is clamped to the channel's scale and then to at least the
    /// current lower bound. Non-finite values are ignored.
    pub fn set_max(&mut self, channel: Channel, value: f64) {
        if !value.is_finite() {
            return;
        }
        let band = self.band_mut(channel);
        band.1 = value.clamp(0.0, channel.limit()).max(band.0);
    }

    /// Whether a colour lies inside all three bands (inclusive).
    #[must_use]
    pub fn contains(&self, hsl: Hsl) -> bool {
        in_band(self.hue, hsl.h) && in_band(self.saturation, hsl.s) && in_band(self.lightness, hsl.l)
    }
}

fn in_band((min, max): (f64, f64), value: f64) -> bool {
    value >= min && value <= max
}

impl Default for HslRange {
    fn default() -> Self {
        Self {
            hue: Self::DEFAULT_HUE,
            saturation: Self::DEFAULT_SATURATION,
            lightness: Self::DEFAULT_LIGHTNESS,
        }
    }
}

/// Serde shape of [`HslRange`]: each channel as a `[min, max]` pair.
#[derive(Serialize, Deserialize)]
struct HslRangeRepr {
    hue: (f64, f64),
    saturation: (f64, f64),
    lightness: (f64, f64),
}

impl TryFrom<HslRangeRepr> for HslRange {
    type Error = MeasureError;

    fn try_from(repr: HslRangeRepr) -> Result<Self, Self::Error> {
        Self::new(repr.hue, repr.saturation, repr.lightness)
    }
}

impl From<HslRange> for HslRangeRepr {
    fn from(range: HslRange) -> Self {
        Self {
            hue: range.hue,
            saturation: range.saturation,
            lightness: range.lightness,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_hsl(actual: Hsl, h: f64, s: f64, l: f64) {
        let tol = 0.05;
        assert!(
            (actual.h - h).abs() < tol && (actual.s - s).abs() < tol && (actual.l - l).abs() < tol,
            "expected ({h}, {s}, {l}), got {actual:?}",
        );
    }

    // --- rgb_to_hsl ---

    #[test]
    fn achromatic_has_zero_saturation_and_hue() {
        for v in 0..=255u8 {
            let hsl = rgb_to_hsl(v, v, v);
            assert!(hsl.h.abs() < f64::EPSILON, "hue not zero for gray {v}");
            assert!(hsl.s.abs() < f64::EPSILON, "saturation not zero for gray {v}");
            assert!(!hsl.l.is_nan());
        }
    }

    #[test]
    fn black_and_white_lightness() {
        assert_hsl(rgb_to_hsl(0, 0, 0), 0.0, 0.0, 0.0);
        assert_hsl(rgb_to_hsl(255, 255, 255), 0.0, 0.0, 100.0);
    }

    #[test]
    fn primaries() {
        assert_hsl(rgb_to_hsl(255, 0, 0), 0.0, 100.0, 50.0);
        assert_hsl(rgb_to_hsl(0, 255, 0), 120.0, 100.0, 50.0);
        assert_hsl(rgb_to_hsl(0, 0, 255), 240.0, 100.0, 50.0);
    }

    #[test]
    fn forest_green() {
        // #228B22
        assert_hsl(rgb_to_hsl(34, 139, 34), 120.0, 60.69, 33.92);
    }

    #[test]
    fn hue_just_below_red_wraps_high() {
        // Red dominant with blue > green lands in the last sector.
        let hsl = rgb_to_hsl(255, 0, 1);
        assert!(hsl.h > 359.0 && hsl.h < 360.0, "got {}", hsl.h);
    }

    #[test]
    fn hue_is_always_in_range() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(15) {
                for b in (0..=255u8).step_by(15) {
                    let hsl = rgb_to_hsl(r, g, b);
                    assert!((0.0..360.0).contains(&hsl.h), "hue {} for {r},{g},{b}", hsl.h);
                    assert!((0.0..=100.0).contains(&hsl.s));
                    assert!((0.0..=100.0).contains(&hsl.l));
                }
            }
        }
    }

    // --- HslRange ---

    #[test]
    fn default_range_targets_greens() {
        let range = HslRange::default();
        assert!(range.contains(rgb_to_hsl(34, 139, 34)));
        assert!(!range.contains(rgb_to_hsl(255, 255, 255)));
        assert!(!range.contains(rgb_to_hsl(200, 30, 30)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = HslRange::new((120.0, 120.0), (100.0, 100.0), (50.0, 50.0)).unwrap();
        assert!(range.contains(rgb_to_hsl(0, 255, 0)));
    }

    #[test]
    fn new_rejects_inverted_band() {
        let err = HslRange::new((100.0, 50.0), (0.0, 100.0), (0.0, 100.0)).unwrap_err();
        assert!(matches!(err, MeasureError::InvalidRange(_)));
    }

    #[test]
    fn new_rejects_out_of_scale_band() {
        assert!(HslRange::new((0.0, 361.0), (0.0, 100.0), (0.0, 100.0)).is_err());
        assert!(HslRange::new((0.0, 360.0), (-1.0, 100.0), (0.0, 100.0)).is_err());
        assert!(HslRange::new((0.0, 360.0), (0.0, 100.0), (0.0, f64::NAN)).is_err());
    }

    #[test]
    fn set_min_clamps_against_max() {
        let mut range = HslRange::default();
        range.set_min(Channel::Hue, 200.0);
        assert_eq!(range.band(Channel::Hue), (160.0, 160.0));
    }

    #[test]
    fn set_max_clamps_against_min() {
        let mut range = HslRange::default();
        range.set_max(Channel::Lightness, 5.0);
        assert_eq!(range.band(Channel::Lightness), (15.0, 15.0));
    }

    #[test]
    fn setters_clamp_to_channel_scale() {
        let mut range = HslRange::default();
        range.set_max(Channel::Saturation, 250.0);
        range.set_min(Channel::Saturation, -10.0);
        assert_eq!(range.band(Channel::Saturation), (0.0, 100.0));
        range.set_max(Channel::Hue, 1000.0);
        assert_eq!(range.band(Channel::Hue), (30.0, 360.0));
    }

    #[test]
    fn setters_ignore_non_finite() {
        let mut range = HslRange::default();
        range.set_min(Channel::Hue, f64::NAN);
        range.set_max(Channel::Hue, f64::INFINITY);
        assert_eq!(range, HslRange::default());
    }

    #[test]
    fn setters_never_invert() {
        let mut range = HslRange::default();
        for (i, v) in [400.0, -5.0, 80.0, 20.0, 359.0, 0.0].into_iter().enumerate() {
            for channel in Channel::ALL {
                if i % 2 == 0 {
                    range.set_min(channel, v);
                } else {
                    range.set_max(channel, v);
                }
                let (min, max) = range.band(channel);
                assert!(min <= max, "{channel:?} inverted: {min} > {max}");
            }
        }
    }

    #[test]
    fn serde_uses_pair_shape_and_validates() {
        let json = serde_json::to_value(HslRange::default()).unwrap();
        assert_eq!(json["hue"], serde_json::json!([30.0, 160.0]));

        let parsed: HslRange = serde_json::from_str(
            r#"{"hue":[0,360],"saturation":[0,100],"lightness":[0,100]}"#,
        )
        .unwrap();
        assert_eq!(parsed, HslRange::ALL);

        let inverted = serde_json::from_str::<HslRange>(
            r#"{"hue":[90,10],"saturation":[0,100],"lightness":[0,100]}"#,
        );
        assert!(inverted.is_err());
    }
}
