//! CSV export of per-region area results.
//!
//! One header line followed by one row per region of every image that has
//! results, in image order and then region order:
//!
//! ```text
//! File,Region,Area (cm²),Scale (px/cm)
//! leaf.png,1,"25,00",10.00
//! ```
//!
//! Areas use a comma as decimal separator, the calibration ratio a point.
//! Any field containing the delimiter, a double quote or a line break is
//! quoted, so the comma-decimal area survives the comma delimiter.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::{self, Write};

use leafarea_core::ImageRecord;

/// Field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// `,`
    #[default]
    Comma,
    /// `;`, common for spreadsheets in comma-decimal locales.
    Semicolon,
}

impl Delimiter {
    /// The separator character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Comma => ',',
            Self::Semicolon => ';',
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(self.as_char())
    }
}

/// Formatting choices for [`to_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions<'a> {
    /// Field separator.
    pub delimiter: Delimiter,

    /// Name of the calibration unit, used in the header (`Area (cm²)`).
    pub unit: &'a str,
}

impl CsvOptions<'_> {
    /// Default calibration unit.
    pub const DEFAULT_UNIT: &'static str = "cm";
}

impl Default for CsvOptions<'_> {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            unit: Self::DEFAULT_UNIT,
        }
    }
}

/// Serialize the results of `records` as CSV.
///
/// Records without results are skipped. Results are written as stored,
/// even if the record has since become pending. Rows are joined with
/// `\n` and there is no trailing newline.
///
/// # Examples
///
/// ```
/// use leafarea_export::{CsvOptions, to_csv};
///
/// let csv = to_csv(&[], &CsvOptions::default());
/// assert_eq!(csv, "File,Region,Area (cm²),Scale (px/cm)");
/// ```
#[must_use]
pub fn to_csv(records: &[ImageRecord], options: &CsvOptions<'_>) -> String {
    let d = options.delimiter;
    let unit = options.unit;
    let mut out = String::new();

    let _ = write!(
        out,
        "{}{d}Region{d}{}{d}{}",
        field("File", d),
        field(&format!("Area ({unit}²)"), d),
        field(&format!("Scale (px/{unit})"), d),
    );

    for record in records {
        let name = field(record.name(), d);
        let scale = record
            .calibration()
            .map(|c| hundredths(c.ratio()))
            .unwrap_or_default();
        for result in record.results() {
            let area = hundredths(result.area).replace('.', ",");
            let _ = write!(
                out,
                "\n{name}{d}{}{d}{}{d}{scale}",
                result.region_id,
                field(&area, d),
            );
        }
    }

    out
}

/// Render `value` with two decimals, rounding ties away from zero.
///
/// `format!("{:.2}")` rounds an exact tie such as `0.125` to even
/// (`0.12`); reports show `0.13`.
#[must_use]
pub fn hundredths(value: f64) -> String {
    format!("{:.2}", (value * 100.0).round() / 100.0)
}

/// Quote `value` if it contains the delimiter, a quote or a line break.
fn field(value: &str, delimiter: Delimiter) -> String {
    let needs_quotes = value.contains(delimiter.as_char())
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_delimiter_quotes_comma_decimal() {
        assert_eq!(field("25,00", Delimiter::Comma), "\"25,00\"");
        assert_eq!(field("25,00", Delimiter::Semicolon), "25,00");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(field("say \"hi\"", Delimiter::Semicolon), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn line_breaks_are_quoted() {
        assert_eq!(field("a\nb", Delimiter::Comma), "\"a\nb\"");
    }

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(field("leaf.png", Delimiter::Comma), "leaf.png");
    }

    #[test]
    fn header_uses_unit_and_delimiter() {
        let options = CsvOptions {
            delimiter: Delimiter::Semicolon,
            unit: "mm",
        };
        assert_eq!(
            to_csv(&[], &options),
            "File;Region;Area (mm²);Scale (px/mm)"
        );
    }

    #[test]
    fn hundredths_rounds_ties_up() {
        assert_eq!(hundredths(50.0 / 400.0), "0.13");
        assert_eq!(hundredths(0.375), "0.38");
        assert_eq!(hundredths(25.0), "25.00");
        assert_eq!(hundredths(2.2449), "2.24");
    }

    #[test]
    fn delimiter_display() {
        assert_eq!(Delimiter::Comma.to_string(), ",");
        assert_eq!(Delimiter::Semicolon.to_string(), ";");
    }
}
