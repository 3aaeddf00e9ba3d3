//! leafarea-export: Pure report serializers (sans-IO)
//!
//! Converts measured image records into report formats. Currently
//! supports CSV.

pub mod csv;

pub use csv::{CsvOptions, Delimiter, hundredths, to_csv};
