//! leafarea: measure leaf areas from a job file.
//!
//! Reads a JSON job listing images, their calibration segment and region
//! outlines, measures the leaf-coloured area inside every region and
//! prints a results table (or JSON). Optionally writes the results as
//! CSV and an annotated preview PNG per image.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin leafarea -- [OPTIONS] <JOB>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod job;
mod overlay;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use leafarea_core::{Dimensions, MeasureError, Mode, Session, decode_rgba};
use leafarea_export::{CsvOptions, Delimiter};

use crate::job::{BandOverrides, Job, JobImage};

/// Leaf-area measurement from calibrated photographs.
///
/// Every region's area counts only pixels whose colour lies inside the
/// HSL range, converted to squared units with the image's calibration.
#[derive(Parser)]
#[command(name = "leafarea", version)]
struct Cli {
    /// Path to the job file (JSON).
    job: PathBuf,

    /// Write per-region results as CSV to this file.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// CSV field separator.
    #[arg(long, value_enum, default_value_t = Separator::Comma)]
    delimiter: Separator,

    /// Calibration unit name used in report headers.
    #[arg(long, default_value = CsvOptions::DEFAULT_UNIT)]
    unit: String,

    /// Write an annotated preview PNG per image into this directory.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Print results as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Hue band as MIN,MAX (0-360), overriding the job file.
    #[arg(long, value_parser = job::parse_band, allow_hyphen_values = true)]
    hue: Option<(f64, f64)>,

    /// Saturation band as MIN,MAX (0-100), overriding the job file.
    #[arg(long, value_parser = job::parse_band, allow_hyphen_values = true)]
    saturation: Option<(f64, f64)>,

    /// Lightness band as MIN,MAX (0-100), overriding the job file.
    #[arg(long, value_parser = job::parse_band, allow_hyphen_values = true)]
    lightness: Option<(f64, f64)>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// CSV separator selection.
#[derive(Clone, Copy, ValueEnum)]
enum Separator {
    /// `,` (areas are quoted).
    Comma,
    /// `;`
    Semicolon,
}

impl From<Separator> for Delimiter {
    fn from(separator: Separator) -> Self {
        match separator {
            Separator::Comma => Self::Comma,
            Separator::Semicolon => Self::Semicolon,
        }
    }
}

impl Cli {
    const fn overrides(&self) -> BandOverrides {
        BandOverrides {
            hue: self.hue,
            saturation: self.saturation,
            lightness: self.lightness,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let job = Job::load(&cli.job)?;
    let mut config = job.config.clone();
    config.range = cli
        .overrides()
        .apply(config.range)
        .context("invalid HSL band override")?;
    log::debug!("range: {:?}", config.range);

    if let Some(dir) = &cli.preview_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating preview directory {}", dir.display()))?;
    }

    let mut session = Session::new(config);
    for entry in &job.images {
        measure(&mut session, entry, cli.preview_dir.as_deref())?;
    }

    let reports = report::summarize(session.images());
    if cli.json {
        let json = serde_json::to_string_pretty(&reports).context("serializing results")?;
        println!("{json}");
    } else {
        print!("{}", report::table(&reports, &cli.unit));
    }

    if let Some(path) = &cli.csv {
        let options = CsvOptions {
            delimiter: cli.delimiter.into(),
            unit: &cli.unit,
        };
        let csv = leafarea_export::to_csv(session.images(), &options);
        std::fs::write(path, &csv).with_context(|| format!("writing CSV to {}", path.display()))?;
        eprintln!("CSV written to {} ({} bytes)", path.display(), csv.len());
    }

    Ok(())
}

/// Load one image into the session, apply its calibration and regions,
/// and measure it.
///
/// Images without calibration or regions stay in the session unmeasured.
fn measure(session: &mut Session, entry: &JobImage, preview_dir: Option<&Path>) -> anyhow::Result<()> {
    let path = &entry.path;
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let image = decode_rgba(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let id = session.add_image(name.clone(), Dimensions::of(&image));
    session.select(id)?;

    if let Some(calibration) = entry.calibration {
        session.set_mode(Mode::Calibrating)?;
        session.click(calibration.start)?;
        session.click(calibration.end)?;
        session
            .commit_calibration(calibration.distance)
            .with_context(|| format!("calibrating {name}"))?;
    }
    for (index, outline) in entry.regions.iter().enumerate() {
        session
            .add_region(outline.clone())
            .with_context(|| format!("{name}: region {}", index + 1))?;
    }

    match session.compute_areas(&image) {
        Ok(_) => {}
        Err(e @ (MeasureError::Uncalibrated | MeasureError::NoRegions)) => {
            log::warn!("{name}: not measured, {e}");
        }
        Err(e) => return Err(e).with_context(|| format!("measuring {name}")),
    }

    if let Some(dir) = preview_dir {
        let preview = overlay::render(&image, session)?;
        let stem = path.file_stem().map_or_else(
            || "image".to_string(),
            |s| s.to_string_lossy().into_owned(),
        );
        let out = dir.join(format!("{stem}-preview.png"));
        preview
            .save(&out)
            .with_context(|| format!("writing preview {}", out.display()))?;
        log::info!("preview written to {}", out.display());
    }

    Ok(())
}
