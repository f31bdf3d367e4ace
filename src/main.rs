use std::path::PathBuf;

use clap::Parser;
use signal_histogram::{
    ComparisonMethod, DetectError, DetectorConfig, ReferencePaths, TrafficLightDetector,
    Verbosity,
};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "signal-histogram")]
#[command(about = "Classify the lit lamp of a fixed-position traffic signal from one image")]
#[command(version)]
struct Cli {
    /// Input image path.
    #[arg(long)]
    image: PathBuf,

    /// Histogram comparison threshold; a lamp matches below it.
    /// Defaults to the configured value (0.5).
    #[arg(long)]
    hist_thresh: Option<f64>,

    /// 0: result only, 1: + scores, 2: + parameters.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    verbose: u8,

    /// Camera calibration file (toml, json or yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding ref_red.npy, ref_amber.npy and ref_green.npy.
    #[arg(long)]
    references: Option<PathBuf>,

    /// Histogram distance: bhattacharyya, chi_square or chi_square_alt.
    #[arg(long)]
    method: Option<ComparisonMethod>,
}

fn init_logging(verbosity: Verbosity) {
    let level = match verbosity {
        Verbosity::Quiet => Level::WARN,
        Verbosity::Scores => Level::INFO,
        Verbosity::Parameters => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<(), DetectError> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from(cli.verbose);
    init_logging(verbosity);

    let mut configuration = DetectorConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.references {
        configuration = configuration.with_references(ReferencePaths::in_dir(dir));
    }
    if let Some(method) = cli.method {
        configuration = configuration.with_method(method);
    }

    let detector = TrafficLightDetector::new(configuration)?;
    let mut options = detector.options(cli.image).with_verbosity(verbosity);
    if let Some(threshold) = cli.hist_thresh {
        options = options.with_threshold(threshold);
    }

    let classification = detector.detect(&options)?;
    println!("Current Traffic Signal: {}", classification.signal);
    Ok(())
}
