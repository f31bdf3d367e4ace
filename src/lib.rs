pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{BlurConfig, DetectorConfig, ReferencePaths, Region, RegionSet};
pub use error::{DetectError, ReferenceError};

pub use pipeline::{
    Classification, ColorScores, ComparisonMethod, DetectOptions, Histogram, LightColor, Signal,
    TrafficLightDetector, Verbosity,
};

/// Classify the image named in `options` with the default camera calibration.
pub fn detect(options: &DetectOptions) -> Result<Signal, DetectError> {
    let detector = TrafficLightDetector::new(DetectorConfig::default())?;
    Ok(detector.detect(options)?.signal)
}
