use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::OnceLock;

use image::RgbImage;
use tracing::{debug, info};

use super::compare::ComparisonMethod;
use super::decision::decide;
use super::histogram::{Histogram, HistogramEngine};
use super::loader::load_image;
use super::reference::ReferenceSet;
use super::region::extract;
use super::types::{Classification, ColorScores, LightColor, SignalFlags, Verbosity};
use crate::config::{DetectorConfig, DEFAULT_THRESHOLD};
use crate::error::DetectError;

/// One classification request.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectOptions {
    pub image: PathBuf,
    pub threshold: f64,
    pub verbosity: Verbosity,
}

impl DetectOptions {
    /// Request with [`DEFAULT_THRESHOLD`]; see
    /// [`TrafficLightDetector::options`] for the configured one.
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            threshold: DEFAULT_THRESHOLD,
            verbosity: Verbosity::Quiet,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Live histograms of the three lamp regions.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionHistograms {
    pub red: Histogram,
    pub amber: Histogram,
    pub green: Histogram,
}

impl RegionHistograms {
    pub fn get(&self, color: LightColor) -> &Histogram {
        match color {
            LightColor::Red => &self.red,
            LightColor::Amber => &self.amber,
            LightColor::Green => &self.green,
        }
    }
}

/// Crop, histogram, compare, decide.
///
/// References are read on first use. With `cache_references` they are kept
/// for every later call; otherwise each call reads them again.
pub struct TrafficLightDetector {
    config: DetectorConfig,
    engine: HistogramEngine,
    references: OnceLock<ReferenceSet>,
}

impl TrafficLightDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, DetectError> {
        config.validate().map_err(DetectError::Config)?;
        let engine = HistogramEngine::new(config.nbins, config.blur);
        Ok(Self {
            config,
            engine,
            references: OnceLock::new(),
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn method(&self) -> ComparisonMethod {
        self.config.method
    }

    /// Request for `image` using the configured threshold.
    pub fn options(&self, image: impl Into<PathBuf>) -> DetectOptions {
        DetectOptions::new(image).with_threshold(self.config.threshold)
    }

    pub fn references(&self) -> Result<Cow<'_, ReferenceSet>, DetectError> {
        if !self.config.cache_references {
            return ReferenceSet::load(&self.config.references, self.config.nbins)
                .map(Cow::Owned);
        }
        if let Some(cached) = self.references.get() {
            return Ok(Cow::Borrowed(cached));
        }
        let loaded = ReferenceSet::load(&self.config.references, self.config.nbins)?;
        // a concurrent first call may have won; both loaded the same files
        Ok(Cow::Borrowed(self.references.get_or_init(|| loaded)))
    }

    /// Histograms of the red, amber and green regions of `image`.
    pub fn region_histograms(&self, image: &RgbImage) -> Result<RegionHistograms, DetectError> {
        let histogram = |color: LightColor| -> Result<Histogram, DetectError> {
            let region = self.config.regions.get(color);
            let crop = extract(image, color.name(), region)?;
            Ok(self.engine.compute(&crop))
        };

        Ok(RegionHistograms {
            red: histogram(LightColor::Red)?,
            amber: histogram(LightColor::Amber)?,
            green: histogram(LightColor::Green)?,
        })
    }

    /// Distance of each region to its reference.
    pub fn scores(&self, image: &RgbImage) -> Result<ColorScores, DetectError> {
        let live = self.region_histograms(image)?;
        let references = self.references()?;
        let method = self.config.method;
        let score = |color: LightColor| method.compare(references.get(color), live.get(color));

        Ok(ColorScores {
            red: score(LightColor::Red),
            amber: score(LightColor::Amber),
            green: score(LightColor::Green),
        })
    }

    /// Classify with the configured threshold.
    pub fn classify(&self, image: &RgbImage) -> Result<Classification, DetectError> {
        self.classify_with_threshold(image, self.config.threshold)
    }

    pub fn classify_with_threshold(
        &self,
        image: &RgbImage,
        threshold: f64,
    ) -> Result<Classification, DetectError> {
        let scores = self.scores(image)?;
        let flags = SignalFlags::from_scores(&scores, threshold);
        let signal = decide(flags);
        debug!(
            "Scores ({}): {} -> {:?} -> {}",
            self.config.method, scores, flags, signal
        );

        Ok(Classification {
            signal,
            scores,
            threshold,
        })
    }

    /// Argument echo, present only at [`Verbosity::Parameters`].
    pub fn parameter_report(&self, options: &DetectOptions) -> Option<String> {
        (options.verbosity >= Verbosity::Parameters).then(|| {
            format!(
                "Arguments: image={}, hist_thresh={}, method={}, nbins={}",
                options.image.display(),
                options.threshold,
                self.config.method,
                self.config.nbins
            )
        })
    }

    /// Load the image named in `options` and classify it.
    pub fn detect(&self, options: &DetectOptions) -> Result<Classification, DetectError> {
        if let Some(line) = self.parameter_report(options) {
            info!("{}", line);
        }

        let image = load_image(&options.image)?;
        let classification = self.classify_with_threshold(&image, options.threshold)?;

        for line in score_report(options.verbosity, &classification.scores) {
            info!("{}", line);
        }
        Ok(classification)
    }
}

/// Score lines logged from [`Verbosity::Scores`] up; empty when quiet.
pub fn score_report(verbosity: Verbosity, scores: &ColorScores) -> Vec<String> {
    if verbosity < Verbosity::Scores {
        return Vec::new();
    }
    let mut lines = vec!["scores (the lower the score, more similar):".to_string()];
    lines.extend(
        LightColor::ALL
            .iter()
            .map(|&color| format!("\t{}\t: {:.3}", color, scores.get(color))),
    );
    lines
}
