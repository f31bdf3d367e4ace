use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DetectError;
use crate::pipeline::compare::ComparisonMethod;
use crate::pipeline::types::LightColor;

/// Prefix for environment overrides, e.g. `SIGNAL__THRESHOLD=0.4`
/// or `SIGNAL__BLUR__SIGMA=2.0`.
pub const ENV_PREFIX: &str = "SIGNAL";

/// Score below which a lamp counts as lit, unless configured otherwise.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Smallest explicit blur sigma; below it the Gaussian weights underflow.
pub const MIN_BLUR_SIGMA: f64 = 1e-3;

/// Calibration for one camera: where the lamps sit, how histograms are built
/// and which reference histograms they are compared against.
///
/// Regions and references are calibrated together. Moving the camera or
/// changing its resolution means building a new configuration, not patching
/// one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub regions: RegionSet,
    /// Must match the bin count the reference histograms were produced with.
    pub nbins: usize,
    pub references: ReferencePaths,
    pub blur: BlurConfig,
    pub method: ComparisonMethod,
    /// Scores strictly below this count as a match.
    pub threshold: f64,
    /// Keep the reference set in memory after the first successful load.
    pub cache_references: bool,
}

/// Rectangle in pixel coordinates, half-open: rows `ymin..ymax`,
/// columns `xmin..xmax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub ymin: u32,
    pub ymax: u32,
    pub xmin: u32,
    pub xmax: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSet {
    /// Housing of the whole signal head. Not used for the decision.
    pub light: Region,
    pub red: Region,
    pub amber: Region,
    pub green: Region,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencePaths {
    pub red: PathBuf,
    pub amber: PathBuf,
    pub green: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Side of the square Gaussian kernel, odd.
    pub kernel_size: u32,
    /// Standard deviation; values <= 0 derive it from `kernel_size`.
    pub sigma: f64,
}

impl Region {
    pub const fn new(ymin: u32, ymax: u32, xmin: u32, xmax: u32) -> Self {
        Self {
            ymin,
            ymax,
            xmin,
            xmax,
        }
    }

    pub fn width(&self) -> u32 {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> u32 {
        self.ymax.saturating_sub(self.ymin)
    }

    pub fn is_empty(&self) -> bool {
        self.ymin >= self.ymax || self.xmin >= self.xmax
    }

    /// True when the rectangle is non-empty and lies inside a
    /// `width` x `height` image.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.ymax <= height && self.xmax <= width
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(ymin {}, ymax {}, xmin {}, xmax {})",
            self.ymin, self.ymax, self.xmin, self.xmax
        )
    }
}

impl RegionSet {
    pub fn get(&self, color: LightColor) -> Region {
        match color {
            LightColor::Red => self.red,
            LightColor::Amber => self.amber,
            LightColor::Green => self.green,
        }
    }

    /// All four regions with their names, housing first.
    pub fn named(&self) -> [(&'static str, Region); 4] {
        [
            ("light", self.light),
            ("red", self.red),
            ("amber", self.amber),
            ("green", self.green),
        ]
    }
}

impl ReferencePaths {
    /// Default file names placed under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            red: dir.join("ref_red.npy"),
            amber: dir.join("ref_amber.npy"),
            green: dir.join("ref_green.npy"),
        }
    }

    pub fn get(&self, color: LightColor) -> &Path {
        match color {
            LightColor::Red => &self.red,
            LightColor::Amber => &self.amber,
            LightColor::Green => &self.green,
        }
    }
}

impl BlurConfig {
    /// Effective standard deviation, following the usual Gaussian kernel
    /// rule of thumb when no explicit sigma is configured.
    pub fn effective_sigma(&self) -> f64 {
        if self.sigma > 0.0 {
            self.sigma
        } else {
            0.3 * ((self.kernel_size as f64 - 1.0) * 0.5 - 1.0) + 0.8
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            regions: RegionSet::default(),
            nbins: 32,
            references: ReferencePaths::default(),
            blur: BlurConfig::default(),
            method: ComparisonMethod::Bhattacharyya,
            threshold: DEFAULT_THRESHOLD,
            cache_references: true,
        }
    }
}

impl Default for RegionSet {
    fn default() -> Self {
        Self {
            light: Region::new(63, 90, 292, 302),
            red: Region::new(64, 70, 294, 300),
            amber: Region::new(73, 79, 294, 300),
            green: Region::new(83, 89, 295, 301),
        }
    }
}

impl Default for ReferencePaths {
    fn default() -> Self {
        Self::in_dir("./reference_histograms")
    }
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 4.0, // the reference data was produced with sigma 4
        }
    }
}

impl DetectorConfig {
    /// Layered load: built-in defaults, then the optional settings file,
    /// then `SIGNAL__*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, DetectError> {
        Self::load_with_environment(path, Self::environment())
    }

    /// `SIGNAL__*` variables, nested keys separated by `__`.
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }

    /// Same layering as [`DetectorConfig::load`] with an explicit
    /// environment source.
    pub fn load_with_environment(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, DetectError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder.add_source(environment).build()?;

        let configuration: DetectorConfig = settings.try_deserialize()?;
        configuration.validate().map_err(DetectError::Config)?;
        Ok(configuration)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_references(mut self, references: ReferencePaths) -> Self {
        self.references = references;
        self
    }

    pub fn with_method(mut self, method: ComparisonMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_cache_references(mut self, enabled: bool) -> Self {
        self.cache_references = enabled;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.nbins == 0 {
            return Err("Bin count must be greater than 0".to_string());
        }

        for (name, region) in self.regions.named() {
            if region.is_empty() {
                return Err(format!("Region '{}' {} is empty", name, region));
            }
        }

        if self.blur.kernel_size == 0 || self.blur.kernel_size % 2 == 0 {
            return Err(format!(
                "Blur kernel size must be odd, got {}",
                self.blur.kernel_size
            ));
        }

        if !self.blur.sigma.is_finite() {
            return Err("Blur sigma must be finite".to_string());
        }

        // values <= 0 select the derived sigma
        if self.blur.sigma > 0.0 && self.blur.sigma < MIN_BLUR_SIGMA {
            return Err(format!(
                "Blur sigma must be at least {}, got {}",
                MIN_BLUR_SIGMA, self.blur.sigma
            ));
        }

        // Negative thresholds are legal, they just never match.
        if self.threshold.is_nan() {
            return Err("Threshold must be a number".to_string());
        }

        Ok(())
    }
}
