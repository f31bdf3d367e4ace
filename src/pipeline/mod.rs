pub mod compare;
pub mod decision;
pub mod detector;
pub mod histogram;
pub mod loader;
pub mod npy;
pub mod reference;
pub mod region;
pub mod types;

pub use compare::ComparisonMethod;
pub use decision::{classify_scores, decide};
pub use detector::{score_report, DetectOptions, RegionHistograms, TrafficLightDetector};
pub use histogram::{Histogram, HistogramEngine};
pub use loader::load_image;
pub use reference::{load_histogram, save_histogram, ReferenceSet};
pub use types::{Classification, ColorScores, LightColor, Signal, SignalFlags, Verbosity};
