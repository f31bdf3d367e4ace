use std::path::PathBuf;

use thiserror::Error;

use crate::config::Region;
use crate::pipeline::types::LightColor;

// Main Detection Error Type

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Input image {0} is not available")]
    FileNotFound(PathBuf),
    #[error("Input image {path} could not be opened: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Region '{name}' {region} does not fit a {width}x{height} image")]
    InvalidRegion {
        name: &'static str,
        region: Region,
        width: u32,
        height: u32,
    },
    #[error("Failed to load {color} reference histogram from {path}: {source}")]
    ReferenceLoad {
        color: LightColor,
        path: PathBuf,
        #[source]
        source: ReferenceError,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
}

// Reference Histogram Codec Error Type
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed npy data: {0}")]
    Npy(String),
    #[error("Malformed json data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported reference file extension: {0:?}")]
    UnsupportedFormat(Option<String>),
    #[error("Expected {expected} bins, found {found}")]
    BinCount { expected: usize, found: usize },
    #[error("Bin {index} holds invalid count {value}")]
    InvalidBin { index: usize, value: f64 },
}

impl From<config::ConfigError> for DetectError {
    fn from(err: config::ConfigError) -> Self {
        DetectError::Config(err.to_string())
    }
}
