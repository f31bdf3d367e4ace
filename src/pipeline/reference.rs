use std::path::Path;

use tracing::debug;

use super::histogram::Histogram;
use super::npy::{self, NpyVector};
use super::types::LightColor;
use crate::config::ReferencePaths;
use crate::error::{DetectError, ReferenceError};

/// Precomputed histograms of each lamp while lit.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSet {
    pub red: Histogram,
    pub amber: Histogram,
    pub green: Histogram,
}

impl ReferenceSet {
    /// Read all three references, each of which must hold exactly `nbins`
    /// values.
    pub fn load(paths: &ReferencePaths, nbins: usize) -> Result<Self, DetectError> {
        let load = |color: LightColor| {
            let path = paths.get(color);
            load_histogram(path, nbins).map_err(|source| DetectError::ReferenceLoad {
                color,
                path: path.to_path_buf(),
                source,
            })
        };

        let references = Self {
            red: load(LightColor::Red)?,
            amber: load(LightColor::Amber)?,
            green: load(LightColor::Green)?,
        };
        debug!("Loaded reference histograms with {} bins", nbins);
        Ok(references)
    }

    pub fn get(&self, color: LightColor) -> &Histogram {
        match color {
            LightColor::Red => &self.red,
            LightColor::Amber => &self.amber,
            LightColor::Green => &self.green,
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Read one reference histogram. The format follows the file extension:
/// `.npy` or `.json` (a flat array of numbers).
pub fn load_histogram(path: &Path, nbins: usize) -> Result<Histogram, ReferenceError> {
    let bytes = std::fs::read(path)?;
    let bins = match extension(path).as_deref() {
        Some("npy") => NpyVector::try_from(&bytes[..])?.values,
        Some("json") => serde_json::from_slice::<Vec<f64>>(&bytes)?,
        _ => return Err(ReferenceError::UnsupportedFormat(extension(path))),
    };

    if bins.len() != nbins {
        return Err(ReferenceError::BinCount {
            expected: nbins,
            found: bins.len(),
        });
    }
    Histogram::from_bins(bins)
}

/// Write a histogram in the format chosen by the extension of `path`.
pub fn save_histogram(path: &Path, histogram: &Histogram) -> Result<(), ReferenceError> {
    let bytes = match extension(path).as_deref() {
        Some("npy") => npy::encode(histogram.bins()),
        Some("json") => serde_json::to_vec(histogram.bins())?,
        _ => return Err(ReferenceError::UnsupportedFormat(extension(path))),
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ramp(nbins: usize) -> Histogram {
        Histogram::from_bins((0..nbins).map(|i| i as f64 * 0.37 + 1.0 / 3.0).collect()).unwrap()
    }

    #[test]
    fn test_npy_and_json_keep_values_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let histogram = ramp(32);
        for name in ["ref.npy", "ref.json", "REF.NPY"] {
            let path = dir.path().join(name);
            save_histogram(&path, &histogram).unwrap();
            assert_eq!(load_histogram(&path, 32).unwrap(), histogram, "{}", name);
        }
    }

    #[test]
    fn test_short_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref_red.npy");
        save_histogram(&path, &ramp(31)).unwrap();

        let err = load_histogram(&path, 32).unwrap_err();
        assert!(matches!(
            err,
            ReferenceError::BinCount {
                expected: 32,
                found: 31
            }
        ));
    }

    #[test]
    fn test_negative_bin_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.json");
        std::fs::write(&path, "[1.0, -1.0, 2.0]").unwrap();
        assert!(matches!(
            load_histogram(&path, 3),
            Err(ReferenceError::InvalidBin { index: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.csv");
        std::fs::write(&path, "1,2,3").unwrap();
        assert!(matches!(
            load_histogram(&path, 3),
            Err(ReferenceError::UnsupportedFormat(Some(ext))) if ext == "csv"
        ));
    }

    #[test]
    fn test_set_reports_which_color_failed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ReferencePaths::in_dir(dir.path());
        save_histogram(&paths.red, &ramp(32)).unwrap();
        std::fs::write(&paths.amber, b"garbage").unwrap();
        save_histogram(&paths.green, &ramp(32)).unwrap();

        match ReferenceSet::load(&paths, 32) {
            Err(DetectError::ReferenceLoad { color, path, .. }) => {
                assert_eq!(color, LightColor::Amber);
                assert_eq!(path, PathBuf::from(&paths.amber));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_reference_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ReferencePaths::in_dir(dir.path().join("absent"));
        assert!(matches!(
            ReferenceSet::load(&paths, 32),
            Err(DetectError::ReferenceLoad {
                color: LightColor::Red,
                source: ReferenceError::Io(_),
                ..
            })
        ));
    }
}
