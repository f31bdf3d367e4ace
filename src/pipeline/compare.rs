use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::histogram::Histogram;

const EPSILON: f64 = f64::EPSILON;

/// Histogram distance. Every method here scores identical histograms as 0
/// and grows with dissimilarity, so a fixed threshold keeps its meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMethod {
    /// Hellinger form of the Bhattacharyya distance, in `[0, 1]` and
    /// insensitive to the overall scale of either histogram.
    #[default]
    Bhattacharyya,
    /// Pearson chi-square, `sum((r - l)^2 / r)` over bins where the
    /// reference is non-zero.
    ChiSquare,
    /// Symmetric chi-square, `2 * sum((r - l)^2 / (r + l))`.
    ChiSquareAlt,
}

impl ComparisonMethod {
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonMethod::Bhattacharyya => "bhattacharyya",
            ComparisonMethod::ChiSquare => "chi_square",
            ComparisonMethod::ChiSquareAlt => "chi_square_alt",
        }
    }

    /// Distance from `reference` to `live`. Argument order matters for
    /// `ChiSquare`, which divides by the reference.
    pub fn compare(&self, reference: &Histogram, live: &Histogram) -> f64 {
        debug_assert_eq!(reference.len(), live.len());
        let pairs = reference
            .bins()
            .iter()
            .copied()
            .zip(live.bins().iter().copied());

        match self {
            ComparisonMethod::Bhattacharyya => {
                let mut overlap = 0.0;
                let mut sum_r = 0.0;
                let mut sum_l = 0.0;
                for (r, l) in pairs {
                    overlap += (r * l).sqrt();
                    sum_r += r;
                    sum_l += l;
                }
                let norm = sum_r * sum_l;
                let scale = if norm.abs() > EPSILON {
                    1.0 / norm.sqrt()
                } else {
                    1.0
                };
                (1.0 - overlap * scale).max(0.0).sqrt()
            }
            ComparisonMethod::ChiSquare => pairs
                .filter(|(r, _)| r.abs() > EPSILON)
                .map(|(r, l)| (r - l) * (r - l) / r)
                .sum(),
            ComparisonMethod::ChiSquareAlt => {
                2.0 * pairs
                    .filter(|(r, l)| (r + l).abs() > EPSILON)
                    .map(|(r, l)| (r - l) * (r - l) / (r + l))
                    .sum::<f64>()
            }
        }
    }
}

impl fmt::Display for ComparisonMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ComparisonMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "bhattacharyya" | "hellinger" => Ok(ComparisonMethod::Bhattacharyya),
            "chi_square" | "chisqr" => Ok(ComparisonMethod::ChiSquare),
            "chi_square_alt" | "chisqr_alt" => Ok(ComparisonMethod::ChiSquareAlt),
            other => Err(format!("unknown comparison method '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(bins: &[f64]) -> Histogram {
        Histogram::from_bins(bins.to_vec()).unwrap()
    }

    #[test]
    fn test_identical_histograms_score_zero() {
        let h = hist(&[3.0, 0.0, 7.0, 26.0]);
        for method in [
            ComparisonMethod::Bhattacharyya,
            ComparisonMethod::ChiSquare,
            ComparisonMethod::ChiSquareAlt,
        ] {
            assert!(method.compare(&h, &h) < 1e-6, "{}", method);
        }
    }

    #[test]
    fn test_bhattacharyya_disjoint_is_one() {
        let a = hist(&[36.0, 0.0, 0.0]);
        let b = hist(&[0.0, 0.0, 36.0]);
        let score = ComparisonMethod::Bhattacharyya.compare(&a, &b);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bhattacharyya_ignores_scale() {
        let a = hist(&[1.0, 2.0, 3.0]);
        let b = hist(&[10.0, 20.0, 30.0]);
        assert!(ComparisonMethod::Bhattacharyya.compare(&a, &b) < 1e-6);
    }

    #[test]
    fn test_bhattacharyya_empty_live_is_one() {
        let a = hist(&[1.0, 2.0, 3.0]);
        let empty = Histogram::zeros(3);
        assert_eq!(ComparisonMethod::Bhattacharyya.compare(&a, &empty), 1.0);
    }

    #[test]
    fn test_chi_square_divides_by_reference() {
        let reference = hist(&[4.0, 0.0]);
        let live = hist(&[2.0, 5.0]);
        // (4 - 2)^2 / 4, second bin skipped
        assert_eq!(ComparisonMethod::ChiSquare.compare(&reference, &live), 1.0);
        // 2 * ((2^2 / 6) + (5^2 / 5))
        let alt = ComparisonMethod::ChiSquareAlt.compare(&reference, &live);
        assert!((alt - 2.0 * (4.0 / 6.0 + 5.0)).abs() < 1e-12);
    }

    #[test]
    fn test_parse_method_names() {
        assert_eq!(
            "bhattacharyya".parse::<ComparisonMethod>(),
            Ok(ComparisonMethod::Bhattacharyya)
        );
        assert_eq!(
            "chi-square".parse::<ComparisonMethod>(),
            Ok(ComparisonMethod::ChiSquare)
        );
        assert_eq!(
            "CHI_SQUARE_ALT".parse::<ComparisonMethod>(),
            Ok(ComparisonMethod::ChiSquareAlt)
        );
        assert!("correlation".parse::<ComparisonMethod>().is_err());
    }
}
