use std::fmt;

use serde::{Deserialize, Serialize};

/// One lamp of the signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Red,
    Amber,
    Green,
}

impl LightColor {
    pub const ALL: [LightColor; 3] = [LightColor::Red, LightColor::Amber, LightColor::Green];

    pub fn name(&self) -> &'static str {
        match self {
            LightColor::Red => "red",
            LightColor::Amber => "amber",
            LightColor::Green => "green",
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one classification. `Unknown` is a valid answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Red,
    Amber,
    Green,
    Unknown,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Red => "RED",
            Signal::Amber => "AMBER",
            Signal::Green => "GREEN",
            Signal::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Distance of each live histogram to its reference. Lower is more similar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorScores {
    pub red: f64,
    pub amber: f64,
    pub green: f64,
}

impl ColorScores {
    pub fn get(&self, color: LightColor) -> f64 {
        match color {
            LightColor::Red => self.red,
            LightColor::Amber => self.amber,
            LightColor::Green => self.green,
        }
    }
}

impl fmt::Display for ColorScores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "red {:.3}, amber {:.3}, green {:.3}",
            self.red, self.amber, self.green
        )
    }
}

/// Per-lamp match flags, the only input of the decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalFlags {
    pub is_red: bool,
    pub is_amber: bool,
    pub is_green: bool,
}

impl SignalFlags {
    pub fn new(is_red: bool, is_amber: bool, is_green: bool) -> Self {
        Self {
            is_red,
            is_amber,
            is_green,
        }
    }

    /// A lamp matches when its score is strictly below `threshold`.
    pub fn from_scores(scores: &ColorScores, threshold: f64) -> Self {
        Self {
            is_red: scores.red < threshold,
            is_amber: scores.amber < threshold,
            is_green: scores.green < threshold,
        }
    }
}

/// How much the detector reports besides the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Scores,
    Parameters,
}

impl From<u8> for Verbosity {
    fn from(level: u8) -> Self {
        match level {
            0 => Verbosity::Quiet,
            1 => Verbosity::Scores,
            _ => Verbosity::Parameters,
        }
    }
}

/// Label plus the evidence it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub signal: Signal,
    pub scores: ColorScores,
    pub threshold: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_labels() {
        assert_eq!(Signal::Red.to_string(), "RED");
        assert_eq!(Signal::Amber.to_string(), "AMBER");
        assert_eq!(Signal::Green.to_string(), "GREEN");
        assert_eq!(Signal::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_flags_use_strict_comparison() {
        let scores = ColorScores {
            red: 0.5,
            amber: 0.49,
            green: 0.51,
        };
        let flags = SignalFlags::from_scores(&scores, 0.5);
        assert_eq!(flags, SignalFlags::new(false, true, false));
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Verbosity::from(0), Verbosity::Quiet);
        assert_eq!(Verbosity::from(1), Verbosity::Scores);
        assert_eq!(Verbosity::from(2), Verbosity::Parameters);
        assert!(Verbosity::Parameters > Verbosity::Scores);
    }
}
