use super::types::{ColorScores, Signal, SignalFlags};

/// Priority rule over the three lamp flags.
///
/// Red wins whenever it matches. Amber and green only count when they are the
/// sole match; any overlap between them is reported as `Unknown`.
pub fn decide(flags: SignalFlags) -> Signal {
    let SignalFlags {
        is_red,
        is_amber,
        is_green,
    } = flags;

    if is_red {
        Signal::Red
    } else if is_amber && !is_red && !is_green {
        Signal::Amber
    } else if is_green && !is_red && !is_amber {
        Signal::Green
    } else {
        Signal::Unknown
    }
}

/// Threshold the scores and apply [`decide`].
pub fn classify_scores(scores: &ColorScores, threshold: f64) -> Signal {
    decide(SignalFlags::from_scores(scores, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(red: f64, amber: f64, green: f64) -> ColorScores {
        ColorScores { red, amber, green }
    }

    #[test]
    fn test_red_has_priority_over_everything() {
        assert_eq!(decide(SignalFlags::new(true, true, true)), Signal::Red);
        assert_eq!(decide(SignalFlags::new(true, true, false)), Signal::Red);
        assert_eq!(decide(SignalFlags::new(true, false, true)), Signal::Red);
        assert_eq!(decide(SignalFlags::new(true, false, false)), Signal::Red);
    }

    #[test]
    fn test_amber_and_green_must_be_exclusive() {
        assert_eq!(decide(SignalFlags::new(false, true, true)), Signal::Unknown);
        assert_eq!(decide(SignalFlags::new(false, true, false)), Signal::Amber);
        assert_eq!(decide(SignalFlags::new(false, false, true)), Signal::Green);
    }

    #[test]
    fn test_no_match_is_unknown() {
        assert_eq!(decide(SignalFlags::default()), Signal::Unknown);
    }

    #[test]
    fn test_not_an_argmin() {
        // green is the closest, but red still matches and wins
        assert_eq!(classify_scores(&scores(0.4, 0.3, 0.1), 0.5), Signal::Red);
        // amber is closest, but green also matches
        assert_eq!(classify_scores(&scores(0.9, 0.1, 0.4), 0.5), Signal::Unknown);
    }

    #[test]
    fn test_non_positive_threshold_is_always_unknown() {
        let cases = [
            scores(0.0, 0.0, 0.0),
            scores(0.0, 1.0, 1.0),
            scores(1.0, 0.0, 1.0),
            scores(0.3, 0.2, 0.0),
        ];
        for threshold in [0.0, -0.1, -10.0] {
            for case in &cases {
                assert_eq!(classify_scores(case, threshold), Signal::Unknown);
            }
        }
    }

    #[test]
    fn test_large_threshold_reports_red() {
        assert_eq!(classify_scores(&scores(0.9, 0.8, 0.7), 10.0), Signal::Red);
    }
}
