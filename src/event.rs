//! Severity classification.
//!
//! Per-frame pixel displacement is the only speed signal the pipeline
//! has, so severity is a pure threshold function over it. Levels
//! serialize as the exact strings `"Low"`, `"Medium"`, `"High"`;
//! downstream consumers compare them verbatim.

use serde::Serialize;
use std::fmt;

/// Alert severity derived from per-frame displacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        };
        f.write_str(name)
    }
}

/// Displacement thresholds separating the severity levels.
///
/// Comparisons are strict: a displacement exactly on a threshold takes
/// the lower level.
#[derive(Clone, Copy, Debug)]
pub struct SeverityThresholds {
    /// Above this, High.
    pub high: f32,
    /// Above this (and at or below `high`), Medium.
    pub medium: f32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            high: 40.0,
            medium: 25.0,
        }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, displacement: f32) -> Severity {
        if displacement > self.high {
            Severity::High
        } else if displacement > self.medium {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_exclusive() {
        let thresholds = SeverityThresholds::default();
        assert_eq!(thresholds.classify(40.0), Severity::Medium);
        assert_eq!(thresholds.classify(40.0001), Severity::High);
        assert_eq!(thresholds.classify(25.0), Severity::Low);
        assert_eq!(thresholds.classify(25.0001), Severity::Medium);
    }

    #[test]
    fn classification_is_monotonic() {
        let thresholds = SeverityThresholds::default();
        let rank = |severity: Severity| match severity {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
        };
        let mut last = 0;
        for displacement in [0.0, 10.0, 25.0, 26.0, 40.0, 41.0, 500.0] {
            let current = rank(thresholds.classify(displacement));
            assert!(current >= last, "severity fell at {}", displacement);
            last = current;
        }
    }

    #[test]
    fn custom_thresholds_apply() {
        let thresholds = SeverityThresholds {
            high: 55.0,
            medium: 35.0,
        };
        assert_eq!(thresholds.classify(50.0), Severity::Medium);
        assert_eq!(thresholds.classify(56.0), Severity::High);
        assert_eq!(thresholds.classify(35.0), Severity::Low);
    }

    #[test]
    fn serializes_as_exact_level_names() {
        assert_eq!(
            serde_json::to_string(&Severity::High).expect("serialize"),
            "\"High\""
        );
        assert_eq!(Severity::Medium.to_string(), "Medium");
    }
}
