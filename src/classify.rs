//! Threshold classification and weight scoring shared by all rules.

use crate::config::{Thresholds, Weights};
use crate::types::Severity;

/// Classification direction: Normal flags values that are too large
/// (continuous minutes, oversized gaps), Reverse flags values that are too
/// small (costume-change buffers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Reverse,
}

/// Outcome of a successful classification: the matched tier, that tier's own
/// threshold, and the distance past it.
#[derive(Debug, Clone, Copy)]
pub struct Classified {
  pub severity: Severity,
  pub threshold: i64,
  pub excess: f64,
}

/// Classify a measured minute value against the tier thresholds, most severe
/// tier first. Returns `None` when no tier matches — a normal outcome, not an
/// error. Values are truncated to whole minutes before comparison, which also
/// keeps `excess` non-negative.
pub fn classify(value: f64, thresholds: &Thresholds, mode: Mode) -> Option<Classified> {
  let v = value.trunc() as i64;
  let (severity, threshold) = match mode {
    Mode::Normal => {
      if v >= thresholds.critical {
        (Severity::Critical, thresholds.critical)
      } else if v >= thresholds.medium {
        (Severity::Medium, thresholds.medium)
      } else if v >= thresholds.low {
        (Severity::Low, thresholds.low)
      } else {
        return None;
      }
    }
    Mode::Reverse => {
      if v <= thresholds.critical {
        (Severity::Critical, thresholds.critical)
      } else if v <= thresholds.medium {
        (Severity::Medium, thresholds.medium)
      } else if v <= thresholds.low {
        (Severity::Low, thresholds.low)
      } else {
        return None;
      }
    }
  };
  let excess = match mode {
    Mode::Normal => (v - threshold) as f64,
    Mode::Reverse => (threshold - v) as f64,
  };
  Some(Classified {
    severity,
    threshold,
    excess,
  })
}

/// Violation weight: the matched tier's base plus a per-minute surcharge for
/// the distance past the threshold.
pub fn score(weights: &Weights, severity: Severity, excess: f64) -> f64 {
  let base = match severity {
    Severity::Critical => weights.base_critical,
    Severity::Medium => weights.base_medium,
    Severity::Low => weights.base_low,
  };
  base + excess * weights.coefficient_per_minute
}
