//! Rule and rating configuration, loaded from YAML and validated up front.
//!
//! Every rule section is required; a missing section or key fails the load.
//! Threshold tiers are checked for monotonic order at load time (normal-mode
//! rules need critical >= medium >= low, reverse-mode rules the opposite) so
//! a misconfigured rule fails fast instead of silently misclassifying.

use serde::Deserialize;
use std::path::Path;

use crate::error::EngineError;
use crate::types::Rating;

/// Full parsed configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
  #[serde(default)]
  pub general: GeneralConfig,
  pub max_continuous_dancing: ContinuousRuleConfig,
  pub costume_change_time: CostumeChangeConfig,
  pub max_continuous_judging: ContinuousRuleConfig,
  pub max_gap_between_performances: GapRuleConfig,
}

impl RulesConfig {
  pub fn from_path(path: &Path) -> Result<Self, EngineError> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_yaml(&raw)
  }

  pub fn from_yaml(raw: &str) -> Result<Self, EngineError> {
    let config: Self = serde_yaml::from_str(raw)?;
    config.validate()?;
    Ok(config)
  }

  /// Check invariants serde cannot express. Safe to call repeatedly.
  pub fn validate(&self) -> Result<(), EngineError> {
    check_normal_order("max_continuous_dancing", &self.max_continuous_dancing.thresholds)?;
    check_reverse_order("costume_change_time", &self.costume_change_time.thresholds)?;
    check_normal_order("max_continuous_judging", &self.max_continuous_judging.thresholds)?;
    check_normal_order(
      "max_gap_between_performances",
      &self.max_gap_between_performances.thresholds,
    )?;

    check_weights("max_continuous_dancing", &self.max_continuous_dancing.weights)?;
    check_weights("costume_change_time", &self.costume_change_time.weights)?;
    check_weights("max_continuous_judging", &self.max_continuous_judging.weights)?;
    check_weights(
      "max_gap_between_performances",
      &self.max_gap_between_performances.weights,
    )?;

    self.general.schedule_rating.validate()?;
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
  #[serde(default)]
  pub schedule_rating: RatingThresholds,
}

/// Ascending total-weight cutoffs for the five rating tiers. A total above
/// `poor` falls into the fifth, worst tier.
#[derive(Debug, Clone, Deserialize)]
pub struct RatingThresholds {
  #[serde(default = "defaults::excellent")]
  pub excellent: f64,
  #[serde(default = "defaults::good")]
  pub good: f64,
  #[serde(default = "defaults::acceptable")]
  pub acceptable: f64,
  #[serde(default = "defaults::poor")]
  pub poor: f64,
}

impl RatingThresholds {
  /// Map a total violation weight to a rating. Comparisons are inclusive on
  /// the lower tier: a total exactly at `good` still rates Good.
  pub fn rate(&self, total_weight: f64) -> Rating {
    if total_weight <= self.excellent {
      Rating::Excellent
    } else if total_weight <= self.good {
      Rating::Good
    } else if total_weight <= self.acceptable {
      Rating::Acceptable
    } else if total_weight <= self.poor {
      Rating::Poor
    } else {
      Rating::Critical
    }
  }

  fn validate(&self) -> Result<(), EngineError> {
    if self.excellent <= self.good && self.good <= self.acceptable && self.acceptable <= self.poor {
      Ok(())
    } else {
      Err(EngineError::config(
        "general.schedule_rating",
        "thresholds must satisfy excellent <= good <= acceptable <= poor",
      ))
    }
  }
}

impl Default for RatingThresholds {
  fn default() -> Self {
    Self {
      excellent: defaults::excellent(),
      good: defaults::good(),
      acceptable: defaults::acceptable(),
      poor: defaults::poor(),
    }
  }
}

/// Config for the two continuous-block rules (dancing, judging).
#[derive(Debug, Clone, Deserialize)]
pub struct ContinuousRuleConfig {
  #[serde(default = "defaults::enabled")]
  pub enabled: bool,
  /// Gaps strictly below this count as one continuous block.
  #[serde(default = "defaults::continuity_gap")]
  pub continuity_gap_minutes: f64,
  pub thresholds: Thresholds,
  pub weights: Weights,
}

/// Config for the costume-change rule (reverse mode: small gap = severe).
#[derive(Debug, Clone, Deserialize)]
pub struct CostumeChangeConfig {
  #[serde(default = "defaults::enabled")]
  pub enabled: bool,
  /// Disciplines whose back-to-back combination needs a costume change.
  pub disciplines: Vec<String>,
  /// Recommended buffer, surfaced in violation details for reporting.
  pub min_gap_minutes: i64,
  pub thresholds: Thresholds,
  pub weights: Weights,
}

/// Config for the max-gap rule.
#[derive(Debug, Clone, Deserialize)]
pub struct GapRuleConfig {
  #[serde(default = "defaults::enabled")]
  pub enabled: bool,
  pub thresholds: Thresholds,
  pub weights: Weights,
}

/// Minute cutoffs for the three severity tiers.
#[derive(Debug, Clone, Deserialize)]
pub struct Thresholds {
  pub critical: i64,
  pub medium: i64,
  pub low: i64,
}

/// Weight formula inputs: `base[severity] + excess * coefficient_per_minute`.
#[derive(Debug, Clone, Deserialize)]
pub struct Weights {
  pub base_critical: f64,
  pub base_medium: f64,
  pub base_low: f64,
  #[serde(default)]
  pub coefficient_per_minute: f64,
}

fn check_normal_order(section: &str, t: &Thresholds) -> Result<(), EngineError> {
  if t.critical >= t.medium && t.medium >= t.low {
    Ok(())
  } else {
    Err(EngineError::config(
      section,
      "thresholds must satisfy critical >= medium >= low",
    ))
  }
}

fn check_reverse_order(section: &str, t: &Thresholds) -> Result<(), EngineError> {
  if t.critical <= t.medium && t.medium <= t.low {
    Ok(())
  } else {
    Err(EngineError::config(
      section,
      "thresholds must satisfy critical <= medium <= low",
    ))
  }
}

fn check_weights(section: &str, w: &Weights) -> Result<(), EngineError> {
  let all_non_negative = w.base_critical >= 0.0
    && w.base_medium >= 0.0
    && w.base_low >= 0.0
    && w.coefficient_per_minute >= 0.0;
  if all_non_negative {
    Ok(())
  } else {
    Err(EngineError::config(
      section,
      "base weights and coefficient_per_minute must be non-negative",
    ))
  }
}

mod defaults {
  pub fn enabled() -> bool {
    true
  }

  pub fn continuity_gap() -> f64 {
    10.0
  }

  pub fn excellent() -> f64 {
    0.0
  }

  pub fn good() -> f64 {
    100.0
  }

  pub fn acceptable() -> f64 {
    300.0
  }

  pub fn poor() -> f64 {
    600.0
  }
}
