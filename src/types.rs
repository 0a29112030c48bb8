//! Core types for the schedule engine (JSON contracts + internal models).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Inbound schedule graph (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// Read-only snapshot of a fully assembled schedule. Unknown fields are
/// silently ignored; the engine never mutates it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleGraph {
  #[serde(default)]
  pub competitors: Vec<Competitor>,
  #[serde(default)]
  pub juries: Vec<Jury>,
}

impl ScheduleGraph {
  pub fn competitors(&self) -> &[Competitor] {
    &self.competitors
  }

  pub fn juries(&self) -> &[Jury] {
    &self.juries
  }
}

/// A dancing couple (or solo dancer). Performances arrive in assembly order,
/// not necessarily time order; every rule sorts before looking at them.
#[derive(Debug, Clone, Deserialize)]
pub struct Competitor {
  pub id: String,
  pub display_name: String,
  #[serde(default)]
  pub performances: Vec<Performance>,
}

/// A jury member. Same shape as a competitor from the rules' point of view.
#[derive(Debug, Clone, Deserialize)]
pub struct Jury {
  pub id: String,
  pub display_name: String,
  #[serde(default)]
  pub performances: Vec<Performance>,
}

/// One scheduled performance. Times are kept as raw strings and parsed
/// lazily during analysis, so a malformed value fails the run instead of the
/// graph load.
#[derive(Debug, Clone, Deserialize)]
pub struct Performance {
  pub start_time: String,
  pub end_time: String,
  pub duration_minutes: f64,
  #[serde(default)]
  pub round_type: String,
  /// Link to the competition this performance belongs to (flattened to the
  /// two fields the rules read; absent when the schedule row was unmatched).
  #[serde(default)]
  pub competition: Option<Competition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Competition {
  pub name: String,
  pub discipline: String,
}

/// Common surface over competitors and juries for the continuous-time rules.
pub trait Entity {
  fn id(&self) -> &str;
  fn display_name(&self) -> &str;
  fn performances(&self) -> &[Performance];
}

impl Entity for Competitor {
  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> &str {
    &self.display_name
  }

  fn performances(&self) -> &[Performance] {
    &self.performances
  }
}

impl Entity for Jury {
  fn id(&self) -> &str {
    &self.id
  }

  fn display_name(&self) -> &str {
    &self.display_name
  }

  fn performances(&self) -> &[Performance] {
    &self.performances
  }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Violation severity. Ordered most-to-least severe so sorted collections
/// put critical entries first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Critical,
  Medium,
  Low,
}

impl Severity {
  pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Medium, Severity::Low];
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// One detected rule breach with its computed weight and evidence.
#[derive(Debug, Clone, Serialize)]
pub struct Violation {
  pub rule_name: String,
  pub severity: Severity,
  pub weight: f64,
  pub description: String,
  pub entity_id: String,
  pub entity_name: String,
  pub details: ViolationDetails,
}

/// Rule-specific evidence, one closed variant per rule so the reporting side
/// can pattern-match instead of probing a string map.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationDetails {
  /// Continuous dancing/judging block that ran too long.
  ContinuousBlock {
    duration_minutes: i64,
    threshold_minutes: i64,
    excess_minutes: f64,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
  },
  /// Too little time to change costume between disciplines.
  CostumeChange {
    gap_minutes: f64,
    required_minutes: i64,
    shortage_minutes: f64,
    from_discipline: String,
    to_discipline: String,
    from_time: NaiveDateTime,
    to_time: NaiveDateTime,
  },
  /// Too much idle time between two consecutive performances.
  PerformanceGap {
    gap_minutes: f64,
    threshold_minutes: i64,
    excess_minutes: f64,
    first_performance_end: NaiveDateTime,
    second_performance_start: NaiveDateTime,
  },
}

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// Overall schedule rating, best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
  Excellent,
  Good,
  Acceptable,
  Poor,
  Critical,
}

impl Rating {
  /// Czech display label, as printed in the final report.
  pub fn label_cs(self) -> &'static str {
    match self {
      Rating::Excellent => "VYNIKAJÍCÍ",
      Rating::Good => "DOBRÉ",
      Rating::Acceptable => "PŘIJATELNÉ",
      Rating::Poor => "ŠPATNÉ",
      Rating::Critical => "KRITICKÉ",
    }
  }
}

// ---------------------------------------------------------------------------
// Analysis result (JSON contract — what we emit)
// ---------------------------------------------------------------------------

/// Immutable outcome of one `analyze` call.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
  pub total_weight: f64,
  pub rating: Rating,
  /// All violations in fixed rule order (each rule's own order preserved).
  pub violations: Vec<Violation>,
  /// Keyed by severity; every severity is present even when empty.
  pub violations_by_severity: BTreeMap<Severity, Vec<Violation>>,
  /// Keyed by rule name; only rules that produced at least one violation.
  pub violations_by_rule: BTreeMap<String, Vec<Violation>>,
}

impl AnalysisResult {
  /// Brief counts-only view of the result.
  pub fn summary(&self) -> AnalysisSummary {
    let count = |s: Severity| {
      self
        .violations_by_severity
        .get(&s)
        .map(|v| v.len())
        .unwrap_or(0)
    };
    AnalysisSummary {
      total_weight: self.total_weight,
      rating: self.rating,
      total_violations: self.violations.len(),
      critical_count: count(Severity::Critical),
      medium_count: count(Severity::Medium),
      low_count: count(Severity::Low),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
  pub total_weight: f64,
  pub rating: Rating,
  pub total_violations: usize,
  pub critical_count: usize,
  pub medium_count: usize,
  pub low_count: usize,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for the subprocess mode.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub section: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      section: None,
    }
  }

  pub fn with_section(mut self, section: impl Into<String>) -> Self {
    self.section = Some(section.into());
    self
  }
}
