//! Inference engine: runs the rules, aggregates violations, rates the result.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::{RatingThresholds, RulesConfig};
use crate::error::EngineError;
use crate::rules::{rules_from_config, Rule};
use crate::types::{AnalysisResult, ScheduleGraph, Severity, Violation};

/// The schedule inference engine. Construction validates the configuration;
/// a constructed engine can analyze any number of graphs.
pub struct Engine {
  rating: RatingThresholds,
  rules: Vec<Rule>,
}

impl Engine {
  /// Build from an already-parsed configuration. Fails on invalid threshold
  /// ordering or negative weights — a misconfigured rule must not silently
  /// misclassify.
  pub fn new(config: RulesConfig) -> Result<Self, EngineError> {
    config.validate()?;
    Ok(Self {
      rating: config.general.schedule_rating.clone(),
      rules: rules_from_config(&config),
    })
  }

  /// Load and validate a YAML rules configuration, then build the engine.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
    Self::new(RulesConfig::from_path(path.as_ref())?)
  }

  /// The fixed rule list, in execution order.
  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  /// Run every enabled rule against the graph and aggregate the outcome.
  ///
  /// Rule errors are not caught: one malformed timestamp means systemically
  /// bad input, so the whole call fails with no partial report.
  pub fn analyze(&self, graph: &ScheduleGraph) -> Result<AnalysisResult, EngineError> {
    let mut violations = Vec::new();
    for rule in &self.rules {
      violations.extend(rule.check(graph)?);
    }

    let total_weight: f64 = violations.iter().map(|v| v.weight).sum();
    let rating = self.rating.rate(total_weight);
    let violations_by_severity = group_by_severity(&violations);
    let violations_by_rule = group_by_rule(&violations);

    Ok(AnalysisResult {
      total_weight,
      rating,
      violations,
      violations_by_severity,
      violations_by_rule,
    })
  }
}

/// Bucket violations per severity. Every severity gets a bucket, empty or not.
fn group_by_severity(violations: &[Violation]) -> BTreeMap<Severity, Vec<Violation>> {
  let mut groups: BTreeMap<Severity, Vec<Violation>> =
    Severity::ALL.iter().map(|&s| (s, Vec::new())).collect();
  for v in violations {
    groups.entry(v.severity).or_default().push(v.clone());
  }
  groups
}

/// Bucket violations per rule name. Only rules that fired appear.
fn group_by_rule(violations: &[Violation]) -> BTreeMap<String, Vec<Violation>> {
  let mut groups: BTreeMap<String, Vec<Violation>> = BTreeMap::new();
  for v in violations {
    groups.entry(v.rule_name.clone()).or_default().push(v.clone());
  }
  groups
}
