//! The four schedule-validation rules and their detection algorithms.
//!
//! The rule set is fixed and small, so it is a closed enum dispatched with a
//! match, not a registry. Every rule time-sorts an entity's performances
//! before looking at them — input order is assembly order and means nothing.

use chrono::NaiveDateTime;

use crate::classify::{classify, score, Mode};
use crate::config::{ContinuousRuleConfig, CostumeChangeConfig, GapRuleConfig, RulesConfig};
use crate::error::EngineError;
use crate::timeparse::{minutes_between, parse_time};
use crate::types::{Competitor, Entity, Performance, ScheduleGraph, Violation, ViolationDetails};

/// The closed set of schedule rules, each carrying its own config.
#[derive(Debug, Clone)]
pub enum Rule {
  ContinuousDancing(ContinuousRuleConfig),
  CostumeChange(CostumeChangeConfig),
  ContinuousJudging(ContinuousRuleConfig),
  MaxGap(GapRuleConfig),
}

/// Build the fixed rule list in registration order. Analysis output keeps
/// this order, so it is part of the engine's deterministic contract.
pub fn rules_from_config(config: &RulesConfig) -> Vec<Rule> {
  vec![
    Rule::ContinuousDancing(config.max_continuous_dancing.clone()),
    Rule::CostumeChange(config.costume_change_time.clone()),
    Rule::ContinuousJudging(config.max_continuous_judging.clone()),
    Rule::MaxGap(config.max_gap_between_performances.clone()),
  ]
}

impl Rule {
  pub fn name(&self) -> &'static str {
    match self {
      Rule::ContinuousDancing(_) => "MaxContinuousDancing",
      Rule::CostumeChange(_) => "CostumeChangeTime",
      Rule::ContinuousJudging(_) => "MaxContinuousJudging",
      Rule::MaxGap(_) => "MaxGapBetweenPerformances",
    }
  }

  pub fn enabled(&self) -> bool {
    match self {
      Rule::ContinuousDancing(cfg) | Rule::ContinuousJudging(cfg) => cfg.enabled,
      Rule::CostumeChange(cfg) => cfg.enabled,
      Rule::MaxGap(cfg) => cfg.enabled,
    }
  }

  /// Run this rule against the graph. A disabled rule returns an empty list.
  /// Errors (malformed timestamps) propagate — the caller aborts the whole
  /// analysis rather than emit a partial report.
  pub fn check(&self, graph: &ScheduleGraph) -> Result<Vec<Violation>, EngineError> {
    if !self.enabled() {
      return Ok(Vec::new());
    }
    match self {
      Rule::ContinuousDancing(cfg) => {
        check_continuous(graph.competitors(), BlockKind::Dancing, cfg)
      }
      Rule::CostumeChange(cfg) => check_costume_change(graph.competitors(), cfg),
      Rule::ContinuousJudging(cfg) => check_continuous(graph.juries(), BlockKind::Judging, cfg),
      Rule::MaxGap(cfg) => check_max_gap(graph.competitors(), cfg),
    }
  }
}

// ---------------------------------------------------------------------------
// Shared timeline
// ---------------------------------------------------------------------------

/// A performance with its boundary times parsed once up front.
struct Timed<'a> {
  start: NaiveDateTime,
  end: NaiveDateTime,
  performance: &'a Performance,
}

/// Parse and sort an entity's performances ascending by start time. The sort
/// is stable, so equal starts keep their assembly order.
fn sorted_timeline(performances: &[Performance]) -> Result<Vec<Timed<'_>>, EngineError> {
  let mut timeline = performances
    .iter()
    .map(|p| {
      Ok(Timed {
        start: parse_time(&p.start_time)?,
        end: parse_time(&p.end_time)?,
        performance: p,
      })
    })
    .collect::<Result<Vec<_>, EngineError>>()?;
  timeline.sort_by_key(|t| t.start);
  Ok(timeline)
}

// ---------------------------------------------------------------------------
// Continuous-block rules (dancing, judging)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum BlockKind {
  Dancing,
  Judging,
}

impl BlockKind {
  fn rule_name(self) -> &'static str {
    match self {
      BlockKind::Dancing => "MaxContinuousDancing",
      BlockKind::Judging => "MaxContinuousJudging",
    }
  }

  fn describe(self, entity_name: &str, minutes: i64) -> String {
    match self {
      BlockKind::Dancing => {
        format!("Tanečník {} tančí {} minut bez přestávky", entity_name, minutes)
      }
      BlockKind::Judging => {
        format!("Porotce {} porotuje {} minut bez přestávky", entity_name, minutes)
      }
    }
  }
}

/// Detect maximal continuous blocks per entity and flag the ones whose
/// accumulated active minutes exceed the thresholds. A gap strictly below
/// `continuity_gap_minutes` keeps the block open; a gap of exactly that many
/// minutes closes it.
fn check_continuous<E: Entity>(
  entities: &[E],
  kind: BlockKind,
  cfg: &ContinuousRuleConfig,
) -> Result<Vec<Violation>, EngineError> {
  let mut violations = Vec::new();

  for entity in entities {
    let timeline = sorted_timeline(entity.performances())?;
    if timeline.len() < 2 {
      continue;
    }

    let mut block_minutes = timeline[0].performance.duration_minutes;
    let mut block_start = timeline[0].start;

    for pair in timeline.windows(2) {
      let (prev, curr) = (&pair[0], &pair[1]);
      let gap = minutes_between(prev.end, curr.start);

      if gap < cfg.continuity_gap_minutes {
        block_minutes += curr.performance.duration_minutes;
      } else {
        // Block closed by a real break: evaluate it, then restart at curr.
        if let Some(v) = block_violation(entity, kind, cfg, block_minutes, block_start, prev.end) {
          violations.push(v);
        }
        block_minutes = curr.performance.duration_minutes;
        block_start = curr.start;
      }
    }

    // The trailing block is always evaluated exactly once, even when the
    // walk never broke it. Safe to index: len >= 2 checked above.
    let last_end = timeline[timeline.len() - 1].end;
    if let Some(v) = block_violation(entity, kind, cfg, block_minutes, block_start, last_end) {
      violations.push(v);
    }
  }

  Ok(violations)
}

fn block_violation<E: Entity>(
  entity: &E,
  kind: BlockKind,
  cfg: &ContinuousRuleConfig,
  block_minutes: f64,
  start_time: NaiveDateTime,
  end_time: NaiveDateTime,
) -> Option<Violation> {
  let hit = classify(block_minutes, &cfg.thresholds, Mode::Normal)?;
  let minutes = block_minutes.trunc() as i64;

  Some(Violation {
    rule_name: kind.rule_name().to_string(),
    severity: hit.severity,
    weight: score(&cfg.weights, hit.severity, hit.excess),
    description: kind.describe(entity.display_name(), minutes),
    entity_id: entity.id().to_string(),
    entity_name: entity.display_name().to_string(),
    details: ViolationDetails::ContinuousBlock {
      duration_minutes: minutes,
      threshold_minutes: hit.threshold,
      excess_minutes: hit.excess,
      start_time,
      end_time,
    },
  })
}

// ---------------------------------------------------------------------------
// Costume change rule
// ---------------------------------------------------------------------------

/// Flag consecutive performances in different configured disciplines whose
/// buffer is too short for a costume change. Pairs with a shared discipline,
/// a discipline outside the configured set, or a missing competition link
/// are never eligible, whatever their gap.
fn check_costume_change(
  competitors: &[Competitor],
  cfg: &CostumeChangeConfig,
) -> Result<Vec<Violation>, EngineError> {
  let mut violations = Vec::new();

  for competitor in competitors {
    let timeline = sorted_timeline(&competitor.performances)?;

    for pair in timeline.windows(2) {
      let (curr, next) = (&pair[0], &pair[1]);

      let (Some(from), Some(to)) = (
        curr.performance.competition.as_ref(),
        next.performance.competition.as_ref(),
      ) else {
        continue;
      };
      let eligible = cfg.disciplines.contains(&from.discipline)
        && cfg.disciplines.contains(&to.discipline)
        && from.discipline != to.discipline;
      if !eligible {
        continue;
      }

      let gap = minutes_between(curr.end, next.start);
      let Some(hit) = classify(gap, &cfg.thresholds, Mode::Reverse) else {
        continue;
      };

      violations.push(Violation {
        rule_name: "CostumeChangeTime".to_string(),
        severity: hit.severity,
        weight: score(&cfg.weights, hit.severity, hit.excess),
        description: format!(
          "Nedostatečný čas ({:.0} min) na převlečení kostýmu pro {}",
          gap, competitor.display_name
        ),
        entity_id: competitor.id.clone(),
        entity_name: competitor.display_name.clone(),
        details: ViolationDetails::CostumeChange {
          gap_minutes: gap,
          required_minutes: cfg.min_gap_minutes,
          shortage_minutes: hit.excess,
          from_discipline: from.discipline.clone(),
          to_discipline: to.discipline.clone(),
          from_time: curr.end,
          to_time: next.start,
        },
      });
    }
  }

  Ok(violations)
}

// ---------------------------------------------------------------------------
// Max gap rule
// ---------------------------------------------------------------------------

/// Flag oversized idle gaps between a competitor's consecutive performances.
/// Every consecutive pair is examined; there is no discipline filter.
fn check_max_gap(
  competitors: &[Competitor],
  cfg: &GapRuleConfig,
) -> Result<Vec<Violation>, EngineError> {
  let mut violations = Vec::new();

  for competitor in competitors {
    if competitor.performances.len() < 2 {
      continue;
    }
    let timeline = sorted_timeline(&competitor.performances)?;

    for pair in timeline.windows(2) {
      let (curr, next) = (&pair[0], &pair[1]);
      let gap = minutes_between(curr.end, next.start);
      let Some(hit) = classify(gap, &cfg.thresholds, Mode::Normal) else {
        continue;
      };

      violations.push(Violation {
        rule_name: "MaxGapBetweenPerformances".to_string(),
        severity: hit.severity,
        weight: score(&cfg.weights, hit.severity, hit.excess),
        description: format!(
          "Příliš velká přestávka ({:.0} min) mezi vystoupeními pro {}",
          gap, competitor.display_name
        ),
        entity_id: competitor.id.clone(),
        entity_name: competitor.display_name.clone(),
        details: ViolationDetails::PerformanceGap {
          gap_minutes: gap,
          threshold_minutes: hit.threshold,
          excess_minutes: hit.excess,
          first_performance_end: curr.end,
          second_performance_start: next.start,
        },
      });
    }
  }

  Ok(violations)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Thresholds, Weights};
  use crate::types::{Competition, Jury, Severity};

  fn performance(start: &str, end: &str, minutes: f64) -> Performance {
    Performance {
      start_time: start.to_string(),
      end_time: end.to_string(),
      duration_minutes: minutes,
      round_type: String::new(),
      competition: None,
    }
  }

  fn discipline_performance(start: &str, end: &str, minutes: f64, discipline: &str) -> Performance {
    Performance {
      competition: Some(Competition {
        name: format!("{} Open", discipline),
        discipline: discipline.to_string(),
      }),
      ..performance(start, end, minutes)
    }
  }

  fn competitor(performances: Vec<Performance>) -> Competitor {
    Competitor {
      id: "c1".to_string(),
      display_name: "Novák & Nováková".to_string(),
      performances,
    }
  }

  fn dancing_config() -> ContinuousRuleConfig {
    ContinuousRuleConfig {
      enabled: true,
      continuity_gap_minutes: 10.0,
      thresholds: Thresholds {
        critical: 90,
        medium: 60,
        low: 40,
      },
      weights: Weights {
        base_critical: 50.0,
        base_medium: 20.0,
        base_low: 5.0,
        coefficient_per_minute: 0.5,
      },
    }
  }

  fn costume_config() -> CostumeChangeConfig {
    CostumeChangeConfig {
      enabled: true,
      disciplines: vec!["Latin".to_string(), "Standard".to_string()],
      min_gap_minutes: 15,
      thresholds: Thresholds {
        critical: 5,
        medium: 10,
        low: 15,
      },
      weights: Weights {
        base_critical: 40.0,
        base_medium: 15.0,
        base_low: 5.0,
        coefficient_per_minute: 2.0,
      },
    }
  }

  fn gap_config() -> GapRuleConfig {
    GapRuleConfig {
      enabled: true,
      thresholds: Thresholds {
        critical: 240,
        medium: 180,
        low: 120,
      },
      weights: Weights {
        base_critical: 25.0,
        base_medium: 10.0,
        base_low: 2.0,
        coefficient_per_minute: 0.1,
      },
    }
  }

  fn graph_with(competitors: Vec<Competitor>) -> ScheduleGraph {
    ScheduleGraph {
      competitors,
      juries: Vec::new(),
    }
  }

  // --- continuous blocks ---------------------------------------------------

  #[test]
  fn close_performances_merge_into_one_block() {
    // 09:00-09:20 and 09:25-09:45 (gap 5 < 10) merge to a 40-minute block:
    // exactly the low threshold. 10:10-10:30 stands alone and is clean.
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:20", 20.0),
      performance("09:25", "09:45", 20.0),
      performance("10:10", "10:30", 20.0),
    ])]);
    let violations = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap();

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.severity, Severity::Low);
    assert_eq!(v.weight, 5.0);
    match &v.details {
      ViolationDetails::ContinuousBlock {
        duration_minutes,
        threshold_minutes,
        excess_minutes,
        start_time,
        end_time,
      } => {
        assert_eq!(*duration_minutes, 40);
        assert_eq!(*threshold_minutes, 40);
        assert_eq!(*excess_minutes, 0.0);
        assert_eq!(start_time.format("%H:%M").to_string(), "09:00");
        assert_eq!(end_time.format("%H:%M").to_string(), "09:45");
      }
      other => panic!("unexpected details: {:?}", other),
    }
  }

  #[test]
  fn gap_of_exactly_ten_minutes_closes_the_block() {
    // 20 + 20 would be a low violation if merged; the 10.0-minute gap is NOT
    // continuous (strict <), so neither half violates on its own.
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:20", 20.0),
      performance("09:30", "09:50", 20.0),
    ])]);
    let violations = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  #[test]
  fn one_violation_per_maximal_block() {
    // Three merged performances totalling 65 minutes: exactly one Medium
    // violation, not one per pair.
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:25", 25.0),
      performance("09:27", "09:47", 20.0),
      performance("09:50", "10:10", 20.0),
    ])]);
    let violations = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Medium);
    // excess 5 over the medium threshold at 0.5/min on base 20.
    assert_eq!(violations[0].weight, 22.5);
  }

  #[test]
  fn single_long_performance_in_a_block_can_violate() {
    // The 95-minute opening performance is its own block; the far-away
    // second performance only makes the entity eligible (>= 2 performances).
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "10:35", 95.0),
      performance("13:00", "13:20", 20.0),
    ])]);
    let violations = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Critical);
    assert!(violations[0].description.contains("95 minut"));
  }

  #[test]
  fn fewer_than_two_performances_never_violate() {
    let graph = graph_with(vec![competitor(vec![performance("09:00", "11:00", 120.0)])]);
    let violations = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  #[test]
  fn unsorted_input_is_sorted_before_block_detection() {
    // Same schedule as close_performances_merge_into_one_block, shuffled.
    let graph = graph_with(vec![competitor(vec![
      performance("10:10", "10:30", 20.0),
      performance("09:25", "09:45", 20.0),
      performance("09:00", "09:20", 20.0),
    ])]);
    let violations = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Low);
  }

  #[test]
  fn configured_continuity_gap_is_honored() {
    let cfg = ContinuousRuleConfig {
      continuity_gap_minutes: 20.0,
      ..dancing_config()
    };
    // The 15-minute gap is continuous under a 20-minute threshold.
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:20", 20.0),
      performance("09:35", "09:55", 20.0),
    ])]);
    let violations = Rule::ContinuousDancing(cfg).check(&graph).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].severity, Severity::Low);
  }

  #[test]
  fn judging_rule_walks_juries_not_competitors() {
    let jury = Jury {
      id: "j1".to_string(),
      display_name: "Dvořák".to_string(),
      performances: vec![
        performance("09:00", "10:00", 60.0),
        performance("10:05", "11:05", 60.0),
      ],
    };
    let graph = ScheduleGraph {
      competitors: vec![competitor(vec![
        performance("09:00", "10:00", 60.0),
        performance("10:05", "11:05", 60.0),
      ])],
      juries: vec![jury],
    };
    let cfg = ContinuousRuleConfig {
      thresholds: Thresholds {
        critical: 180,
        medium: 120,
        low: 90,
      },
      ..dancing_config()
    };
    let violations = Rule::ContinuousJudging(cfg).check(&graph).unwrap();

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_name, "MaxContinuousJudging");
    assert_eq!(violations[0].entity_id, "j1");
    assert!(violations[0].description.starts_with("Porotce Dvořák"));
  }

  #[test]
  fn disabled_rule_short_circuits() {
    let cfg = ContinuousRuleConfig {
      enabled: false,
      ..dancing_config()
    };
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "11:00", 120.0),
      performance("11:01", "12:00", 59.0),
    ])]);
    let violations = Rule::ContinuousDancing(cfg).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  #[test]
  fn malformed_timestamp_aborts_the_check() {
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:20", 20.0),
      performance("bad-time", "09:45", 20.0),
    ])]);
    let err = Rule::ContinuousDancing(dancing_config()).check(&graph).unwrap_err();
    assert!(err.to_string().contains("bad-time"));
  }

  // --- costume change ------------------------------------------------------

  #[test]
  fn tight_discipline_switch_is_critical() {
    // Latin -> Standard with a 4-minute buffer against reverse thresholds
    // {critical 5, medium 10, low 15}.
    let graph = graph_with(vec![competitor(vec![
      discipline_performance("09:00", "09:20", 20.0, "Latin"),
      discipline_performance("09:24", "09:44", 20.0, "Standard"),
    ])]);
    let violations = Rule::CostumeChange(costume_config()).check(&graph).unwrap();

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.severity, Severity::Critical);
    // shortage 1 minute at 2.0/min on base 40.
    assert_eq!(v.weight, 42.0);
    match &v.details {
      ViolationDetails::CostumeChange {
        gap_minutes,
        required_minutes,
        shortage_minutes,
        from_discipline,
        to_discipline,
        ..
      } => {
        assert_eq!(*gap_minutes, 4.0);
        assert_eq!(*required_minutes, 15);
        assert_eq!(*shortage_minutes, 1.0);
        assert_eq!(from_discipline, "Latin");
        assert_eq!(to_discipline, "Standard");
      }
      other => panic!("unexpected details: {:?}", other),
    }
  }

  #[test]
  fn same_discipline_pair_is_ineligible() {
    let graph = graph_with(vec![competitor(vec![
      discipline_performance("09:00", "09:20", 20.0, "Latin"),
      discipline_performance("09:21", "09:41", 20.0, "Latin"),
    ])]);
    let violations = Rule::CostumeChange(costume_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  #[test]
  fn discipline_outside_the_configured_set_is_ineligible() {
    let graph = graph_with(vec![competitor(vec![
      discipline_performance("09:00", "09:20", 20.0, "Latin"),
      discipline_performance("09:21", "09:41", 20.0, "Hip-Hop"),
    ])]);
    let violations = Rule::CostumeChange(costume_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  #[test]
  fn missing_competition_link_is_ineligible() {
    let graph = graph_with(vec![competitor(vec![
      discipline_performance("09:00", "09:20", 20.0, "Latin"),
      performance("09:21", "09:41", 20.0),
    ])]);
    let violations = Rule::CostumeChange(costume_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  #[test]
  fn comfortable_buffer_is_no_violation() {
    let graph = graph_with(vec![competitor(vec![
      discipline_performance("09:00", "09:20", 20.0, "Latin"),
      discipline_performance("09:40", "10:00", 20.0, "Standard"),
    ])]);
    let violations = Rule::CostumeChange(costume_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }

  // --- max gap -------------------------------------------------------------

  #[test]
  fn oversized_gap_is_flagged_with_boundary_times() {
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:20", 20.0),
      performance("12:30", "12:50", 20.0),
    ])]);
    let violations = Rule::MaxGap(gap_config()).check(&graph).unwrap();

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    // 190-minute gap: medium tier, excess 10 at 0.1/min on base 10.
    assert_eq!(v.severity, Severity::Medium);
    assert_eq!(v.weight, 11.0);
    match &v.details {
      ViolationDetails::PerformanceGap {
        gap_minutes,
        first_performance_end,
        second_performance_start,
        ..
      } => {
        assert_eq!(*gap_minutes, 190.0);
        assert_eq!(first_performance_end.format("%H:%M").to_string(), "09:20");
        assert_eq!(second_performance_start.format("%H:%M").to_string(), "12:30");
      }
      other => panic!("unexpected details: {:?}", other),
    }
  }

  #[test]
  fn every_consecutive_pair_is_examined() {
    // Two oversized gaps in one schedule give two violations.
    let graph = graph_with(vec![competitor(vec![
      performance("09:00", "09:20", 20.0),
      performance("11:30", "11:50", 20.0),
      performance("15:00", "15:20", 20.0),
    ])]);
    let violations = Rule::MaxGap(gap_config()).check(&graph).unwrap();
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].severity, Severity::Low);
    assert_eq!(violations[1].severity, Severity::Medium);
  }

  #[test]
  fn moderate_gap_checked_against_its_own_thresholds() {
    // The 25-minute gap from the block-rule scenario is far below the gap
    // rule's lowest tier.
    let graph = graph_with(vec![competitor(vec![
      performance("09:25", "09:45", 20.0),
      performance("10:10", "10:30", 20.0),
    ])]);
    let violations = Rule::MaxGap(gap_config()).check(&graph).unwrap();
    assert!(violations.is_empty());
  }
}
