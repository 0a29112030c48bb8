//! Schedule inference engine for dance competitions — deterministic,
//! rule-based.
//!
//! Validates an in-memory schedule graph (competitors and juries with their
//! performances) against four temporal fairness rules: continuous dancing,
//! costume-change buffers, continuous judging, and gaps between
//! performances. Produces a weighted violation report with an overall
//! rating.
//!
//! No AI, no DB, no network; pure computation over an immutable graph.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod timeparse;
pub mod types;

pub use config::RulesConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use types::{AnalysisResult, Rating, ScheduleGraph, Severity, Violation};
