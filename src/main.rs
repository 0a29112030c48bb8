//! Binary entrypoint: validate a schedule graph against a rules config.
//!
//! Usage: schedule-engine <rules-config.yaml>
//!
//! The schedule graph is read as one JSON document from stdin; the analysis
//! result is written as JSON to stdout. Configuration and analysis failures
//! are emitted as a structured JSON error object on stdout with exit code 1.

use schedule_engine::types::ErrorOutput;
use schedule_engine::{Engine, EngineError, ScheduleGraph};
use std::io::{self, Read, Write};

fn main() {
  let config_path = match std::env::args().nth(1) {
    Some(p) => p,
    None => {
      let _ = writeln!(io::stderr(), "usage: schedule-engine <rules-config.yaml>");
      std::process::exit(2);
    }
  };

  let engine = match Engine::from_path(&config_path) {
    Ok(engine) => engine,
    Err(e) => emit_error_and_exit(&e),
  };

  let mut raw = String::new();
  if let Err(e) = io::stdin().read_to_string(&mut raw) {
    let _ = writeln!(io::stderr(), "schedule-engine: read error: {}", e);
    std::process::exit(1);
  }

  let graph: ScheduleGraph = match serde_json::from_str(&raw) {
    Ok(graph) => graph,
    Err(e) => emit_error_and_exit(&EngineError::Json(e)),
  };

  match engine.analyze(&graph) {
    Ok(result) => {
      let stdout = io::stdout();
      let mut out = io::BufWriter::new(stdout.lock());
      let _ = serde_json::to_writer(&mut out, &result);
      let _ = writeln!(out);
      let _ = out.flush();
    }
    Err(e) => emit_error_and_exit(&e),
  }
}

fn emit_error_and_exit(e: &EngineError) -> ! {
  let err = match e {
    EngineError::Config { section, reason } => {
      ErrorOutput::new(reason.clone()).with_section(section.clone())
    }
    _ => ErrorOutput::new(e.to_string()),
  };
  let stdout = io::stdout();
  let mut out = stdout.lock();
  let _ = serde_json::to_writer(&mut out, &err);
  let _ = writeln!(out);
  std::process::exit(1);
}
