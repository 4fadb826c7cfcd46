//! Binary entrypoint: read one JSON request from stdin, write one JSON object to stdout.
//!
//! Output is either a Response (RepoInsights or CategorizationReport) or an
//! ErrorOutput, in which case the process exits with status 1. Logs go to stderr.

use commit_insights::types::ErrorOutput;
use commit_insights::{run, InsightsError, Request};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

fn main() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .init();

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  let code = match run_binary() {
    Ok(response) => {
      let _ = serde_json::to_writer(&mut out, &response);
      0
    }
    Err(e) => {
      tracing::error!(error = %e, "request failed");
      let err = match &e {
        InsightsError::Validation { field, reason } => {
          ErrorOutput::new(reason.clone()).with_field(field.clone())
        }
        _ => ErrorOutput::new(e.to_string()),
      };
      let _ = serde_json::to_writer(&mut out, &err);
      1
    }
  };
  let _ = writeln!(out);
  let _ = out.flush();
  drop(out);
  std::process::exit(code);
}

fn run_binary() -> Result<commit_insights::Response, InsightsError> {
  let mut raw = String::new();
  io::stdin().lock().read_to_string(&mut raw)?;
  let request: Request = serde_json::from_str(&raw)?;
  run(&request)
}
