//! Commit Insights Engine: deterministic, rule-based commit analytics.
//!
//! Ingests already-fetched commit records, classifies each one (commit type, SSM
//! category, change class), scores it (complexity, risk, quality), and rolls the
//! results up per author, per branch and per repository into a `RepoInsights` report.
//!
//! No AI, no DB, no network; pure computation. Used by the binary for stdin/stdout;
//! can also be called as a library.

pub mod aggregate;
pub mod analyze;
pub mod change_class;
pub mod commit_type;
pub mod config;
pub mod error;
pub mod filter;
pub mod insights;
pub mod matcher;
pub mod normalize;
pub mod quality;
pub mod score;
pub mod ssm;
pub mod timeframe;
pub mod types;

#[cfg(test)]
mod testutil;

pub use analyze::{Analysis, Analyzer};
pub use config::Config;
pub use error::InsightsError;
pub use insights::{build_insights, categorize_scope, InsightsBuilder, Scope};
pub use types::{CategorizationReport, Commit, InboundCommit, RepoInsights, Request, Response};

/// Run one request and return the response (no I/O).
pub fn run(request: &Request) -> Result<Response, InsightsError> {
  match request {
    Request::Insights(req) => build_insights(req).map(|r| Response::Insights(Box::new(r))),
    Request::CategorizeAuthor {
      author,
      commits,
      config,
    } => categorize(config, Scope::Author(author.clone()), commits),
    Request::CategorizeCommit {
      sha,
      commits,
      config,
    } => categorize(config, Scope::Commit(sha.clone()), commits),
  }
}

fn categorize(
  config: &Config,
  scope: Scope,
  raw: &[serde_json::Value],
) -> Result<Response, InsightsError> {
  let (commits, _skipped) = normalize::decode_all(raw.to_vec());
  let analyzer = Analyzer::new(config.clone());
  categorize_scope(&analyzer, &scope, &commits).map(Response::Categorization)
}
