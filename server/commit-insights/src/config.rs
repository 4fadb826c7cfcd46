//! Engine configuration with sane defaults.
//!
//! Every threshold is empirically chosen; requests may override any subset
//! (missing keys fall back to the defaults below).

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub ssm: SsmConfig,
  pub scoring: ScoringConfig,
  pub change_class: ChangeClassConfig,
  /// Max commits kept in `recent_commits` (newest first).
  pub recent_commits_limit: usize,
  /// Window for the code churn rate metric.
  pub churn_window_days: i64,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      ssm: SsmConfig::default(),
      scoring: ScoringConfig::default(),
      change_class: ChangeClassConfig::default(),
      recent_commits_limit: 10,
      churn_window_days: 30,
    }
  }
}

/// Numeric fallbacks of the SSM cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsmConfig {
  /// Lower bound (exclusive) of deletions/additions for the balanced-churn refactor rule.
  pub refactor_ratio_min: f64,
  /// Upper bound (exclusive) of deletions/additions for the balanced-churn refactor rule.
  pub refactor_ratio_max: f64,
  /// Churn strictly above this falls back to Architectural.
  pub architectural_min_churn: u64,
  /// Churn strictly above this falls back to Trivial (and so does everything below).
  pub trivial_min_churn: u64,
}

impl Default for SsmConfig {
  fn default() -> Self {
    Self {
      refactor_ratio_min: 0.7,
      refactor_ratio_max: 1.3,
      architectural_min_churn: 100,
      trivial_min_churn: 20,
    }
  }
}

/// Bucket boundaries for the complexity / risk / quality scorers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
  /// Changed lines (additions + deletions) below this is Simple.
  pub simple_below: u64,
  /// Changed lines (additions + deletions) below this is Moderate.
  pub moderate_below: u64,
  /// Changed lines (additions + deletions) below this is Complex; anything else is Very Complex.
  pub complex_below: u64,
  pub high_risk_churn: u64,
  pub high_risk_files: usize,
  pub medium_risk_churn: u64,
  pub medium_risk_files: usize,
  /// More files than this needs review.
  pub review_files: usize,
  /// removed/added above this is questionable.
  pub questionable_ratio: f64,
}

impl Default for ScoringConfig {
  fn default() -> Self {
    Self {
      simple_below: 10,
      moderate_below: 50,
      complex_below: 200,
      high_risk_churn: 100,
      high_risk_files: 5,
      medium_risk_churn: 50,
      medium_risk_files: 2,
      review_files: 10,
      questionable_ratio: 3.0,
    }
  }
}

/// Thresholds for the bug_fix / low_feature / high_feature split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeClassConfig {
  /// Share of the branch's files (percent) at or above which a change is high_feature.
  pub high_feature_percent: f64,
  /// Used when the branch file count is unknown.
  pub high_feature_fallback_files: usize,
}

impl Default for ChangeClassConfig {
  fn default() -> Self {
    Self {
      high_feature_percent: 15.0,
      high_feature_fallback_files: 100,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_override_keeps_other_defaults() {
    let config: Config =
      serde_json::from_str(r#"{"ssm": {"refactor_ratio_max": 1.5}, "recent_commits_limit": 3}"#)
        .unwrap();
    assert_eq!(config.ssm.refactor_ratio_max, 1.5);
    assert_eq!(config.ssm.refactor_ratio_min, 0.7);
    assert_eq!(config.ssm.architectural_min_churn, 100);
    assert_eq!(config.recent_commits_limit, 3);
    assert_eq!(config.scoring, ScoringConfig::default());
  }

  #[test]
  fn empty_object_is_default() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
  }
}
