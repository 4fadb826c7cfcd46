//! Complexity, risk and quality buckets from line and file counts.
//!
//! All three are total: zero or oversized inputs land in a defined bucket.

use crate::config::ScoringConfig;
use crate::types::{Commit, Complexity, Quality, Risk, ScoreSet};

/// Strict less-than boundaries: exactly `simple_below` lines is already Moderate.
pub fn complexity(total_changed_lines: u64, config: &ScoringConfig) -> Complexity {
  if total_changed_lines < config.simple_below {
    Complexity::Simple
  } else if total_changed_lines < config.moderate_below {
    Complexity::Moderate
  } else if total_changed_lines < config.complex_below {
    Complexity::Complex
  } else {
    Complexity::VeryComplex
  }
}

pub fn risk(total_changed_lines: u64, files_changed: usize, config: &ScoringConfig) -> Risk {
  if files_changed == 0 {
    Risk::None
  } else if total_changed_lines > config.high_risk_churn || files_changed > config.high_risk_files {
    Risk::High
  } else if total_changed_lines > config.medium_risk_churn
    || files_changed > config.medium_risk_files
  {
    Risk::Medium
  } else {
    Risk::Low
  }
}

/// removed/added with added == 0 treated as ratio 0.
pub fn quality(added: u64, removed: u64, files_changed: usize, config: &ScoringConfig) -> Quality {
  if files_changed == 0 {
    return Quality::NotApplicable;
  }
  if files_changed > config.review_files {
    return Quality::NeedsReview;
  }
  let ratio = if added == 0 {
    0.0
  } else {
    removed as f64 / added as f64
  };
  if ratio > config.questionable_ratio {
    Quality::Questionable
  } else {
    Quality::Good
  }
}

/// Complexity and risk are both measured on total churn.
pub fn score_commit(commit: &Commit, config: &ScoringConfig) -> ScoreSet {
  let files = commit.files_changed();
  ScoreSet {
    complexity: complexity(commit.churn(), config),
    risk: risk(commit.churn(), files, config),
    quality: quality(commit.additions, commit.deletions, files, config),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg() -> ScoringConfig {
    ScoringConfig::default()
  }

  #[test]
  fn complexity_boundaries_go_up() {
    assert_eq!(complexity(0, &cfg()), Complexity::Simple);
    assert_eq!(complexity(9, &cfg()), Complexity::Simple);
    assert_eq!(complexity(10, &cfg()), Complexity::Moderate);
    assert_eq!(complexity(49, &cfg()), Complexity::Moderate);
    assert_eq!(complexity(50, &cfg()), Complexity::Complex);
    assert_eq!(complexity(199, &cfg()), Complexity::Complex);
    assert_eq!(complexity(200, &cfg()), Complexity::VeryComplex);
    assert_eq!(complexity(u64::MAX, &cfg()), Complexity::VeryComplex);
  }

  #[test]
  fn risk_uses_strict_greater_than() {
    assert_eq!(risk(500, 0, &cfg()), Risk::None);
    assert_eq!(risk(100, 5, &cfg()), Risk::Medium);
    assert_eq!(risk(101, 1, &cfg()), Risk::High);
    assert_eq!(risk(1, 6, &cfg()), Risk::High);
    assert_eq!(risk(50, 2, &cfg()), Risk::Low);
    assert_eq!(risk(51, 1, &cfg()), Risk::Medium);
    assert_eq!(risk(1, 3, &cfg()), Risk::Medium);
  }

  #[test]
  fn quality_buckets() {
    assert_eq!(quality(0, 0, 0, &cfg()), Quality::NotApplicable);
    assert_eq!(quality(10, 0, 11, &cfg()), Quality::NeedsReview);
    assert_eq!(quality(10, 0, 10, &cfg()), Quality::Good);
    assert_eq!(quality(10, 31, 1, &cfg()), Quality::Questionable);
    assert_eq!(quality(10, 30, 1, &cfg()), Quality::Good);
    // Pure deletion: added == 0 counts as ratio 0.
    assert_eq!(quality(0, 500, 1, &cfg()), Quality::Good);
  }

  fn commit(additions: u64, deletions: u64, files: usize) -> Commit {
    Commit {
      sha: "abc".into(),
      message: String::new(),
      author: Default::default(),
      committer: Default::default(),
      date: None,
      raw_date: None,
      additions,
      deletions,
      changes: additions + deletions,
      files: (0..files)
        .map(|i| crate::types::CommitFile {
          filename: format!("src/f{}.rs", i),
          status: crate::types::FileStatus::Modified,
          additions: 0,
          deletions: 0,
          changes: 0,
          patch: None,
        })
        .collect(),
      branches: Default::default(),
      parents: Vec::new(),
    }
  }

  #[test]
  fn small_fix_scores_moderate_low_good() {
    // 15 changed lines is past the Simple cut.
    let set = score_commit(&commit(12, 3, 2), &cfg());
    assert_eq!(
      set,
      ScoreSet {
        complexity: Complexity::Moderate,
        risk: Risk::Low,
        quality: Quality::Good,
      }
    );
  }

  #[test]
  fn empty_merge_scores_none_and_na() {
    let set = score_commit(&commit(0, 0, 0), &cfg());
    assert_eq!(set.risk, Risk::None);
    assert_eq!(set.quality, Quality::NotApplicable);
    assert_eq!(set.complexity, Complexity::Simple);
  }

  #[test]
  fn balanced_rewrite_counts_every_changed_line() {
    assert_eq!(score_commit(&commit(5, 5, 1), &cfg()).complexity, Complexity::Moderate);
    assert_eq!(score_commit(&commit(150, 150, 1), &cfg()).complexity, Complexity::VeryComplex);
    assert_eq!(score_commit(&commit(4, 5, 1), &cfg()).complexity, Complexity::Simple);
  }

  #[test]
  fn large_commit_scores_high() {
    let set = score_commit(&commit(400, 20, 12), &cfg());
    assert_eq!(set.complexity, Complexity::VeryComplex);
    assert_eq!(set.risk, Risk::High);
    assert_eq!(set.quality, Quality::NeedsReview);
  }
}
