//! Per-commit analysis: classifiers and scorers bundled with their configuration.

use std::collections::HashMap;

use crate::change_class::classify_change;
use crate::commit_type::commit_type;
use crate::config::Config;
use crate::normalize::format_timestamp;
use crate::score::score_commit;
use crate::ssm::SsmClassifier;
use crate::types::{ChangeClass, Commit, CommitDigest, CommitType, ScoreSet, SsmCategory};

/// Shown in place of a missing or unparseable commit date.
pub const INVALID_DATE: &str = "Invalid Date";

/// Everything derived from a single commit. Recomputed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
  pub commit_type: CommitType,
  pub ssm_category: SsmCategory,
  pub scores: ScoreSet,
  pub change_class: ChangeClass,
}

/// Stateless per-commit analyzer; `Sync`, so it can be shared across rayon workers.
#[derive(Debug, Clone)]
pub struct Analyzer {
  config: Config,
  ssm: SsmClassifier,
  branch_file_counts: HashMap<String, u64>,
}

impl Analyzer {
  pub fn new(config: Config) -> Self {
    let ssm = SsmClassifier::new(&config.ssm);
    Self {
      config,
      ssm,
      branch_file_counts: HashMap::new(),
    }
  }

  pub fn with_branch_file_counts(mut self, counts: HashMap<String, u64>) -> Self {
    self.branch_file_counts = counts;
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn ssm(&self) -> &SsmClassifier {
    &self.ssm
  }

  pub fn analyze(&self, commit: &Commit) -> Analysis {
    Analysis {
      commit_type: commit_type(&commit.message),
      ssm_category: self.ssm.classify_commit(commit),
      scores: score_commit(commit, &self.config.scoring),
      change_class: classify_change(
        &commit.message,
        commit.files_changed(),
        self.branch_total_files(commit),
        &self.config.change_class,
      ),
    }
  }

  /// Change class sized against one branch's file count instead of the first known one.
  pub fn change_class_on(&self, commit: &Commit, branch: &str) -> ChangeClass {
    classify_change(
      &commit.message,
      commit.files_changed(),
      self.branch_file_counts.get(branch).copied(),
      &self.config.change_class,
    )
  }

  pub fn digest(&self, commit: &Commit) -> CommitDigest {
    digest_with(commit, self.analyze(commit))
  }

  /// File count of the first (sorted) branch with a known size.
  fn branch_total_files(&self, commit: &Commit) -> Option<u64> {
    commit
      .branches
      .iter()
      .find_map(|b| self.branch_file_counts.get(b).copied())
  }
}

impl Default for Analyzer {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

pub fn digest_with(commit: &Commit, analysis: Analysis) -> CommitDigest {
  CommitDigest {
    sha: commit.sha.clone(),
    summary: commit.summary().to_string(),
    author: commit.display_name().to_string(),
    date: commit
      .date
      .map(format_timestamp)
      .unwrap_or_else(|| INVALID_DATE.to_string()),
    additions: commit.additions,
    deletions: commit.deletions,
    changes: commit.changes,
    files_changed: commit.files_changed(),
    commit_type: analysis.commit_type,
    ssm_category: analysis.ssm_category,
    change_class: analysis.change_class,
    scores: analysis.scores,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::CommitBuilder;
  use crate::types::{ChangeLabel, Complexity, Quality, Risk};

  #[test]
  fn null_token_fix_scenario() {
    let commit = CommitBuilder::new("a1")
      .message("fix(api): handle null token")
      .lines(12, 3)
      .files(2)
      .build();
    let a = Analyzer::default().analyze(&commit);
    assert_eq!(a.commit_type, CommitType::BugFix);
    assert_eq!(a.ssm_category, SsmCategory::BugFix);
    assert_eq!(a.scores.complexity, Complexity::Moderate);
    assert_eq!(a.scores.risk, Risk::Low);
    assert_eq!(a.scores.quality, Quality::Good);
    assert_eq!(a.change_class.label, ChangeLabel::BugFix);
  }

  #[test]
  fn merge_pull_request_scenario() {
    let commit = CommitBuilder::new("a2").message("Merge pull request #42").build();
    let a = Analyzer::default().analyze(&commit);
    assert_eq!(a.ssm_category, SsmCategory::Integration);
    assert_eq!(a.scores.risk, Risk::None);
    assert_eq!(a.scores.quality, Quality::NotApplicable);
  }

  #[test]
  fn branch_file_counts_feed_change_class() {
    let commit = CommitBuilder::new("a3")
      .message("add search page")
      .files(5)
      .branches(&["feature/search", "main"])
      .build();
    let analyzer = Analyzer::default()
      .with_branch_file_counts(HashMap::from([("main".to_string(), 20)]));
    let a = analyzer.analyze(&commit);
    assert_eq!(a.change_class.label, ChangeLabel::HighFeature);
    assert_eq!(a.change_class.total_files, Some(20));
  }

  #[test]
  fn digest_marks_missing_dates() {
    let commit = CommitBuilder::new("a4").message("wip\n\nbody").build();
    let d = Analyzer::default().digest(&commit);
    assert_eq!(d.date, INVALID_DATE);
    assert_eq!(d.summary, "wip");

    let dated = CommitBuilder::new("a5").date("2025-03-01T08:00:00Z").build();
    assert_eq!(Analyzer::default().digest(&dated).date, "2025-03-01T08:00:00Z");
    let offset = CommitBuilder::new("a6").date("2025-03-01T10:00:00.250+02:00").build();
    assert_eq!(Analyzer::default().digest(&offset).date, "2025-03-01T08:00:00Z");
  }

  #[test]
  fn change_class_on_uses_that_branch_size() {
    let commit = CommitBuilder::new("a7")
      .message("add search page")
      .files(5)
      .branches(&["dev", "main"])
      .build();
    let analyzer = Analyzer::default().with_branch_file_counts(HashMap::from([
      ("main".to_string(), 20),
      ("dev".to_string(), 500),
    ]));
    assert_eq!(analyzer.change_class_on(&commit, "main").label, ChangeLabel::HighFeature);
    assert_eq!(analyzer.change_class_on(&commit, "dev").label, ChangeLabel::LowFeature);
    assert_eq!(analyzer.change_class_on(&commit, "dev").total_files, Some(500));
  }

  #[test]
  fn analysis_is_idempotent() {
    let commit = CommitBuilder::new("a6").message("Refactor cache").lines(40, 38).files(3).build();
    let analyzer = Analyzer::default();
    assert_eq!(analyzer.analyze(&commit), analyzer.analyze(&commit));
  }
}
