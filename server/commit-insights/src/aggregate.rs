//! Roll-ups over commit collections: category/type counts and author/branch/repo tallies.
//!
//! Every accumulator here merges associatively, so a history can be folded in one pass,
//! in batches, or in parallel (see [`aggregate_authors_par`]) with identical results.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::analyze::{digest_with, Analysis, Analyzer};
use crate::types::*;

/// `round(count / total * 100)`; 0 for an empty total.
pub fn percentage(count: u64, total: u64) -> u8 {
  if total == 0 {
    return 0;
  }
  ((count as f64 / total as f64) * 100.0).round().min(100.0) as u8
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Partial sums for one slice of history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
  pub commits: u64,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
  pub files_changed: u64,
  pub good_quality: u64,
  pub low_risk: u64,
  pub simple: u64,
}

impl Tally {
  pub fn record(&mut self, commit: &Commit, scores: &ScoreSet) {
    self.commits += 1;
    self.additions = self.additions.saturating_add(commit.additions);
    self.deletions = self.deletions.saturating_add(commit.deletions);
    self.changes = self.changes.saturating_add(commit.changes);
    self.files_changed = self.files_changed.saturating_add(commit.files_changed() as u64);
    if scores.quality == Quality::Good {
      self.good_quality += 1;
    }
    if scores.risk.is_low() {
      self.low_risk += 1;
    }
    if scores.complexity == Complexity::Simple {
      self.simple += 1;
    }
  }

  pub fn merge(&mut self, other: &Tally) {
    self.commits += other.commits;
    self.additions = self.additions.saturating_add(other.additions);
    self.deletions = self.deletions.saturating_add(other.deletions);
    self.changes = self.changes.saturating_add(other.changes);
    self.files_changed = self.files_changed.saturating_add(other.files_changed);
    self.good_quality += other.good_quality;
    self.low_risk += other.low_risk;
    self.simple += other.simple;
  }

  pub fn quality_metrics(&self) -> QualityMetrics {
    QualityMetrics {
      quality_score: percentage(self.good_quality, self.commits),
      low_risk_score: percentage(self.low_risk, self.commits),
      simple_commits: percentage(self.simple, self.commits),
    }
  }

  pub fn branch_metrics(&self) -> BranchMetrics {
    BranchMetrics {
      commits: self.commits,
      additions: self.additions,
      deletions: self.deletions,
      files_changed: self.files_changed,
      quality: self.quality_metrics(),
    }
  }
}

// ---------------------------------------------------------------------------
// Category / type counting
// ---------------------------------------------------------------------------

/// Group counts in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCounter {
  groups: Vec<(SsmCategory, u64, Vec<CommitType>)>,
  types: Vec<(CommitType, u64)>,
}

impl CategoryCounter {
  pub fn record(&mut self, category: SsmCategory, commit_type: CommitType) {
    match self.groups.iter_mut().find(|(c, _, _)| *c == category) {
      Some((_, count, types)) => {
        *count += 1;
        if !types.contains(&commit_type) {
          types.push(commit_type);
        }
      }
      None => self.groups.push((category, 1, vec![commit_type])),
    }
    match self.types.iter_mut().find(|(t, _)| *t == commit_type) {
      Some((_, count)) => *count += 1,
      None => self.types.push((commit_type, 1)),
    }
  }

  /// Appends `other`; groups already present keep their position.
  pub fn merge(&mut self, other: &CategoryCounter) {
    for (category, count, types) in &other.groups {
      match self.groups.iter_mut().find(|(c, _, _)| c == category) {
        Some((_, mine, my_types)) => {
          *mine += count;
          for t in types {
            if !my_types.contains(t) {
              my_types.push(*t);
            }
          }
        }
        None => self.groups.push((*category, *count, types.clone())),
      }
    }
    for (commit_type, count) in &other.types {
      match self.types.iter_mut().find(|(t, _)| t == commit_type) {
        Some((_, mine)) => *mine += count,
        None => self.types.push((*commit_type, *count)),
      }
    }
  }

  pub fn total(&self) -> u64 {
    self.groups.iter().map(|(_, n, _)| n).sum()
  }

  /// Sorted by count descending; the stable sort keeps first-seen order on ties.
  pub fn categories(&self) -> Vec<CategoryGroup> {
    let total = self.total();
    let mut out: Vec<CategoryGroup> = self
      .groups
      .iter()
      .map(|(category, count, types)| CategoryGroup {
        category: *category,
        count: *count,
        percentage: percentage(*count, total),
        commit_types: types.clone(),
      })
      .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
  }

  pub fn commit_types(&self) -> Vec<TypeCount> {
    let total = self.total();
    let mut out: Vec<TypeCount> = self
      .types
      .iter()
      .map(|(t, count)| TypeCount {
        commit_type: *t,
        count: *count,
        percentage: percentage(*count, total),
      })
      .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
  }
}

pub fn categorize(analyzer: &Analyzer, commits: &[Commit]) -> Vec<CategoryGroup> {
  count_categories(analyzer, commits).categories()
}

pub fn type_breakdown(analyzer: &Analyzer, commits: &[Commit]) -> Vec<TypeCount> {
  count_categories(analyzer, commits).commit_types()
}

fn count_categories(analyzer: &Analyzer, commits: &[Commit]) -> CategoryCounter {
  let mut counter = CategoryCounter::default();
  for commit in commits {
    let a = analyzer.analyze(commit);
    counter.record(a.ssm_category, a.commit_type);
  }
  counter
}

// ---------------------------------------------------------------------------
// Author / branch / repo
// ---------------------------------------------------------------------------

/// Running state for one author.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorAccumulator {
  pub name: String,
  pub email: String,
  pub username: String,
  pub tally: Tally,
  pub commits: Vec<CommitDigest>,
}

impl AuthorAccumulator {
  pub fn for_commit(commit: &Commit) -> Self {
    Self {
      name: commit.author_name().to_string(),
      email: commit.author_email().to_string(),
      username: commit.display_name().to_string(),
      ..Self::default()
    }
  }

  pub fn record(&mut self, commit: &Commit, analysis: Analysis) {
    self.tally.record(commit, &analysis.scores);
    self.commits.push(digest_with(commit, analysis));
  }

  pub fn merge(&mut self, other: AuthorAccumulator) {
    if self.tally.commits == 0 && self.name.is_empty() {
      self.name = other.name;
      self.email = other.email;
      self.username = other.username;
    }
    self.tally.merge(&other.tally);
    self.commits.extend(other.commits);
  }

  pub fn finish(self) -> AuthorMetrics {
    AuthorMetrics {
      name: self.name,
      email: self.email,
      username: self.username,
      commits: self.tally.commits,
      additions: self.tally.additions,
      deletions: self.tally.deletions,
      files_changed: self.tally.files_changed,
      quality: self.tally.quality_metrics(),
      commit_list: self.commits,
    }
  }
}

pub type AuthorTable = BTreeMap<String, AuthorAccumulator>;

pub fn record_author(table: &mut AuthorTable, commit: &Commit, analysis: Analysis) {
  table
    .entry(commit.author_identity())
    .or_insert_with(|| AuthorAccumulator::for_commit(commit))
    .record(commit, analysis);
}

pub fn merge_author_tables(mut left: AuthorTable, right: AuthorTable) -> AuthorTable {
  for (key, acc) in right {
    match left.get_mut(&key) {
      Some(mine) => mine.merge(acc),
      None => {
        left.insert(key, acc);
      }
    }
  }
  left
}

pub fn finish_authors(table: AuthorTable) -> BTreeMap<String, AuthorMetrics> {
  table.into_iter().map(|(k, acc)| (k, acc.finish())).collect()
}

/// Metrics for one author's commits. Identity comes from the first commit.
pub fn aggregate_author(analyzer: &Analyzer, commits: &[Commit]) -> AuthorMetrics {
  let mut acc = match commits.first() {
    Some(first) => AuthorAccumulator::for_commit(first),
    None => AuthorAccumulator {
      name: "Unknown".into(),
      username: "Unknown".into(),
      ..AuthorAccumulator::default()
    },
  };
  for commit in commits {
    acc.record(commit, analyzer.analyze(commit));
  }
  acc.finish()
}

/// Metrics keyed by author identity, single pass.
pub fn aggregate_authors(analyzer: &Analyzer, commits: &[Commit]) -> BTreeMap<String, AuthorMetrics> {
  let mut table = AuthorTable::new();
  for commit in commits {
    record_author(&mut table, commit, analyzer.analyze(commit));
  }
  finish_authors(table)
}

/// Same result as [`aggregate_authors`], folded in parallel chunks and merged in order.
pub fn aggregate_authors_par(
  analyzer: &Analyzer,
  commits: &[Commit],
) -> BTreeMap<String, AuthorMetrics> {
  let table = commits
    .par_iter()
    .fold(AuthorTable::new, |mut table, commit| {
      record_author(&mut table, commit, analyzer.analyze(commit));
      table
    })
    .reduce(AuthorTable::new, merge_author_tables);
  finish_authors(table)
}

/// Metrics for commits reachable from `branch`.
pub fn aggregate_branch(analyzer: &Analyzer, commits: &[Commit], branch: &str) -> BranchMetrics {
  let mut tally = Tally::default();
  for commit in commits.iter().filter(|c| c.branches.contains(branch)) {
    tally.record(commit, &analyzer.analyze(commit).scores);
  }
  tally.branch_metrics()
}

pub fn aggregate_repo(analyzer: &Analyzer, commits: &[Commit]) -> BranchMetrics {
  commits
    .par_iter()
    .fold(Tally::default, |mut tally, commit| {
      tally.record(commit, &analyzer.analyze(commit).scores);
      tally
    })
    .reduce(Tally::default, |mut a, b| {
      a.merge(&b);
      a
    })
    .branch_metrics()
}
