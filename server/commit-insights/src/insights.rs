//! Insights assembly: streams commits into every accumulator and emits one report.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::aggregate::{finish_authors, record_author, AuthorTable, CategoryCounter, Tally};
use crate::analyze::{digest_with, Analyzer};
use crate::error::InsightsError;
use crate::filter::Selection;
use crate::normalize::{decode_all, format_timestamp, parse_timestamp};
use crate::quality::{assemble, static_metrics, HistorySummary, MetricProvider};
use crate::timeframe::TimeframeAccumulator;
use crate::types::*;

/// What a sha contributed the first time it arrived, plus every branch counted since.
struct Seen {
  date: Option<DateTime<Utc>>,
  branches: BTreeSet<String>,
}

/// Streaming report builder. Feed commits with [`push`](Self::push) in any order,
/// then call [`finish`](Self::finish).
pub struct InsightsBuilder {
  analyzer: Analyzer,
  seen: BTreeMap<String, Seen>,
  repo: Tally,
  authors: AuthorTable,
  branches: BTreeMap<String, Tally>,
  categories: CategoryCounter,
  timeframes: TimeframeAccumulator,
  branch_timeframes: BTreeMap<String, TimeframeAccumulator>,
  now: DateTime<Utc>,
  history: HistorySummary,
  latest: Option<(DateTime<Utc>, CommitDigest)>,
  recent: Vec<(Option<DateTime<Utc>>, CommitDigest)>,
  providers: Vec<Box<dyn MetricProvider>>,
  skipped: u64,
}

impl InsightsBuilder {
  /// `declared_branches` appear in the report even when no commit reaches them.
  pub fn new(analyzer: Analyzer, now: DateTime<Utc>, declared_branches: &[String]) -> Self {
    let churn_window_days = analyzer.config().churn_window_days;
    let declared: Vec<&str> = declared_branches
      .iter()
      .map(|b| b.trim())
      .filter(|b| !b.is_empty())
      .collect();
    let branches = declared.iter().map(|b| (b.to_string(), Tally::default())).collect();
    let branch_timeframes = declared
      .iter()
      .map(|b| (b.to_string(), TimeframeAccumulator::new(now)))
      .collect();
    Self {
      analyzer,
      seen: BTreeMap::new(),
      repo: Tally::default(),
      authors: AuthorTable::new(),
      branches,
      categories: CategoryCounter::default(),
      timeframes: TimeframeAccumulator::new(now),
      branch_timeframes,
      now,
      history: HistorySummary::new(now, churn_window_days),
      latest: None,
      recent: Vec::new(),
      providers: Vec::new(),
      skipped: 0,
    }
  }

  pub fn with_provider(mut self, provider: Box<dyn MetricProvider>) -> Self {
    self.providers.push(provider);
    self
  }

  /// Counts records dropped before they reached the builder.
  pub fn note_skipped(&mut self, n: u64) {
    self.skipped += n;
  }

  pub fn push(&mut self, mut commit: Commit) {
    if commit.sha.is_empty() {
      warn!(message = %commit.summary(), "skipping commit without sha");
      self.skipped += 1;
      return;
    }

    if let Some(known) = self.seen.get_mut(&commit.sha) {
      let fresh: Vec<String> = commit
        .branches
        .iter()
        .filter(|b| !known.branches.contains(*b))
        .cloned()
        .collect();
      known.branches.extend(fresh.iter().cloned());
      if commit.date.is_none() {
        commit.date = known.date;
      }
      if fresh.is_empty() {
        return;
      }
      let scores = self.analyzer.analyze(&commit).scores;
      for branch in fresh {
        self.branches.entry(branch.clone()).or_default().record(&commit, &scores);
        self.record_branch_timeframes(&branch, &commit);
      }
      return;
    }

    let analysis = self.analyzer.analyze(&commit);
    let scores = analysis.scores;
    self.repo.record(&commit, &scores);
    for branch in &commit.branches {
      self
        .branches
        .entry(branch.clone())
        .or_default()
        .record(&commit, &scores);
      self.record_branch_timeframes(branch, &commit);
    }
    self.categories.record(analysis.ssm_category, analysis.commit_type);
    self.timeframes.record(&commit, &analysis.change_class);
    self.history.record(&commit, &scores);
    record_author(&mut self.authors, &commit, analysis.clone());

    let digest = digest_with(&commit, analysis);
    if let Some(at) = commit.date {
      if self.latest.as_ref().map_or(true, |(t, _)| at > *t) {
        self.latest = Some((at, digest.clone()));
      }
    }
    self.push_recent(commit.date, digest);
    self.seen.insert(
      commit.sha,
      Seen {
        date: commit.date,
        branches: commit.branches,
      },
    );
  }

  /// Change class here is sized against `branch` alone.
  fn record_branch_timeframes(&mut self, branch: &str, commit: &Commit) {
    let now = self.now;
    let windows = self
      .branch_timeframes
      .entry(branch.to_string())
      .or_insert_with(|| TimeframeAccumulator::new(now));
    if commit.date.is_some() {
      windows.record(commit, &self.analyzer.change_class_on(commit, branch));
    }
  }

  /// Newest first; undated commits sort last; ties keep arrival order.
  fn push_recent(&mut self, date: Option<DateTime<Utc>>, digest: CommitDigest) {
    let limit = self.analyzer.config().recent_commits_limit;
    if limit == 0 {
      return;
    }
    self.recent.push((date, digest));
    self.recent.sort_by(|a, b| b.0.cmp(&a.0));
    self.recent.truncate(limit);
  }

  pub fn finish(self) -> RepoInsights {
    let providers: Vec<&dyn MetricProvider> = self.providers.iter().map(|p| p.as_ref()).collect();
    let code_quality_metrics = assemble(&self.history, &providers);

    let report_id = report_id(self.seen.keys());
    let author_metrics = finish_authors(self.authors);
    let by_developer = by_developer(&author_metrics);
    let per_branch = self
      .branches
      .iter()
      .map(|(b, t)| (b.clone(), t.commits))
      .collect();
    let branch_metrics: BTreeMap<String, BranchMetrics> = self
      .branches
      .iter()
      .map(|(b, t)| (b.clone(), t.branch_metrics()))
      .collect();

    debug!(
      report_id = %report_id,
      commits = self.repo.commits,
      branches = branch_metrics.len(),
      developers = author_metrics.len(),
      skipped = self.skipped,
      "insights assembled"
    );

    RepoInsights {
      report_id,
      total_commits: self.repo.commits,
      total_branches: branch_metrics.len() as u64,
      total_developers: author_metrics.len() as u64,
      latest_activity: self
        .latest
        .as_ref()
        .map(|(at, _)| format_timestamp(*at)),
      per_branch,
      branch_metrics,
      by_developer,
      author_metrics,
      repo_metrics: self.repo.branch_metrics(),
      categories: self.categories.categories(),
      commit_types: self.categories.commit_types(),
      code_quality_metrics,
      timeframes: self.timeframes.finish(),
      branch_timeframes: self
        .branch_timeframes
        .into_iter()
        .map(|(b, acc)| (b, acc.finish()))
        .collect(),
      latest_commit: self.latest.map(|(_, d)| d),
      recent_commits: self.recent.into_iter().map(|(_, d)| d).collect(),
      skipped_commits: self.skipped,
    }
  }
}

/// "ins-" + 16 hex chars of blake3 over the sorted unique shas.
fn report_id<'a>(sorted_shas: impl Iterator<Item = &'a String>) -> String {
  let mut hasher = blake3::Hasher::new();
  for sha in sorted_shas {
    hasher.update(sha.as_bytes());
    hasher.update(b"\n");
  }
  let hex = hasher.finalize().to_hex();
  format!("ins-{}", &hex[..16])
}

/// Commits per username, most active first, ties by username.
fn by_developer(authors: &BTreeMap<String, AuthorMetrics>) -> Vec<DeveloperCommits> {
  let mut counts: HashMap<&str, u64> = HashMap::new();
  for m in authors.values() {
    *counts.entry(m.username.as_str()).or_default() += m.commits;
  }
  let mut out: Vec<DeveloperCommits> = counts
    .into_iter()
    .map(|(username, commits)| DeveloperCommits {
      username: username.to_string(),
      commits,
    })
    .collect();
  out.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.username.cmp(&b.username)));
  out
}

/// Reference time for a request: the supplied `now`, or the wall clock.
pub fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>, InsightsError> {
  match now.map(str::trim).filter(|s| !s.is_empty()) {
    Some(s) => parse_timestamp(s).ok_or_else(|| InsightsError::validation("now", "invalid timestamp")),
    None => Ok(Utc::now()),
  }
}

/// Full report for an insights request.
pub fn build_insights(request: &InsightsRequest) -> Result<RepoInsights, InsightsError> {
  let now = resolve_now(request.now.as_deref())?;
  let selection = request.filter.compile()?;
  let (commits, skipped) = decode_all(request.commits.clone());

  let analyzer = Analyzer::new(request.config.clone())
    .with_branch_file_counts(request.branch_file_counts.clone());
  let mut builder = InsightsBuilder::new(analyzer, now, &request.branches);
  for provider in static_metrics(&request.external_metrics) {
    builder = builder.with_provider(Box::new(provider));
  }
  builder.note_skipped(skipped);

  let mut filtered_out = 0u64;
  for commit in commits {
    if selection.accepts(&commit) {
      builder.push(commit);
    } else {
      filtered_out += 1;
    }
  }
  debug!(filtered_out, skipped, "commits filtered");
  Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// Categorization
// ---------------------------------------------------------------------------

/// Which commits a categorization report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
  /// Login, name, email or "name|email", case-insensitive.
  Author(String),
  /// Full sha or a prefix of at least 7 characters.
  Commit(String),
}

impl Scope {
  fn label(&self) -> String {
    match self {
      Self::Author(a) => format!("author:{}", a),
      Self::Commit(s) => format!("commit:{}", s),
    }
  }
}

/// Category and type breakdown for one author or one commit. Repeated shas count once.
pub fn categorize_scope(
  analyzer: &Analyzer,
  scope: &Scope,
  commits: &[Commit],
) -> Result<CategorizationReport, InsightsError> {
  let selected: Vec<&Commit> = match scope {
    Scope::Author(author) => {
      let wanted = author.trim().to_lowercase();
      if wanted.is_empty() {
        return Err(InsightsError::validation("author", "must not be empty"));
      }
      commits.iter().filter(|c| authored_by(c, &wanted)).collect()
    }
    Scope::Commit(sha) => {
      if sha.trim().is_empty() {
        return Err(InsightsError::validation("sha", "must not be empty"));
      }
      let selection = Selection::by_sha(sha);
      let hits: Vec<&Commit> = commits.iter().filter(|c| selection.accepts(c)).collect();
      if hits.is_empty() {
        return Err(InsightsError::not_found("commit", sha.trim()));
      }
      hits
    }
  };

  let mut seen = BTreeSet::new();
  let mut counter = CategoryCounter::default();
  let mut digests = Vec::new();
  for commit in selected {
    if !seen.insert(commit.sha.as_str()) {
      continue;
    }
    let analysis = analyzer.analyze(commit);
    counter.record(analysis.ssm_category, analysis.commit_type);
    digests.push(digest_with(commit, analysis));
  }

  Ok(CategorizationReport {
    scope: scope.label(),
    total_commits: digests.len() as u64,
    categories: counter.categories(),
    commit_types: counter.commit_types(),
    commits: digests,
  })
}

fn authored_by(commit: &Commit, wanted_lower: &str) -> bool {
  let login = commit.author.login.as_deref().unwrap_or("");
  [
    login,
    commit.author_name(),
    commit.author_email(),
    commit.author_identity().as_str(),
  ]
  .iter()
  .any(|candidate| !candidate.is_empty() && candidate.to_lowercase() == wanted_lower)
}
