//! Code quality scorecard: nine named metrics, each assessed against a fixed band.
//!
//! Four metrics are derived from commit history ([`HistorySummary`]); the rest only exist
//! when a [`MetricProvider`] supplies them (coverage tools, linters, scanners). Providers
//! take precedence over the history-derived values. A metric nobody can produce is
//! reported as `{ value: null, assessment: "N/A" }`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::timeframe::days_before;
use crate::types::{Assessment, CodeQualityMetrics, Commit, Metric, MetricKind, Quality, ScoreSet};

static WIP_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)\b(wip|temp|tmp|fixup|squash|hack|dirty|oops|draft)\b").expect("WIP regex")
});

static CONVENTIONAL_PREFIX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^(feat|fix|docs?|style|refactor|perf|tests?|build|ci|chore|revert)(\([^)]*\))?!?:\s*\S")
    .expect("conventional prefix regex")
});

const SUMMARY_MIN_LEN: usize = 10;
const SUMMARY_MAX_LEN: usize = 72;

/// 0-100 score for one commit message.
pub fn message_score(message: &str) -> u8 {
  let mut lines = message.trim().splitn(2, '\n');
  let summary = lines.next().unwrap_or("").trim();
  let body = lines.next().unwrap_or("").trim();

  let len = summary.chars().count();
  let mut score = if len > SUMMARY_MAX_LEN {
    25
  } else if len >= SUMMARY_MIN_LEN {
    40
  } else {
    10
  };
  if CONVENTIONAL_PREFIX.is_match(summary) {
    score += 20;
  }
  if !body.is_empty() {
    score += 20;
  }
  if !WIP_PATTERN.is_match(message) {
    score += 20;
  }
  score
}

// ---------------------------------------------------------------------------
// History summary
// ---------------------------------------------------------------------------

/// Streaming inputs for the history-derived metrics.
#[derive(Debug, Clone)]
pub struct HistorySummary {
  window_start: DateTime<Utc>,
  window_end: DateTime<Utc>,
  commits: u64,
  additions: u64,
  deletions: u64,
  recent_churn: u64,
  message_points: u64,
  smells: u64,
}

impl HistorySummary {
  /// Churn is "recent" within `[now - churn_window_days, now)`. An oversized window
  /// reaches back to the start of the calendar.
  pub fn new(now: DateTime<Utc>, churn_window_days: i64) -> Self {
    Self {
      window_start: days_before(now, churn_window_days),
      window_end: now,
      commits: 0,
      additions: 0,
      deletions: 0,
      recent_churn: 0,
      message_points: 0,
      smells: 0,
    }
  }

  pub fn record(&mut self, commit: &Commit, scores: &ScoreSet) {
    self.commits += 1;
    self.additions = self.additions.saturating_add(commit.additions);
    self.deletions = self.deletions.saturating_add(commit.deletions);
    if commit
      .date
      .is_some_and(|at| at >= self.window_start && at < self.window_end)
    {
      self.recent_churn = self.recent_churn.saturating_add(commit.churn());
    }
    self.message_points += message_score(&commit.message) as u64;
    if matches!(scores.quality, Quality::Questionable | Quality::NeedsReview) {
      self.smells += 1;
    }
  }

  pub fn commits(&self) -> u64 {
    self.commits
  }

  pub fn total_churn(&self) -> u64 {
    self.additions.saturating_add(self.deletions)
  }

  pub fn lines_of_code(&self) -> Option<f64> {
    self.non_empty(|s| s.additions.saturating_sub(s.deletions) as f64)
  }

  pub fn average_commit_size(&self) -> Option<f64> {
    self.non_empty(|s| round2(s.total_churn() as f64 / s.commits as f64))
  }

  pub fn code_churn_rate(&self) -> Option<f64> {
    match self.total_churn() {
      0 => None,
      total => Some(round2(self.recent_churn as f64 / total as f64 * 100.0)),
    }
  }

  pub fn message_quality(&self) -> Option<f64> {
    self.non_empty(|s| round2(s.message_points as f64 / s.commits as f64))
  }

  pub fn code_smells(&self) -> Option<f64> {
    self.non_empty(|s| s.smells as f64)
  }

  fn non_empty(&self, f: impl FnOnce(&Self) -> f64) -> Option<f64> {
    (self.commits > 0).then(|| f(self))
  }
}

fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Source of one metric value.
pub trait MetricProvider: Send + Sync {
  fn kind(&self) -> MetricKind;

  /// `None` when the value cannot be produced; the metric then falls back or becomes N/A.
  fn measure(&self, summary: &HistorySummary) -> Option<f64>;
}

/// Values derived from commit history alone.
#[derive(Debug, Clone, Copy)]
pub struct HistoryMetric(pub MetricKind);

impl MetricProvider for HistoryMetric {
  fn kind(&self) -> MetricKind {
    self.0
  }

  fn measure(&self, summary: &HistorySummary) -> Option<f64> {
    match self.0 {
      MetricKind::TotalLinesOfCode => summary.lines_of_code(),
      MetricKind::AverageCommitSize => summary.average_commit_size(),
      MetricKind::CodeChurnRate => summary.code_churn_rate(),
      MetricKind::CommitMessageQuality => summary.message_quality(),
      MetricKind::CodeSmells => summary.code_smells(),
      MetricKind::CommentDensity
      | MetricKind::TechnicalDebtScore
      | MetricKind::TestCoverage
      | MetricKind::SecurityWarnings => None,
    }
  }
}

/// A precomputed value handed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticMetric {
  pub kind: MetricKind,
  pub value: f64,
}

impl MetricProvider for StaticMetric {
  fn kind(&self) -> MetricKind {
    self.kind
  }

  fn measure(&self, _summary: &HistorySummary) -> Option<f64> {
    Some(self.value).filter(|v| v.is_finite())
  }
}

/// Request-supplied values, one provider per entry, in metric order.
pub fn static_metrics(values: &HashMap<MetricKind, f64>) -> Vec<StaticMetric> {
  MetricKind::ALL
    .iter()
    .filter_map(|kind| values.get(kind).map(|&value| StaticMetric { kind: *kind, value }))
    .collect()
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
  LowerIsBetter,
  HigherIsBetter,
}

/// Cut points for Excellent / Good / Fair; anything beyond Fair is Poor.
#[derive(Debug, Clone, Copy)]
struct Band {
  direction: Direction,
  excellent: f64,
  good: f64,
  fair: f64,
}

fn lower(excellent: f64, good: f64, fair: f64) -> Band {
  Band { direction: Direction::LowerIsBetter, excellent, good, fair }
}

fn higher(excellent: f64, good: f64, fair: f64) -> Band {
  Band { direction: Direction::HigherIsBetter, excellent, good, fair }
}

fn band(kind: MetricKind) -> Band {
  match kind {
    MetricKind::TotalLinesOfCode => lower(10_000.0, 50_000.0, 200_000.0),
    MetricKind::AverageCommitSize => lower(50.0, 150.0, 400.0),
    MetricKind::CodeChurnRate => lower(10.0, 25.0, 50.0),
    MetricKind::CommitMessageQuality => higher(80.0, 60.0, 40.0),
    MetricKind::CommentDensity => higher(20.0, 10.0, 5.0),
    MetricKind::TechnicalDebtScore => lower(10.0, 25.0, 50.0),
    MetricKind::CodeSmells => lower(0.0, 5.0, 15.0),
    MetricKind::TestCoverage => higher(80.0, 60.0, 40.0),
    MetricKind::SecurityWarnings => lower(0.0, 2.0, 5.0),
  }
}

pub fn assess(kind: MetricKind, value: f64) -> Assessment {
  let b = band(kind);
  let within = |cut: f64| match b.direction {
    Direction::LowerIsBetter => value <= cut,
    Direction::HigherIsBetter => value >= cut,
  };
  if within(b.excellent) {
    Assessment::Excellent
  } else if within(b.good) {
    Assessment::Good
  } else if within(b.fair) {
    Assessment::Fair
  } else {
    Assessment::Poor
  }
}

fn metric(kind: MetricKind, value: Option<f64>) -> Metric {
  match value.filter(|v| v.is_finite()) {
    Some(v) => Metric {
      value: Some(v),
      assessment: assess(kind, v),
    },
    None => Metric::unavailable(),
  }
}

/// Builds the scorecard; later providers win over earlier ones, all win over history.
pub fn assemble(summary: &HistorySummary, providers: &[&dyn MetricProvider]) -> CodeQualityMetrics {
  let value = |kind: MetricKind| {
    providers
      .iter()
      .rev()
      .filter(|p| p.kind() == kind)
      .find_map(|p| p.measure(summary))
      .or_else(|| HistoryMetric(kind).measure(summary))
  };
  let m = |kind: MetricKind| metric(kind, value(kind));
  CodeQualityMetrics {
    total_lines_of_code: m(MetricKind::TotalLinesOfCode),
    average_commit_size: m(MetricKind::AverageCommitSize),
    code_churn_rate: m(MetricKind::CodeChurnRate),
    commit_message_quality: m(MetricKind::CommitMessageQuality),
    comment_density: m(MetricKind::CommentDensity),
    technical_debt_score: m(MetricKind::TechnicalDebtScore),
    code_smells: m(MetricKind::CodeSmells),
    test_coverage: m(MetricKind::TestCoverage),
    security_warnings: m(MetricKind::SecurityWarnings),
  }
}
