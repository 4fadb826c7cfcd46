//! Core types for the insights engine (JSON contracts + internal models).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::filter::CommitFilter;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the fetcher sends)
// ---------------------------------------------------------------------------

/// One raw commit record. Every field is optional and decoded leniently: missing,
/// `null`, negative or wrong-typed values become zero/empty. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundCommit {
  #[serde(default, deserialize_with = "lenient_string")]
  pub sha: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub message: String,
  #[serde(default, deserialize_with = "lenient_opt")]
  pub author: Option<InboundPerson>,
  #[serde(default, deserialize_with = "lenient_opt")]
  pub committer: Option<InboundPerson>,
  // Flattened shape (author_name / author_email at the top level).
  #[serde(default, deserialize_with = "lenient_string")]
  pub author_name: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub author_email: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub committer_name: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub committer_email: String,
  #[serde(default, deserialize_with = "lenient_opt")]
  pub date: Option<String>,
  #[serde(default, deserialize_with = "lenient_count")]
  pub additions: u64,
  #[serde(default, deserialize_with = "lenient_count")]
  pub deletions: u64,
  /// 0 means "not supplied"; normalization falls back to additions + deletions.
  #[serde(default, deserialize_with = "lenient_count")]
  pub changes: u64,
  #[serde(default, deserialize_with = "lenient_list")]
  pub files: Vec<InboundFile>,
  #[serde(default, deserialize_with = "lenient_list")]
  pub branches: Vec<String>,
  #[serde(default, deserialize_with = "lenient_parents")]
  pub parents: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPerson {
  #[serde(default, deserialize_with = "lenient_string")]
  pub name: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub email: String,
  #[serde(default, deserialize_with = "lenient_opt")]
  pub login: Option<String>,
  #[serde(default, deserialize_with = "lenient_opt")]
  pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundFile {
  #[serde(default, deserialize_with = "lenient_string")]
  pub filename: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub status: String,
  #[serde(default, deserialize_with = "lenient_count")]
  pub additions: u64,
  #[serde(default, deserialize_with = "lenient_count")]
  pub deletions: u64,
  #[serde(default, deserialize_with = "lenient_count")]
  pub changes: u64,
  #[serde(default, deserialize_with = "lenient_opt")]
  pub patch: Option<String>,
}

/// One request to the binary / `run`. Commits stay raw JSON so each one is decoded
/// on its own and a single bad record cannot fail the whole batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
  Insights(InsightsRequest),
  CategorizeAuthor {
    author: String,
    #[serde(default)]
    commits: Vec<Value>,
    #[serde(default)]
    config: Config,
  },
  CategorizeCommit {
    sha: String,
    #[serde(default)]
    commits: Vec<Value>,
    #[serde(default)]
    config: Config,
  },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsightsRequest {
  #[serde(default)]
  pub commits: Vec<Value>,
  /// Every branch of the repository, including ones with no fetched commits.
  #[serde(default)]
  pub branches: Vec<String>,
  /// Total files per branch, for the change-class file share.
  #[serde(default)]
  pub branch_file_counts: HashMap<String, u64>,
  /// Precomputed values from external tools (coverage, linters, scanners).
  #[serde(default)]
  pub external_metrics: HashMap<MetricKind, f64>,
  #[serde(default)]
  pub filter: CommitFilter,
  /// Reference time for timeframes and churn windows; defaults to now.
  #[serde(default)]
  pub now: Option<String>,
  #[serde(default)]
  pub config: Config,
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
  pub name: String,
  pub email: String,
  pub login: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
  Added,
  Removed,
  Modified,
  Renamed,
  Copied,
  Changed,
  Unknown,
}

impl FileStatus {
  pub fn from_str_loose(s: &str) -> Self {
    match s.trim().to_ascii_lowercase().as_str() {
      "added" | "add" | "a" => Self::Added,
      "removed" | "deleted" | "delete" | "d" => Self::Removed,
      "modified" | "modify" | "m" => Self::Modified,
      "renamed" | "rename" | "r" => Self::Renamed,
      "copied" | "copy" | "c" => Self::Copied,
      "changed" => Self::Changed,
      _ => Self::Unknown,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFile {
  pub filename: String,
  pub status: FileStatus,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
  pub patch: Option<String>,
}

/// Canonical commit after normalization. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
  pub sha: String,
  pub message: String,
  pub author: Person,
  pub committer: Person,
  pub date: Option<DateTime<Utc>>,
  /// Date string as supplied, kept for diagnostics.
  pub raw_date: Option<String>,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
  pub files: Vec<CommitFile>,
  pub branches: BTreeSet<String>,
  pub parents: Vec<String>,
}

impl Commit {
  /// First line of the message.
  pub fn summary(&self) -> &str {
    self.message.lines().next().unwrap_or("").trim()
  }

  /// Everything after the first line.
  pub fn body(&self) -> &str {
    match self.message.split_once('\n') {
      Some((_, rest)) => rest.trim(),
      None => "",
    }
  }

  /// Total changed lines.
  pub fn churn(&self) -> u64 {
    self.additions.saturating_add(self.deletions)
  }

  pub fn files_changed(&self) -> usize {
    self.files.len()
  }

  pub fn author_name(&self) -> &str {
    if !self.author.name.is_empty() {
      &self.author.name
    } else if !self.committer.name.is_empty() {
      &self.committer.name
    } else {
      "Unknown"
    }
  }

  pub fn author_email(&self) -> &str {
    if !self.author.email.is_empty() {
      &self.author.email
    } else {
      &self.committer.email
    }
  }

  /// Stable author key: "name|email".
  pub fn author_identity(&self) -> String {
    format!("{}|{}", self.author_name(), self.author_email())
  }

  /// Platform login when known, otherwise the author name.
  pub fn display_name(&self) -> &str {
    match self.author.login.as_deref() {
      Some(login) if !login.is_empty() => login,
      _ => self.author_name(),
    }
  }
}

// ---------------------------------------------------------------------------
// Taxonomies
// ---------------------------------------------------------------------------

/// Coarse seven-way type derived from message keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommitType {
  #[serde(rename = "Bug Fix")]
  BugFix,
  Feature,
  Refactor,
  Documentation,
  Test,
  Chore,
  Other,
}

impl CommitType {
  pub const ALL: [CommitType; 7] = [
    Self::BugFix,
    Self::Feature,
    Self::Refactor,
    Self::Documentation,
    Self::Test,
    Self::Chore,
    Self::Other,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::BugFix => "Bug Fix",
      Self::Feature => "Feature",
      Self::Refactor => "Refactor",
      Self::Documentation => "Documentation",
      Self::Test => "Test",
      Self::Chore => "Chore",
      Self::Other => "Other",
    }
  }
}

impl fmt::Display for CommitType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Semantic intent of a commit (the 11-way SSM taxonomy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SsmCategory {
  Integration,
  Rollback,
  Architectural,
  Feature,
  #[serde(rename = "Bug Fix")]
  BugFix,
  Documentation,
  Test,
  Configuration,
  Refactoring,
  Maintenance,
  Trivial,
}

impl SsmCategory {
  pub const ALL: [SsmCategory; 11] = [
    Self::Integration,
    Self::Rollback,
    Self::Architectural,
    Self::Feature,
    Self::BugFix,
    Self::Documentation,
    Self::Test,
    Self::Configuration,
    Self::Refactoring,
    Self::Maintenance,
    Self::Trivial,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Self::Integration => "Integration",
      Self::Rollback => "Rollback",
      Self::Architectural => "Architectural",
      Self::Feature => "Feature",
      Self::BugFix => "Bug Fix",
      Self::Documentation => "Documentation",
      Self::Test => "Test",
      Self::Configuration => "Configuration",
      Self::Refactoring => "Refactoring",
      Self::Maintenance => "Maintenance",
      Self::Trivial => "Trivial",
    }
  }
}

impl fmt::Display for SsmCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Complexity {
  Simple,
  Moderate,
  Complex,
  #[serde(rename = "Very Complex")]
  VeryComplex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Risk {
  None,
  Low,
  Medium,
  High,
}

impl Risk {
  pub fn is_low(self) -> bool {
    matches!(self, Self::None | Self::Low)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
  #[serde(rename = "N/A")]
  NotApplicable,
  Good,
  Questionable,
  #[serde(rename = "Needs Review")]
  NeedsReview,
}

/// Derived per-commit scores; recomputed on demand, never stored as state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreSet {
  pub complexity: Complexity,
  pub risk: Risk,
  pub quality: Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeLabel {
  BugFix,
  LowFeature,
  HighFeature,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeClass {
  pub label: ChangeLabel,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub files_percent: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total_files: Option<u64>,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

/// Display view of one analysed commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitDigest {
  pub sha: String,
  pub summary: String,
  pub author: String,
  /// RFC3339, or "Invalid Date" when missing or unparseable.
  pub date: String,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
  pub files_changed: usize,
  pub commit_type: CommitType,
  pub ssm_category: SsmCategory,
  pub change_class: ChangeClass,
  pub scores: ScoreSet,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityMetrics {
  pub quality_score: u8,
  pub low_risk_score: u8,
  pub simple_commits: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorMetrics {
  pub name: String,
  pub email: String,
  pub username: String,
  pub commits: u64,
  pub additions: u64,
  pub deletions: u64,
  pub files_changed: u64,
  pub quality: QualityMetrics,
  pub commit_list: Vec<CommitDigest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BranchMetrics {
  pub commits: u64,
  pub additions: u64,
  pub deletions: u64,
  pub files_changed: u64,
  pub quality: QualityMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
  pub category: SsmCategory,
  pub count: u64,
  pub percentage: u8,
  /// Distinct commit types within the group, first-seen order.
  pub commit_types: Vec<CommitType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
  pub commit_type: CommitType,
  pub count: u64,
  pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeveloperCommits {
  pub username: String,
  pub commits: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
  TotalLinesOfCode,
  AverageCommitSize,
  CodeChurnRate,
  CommitMessageQuality,
  CommentDensity,
  TechnicalDebtScore,
  CodeSmells,
  TestCoverage,
  SecurityWarnings,
}

impl MetricKind {
  pub const ALL: [MetricKind; 9] = [
    Self::TotalLinesOfCode,
    Self::AverageCommitSize,
    Self::CodeChurnRate,
    Self::CommitMessageQuality,
    Self::CommentDensity,
    Self::TechnicalDebtScore,
    Self::CodeSmells,
    Self::TestCoverage,
    Self::SecurityWarnings,
  ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Assessment {
  Excellent,
  Good,
  Fair,
  Poor,
  #[serde(rename = "N/A")]
  NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metric {
  pub value: Option<f64>,
  pub assessment: Assessment,
}

impl Metric {
  pub fn unavailable() -> Self {
    Self {
      value: None,
      assessment: Assessment::NotAvailable,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeQualityMetrics {
  pub total_lines_of_code: Metric,
  pub average_commit_size: Metric,
  pub code_churn_rate: Metric,
  pub commit_message_quality: Metric,
  pub comment_density: Metric,
  pub technical_debt_score: Metric,
  pub code_smells: Metric,
  pub test_coverage: Metric,
  pub security_warnings: Metric,
}

impl CodeQualityMetrics {
  pub fn get(&self, kind: MetricKind) -> &Metric {
    match kind {
      MetricKind::TotalLinesOfCode => &self.total_lines_of_code,
      MetricKind::AverageCommitSize => &self.average_commit_size,
      MetricKind::CodeChurnRate => &self.code_churn_rate,
      MetricKind::CommitMessageQuality => &self.commit_message_quality,
      MetricKind::CommentDensity => &self.comment_density,
      MetricKind::TechnicalDebtScore => &self.technical_debt_score,
      MetricKind::CodeSmells => &self.code_smells,
      MetricKind::TestCoverage => &self.test_coverage,
      MetricKind::SecurityWarnings => &self.security_warnings,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributor {
  pub name: String,
  pub email: String,
  pub commits: u64,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
}

/// A commit as listed inside a timeframe window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowCommit {
  pub sha: String,
  pub date: String,
  pub author_name: String,
  pub author_email: String,
  pub summary: String,
  pub additions: u64,
  pub deletions: u64,
  pub changes: u64,
  pub change_class: ChangeClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeframeStats {
  pub label: String,
  pub since: String,
  pub until: String,
  pub total_commits: u64,
  pub total_additions: u64,
  pub total_deletions: u64,
  pub total_changes: u64,
  pub contributors: Vec<Contributor>,
  /// Commits inside the window, in arrival order.
  pub commits: Vec<WindowCommit>,
}

/// Root report; rebuilt from scratch for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoInsights {
  pub report_id: String,
  pub total_commits: u64,
  pub total_branches: u64,
  pub total_developers: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub latest_activity: Option<String>,
  pub per_branch: BTreeMap<String, u64>,
  pub branch_metrics: BTreeMap<String, BranchMetrics>,
  pub by_developer: Vec<DeveloperCommits>,
  pub author_metrics: BTreeMap<String, AuthorMetrics>,
  pub repo_metrics: BranchMetrics,
  pub categories: Vec<CategoryGroup>,
  pub commit_types: Vec<TypeCount>,
  pub code_quality_metrics: CodeQualityMetrics,
  pub timeframes: Vec<TimeframeStats>,
  /// The same windows restricted to each branch, change class sized by that branch.
  pub branch_timeframes: BTreeMap<String, Vec<TimeframeStats>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub latest_commit: Option<CommitDigest>,
  pub recent_commits: Vec<CommitDigest>,
  pub skipped_commits: u64,
}

/// Categorization-only view for a single author or a single commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizationReport {
  pub scope: String,
  pub total_commits: u64,
  pub categories: Vec<CategoryGroup>,
  pub commit_types: Vec<TypeCount>,
  pub commits: Vec<CommitDigest>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
  Insights(Box<RepoInsights>),
  Categorization(CategorizationReport),
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for a failed request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  Ok(match Option::<Value>::deserialize(d)? {
    Some(Value::String(s)) => s,
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  })
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
  Ok(match Option::<Value>::deserialize(d)? {
    Some(Value::Number(n)) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
      .unwrap_or(0),
    Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
    _ => 0,
  })
}

fn lenient_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  Ok(Option::<Value>::deserialize(d)?.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: DeserializeOwned,
{
  Ok(match Option::<Value>::deserialize(d)? {
    Some(Value::Array(items)) => items
      .into_iter()
      .filter_map(|item| serde_json::from_value(item).ok())
      .collect(),
    _ => Vec::new(),
  })
}

/// Parents arrive either as hash strings or as `{ "sha": ... }` objects.
fn lenient_parents<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
  Ok(match Option::<Value>::deserialize(d)? {
    Some(Value::Array(items)) => items
      .into_iter()
      .filter_map(|item| match item {
        Value::String(s) => Some(s),
        Value::Object(map) => map.get("sha").and_then(|s| s.as_str()).map(str::to_string),
        _ => None,
      })
      .collect(),
    _ => Vec::new(),
  })
}
