//! Commit selection: branch set, date range, single sha.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::InsightsError;
use crate::normalize::parse_timestamp;
use crate::types::Commit;

/// Shortest sha prefix accepted for a lookup.
pub const MIN_SHA_PREFIX: usize = 7;

/// Filter as supplied in a request (strings unvalidated).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommitFilter {
  #[serde(default)]
  pub branches: Option<Vec<String>>,
  #[serde(default)]
  pub since: Option<String>,
  #[serde(default)]
  pub until: Option<String>,
  #[serde(default)]
  pub sha: Option<String>,
}

/// Validated filter, ready to test commits.
#[derive(Debug, Clone, Default)]
pub struct Selection {
  branches: Option<Vec<String>>,
  since: Option<DateTime<Utc>>,
  until: Option<DateTime<Utc>>,
  sha: Option<String>,
}

impl CommitFilter {
  pub fn compile(&self) -> Result<Selection, InsightsError> {
    let since = parse_bound(self.since.as_deref(), "filter.since")?;
    let until = parse_bound(self.until.as_deref(), "filter.until")?;
    if let (Some(s), Some(u)) = (since, until) {
      if s >= u {
        return Err(InsightsError::validation(
          "filter.since",
          "must be earlier than filter.until",
        ));
      }
    }
    Ok(Selection {
      branches: self
        .branches
        .as_ref()
        .map(|bs| bs.iter().map(|b| b.trim().to_string()).collect()),
      since,
      until,
      sha: self
        .sha
        .as_ref()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty()),
    })
  }
}

impl Selection {
  pub fn by_sha(sha: &str) -> Self {
    Self {
      sha: Some(sha.trim().to_ascii_lowercase()),
      ..Self::default()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.branches.is_none() && self.since.is_none() && self.until.is_none() && self.sha.is_none()
  }

  pub fn accepts(&self, commit: &Commit) -> bool {
    if let Some(branches) = &self.branches {
      if !branches.iter().any(|b| commit.branches.contains(b)) {
        return false;
      }
    }
    if self.since.is_some() || self.until.is_some() {
      let Some(date) = commit.date else {
        return false;
      };
      if self.since.is_some_and(|s| date < s) || self.until.is_some_and(|u| date >= u) {
        return false;
      }
    }
    if let Some(sha) = &self.sha {
      if !sha_matches(&commit.sha, sha) {
        return false;
      }
    }
    true
  }
}

/// Exact match, or a prefix of at least [`MIN_SHA_PREFIX`] characters.
pub fn sha_matches(commit_sha: &str, wanted: &str) -> bool {
  let commit_sha = commit_sha.to_ascii_lowercase();
  let wanted = wanted.to_ascii_lowercase();
  commit_sha == wanted || (wanted.len() >= MIN_SHA_PREFIX && commit_sha.starts_with(&wanted))
}

fn parse_bound(value: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, InsightsError> {
  match value.map(str::trim).filter(|v| !v.is_empty()) {
    Some(v) => parse_timestamp(v)
      .map(Some)
      .ok_or_else(|| InsightsError::validation(field, "invalid timestamp")),
    None => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::CommitBuilder;

  #[test]
  fn empty_filter_accepts_everything() {
    let sel = CommitFilter::default().compile().unwrap();
    assert!(sel.is_empty());
    assert!(sel.accepts(&CommitBuilder::new("a").build()));
  }

  #[test]
  fn branch_overlap() {
    let sel = CommitFilter {
      branches: Some(vec!["release".into()]),
      ..Default::default()
    }
    .compile()
    .unwrap();
    assert!(sel.accepts(&CommitBuilder::new("a").branches(&["main", "release"]).build()));
    assert!(!sel.accepts(&CommitBuilder::new("b").branches(&["main"]).build()));
  }

  #[test]
  fn date_range_is_half_open_and_drops_undated() {
    let sel = CommitFilter {
      since: Some("2025-01-01T00:00:00Z".into()),
      until: Some("2025-02-01T00:00:00Z".into()),
      ..Default::default()
    }
    .compile()
    .unwrap();
    assert!(sel.accepts(&CommitBuilder::new("a").date("2025-01-01T00:00:00Z").build()));
    assert!(!sel.accepts(&CommitBuilder::new("b").date("2025-02-01T00:00:00Z").build()));
    assert!(!sel.accepts(&CommitBuilder::new("c").build()));
  }

  #[test]
  fn bad_bounds_are_validation_errors() {
    let err = CommitFilter {
      since: Some("last tuesday".into()),
      ..Default::default()
    }
    .compile()
    .unwrap_err();
    assert_eq!(err.field(), Some("filter.since"));

    let err = CommitFilter {
      since: Some("2025-02-01T00:00:00Z".into()),
      until: Some("2025-01-01T00:00:00Z".into()),
      ..Default::default()
    }
    .compile()
    .unwrap_err();
    assert!(err.to_string().contains("earlier"));
  }

  #[test]
  fn sha_prefix_needs_seven_chars() {
    assert!(sha_matches("abcdef1234", "abcdef1234"));
    assert!(sha_matches("abcdef1234", "ABCDEF1"));
    assert!(!sha_matches("abcdef1234", "abcdef"));
    let sel = Selection::by_sha("abcdef1");
    assert!(sel.accepts(&CommitBuilder::new("abcdef1234").build()));
    assert!(!sel.accepts(&CommitBuilder::new("bbcdef1234").build()));
  }
}
