//! Normalize inbound commit records into canonical internal Commit models.
//!
//! Normalization never fails: malformed fields degrade to zero/empty/None and are
//! logged, so one bad record cannot block aggregation of the rest.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::warn;

use crate::types::*;

/// Parse and normalize an InboundCommit into a canonical Commit.
pub fn normalize(raw: &InboundCommit) -> Commit {
  let author = person(
    raw.author.as_ref(),
    &raw.author_name,
    &raw.author_email,
  );
  let committer = person(
    raw.committer.as_ref(),
    &raw.committer_name,
    &raw.committer_email,
  );

  // Top-level date wins; GitHub's nested author.date is the fallback.
  let raw_date = raw
    .date
    .clone()
    .or_else(|| raw.author.as_ref().and_then(|a| a.date.clone()))
    .filter(|d| !d.trim().is_empty());
  let date = raw_date.as_deref().and_then(|d| {
    let parsed = parse_timestamp(d);
    if parsed.is_none() {
      warn!(sha = %raw.sha, date = %d, "unparseable commit date; treating as missing");
    }
    parsed
  });

  let changes = if raw.changes > 0 {
    raw.changes
  } else {
    raw.additions.saturating_add(raw.deletions)
  };

  let files = raw
    .files
    .iter()
    .map(|f| CommitFile {
      filename: f.filename.clone(),
      status: FileStatus::from_str_loose(&f.status),
      additions: f.additions,
      deletions: f.deletions,
      changes: if f.changes > 0 {
        f.changes
      } else {
        f.additions.saturating_add(f.deletions)
      },
      patch: f.patch.clone(),
    })
    .collect();

  Commit {
    sha: raw.sha.trim().to_string(),
    message: raw.message.clone(),
    author,
    committer,
    date,
    raw_date,
    additions: raw.additions,
    deletions: raw.deletions,
    changes,
    files,
    branches: raw
      .branches
      .iter()
      .map(|b| b.trim())
      .filter(|b| !b.is_empty())
      .map(str::to_string)
      .collect(),
    parents: raw.parents.clone(),
  }
}

/// Decode one raw JSON commit. Returns None (and logs) only when the value is not
/// a JSON object at all; every field-level problem is absorbed by the lenient decoders.
pub fn decode(index: usize, value: Value) -> Option<Commit> {
  match serde_json::from_value::<InboundCommit>(value) {
    Ok(raw) => Some(normalize(&raw)),
    Err(e) => {
      warn!(index, error = %e, "skipping malformed commit record");
      None
    }
  }
}

/// Decode a whole batch, returning the commits plus the number skipped.
pub fn decode_all(values: Vec<Value>) -> (Vec<Commit>, u64) {
  let total = values.len();
  let commits: Vec<Commit> = values
    .into_iter()
    .enumerate()
    .filter_map(|(i, v)| decode(i, v))
    .collect();
  let skipped = (total - commits.len()) as u64;
  (commits, skipped)
}

/// The one output format for instants: RFC3339, whole seconds, `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// RFC3339 first, then a naive "YYYY-MM-DDTHH:MM:SS" read as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    .map(|naive| naive.and_utc())
}

fn person(nested: Option<&InboundPerson>, flat_name: &str, flat_email: &str) -> Person {
  let (name, email, login) = match nested {
    Some(p) => (p.name.as_str(), p.email.as_str(), p.login.clone()),
    None => ("", "", None),
  };
  Person {
    name: first_non_empty(name, flat_name).trim().to_string(),
    email: first_non_empty(email, flat_email).trim().to_string(),
    login: login.filter(|l| !l.trim().is_empty()),
  }
}

fn first_non_empty<'a>(a: &'a str, b: &'a str) -> &'a str {
  if a.trim().is_empty() {
    b
  } else {
    a
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;
  use serde_json::json;

  #[test]
  fn parse_timestamp_formats() {
    let expected = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    assert_eq!(parse_timestamp("2025-01-15T10:30:00Z"), Some(expected));
    assert_eq!(parse_timestamp("2025-01-15T12:30:00+02:00"), Some(expected));
    assert_eq!(parse_timestamp("2025-01-15T10:30:00"), Some(expected));
    assert_eq!(parse_timestamp("yesterday-ish"), None);
  }

  #[test]
  fn changes_falls_back_to_additions_plus_deletions() {
    let raw: InboundCommit =
      serde_json::from_value(json!({"sha": "a", "additions": 5, "deletions": 3})).unwrap();
    assert_eq!(normalize(&raw).changes, 8);

    let raw: InboundCommit = serde_json::from_value(
      json!({"sha": "a", "additions": 5, "deletions": 3, "changes": 20}),
    )
    .unwrap();
    assert_eq!(normalize(&raw).changes, 20);
  }

  #[test]
  fn flattened_author_fields_are_used() {
    let raw: InboundCommit = serde_json::from_value(json!({
      "sha": "a",
      "author_name": "Ada",
      "author_email": "ada@example.com",
      "date": "2025-02-01T00:00:00Z"
    }))
    .unwrap();
    let commit = normalize(&raw);
    assert_eq!(commit.author.name, "Ada");
    assert_eq!(commit.author_identity(), "Ada|ada@example.com");
    assert!(commit.date.is_some());
  }

  #[test]
  fn nested_author_with_login_and_date() {
    let raw: InboundCommit = serde_json::from_value(json!({
      "sha": "a",
      "author": {"name": "Grace", "email": "g@example.com", "login": "grace", "date": "2025-02-01T00:00:00Z"},
      "committer": {"name": "GitHub", "email": "noreply@github.com"}
    }))
    .unwrap();
    let commit = normalize(&raw);
    assert_eq!(commit.display_name(), "grace");
    assert_eq!(commit.committer.name, "GitHub");
    assert_eq!(
      commit.date,
      Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
    );
  }

  #[test]
  fn missing_author_falls_back_to_committer_then_unknown() {
    let raw: InboundCommit = serde_json::from_value(json!({
      "sha": "a",
      "committer_name": "Bot",
      "committer_email": "bot@example.com"
    }))
    .unwrap();
    assert_eq!(normalize(&raw).author_identity(), "Bot|bot@example.com");

    let raw: InboundCommit = serde_json::from_value(json!({"sha": "b"})).unwrap();
    assert_eq!(normalize(&raw).author_identity(), "Unknown|");
  }

  #[test]
  fn malformed_date_becomes_none_but_keeps_raw() {
    let raw: InboundCommit =
      serde_json::from_value(json!({"sha": "a", "date": "not-a-date"})).unwrap();
    let commit = normalize(&raw);
    assert!(commit.date.is_none());
    assert_eq!(commit.raw_date.as_deref(), Some("not-a-date"));
  }

  #[test]
  fn decode_all_skips_non_objects() {
    let (commits, skipped) = decode_all(vec![
      json!({"sha": "a"}),
      json!(17),
      json!("nope"),
      json!({"sha": "b", "files": null}),
    ]);
    assert_eq!(commits.len(), 2);
    assert_eq!(skipped, 2);
    assert!(commits[1].files.is_empty());
  }

  #[test]
  fn message_summary_and_body() {
    let raw: InboundCommit = serde_json::from_value(json!({
      "sha": "a",
      "message": "feat: add login\n\nAdds the OAuth flow.\n"
    }))
    .unwrap();
    let commit = normalize(&raw);
    assert_eq!(commit.summary(), "feat: add login");
    assert_eq!(commit.body(), "Adds the OAuth flow.");
  }
}
