//! Commit type derived from commit message keywords.

use crate::types::CommitType;

/// Ordered keyword table; first hit wins.
const KEYWORDS: &[(&[&str], CommitType)] = &[
  (&["fix", "bug"], CommitType::BugFix),
  (&["feat", "add"], CommitType::Feature),
  (&["refactor"], CommitType::Refactor),
  (&["doc"], CommitType::Documentation),
  (&["test"], CommitType::Test),
  (&["chore"], CommitType::Chore),
];

/// Commit type from a case-insensitive substring scan of the message.
pub fn commit_type(message: &str) -> CommitType {
  let msg = message.to_lowercase();
  KEYWORDS
    .iter()
    .find(|(words, _)| words.iter().any(|w| msg.contains(w)))
    .map(|(_, t)| *t)
    .unwrap_or(CommitType::Other)
}
