//! Coarse bug_fix / low_feature / high_feature split, sized against the branch.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ChangeClassConfig;
use crate::types::{ChangeClass, ChangeLabel};

static BUG_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)\b(fix|fixed|bug|bugs|hotfix|patch|revert|regression)\b").expect("bug regex")
});

/// Bug keywords win; otherwise the share of the branch's files touched decides
/// (falling back to an absolute file count when the branch size is unknown).
pub fn classify_change(
  message: &str,
  changed_files: usize,
  total_files_in_branch: Option<u64>,
  config: &ChangeClassConfig,
) -> ChangeClass {
  if BUG_PATTERN.is_match(message) {
    return ChangeClass {
      label: ChangeLabel::BugFix,
      files_percent: None,
      total_files: None,
    };
  }

  match total_files_in_branch.filter(|&t| t > 0) {
    Some(total) => {
      let percent = changed_files as f64 / total as f64 * 100.0;
      let label = if percent >= config.high_feature_percent {
        ChangeLabel::HighFeature
      } else {
        ChangeLabel::LowFeature
      };
      ChangeClass {
        label,
        files_percent: Some((percent * 100.0).round() / 100.0),
        total_files: Some(total),
      }
    }
    None => ChangeClass {
      label: if changed_files >= config.high_feature_fallback_files {
        ChangeLabel::HighFeature
      } else {
        ChangeLabel::LowFeature
      },
      files_percent: None,
      total_files: None,
    },
  }
}
