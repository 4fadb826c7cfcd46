//! Rolling activity windows (yesterday, last 5 days, week, month, all time) with
//! per-contributor totals and the commits that fell inside each window.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

use crate::analyze::Analyzer;
use crate::normalize::format_timestamp;
use crate::types::{ChangeClass, Commit, Contributor, TimeframeStats, WindowCommit};

/// Half-open `[since, until)` window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
  pub label: &'static str,
  pub since: DateTime<Utc>,
  pub until: DateTime<Utc>,
}

impl Window {
  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    at >= self.since && at < self.until
  }
}

/// `at` minus `days` whole days, clamped to the earliest representable instant.
/// Negative `days` count as zero.
pub fn days_before(at: DateTime<Utc>, days: i64) -> DateTime<Utc> {
  TimeDelta::try_days(days.max(0))
    .and_then(|delta| at.checked_sub_signed(delta))
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// The five report windows, relative to `now`.
pub fn windows(now: DateTime<Utc>) -> Vec<Window> {
  let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
  vec![
    Window {
      label: "Yesterday",
      since: days_before(today, 1),
      until: today,
    },
    Window {
      label: "Last 5 days",
      since: days_before(now, 5),
      until: now,
    },
    Window {
      label: "Weekly",
      since: days_before(now, 7),
      until: now,
    },
    Window {
      label: "Monthly",
      since: days_before(now, 30),
      until: now,
    },
    Window {
      label: "All time",
      since: DateTime::<Utc>::default(),
      until: now,
    },
  ]
}

#[derive(Debug, Clone, Default)]
struct WindowTotals {
  commits: u64,
  additions: u64,
  deletions: u64,
  changes: u64,
  contributors: Vec<Contributor>,
  index: HashMap<String, usize>,
  listed: Vec<WindowCommit>,
}

impl WindowTotals {
  fn record(&mut self, commit: &Commit, change_class: &ChangeClass) {
    self.commits += 1;
    self.additions = self.additions.saturating_add(commit.additions);
    self.deletions = self.deletions.saturating_add(commit.deletions);
    self.changes = self.changes.saturating_add(commit.changes);

    let key = commit.author_identity();
    let slot = match self.index.get(&key) {
      Some(&i) => i,
      None => {
        self.contributors.push(Contributor {
          name: commit.author_name().to_string(),
          email: commit.author_email().to_string(),
          commits: 0,
          additions: 0,
          deletions: 0,
          changes: 0,
        });
        self.index.insert(key, self.contributors.len() - 1);
        self.contributors.len() - 1
      }
    };
    let c = &mut self.contributors[slot];
    c.commits += 1;
    c.additions = c.additions.saturating_add(commit.additions);
    c.deletions = c.deletions.saturating_add(commit.deletions);
    c.changes = c.changes.saturating_add(commit.changes);

    self.listed.push(WindowCommit {
      sha: commit.sha.clone(),
      date: commit.date.map(format_timestamp).unwrap_or_default(),
      author_name: commit.author_name().to_string(),
      author_email: commit.author_email().to_string(),
      summary: commit.summary().to_string(),
      additions: commit.additions,
      deletions: commit.deletions,
      changes: commit.changes,
      change_class: change_class.clone(),
    });
  }

  fn into_stats(self, window: &Window) -> TimeframeStats {
    TimeframeStats {
      label: window.label.to_string(),
      since: format_timestamp(window.since),
      until: format_timestamp(window.until),
      total_commits: self.commits,
      total_additions: self.additions,
      total_deletions: self.deletions,
      total_changes: self.changes,
      contributors: self.contributors,
      commits: self.listed,
    }
  }
}

/// Feeds commits into every window at once.
#[derive(Debug, Clone)]
pub struct TimeframeAccumulator {
  windows: Vec<(Window, WindowTotals)>,
}

impl TimeframeAccumulator {
  pub fn new(now: DateTime<Utc>) -> Self {
    Self {
      windows: windows(now)
        .into_iter()
        .map(|w| (w, WindowTotals::default()))
        .collect(),
    }
  }

  /// Undated commits belong to no window.
  pub fn record(&mut self, commit: &Commit, change_class: &ChangeClass) {
    let Some(at) = commit.date else {
      return;
    };
    for (window, totals) in &mut self.windows {
      if window.contains(at) {
        totals.record(commit, change_class);
      }
    }
  }

  pub fn finish(self) -> Vec<TimeframeStats> {
    self
      .windows
      .into_iter()
      .map(|(w, t)| t.into_stats(&w))
      .collect()
  }
}

/// Stats for a single window over a commit slice.
pub fn aggregate_window(analyzer: &Analyzer, window: &Window, commits: &[Commit]) -> TimeframeStats {
  let mut totals = WindowTotals::default();
  for commit in commits {
    if commit.date.is_some_and(|at| window.contains(at)) {
      totals.record(commit, &analyzer.analyze(commit).change_class);
    }
  }
  totals.into_stats(window)
}
