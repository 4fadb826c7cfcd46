//! Commit fixtures for unit tests.

use crate::normalize::parse_timestamp;
use crate::types::{Commit, CommitFile, FileStatus, Person};

pub struct CommitBuilder {
  commit: Commit,
}

impl CommitBuilder {
  pub fn new(sha: &str) -> Self {
    Self {
      commit: Commit {
        sha: sha.to_string(),
        message: String::new(),
        author: Person {
          name: "Ada".into(),
          email: "ada@example.com".into(),
          login: None,
        },
        committer: Person::default(),
        date: None,
        raw_date: None,
        additions: 0,
        deletions: 0,
        changes: 0,
        files: Vec::new(),
        branches: Default::default(),
        parents: Vec::new(),
      },
    }
  }

  pub fn message(mut self, message: &str) -> Self {
    self.commit.message = message.to_string();
    self
  }

  pub fn author(mut self, name: &str, email: &str) -> Self {
    self.commit.author.name = name.to_string();
    self.commit.author.email = email.to_string();
    self
  }

  pub fn login(mut self, login: &str) -> Self {
    self.commit.author.login = Some(login.to_string());
    self
  }

  pub fn date(mut self, date: &str) -> Self {
    self.commit.raw_date = Some(date.to_string());
    self.commit.date = parse_timestamp(date);
    self
  }

  /// Sets additions/deletions and changes = additions + deletions.
  pub fn lines(mut self, additions: u64, deletions: u64) -> Self {
    self.commit.additions = additions;
    self.commit.deletions = deletions;
    self.commit.changes = additions.saturating_add(deletions);
    self
  }

  /// Adds `n` modified files with no line detail.
  pub fn files(mut self, n: usize) -> Self {
    self.commit.files = (0..n)
      .map(|i| CommitFile {
        filename: format!("src/file{}.rs", i),
        status: FileStatus::Modified,
        additions: 0,
        deletions: 0,
        changes: 0,
        patch: None,
      })
      .collect();
    self
  }

  pub fn branches(mut self, branches: &[&str]) -> Self {
    self.commit.branches = branches.iter().map(|b| b.to_string()).collect();
    self
  }

  pub fn build(self) -> Commit {
    self.commit
  }
}
