//! SSM category: an ordered cascade of tagged rules, first match wins.
//!
//! Message-content rules come first and size-based fallbacks last; the order is part of
//! the contract (existing classifications depend on it) and is exposed via
//! [`SsmClassifier::rules`].

use once_cell::sync::Lazy;

use crate::config::SsmConfig;
use crate::matcher::{NormalizedMessage, Pattern};
use crate::types::{Commit, SsmCategory};

/// Condition half of a rule.
#[derive(Debug, Clone)]
pub enum Predicate {
  /// Message matches any pattern (fuzzy phrase or regex).
  Message(Vec<Pattern>),
  /// deletions / additions strictly inside (min, max); needs additions > 0.
  BalancedChurn { min: f64, max: f64 },
  /// additions + deletions strictly above the threshold.
  ChurnAbove(u64),
  AnyOf(Vec<Predicate>),
  Always,
}

impl Predicate {
  fn holds(&self, msg: &NormalizedMessage, tokens: &[&str], additions: u64, deletions: u64) -> bool {
    match self {
      Self::Message(patterns) => patterns.iter().any(|p| p.is_match(msg.as_str(), tokens)),
      Self::BalancedChurn { min, max } => {
        if additions == 0 {
          return false;
        }
        let ratio = deletions as f64 / additions as f64;
        ratio > *min && ratio < *max
      }
      Self::ChurnAbove(threshold) => additions.saturating_add(deletions) > *threshold,
      Self::AnyOf(preds) => preds
        .iter()
        .any(|p| p.holds(msg, tokens, additions, deletions)),
      Self::Always => true,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Rule {
  /// Short id for diagnostics ("integration", "size-fallback-large", ...).
  pub name: &'static str,
  pub predicate: Predicate,
  pub category: SsmCategory,
}

struct Vocabulary {
  integration: Vec<Pattern>,
  rollback: Vec<Pattern>,
  architectural: Vec<Pattern>,
  feature: Vec<Pattern>,
  bug_fix: Vec<Pattern>,
  documentation: Vec<Pattern>,
  test: Vec<Pattern>,
  configuration: Vec<Pattern>,
  refactoring: Vec<Pattern>,
  maintenance: Vec<Pattern>,
}

fn vocab(phrases: &[&str], regexes: &[&str]) -> Vec<Pattern> {
  regexes
    .iter()
    .map(|re| Pattern::regex(re).expect("static SSM regex"))
    .chain(phrases.iter().map(|p| Pattern::phrase(p)))
    .collect()
}

// Regexes see the normalized message: lowercase, punctuation replaced by spaces,
// so "feat(ui):" arrives as "feat ui  ".
static VOCABULARY: Lazy<Vocabulary> = Lazy::new(|| Vocabulary {
  integration: vocab(
    &["merge", "pull request", "rebase", "squash", "cherry pick"],
    &[r"\bpr\s*\d+\b"],
  ),
  rollback: vocab(&["revert", "rollback", "roll back", "undo"], &[]),
  architectural: vocab(
    &["architect", "restructure", "redesign", "overhaul", "reorganize"],
    &[],
  ),
  feature: vocab(&["add", "implement", "introduce", "feature"], &[r"^feat\b"]),
  bug_fix: vocab(
    &["fix", "bug", "error", "crash", "hotfix", "patch", "issue", "resolve", "broken"],
    &[r"^fix\b"],
  ),
  documentation: vocab(
    &["docs", "documentation", "readme", "changelog", "license", "docstring"],
    &[r"^docs?\b"],
  ),
  test: vocab(&["test", "coverage", "e2e"], &[r"^tests?\b"]),
  configuration: vocab(
    &[
      "config", "build", "pipeline", "docker", "workflow", "makefile", "webpack", "eslint",
      "prettier", "settings", "env", "yaml", "toml",
    ],
    &[r"\bci\b"],
  ),
  refactoring: vocab(
    &["refactor", "cleanup", "clean up", "simplify", "rename", "extract", "rework", "tidy"],
    &[],
  ),
  maintenance: vocab(
    &[
      "chore", "bump", "upgrade", "dependency", "dependencies", "deps", "release", "version",
      "maintenance", "deprecate",
    ],
    &[r"^chore\b"],
  ),
});

static DEFAULT_CLASSIFIER: Lazy<SsmClassifier> =
  Lazy::new(|| SsmClassifier::new(&SsmConfig::default()));

/// The rule cascade, parameterized by the numeric fallbacks in [`SsmConfig`].
#[derive(Debug, Clone)]
pub struct SsmClassifier {
  rules: Vec<Rule>,
}

impl SsmClassifier {
  pub fn new(config: &SsmConfig) -> Self {
    let v = &*VOCABULARY;
    let msg = |patterns: &Vec<Pattern>| Predicate::Message(patterns.clone());
    let rules = vec![
      Rule { name: "integration", predicate: msg(&v.integration), category: SsmCategory::Integration },
      Rule { name: "rollback", predicate: msg(&v.rollback), category: SsmCategory::Rollback },
      Rule { name: "architectural", predicate: msg(&v.architectural), category: SsmCategory::Architectural },
      Rule { name: "feature", predicate: msg(&v.feature), category: SsmCategory::Feature },
      Rule { name: "bug-fix", predicate: msg(&v.bug_fix), category: SsmCategory::BugFix },
      Rule { name: "documentation", predicate: msg(&v.documentation), category: SsmCategory::Documentation },
      Rule { name: "test", predicate: msg(&v.test), category: SsmCategory::Test },
      Rule { name: "configuration", predicate: msg(&v.configuration), category: SsmCategory::Configuration },
      Rule {
        name: "refactoring",
        predicate: Predicate::AnyOf(vec![
          msg(&v.refactoring),
          Predicate::BalancedChurn {
            min: config.refactor_ratio_min,
            max: config.refactor_ratio_max,
          },
        ]),
        category: SsmCategory::Refactoring,
      },
      Rule { name: "maintenance", predicate: msg(&v.maintenance), category: SsmCategory::Maintenance },
      Rule {
        name: "size-fallback-large",
        predicate: Predicate::ChurnAbove(config.architectural_min_churn),
        category: SsmCategory::Architectural,
      },
      Rule {
        name: "size-fallback-medium",
        predicate: Predicate::ChurnAbove(config.trivial_min_churn),
        category: SsmCategory::Trivial,
      },
      Rule { name: "size-fallback-small", predicate: Predicate::Always, category: SsmCategory::Trivial },
    ];
    Self { rules }
  }

  /// Rules in evaluation order.
  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  /// First rule that holds for the given message and line counts.
  pub fn matching_rule(&self, message: &str, additions: u64, deletions: u64) -> Option<&Rule> {
    let msg = NormalizedMessage::new(message);
    let tokens = msg.tokens();
    self
      .rules
      .iter()
      .find(|r| r.predicate.holds(&msg, &tokens, additions, deletions))
  }

  pub fn classify(&self, message: &str, additions: u64, deletions: u64) -> SsmCategory {
    self
      .matching_rule(message, additions, deletions)
      .map(|r| r.category)
      .unwrap_or(SsmCategory::Trivial)
  }

  pub fn classify_commit(&self, commit: &Commit) -> SsmCategory {
    self.classify(&commit.message, commit.additions, commit.deletions)
  }
}

impl Default for SsmClassifier {
  fn default() -> Self {
    DEFAULT_CLASSIFIER.clone()
  }
}

/// SSM category with the default thresholds.
pub fn ssm_category(commit: &Commit) -> SsmCategory {
  DEFAULT_CLASSIFIER.classify_commit(commit)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn classify(message: &str, additions: u64, deletions: u64) -> SsmCategory {
    SsmClassifier::default().classify(message, additions, deletions)
  }

  #[test]
  fn cascade_order_is_fixed() {
    let names: Vec<&str> = SsmClassifier::default().rules().iter().map(|r| r.name).collect();
    assert_eq!(
      names,
      vec![
        "integration",
        "rollback",
        "architectural",
        "feature",
        "bug-fix",
        "documentation",
        "test",
        "configuration",
        "refactoring",
        "maintenance",
        "size-fallback-large",
        "size-fallback-medium",
        "size-fallback-small",
      ]
    );
    assert!(matches!(
      SsmClassifier::default().rules().last().map(|r| &r.predicate),
      Some(Predicate::Always)
    ));
  }

  #[test]
  fn integration_beats_bug_fix() {
    assert_eq!(classify("fix merge conflict", 3, 3), SsmCategory::Integration);
    assert_eq!(classify("Merge pull request #42", 0, 0), SsmCategory::Integration);
    assert_eq!(classify("PR #17 follow-up", 1, 0), SsmCategory::Integration);
  }

  #[test]
  fn vocabulary_rules() {
    assert_eq!(classify("Revert \"bump lodash\"", 2, 2), SsmCategory::Rollback);
    assert_eq!(classify("Restructure services layer", 5, 1), SsmCategory::Architectural);
    assert_eq!(classify("feat(ui): dark mode", 40, 2), SsmCategory::Feature);
    assert_eq!(classify("Implement OAuth login", 40, 2), SsmCategory::Feature);
    assert_eq!(classify("fix(api): handle null token", 12, 3), SsmCategory::BugFix);
    assert_eq!(classify("Resolve crash on startup", 1, 1), SsmCategory::BugFix);
    assert_eq!(classify("docs: usage section", 30, 0), SsmCategory::Documentation);
    assert_eq!(classify("Update README", 3, 1), SsmCategory::Documentation);
    assert_eq!(classify("tests: cover parser", 30, 0), SsmCategory::Test);
    assert_eq!(classify("Update CI workflow", 3, 1), SsmCategory::Configuration);
    assert_eq!(classify("Simplify token parsing", 10, 30), SsmCategory::Refactoring);
    assert_eq!(classify("chore: bump serde", 4, 1), SsmCategory::Maintenance);
  }

  #[test]
  fn partial_words_reach_early_rules() {
    assert_eq!(classify("add REST endpoint", 10, 0), SsmCategory::Architectural);
    assert_eq!(classify("set default timeout", 2, 1), SsmCategory::Configuration);
  }

  #[test]
  fn balanced_churn_is_refactoring() {
    assert_eq!(classify("tweak parser", 100, 90), SsmCategory::Refactoring);
    assert_ne!(classify("tweak parser", 100, 40), SsmCategory::Refactoring);
  }

  #[test]
  fn ratio_bounds_are_exclusive() {
    assert_ne!(classify("tweak parser", 100, 70), SsmCategory::Refactoring);
    assert_ne!(classify("tweak parser", 100, 130), SsmCategory::Refactoring);
    assert_eq!(classify("tweak parser", 100, 71), SsmCategory::Refactoring);
    // No additions means no ratio.
    assert_ne!(classify("tweak parser", 0, 50), SsmCategory::Refactoring);
  }

  #[test]
  fn size_fallbacks() {
    assert_eq!(classify("tweak parser", 101, 0), SsmCategory::Architectural);
    assert_eq!(classify("tweak parser", 100, 0), SsmCategory::Trivial);
    assert_eq!(classify("tweak parser", 21, 0), SsmCategory::Trivial);
    assert_eq!(classify("tweak parser", 0, 0), SsmCategory::Trivial);
  }

  #[test]
  fn thresholds_are_configurable() {
    let classifier = SsmClassifier::new(&SsmConfig {
      refactor_ratio_min: 0.3,
      architectural_min_churn: 500,
      ..SsmConfig::default()
    });
    assert_eq!(classifier.classify("tweak parser", 100, 40), SsmCategory::Refactoring);
    assert_eq!(classifier.classify("tweak parser", 300, 0), SsmCategory::Trivial);
  }

  #[test]
  fn matching_rule_names_the_reason() {
    let classifier = SsmClassifier::default();
    let rule = classifier.matching_rule("tweak parser", 100, 90).unwrap();
    assert_eq!(rule.name, "refactoring");
    let rule = classifier.matching_rule("tweak parser", 5, 0).unwrap();
    assert_eq!(rule.name, "size-fallback-small");
  }
}
