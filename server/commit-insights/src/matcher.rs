//! Fuzzy message matcher: literal phrases with bidirectional word containment, or
//! regular expressions, tested against a normalized message.

use regex::Regex;

/// Reverse containment (message token inside a pattern word) only counts for
/// tokens at least this long, so "a" or "pr" alone cannot satisfy "add" / "prepare".
pub const MIN_PARTIAL_TOKEN_LEN: usize = 3;

#[derive(Debug, Clone)]
pub enum Pattern {
  /// Every word must find a token that contains it or is contained by it.
  Phrase(String),
  /// Tested against the normalized (lowercase, punctuation-free) message.
  Regex(Regex),
}

impl Pattern {
  pub fn phrase(s: &str) -> Self {
    Self::Phrase(s.to_string())
  }

  /// Builds a regex pattern. Only called with literals from the rule tables.
  pub fn regex(re: &str) -> Result<Self, regex::Error> {
    Regex::new(re).map(Self::Regex)
  }

  pub fn is_match(&self, normalized: &str, tokens: &[&str]) -> bool {
    match self {
      Self::Phrase(phrase) => phrase_matches(phrase, tokens),
      Self::Regex(re) => re.is_match(normalized),
    }
  }
}

/// Lowercase and turn everything except letters, digits, `_` and whitespace into spaces.
pub fn normalize_message(message: &str) -> String {
  message
    .chars()
    .flat_map(char::to_lowercase)
    .map(|c| {
      if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
        c
      } else {
        ' '
      }
    })
    .collect()
}

/// A message pre-normalized once so several pattern lists can be tested cheaply.
#[derive(Debug, Clone)]
pub struct NormalizedMessage {
  text: String,
}

impl NormalizedMessage {
  pub fn new(message: &str) -> Self {
    Self {
      text: normalize_message(message),
    }
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }

  pub fn tokens(&self) -> Vec<&str> {
    self.text.split_whitespace().collect()
  }

  /// True on the first pattern that matches.
  pub fn matches_any(&self, patterns: &[Pattern]) -> bool {
    let tokens = self.tokens();
    patterns.iter().any(|p| p.is_match(&self.text, &tokens))
  }
}

/// Does `message` match any of `patterns`?
pub fn matches(message: &str, patterns: &[Pattern]) -> bool {
  NormalizedMessage::new(message).matches_any(patterns)
}

fn phrase_matches(phrase: &str, tokens: &[&str]) -> bool {
  let normalized = normalize_message(phrase);
  let mut words = normalized.split_whitespace().peekable();
  if words.peek().is_none() {
    return false;
  }
  words.all(|word| tokens.iter().any(|token| token_matches(token, word)))
}

fn token_matches(token: &str, word: &str) -> bool {
  token.contains(word) || (token.chars().count() >= MIN_PARTIAL_TOKEN_LEN && word.contains(token))
}
