//! Capabilities for plain-text artifacts.
//!
//! None of these define what "consistent" or "minimal" means in general;
//! they are ready-made choices for the common case of prose and code
//! comments.

use serde::Deserialize;

use crate::capability::{ConsistencyOracle, DiffMetric};
use crate::error::CapabilityError;

/// Levenshtein distance over any token sequence.
fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ta) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, tb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ta != tb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Character-level Levenshtein distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    edit_distance(&a, &b)
}

fn normalized(distance: usize, len_a: usize, len_b: usize) -> f64 {
    let longest = len_a.max(len_b);
    if longest == 0 {
        0.0
    } else {
        distance as f64 / longest as f64
    }
}

/// Character edit distance divided by the longer length; range `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedEditDistance;

impl NormalizedEditDistance {
    pub fn between(a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        normalized(edit_distance(&a, &b), a.len(), b.len())
    }
}

impl<T: AsRef<str>> DiffMetric<T> for NormalizedEditDistance {
    fn distance(&self, candidate: &T, previous: &T) -> Result<f64, CapabilityError> {
        Ok(Self::between(candidate.as_ref(), previous.as_ref()))
    }
}

/// Edit distance over whitespace-separated words, normalized like
/// [`NormalizedEditDistance`]. Rewording one word costs the same however
/// long the word is.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordEditDistance;

impl WordEditDistance {
    pub fn between(a: &str, b: &str) -> f64 {
        let a: Vec<&str> = a.split_whitespace().collect();
        let b: Vec<&str> = b.split_whitespace().collect();
        normalized(edit_distance(&a, &b), a.len(), b.len())
    }
}

impl<T: AsRef<str>> DiffMetric<T> for WordEditDistance {
    fn distance(&self, candidate: &T, previous: &T) -> Result<f64, CapabilityError> {
        Ok(Self::between(candidate.as_ref(), previous.as_ref()))
    }
}

/// One (source term, destination term) correspondence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlossaryEntry {
    pub source: String,
    pub destination: String,
}

impl GlossaryEntry {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { source: source.into(), destination: destination.into() }
    }
}

/// Rule-based oracle: a pair is consistent when, for every glossary entry,
/// the destination term occurs in `d` exactly when the source term occurs in
/// `s`.
#[derive(Debug, Clone, Default)]
pub struct GlossaryOracle {
    entries: Vec<GlossaryEntry>,
    case_sensitive: bool,
}

impl GlossaryOracle {
    pub fn new(entries: Vec<GlossaryEntry>) -> Self {
        Self { entries, case_sensitive: true }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    fn contains(&self, haystack: &str, needle: &str) -> bool {
        if self.case_sensitive {
            haystack.contains(needle)
        } else {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }
    }

    /// Entries whose two sides disagree for `(source, destination)`.
    pub fn violations<'g>(&'g self, source: &str, destination: &str) -> Vec<&'g GlossaryEntry> {
        self.entries
            .iter()
            .filter(|e| self.contains(source, &e.source) != self.contains(destination, &e.destination))
            .collect()
    }
}

impl<S, D> ConsistencyOracle<S, D> for GlossaryOracle
where
    S: AsRef<str>,
    D: AsRef<str>,
{
    fn is_consistent(&self, source: &S, destination: &D) -> Result<bool, CapabilityError> {
        Ok(self.violations(source.as_ref(), destination.as_ref()).is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("flaw", "lawn"), 2);
        // Counted in chars, not bytes.
        assert_eq!(levenshtein("日本語", "日本"), 1);
    }

    #[test]
    fn normalized_range() {
        assert_eq!(NormalizedEditDistance::between("", ""), 0.0);
        assert_eq!(NormalizedEditDistance::between("same", "same"), 0.0);
        assert_eq!(NormalizedEditDistance::between("abcd", "wxyz"), 1.0);
        assert_eq!(NormalizedEditDistance::between("abcd", "abcx"), 0.25);
    }

    #[test]
    fn word_distance_counts_words() {
        let a = "use UUID or similar";
        let b = "use UUID v4 or similar";
        assert_eq!(WordEditDistance::between(a, b), 0.2);
        assert!(WordEditDistance.distance(&a.to_string(), &a.to_string()).unwrap() == 0.0);
    }

    #[test]
    fn glossary_requires_both_sides() {
        let oracle = GlossaryOracle::new(vec![GlossaryEntry::new("v4", "v4")]);
        let d1 = "UUID v4 などを使った安全な実装に変更する";
        assert!(oracle.is_consistent(&"use UUID v4", &d1).unwrap());
        assert!(!oracle.is_consistent(&"use UUID", &d1).unwrap());
        assert!(oracle.is_consistent(&"use UUID", &"UUID などを使う").unwrap());
    }

    #[test]
    fn glossary_case_insensitive() {
        let oracle = GlossaryOracle::new(vec![GlossaryEntry::new("user id", "ユーザーID")]).case_insensitive();
        assert!(oracle.is_consistent(&"The User ID", &"ユーザーIDの生成").unwrap());
        let violations = oracle.violations("The User ID", "生成");
        assert_eq!(violations.len(), 1);
    }
}
