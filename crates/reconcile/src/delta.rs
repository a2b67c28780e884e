//! Destination-side delta: what changed between `d0` and `d1`.
//!
//! Feeds the generator prompt so a model translates only the change instead
//! of the whole text.

use std::fmt;

use serde::Serialize;

/// Token granularity for the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Word,
    Char,
}

impl Granularity {
    /// Words when both texts have whitespace, chars otherwise (scripts such
    /// as Japanese are written without spaces).
    pub fn detect(old: &str, new: &str) -> Self {
        if old.contains(char::is_whitespace) && new.contains(char::is_whitespace) {
            Self::Word
        } else {
            Self::Char
        }
    }

    fn tokenize(self, text: &str) -> Vec<&str> {
        match self {
            Self::Word => text.split_whitespace().collect(),
            Self::Char => text
                .char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect(),
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Word => " ",
            Self::Char => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "text", rename_all = "snake_case")]
pub enum DeltaOp {
    Equal(String),
    Insert(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub ops: Vec<DeltaOp>,
}

impl Delta {
    pub fn is_unchanged(&self) -> bool {
        self.ops.iter().all(|op| matches!(op, DeltaOp::Equal(_)))
    }

    pub fn insertions(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DeltaOp::Insert(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn deletions(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DeltaOp::Delete(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Delta {
    /// One line per changed span: `+ inserted`, `- removed`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unchanged() {
            return write!(f, "(no change)");
        }
        let mut first = true;
        for op in &self.ops {
            let (marker, text) = match op {
                DeltaOp::Insert(text) => ('+', text),
                DeltaOp::Delete(text) => ('-', text),
                DeltaOp::Equal(_) => continue,
            };
            if !first {
                writeln!(f)?;
            }
            let trimmed = text.trim();
            if trimmed.is_empty() {
                // Whitespace-only change: quote it so it stays visible.
                write!(f, "{marker} {text:?}")?;
            } else {
                write!(f, "{marker} {trimmed}")?;
            }
            first = false;
        }
        Ok(())
    }
}

/// Token-level LCS diff from `old` to `new`, with auto-detected granularity.
pub fn destination_delta(old: &str, new: &str) -> Delta {
    diff_with(old, new, Granularity::detect(old, new))
}

/// Shared prefix and suffix are peeled off first; the remaining middle is
/// aligned with Hirschberg's algorithm, so memory stays linear in the input.
pub fn diff_with(old: &str, new: &str, granularity: Granularity) -> Delta {
    let a = granularity.tokenize(old);
    let b = granularity.tokenize(new);

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut edits: Vec<(Edit, &str)> = Vec::with_capacity(a.len().max(b.len()));
    edits.extend(a[..prefix].iter().map(|t| (Edit::Equal, *t)));
    align(&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix], &mut edits);
    edits.extend(a[a.len() - suffix..].iter().map(|t| (Edit::Equal, *t)));

    let sep = granularity.separator();
    let mut ops: Vec<DeltaOp> = Vec::new();
    for (edit, token) in edits {
        let merged = match (ops.last_mut(), edit) {
            (Some(DeltaOp::Equal(acc)), Edit::Equal)
            | (Some(DeltaOp::Insert(acc)), Edit::Insert)
            | (Some(DeltaOp::Delete(acc)), Edit::Delete) => {
                acc.push_str(sep);
                acc.push_str(token);
                true
            }
            _ => false,
        };
        if !merged {
            ops.push(match edit {
                Edit::Equal => DeltaOp::Equal(token.to_string()),
                Edit::Insert => DeltaOp::Insert(token.to_string()),
                Edit::Delete => DeltaOp::Delete(token.to_string()),
            });
        }
    }

    Delta { ops }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    Equal,
    Insert,
    Delete,
}

/// Hirschberg alignment of `a` onto `b`. Deletions are emitted before
/// insertions within a replaced span.
fn align<'t>(a: &[&'t str], b: &[&'t str], out: &mut Vec<(Edit, &'t str)>) {
    if a.is_empty() {
        out.extend(b.iter().map(|t| (Edit::Insert, *t)));
        return;
    }
    if b.is_empty() {
        out.extend(a.iter().map(|t| (Edit::Delete, *t)));
        return;
    }
    if a.len() == 1 {
        match b.iter().position(|t| *t == a[0]) {
            Some(k) => {
                out.extend(b[..k].iter().map(|t| (Edit::Insert, *t)));
                out.push((Edit::Equal, a[0]));
                out.extend(b[k + 1..].iter().map(|t| (Edit::Insert, *t)));
            }
            None => {
                out.push((Edit::Delete, a[0]));
                out.extend(b.iter().map(|t| (Edit::Insert, *t)));
            }
        }
        return;
    }

    let mid = a.len() / 2;
    let forward = lcs_lengths(a[..mid].iter(), b.iter(), b.len());
    let backward = lcs_lengths(a[mid..].iter().rev(), b.iter().rev(), b.len());

    // Split b where the two halves together keep the longest subsequence.
    let m = b.len();
    let split = (0..=m)
        .max_by_key(|&j| (forward[j] + backward[m - j], std::cmp::Reverse(j)))
        .unwrap_or(0);

    align(&a[..mid], &b[..split], out);
    align(&a[mid..], &b[split..], out);
}

/// Last row of the LCS table: `row[j]` is the LCS length of all of `a`
/// against the first `j` tokens of `b`. Two rows of memory.
fn lcs_lengths<'t, 's>(
    a: impl Iterator<Item = &'s &'t str>,
    b: impl Iterator<Item = &'s &'t str> + Clone,
    b_len: usize,
) -> Vec<usize>
where
    't: 's,
{
    let mut prev = vec![0usize; b_len + 1];
    let mut curr = vec![0usize; b_len + 1];
    for x in a {
        for (j, y) in b.clone().enumerate() {
            curr[j + 1] = if x == y { prev[j] + 1 } else { prev[j + 1].max(curr[j]) };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev
}
