//! Lenient version comparison.
//!
//! Tag names on a repository host are free-form text, so this cannot rely on
//! strict semver parsing. Every input maps to a [`VersionKey`] and keys are
//! totally ordered:
//!
//! - a leading `v` before a digit, surrounding whitespace and `+build`
//!   metadata are ignored
//! - the release part (`1.10.2`) compares numerically, component by
//!   component, with missing trailing components treated as zero
//! - anything after the release part is a pre-release suffix; a version
//!   without a suffix sorts above the same release with one
//! - suffix tokens compare left to right: words before numbers, known words
//!   ranked `dev < alpha < beta < rc`, unknown words after `rc` in
//!   case-insensitive lexical order, numbers numerically

use std::cmp::Ordering;

/// A numeric component, stored without leading zeros so arbitrarily long
/// digit runs still compare numerically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Numeric {
    len: usize,
    digits: String,
}

impl Numeric {
    fn new(raw: &str) -> Self {
        let digits = raw.trim_start_matches('0').to_string();
        Self {
            len: digits.len(),
            digits,
        }
    }

    fn is_zero(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Token {
    Word { rank: u8, text: String },
    Number(Numeric),
}

impl Token {
    fn word(raw: &str) -> Self {
        let text = raw.to_lowercase();
        let (rank, canonical) = match text.as_str() {
            "dev" => (0, "dev"),
            "alpha" | "a" => (1, "alpha"),
            "beta" | "b" => (2, "beta"),
            "rc" | "c" | "pre" | "preview" => (3, "rc"),
            _ => return Self::Word { rank: 4, text },
        };
        Self::Word {
            rank,
            text: canonical.to_string(),
        }
    }
}

// Variant order matters: any pre-release sorts below the release.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    PreRelease(Vec<Token>),
    Release,
}

/// Normalized, totally ordered form of a version string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VersionKey {
    release: Vec<Numeric>,
    stage: Stage,
}

impl VersionKey {
    /// Parse any string into a key. Never fails.
    pub fn parse(input: &str) -> Self {
        let mut s = input.trim();
        if let Some(rest) = s.strip_prefix(['v', 'V']) {
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                s = rest;
            }
        }
        if let Some((head, _build)) = s.split_once('+') {
            s = head;
        }

        let (mut release, suffix) = split_release(s);
        while release.last().is_some_and(Numeric::is_zero) {
            release.pop();
        }

        let tokens = tokenize(suffix);
        let stage = if tokens.is_empty() {
            Stage::Release
        } else {
            Stage::PreRelease(tokens)
        };

        Self { release, stage }
    }

    /// Whether the version carries a pre-release suffix.
    pub fn is_prerelease(&self) -> bool {
        matches!(self.stage, Stage::PreRelease(_))
    }
}

/// Split `1.2.3-beta` into its numeric release components and the rest.
fn split_release(s: &str) -> (Vec<Numeric>, &str) {
    let mut release = Vec::new();
    let mut rest = s;

    loop {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end == 0 {
            break;
        }
        release.push(Numeric::new(&rest[..end]));
        rest = &rest[end..];

        match rest.strip_prefix('.') {
            Some(after) if after.starts_with(|c: char| c.is_ascii_digit()) => rest = after,
            _ => break,
        }
    }

    (release, rest)
}

fn tokenize(suffix: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = suffix.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c.is_ascii_digit() {
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !next.is_ascii_digit() {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            tokens.push(Token::Number(Numeric::new(&suffix[start..end])));
        } else if c.is_alphabetic() {
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = chars.peek() {
                if !next.is_alphabetic() {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            tokens.push(Token::word(&suffix[start..end]));
        }
        // Anything else is a separator.
    }

    tokens
}

/// Compare two version strings.
///
/// `compare(a, b) == Greater` exactly when `compare(b, a) == Less`, and
/// `compare(a, a) == Equal` for every input.
pub fn compare(a: &str, b: &str) -> Ordering {
    VersionKey::parse(a).cmp(&VersionKey::parse(b))
}

/// Whether `candidate` is strictly newer than `installed`.
pub fn is_newer(candidate: &str, installed: &str) -> bool {
    compare(candidate, installed) == Ordering::Greater
}
