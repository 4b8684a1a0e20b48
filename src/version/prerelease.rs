//! Prerelease marker detection and suffix ordering
//!
//! Recognized markers:
//! - `alpha`, `beta`, `rc`, `final` (not as part of a larger word)
//! - Greek letters `α`, `β`, `γ`, `δ`, which rank like alpha, beta, rc, final
//!
//! A marker may carry a suffix: digits (`beta.2`, `rc1`, `beta 3`) or a
//! word (`alpha.α`, `beta.preview`).

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::version::types::{Prerelease, PrereleaseKind, PrereleaseSuffix};

/// Lowercase Greek alphabet in its fixed order, used to rank single-letter suffixes
const GREEK_ALPHABET: [char; 24] = [
    'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ',
    'τ', 'υ', 'φ', 'χ', 'ψ', 'ω',
];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\p{L}])(alpha|beta|rc|final)(?:[.\-_\s]?(\d+)|[.\-_]([\p{L}\d]+))?(?:$|[^\p{L}])")
        .unwrap()
});

static GREEK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([αβγδ])(?:[.\-_\s]?(\d+)|[.\-_](\p{Greek}))?").unwrap());

/// Matches a marker attached to the end of the numeric part: `-beta`, `.rc2`, `-α`
static ATTACHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.\-](?:alpha|beta|rc|final|[αβγδ])").unwrap());

/// Detect a prerelease marker anywhere in normalized (lowercase) version text
pub fn detect_prerelease(text: &str) -> Option<Prerelease> {
    KEYWORD_RE
        .captures(text)
        .or_else(|| GREEK_RE.captures(text))
        .and_then(|caps| {
            let kind = PrereleaseKind::from_keyword(caps.get(1)?.as_str())?;
            let suffix = match (caps.get(2), caps.get(3)) {
                (Some(digits), _) => Some(PrereleaseSuffix::Number(
                    digits.as_str().parse().unwrap_or(u64::MAX),
                )),
                (None, Some(word)) => Some(PrereleaseSuffix::Text(word.as_str().to_string())),
                (None, None) => None,
            };
            Some(Prerelease { kind, suffix })
        })
}

/// Whether `rest` (the text right after the numeric part) starts with a
/// separator followed by a prerelease marker
pub fn is_attached(rest: &str) -> bool {
    ATTACHED_RE.is_match(rest)
}

/// Position of a single Greek letter in the alphabet
fn greek_rank(text: &str) -> Option<usize> {
    let mut chars = text.chars();
    let letter = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    GREEK_ALPHABET.iter().position(|&c| c == letter)
}

/// Order two prerelease suffixes
///
/// - no suffix sorts before any suffix
/// - numbers compare numerically and sort before text
/// - text compares lexically, except that two single Greek letters compare
///   by alphabet position
pub fn compare_prerelease_suffixes(
    left: Option<&PrereleaseSuffix>,
    right: Option<&PrereleaseSuffix>,
) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(PrereleaseSuffix::Number(a)), Some(PrereleaseSuffix::Number(b))) => a.cmp(b),
        (Some(PrereleaseSuffix::Number(_)), Some(PrereleaseSuffix::Text(_))) => Ordering::Less,
        (Some(PrereleaseSuffix::Text(_)), Some(PrereleaseSuffix::Number(_))) => Ordering::Greater,
        (Some(PrereleaseSuffix::Text(a)), Some(PrereleaseSuffix::Text(b))) => {
            match (greek_rank(a), greek_rank(b)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
    }
}
