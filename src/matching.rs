//! Fuzzy application-name matching
//!
//! Scores names with a partial similarity ratio: the shorter name is aligned
//! against every same-length window of the longer one and the best window's
//! Indel similarity (0-100) is the score.

use tracing::debug;

pub use crate::config::DEFAULT_MATCH_THRESHOLD;

/// Normalize an application name for matching and catalog queries
///
/// Lowercases, drops a trailing `.app`, and joins words with `-` so that
/// `Google Chrome.app` and `google-chrome` compare equal.
pub fn normalize_app_name(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let stem = lowered.strip_suffix(".app").unwrap_or(&lowered);
    stem.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Number of insertions and deletions needed to turn `a` into `b`
fn indel_distance(a: &[char], b: &[char]) -> usize {
    // Longest common subsequence, two rolling rows
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    a.len() + b.len() - 2 * previous[b.len()]
}

fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (1.0 - indel_distance(a, b) as f64 / total as f64)
}

/// Partial similarity between two names, 0-100
///
/// Both names are normalized first. An empty name scores 0.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = normalize_app_name(a).chars().collect();
    let b: Vec<char> = normalize_app_name(b).chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if shorter.is_empty() {
        return 0;
    }

    let mut best = 0.0_f64;
    for window in longer.windows(shorter.len()) {
        best = best.max(ratio(&shorter, window));
        if best >= 100.0 {
            break;
        }
    }

    best.round() as u8
}

/// Return the candidate with the highest score strictly above `threshold`
///
/// On equal scores the first candidate wins, so callers should supply
/// candidates in a deterministic order.
pub fn find_best_match<I, S>(name: &str, candidates: I, threshold: u8) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut best: Option<(u8, S)> = None;

    for candidate in candidates {
        let score = partial_ratio(name, candidate.as_ref());
        if score <= threshold {
            continue;
        }
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, candidate));
        }
    }

    best.map(|(score, candidate)| {
        debug!("Matched {:?} to {:?} (score {})", name, candidate.as_ref(), score);
        candidate.as_ref().to_string()
    })
}
