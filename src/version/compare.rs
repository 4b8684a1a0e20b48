//! Total ordering over free-form versions
//!
//! Rules, in precedence order:
//!
//! 1. Unset: both unset are equal, an unset side is lower
//! 2. Malformed (text without digits): both malformed are equal, a malformed side is lower
//! 3. Empty text: both empty are equal, an empty side is lower
//! 4. Prerelease (either side has a marker): see [`compare_parsed`]
//! 5. Otherwise: zero-padded component-wise comparison
//!
//! Comparison never fails; every input shape maps to one of the three orderings.

use std::cmp::Ordering;

use serde::Serialize;

use crate::version::parser::{parse_detailed, parse_version};
use crate::version::prerelease::compare_prerelease_suffixes;
use crate::version::types::{ParsedVersion, PrereleaseKind, VersionInput, VersionTuple};

/// Kind of change between two versions, by the first differing component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionChange {
    MajorUpdate,
    MinorUpdate,
    PatchUpdate,
    /// Change past the patch component, or a decrease
    Updated,
    Unchanged,
}

/// An operand after null/malformed/empty classification
enum Operand {
    Unset,
    Malformed,
    Empty,
    Version(ParsedVersion),
}

impl Operand {
    fn classify(input: &VersionInput<'_>) -> Self {
        match input {
            VersionInput::Unset => Operand::Unset,
            VersionInput::Malformed => Operand::Malformed,
            // Empty text is never malformed, so checking it first keeps rule order
            VersionInput::Text(text) if text.trim().is_empty() => Operand::Empty,
            VersionInput::Text(text) => {
                parse_detailed(Some(text)).map_or(Operand::Malformed, Operand::Version)
            }
            VersionInput::Tuple(tuple) => Operand::Version(ParsedVersion {
                release: tuple.components().to_vec(),
                prerelease: None,
                prerelease_component: None,
                build: None,
            }),
        }
    }
}

/// Order two version operands
pub fn compare<'a, 'b>(
    left: impl Into<VersionInput<'a>>,
    right: impl Into<VersionInput<'b>>,
) -> Ordering {
    let left = Operand::classify(&left.into());
    let right = Operand::classify(&right.into());

    match (left, right) {
        (Operand::Unset, Operand::Unset) => Ordering::Equal,
        (Operand::Unset, _) => Ordering::Less,
        (_, Operand::Unset) => Ordering::Greater,
        (Operand::Malformed, Operand::Malformed) => Ordering::Equal,
        (Operand::Malformed, _) => Ordering::Less,
        (_, Operand::Malformed) => Ordering::Greater,
        (Operand::Empty, Operand::Empty) => Ordering::Equal,
        (Operand::Empty, _) => Ordering::Less,
        (_, Operand::Empty) => Ordering::Greater,
        (Operand::Version(left), Operand::Version(right)) => compare_parsed(&left, &right),
    }
}

/// [`compare`] as `-1`, `0` or `1`
pub fn compare_versions<'a, 'b>(
    left: impl Into<VersionInput<'a>>,
    right: impl Into<VersionInput<'b>>,
) -> i8 {
    match compare(left, right) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Order two parsed versions
///
/// Without prerelease markers the flattened tuples are compared. When either
/// side has a marker, the side without one ranks as `final` and:
///
/// - if both sides are prerelease, the stage rank decides first, then the
///   release components, then the suffix. This means `1.0.0-beta` sorts
///   after `2.0.0-alpha`.
/// - otherwise the release components decide first, then the stage rank,
///   then the suffix.
pub fn compare_parsed(left: &ParsedVersion, right: &ParsedVersion) -> Ordering {
    if !left.is_prerelease() && !right.is_prerelease() {
        return left.to_tuple().cmp_padded(&right.to_tuple());
    }

    let rank = |parsed: &ParsedVersion| {
        parsed
            .prerelease
            .as_ref()
            .map_or(PrereleaseKind::Final, |p| p.kind)
            .rank()
    };
    let suffix = |parsed: &ParsedVersion| {
        parsed
            .prerelease
            .as_ref()
            .and_then(|p| p.suffix.as_ref())
            .cloned()
    };

    let by_base = || left.base().cmp_padded(&right.base());
    let by_rank = || rank(left).cmp(&rank(right));
    let by_suffix = || compare_prerelease_suffixes(suffix(left).as_ref(), suffix(right).as_ref());

    if left.is_prerelease() && right.is_prerelease() {
        by_rank().then_with(by_base).then_with(by_suffix)
    } else {
        by_base().then_with(by_rank).then_with(by_suffix)
    }
}

/// True when `latest` is strictly newer than `current`
pub fn is_version_newer<'a, 'b>(
    current: impl Into<VersionInput<'a>>,
    latest: impl Into<VersionInput<'b>>,
) -> bool {
    compare(current, latest) == Ordering::Less
}

fn to_tuple(input: VersionInput<'_>) -> Option<VersionTuple> {
    match input {
        VersionInput::Unset | VersionInput::Malformed => None,
        VersionInput::Text(text) => parse_version(Some(text)),
        VersionInput::Tuple(tuple) => Some(tuple),
    }
}

/// Component-wise absolute difference after zero padding
///
/// Returns `None` if either side does not parse.
pub fn get_version_difference<'a, 'b>(
    left: impl Into<VersionInput<'a>>,
    right: impl Into<VersionInput<'b>>,
) -> Option<VersionTuple> {
    let left = to_tuple(left.into())?;
    let right = to_tuple(right.into())?;
    let len = left.len().max(right.len());

    Some(VersionTuple::new(
        (0..len).map(|i| left.get(i).abs_diff(right.get(i))).collect(),
    ))
}

/// Classify the change from `from` to `to` by the first differing component
///
/// Returns `None` if either side does not parse.
pub fn get_version_info<'a, 'b>(
    from: impl Into<VersionInput<'a>>,
    to: impl Into<VersionInput<'b>>,
) -> Option<VersionChange> {
    let from = to_tuple(from.into())?;
    let to = to_tuple(to.into())?;
    let len = from.len().max(to.len());

    let Some(index) = (0..len).find(|&i| from.get(i) != to.get(i)) else {
        return Some(VersionChange::Unchanged);
    };

    if to.get(index) < from.get(index) {
        return Some(VersionChange::Updated);
    }

    Some(match index {
        0 => VersionChange::MajorUpdate,
        1 => VersionChange::MinorUpdate,
        2 => VersionChange::PatchUpdate,
        _ => VersionChange::Updated,
    })
}
