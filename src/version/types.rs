//! Common types for version parsing and comparison

use std::cmp::Ordering;
use std::fmt;

/// Ordered numeric components of a version (major, minor, patch, build, ...)
///
/// Equality is structural. Use [`VersionTuple::cmp_padded`] for version
/// ordering, where trailing zeros are insignificant (`1.0` == `1.0.0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionTuple(Vec<u64>);

impl VersionTuple {
    pub fn new(components: Vec<u64>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Component at `index`, or 0 past the end
    pub fn get(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    /// Compare two tuples after padding the shorter one with zeros
    pub fn cmp_padded(&self, other: &Self) -> Ordering {
        let len = self.len().max(other.len());
        (0..len)
            .map(|i| self.get(i).cmp(&other.get(i)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl From<Vec<u64>> for VersionTuple {
    fn from(components: Vec<u64>) -> Self {
        Self(components)
    }
}

impl<const N: usize> From<[u64; N]> for VersionTuple {
    fn from(components: [u64; N]) -> Self {
        Self(components.to_vec())
    }
}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Prerelease stage, ranked `alpha < beta < rc < final`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrereleaseKind {
    /// `alpha` or `α`
    Alpha,
    /// `beta` or `β`
    Beta,
    /// `rc` or `γ`
    Rc,
    /// `final` or `δ`; also the implicit stage of a version with no marker
    Final,
}

impl PrereleaseKind {
    pub fn rank(&self) -> u8 {
        match self {
            PrereleaseKind::Alpha => 0,
            PrereleaseKind::Beta => 1,
            PrereleaseKind::Rc => 2,
            PrereleaseKind::Final => 3,
        }
    }

    /// Map a normalized (lowercase) keyword or Greek letter to its stage
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "alpha" | "α" => Some(PrereleaseKind::Alpha),
            "beta" | "β" => Some(PrereleaseKind::Beta),
            "rc" | "γ" => Some(PrereleaseKind::Rc),
            "final" | "δ" => Some(PrereleaseKind::Final),
            _ => None,
        }
    }
}

/// Tiebreak value following a prerelease keyword (`beta.2`, `alpha.α`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrereleaseSuffix {
    Number(u64),
    Text(String),
}

/// Prerelease marker detected in a version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prerelease {
    pub kind: PrereleaseKind,
    pub suffix: Option<PrereleaseSuffix>,
}

/// Structured result of parsing a version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    /// Numeric release components, padded to at least three
    pub release: Vec<u64>,
    /// Prerelease marker found anywhere in the string
    pub prerelease: Option<Prerelease>,
    /// Trailing component contributed by a prerelease attached to the numeric part
    pub prerelease_component: Option<u64>,
    /// App-style build number (`(1234)`, `build 1234`, `-dev-42`)
    pub build: Option<u64>,
}

impl ParsedVersion {
    /// The `0.0.0` version used for empty input
    pub fn zero() -> Self {
        Self {
            release: vec![0, 0, 0],
            prerelease: None,
            prerelease_component: None,
            build: None,
        }
    }

    /// Release components only, without prerelease or build components
    pub fn base(&self) -> VersionTuple {
        VersionTuple::new(self.release.clone())
    }

    /// Flattened tuple used for ordering
    pub fn to_tuple(&self) -> VersionTuple {
        let mut components = self.release.clone();
        components.extend(self.prerelease_component);
        components.extend(self.build);
        VersionTuple::new(components)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

/// A version operand for the comparator
///
/// Replaces runtime type inspection of "string or tuple or nothing" with an
/// explicit variant per input shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionInput<'a> {
    /// No version information at all
    Unset,
    /// Raw version text to be parsed
    Text(&'a str),
    /// Already-parsed numeric components
    Tuple(VersionTuple),
    /// Known to carry no usable version (e.g. a tuple with non-numeric parts)
    Malformed,
}

impl VersionInput<'static> {
    /// Build a tuple input from loose parts; any non-numeric part makes the
    /// whole input malformed
    pub fn from_parts<S: AsRef<str>>(parts: &[S]) -> Self {
        parts
            .iter()
            .map(|part| part.as_ref().trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map(|components| VersionInput::Tuple(VersionTuple::new(components)))
            .unwrap_or(VersionInput::Malformed)
    }
}

impl<'a> From<&'a str> for VersionInput<'a> {
    fn from(text: &'a str) -> Self {
        VersionInput::Text(text)
    }
}

impl<'a> From<&'a String> for VersionInput<'a> {
    fn from(text: &'a String) -> Self {
        VersionInput::Text(text.as_str())
    }
}

impl<'a> From<Option<&'a str>> for VersionInput<'a> {
    fn from(text: Option<&'a str>) -> Self {
        text.map_or(VersionInput::Unset, VersionInput::Text)
    }
}

impl From<VersionTuple> for VersionInput<'_> {
    fn from(tuple: VersionTuple) -> Self {
        VersionInput::Tuple(tuple)
    }
}

impl From<Option<VersionTuple>> for VersionInput<'_> {
    fn from(tuple: Option<VersionTuple>) -> Self {
        tuple.map_or(VersionInput::Unset, VersionInput::Tuple)
    }
}
