//! Free-form version string parser
//!
//! Converts inconsistently formatted version strings into a [`VersionTuple`]:
//!
//! - `1.2.3`, `v1.2.3`, `Version 1.2.3`, `Firefox 91.0.2` -> `(1, 2, 3)` / `(91, 0, 2)`
//! - `1.0.0-beta` -> `(1, 0, 0, 0)`, `2.3.4-alpha.1` -> `(2, 3, 4, 1)`
//! - `1.0.0 (4512)`, `1.0 build 4512`, `1.0-dev-4512` -> build number appended
//! - `1.0.0+build.7` -> `(1, 0, 0)` (semver build metadata is discarded)
//! - `2024-03-15` -> `(2024, 3, 15)`
//! - empty text -> `(0, 0, 0)`; text without digits -> `None`

use std::sync::LazyLock;

use regex::Regex;

use crate::version::prerelease::{detect_prerelease, is_attached};
use crate::version::types::{ParsedVersion, PrereleaseSuffix, VersionTuple};

/// Minimum number of components in a parsed release
const MIN_COMPONENTS: usize = 3;

static PARSER: LazyLock<VersionParser> = LazyLock::new(VersionParser::new);

/// Parse a raw version string into its flattened numeric tuple
///
/// `None` stays `None`; empty or whitespace-only text becomes `(0, 0, 0)`;
/// text with no digits at all yields `None`.
pub fn parse_version(raw: Option<&str>) -> Option<VersionTuple> {
    parse_detailed(raw).map(|parsed| parsed.to_tuple())
}

/// Parse a raw version string, keeping prerelease and build information separate
pub fn parse_detailed(raw: Option<&str>) -> Option<ParsedVersion> {
    PARSER.parse(raw?)
}

/// True when `raw` has content but no digit any pattern can anchor on
pub fn is_malformed(raw: &str) -> bool {
    !raw.trim().is_empty() && PARSER.parse(raw).is_none()
}

/// Extraction pattern applied to prefix-stripped text
struct Pattern {
    name: &'static str,
    regex: Regex,
}

/// Parser holding the compiled normalization and extraction patterns
pub struct VersionParser {
    /// Semver build metadata: `1.0.0+build.1`, `1.0.0-beta+exp`
    build_metadata_re: Regex,
    /// Anything outside word chars, whitespace, `.`, `(`, `)` and `-`
    disallowed_re: Regex,
    /// Extraction patterns, most specific first
    patterns: Vec<Pattern>,
    /// App-style build numbers following the numeric part
    build_number_re: Regex,
    digit_run_re: Regex,
}

impl VersionParser {
    pub fn new() -> Self {
        let pattern = |name, re: &str| Pattern {
            name,
            regex: Regex::new(re).unwrap(),
        };

        Self {
            build_metadata_re: Regex::new(r"\+[\w.\-]*").unwrap(),
            disallowed_re: Regex::new(r"[^\w\s.()\-]").unwrap(),
            patterns: vec![
                // 1.2.3, 1.2.3.4, 1.2.3-beta.1
                pattern("semantic", r"^(\d+)\.(\d+)\.(\d+)((?:\.\d+)*)"),
                // 1.2
                pattern("major_minor", r"^(\d+)\.(\d+)"),
                // 12 (4A5), 12.1 (21C52)
                pattern("mac", r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?\s*\(\w+\)"),
                // 2024-03, 2024-03-15
                pattern("date", r"^(\d{4})-(\d{1,2})(?:-(\d{1,2}))?"),
                // 7
                pattern("integer", r"^(\d+)"),
            ],
            build_number_re: Regex::new(r"\((\d+)\)|\bbuild\s*(\d+)|-dev-(\d+)").unwrap(),
            digit_run_re: Regex::new(r"\d+").unwrap(),
        }
    }

    /// Parse one version string; see [`parse_version`] for the contract
    pub fn parse(&self, raw: &str) -> Option<ParsedVersion> {
        if raw.trim().is_empty() {
            return Some(ParsedVersion::zero());
        }

        let normalized = self.normalize(raw);
        let text = strip_app_prefix(&normalized);
        let prerelease = detect_prerelease(text);

        let Some((mut release, rest)) = self.match_pattern(text) else {
            // No anchored pattern: take every digit run in order
            let mut release: Vec<u64> = self
                .digit_run_re
                .find_iter(text)
                .map(|m| parse_component(m.as_str()))
                .collect();
            if release.is_empty() {
                return None;
            }
            pad(&mut release);
            return Some(ParsedVersion {
                release,
                prerelease,
                prerelease_component: None,
                build: None,
            });
        };
        pad(&mut release);

        let prerelease_component = is_attached(rest).then(|| {
            match detect_prerelease(rest).and_then(|p| p.suffix) {
                Some(PrereleaseSuffix::Number(n)) => n,
                _ => 0,
            }
        });

        let build = if prerelease_component.is_some() {
            None
        } else {
            self.extract_build_number(rest)
        };

        Some(ParsedVersion {
            release,
            prerelease,
            prerelease_component,
            build,
        })
    }

    /// Trim, lowercase, drop semver build metadata and disallowed characters
    fn normalize(&self, raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();
        let without_metadata = self.build_metadata_re.replace_all(&lowered, "");
        self.disallowed_re
            .replace_all(&without_metadata, "")
            .trim()
            .to_string()
    }

    /// Apply extraction patterns in order and return the captured components
    /// together with the text following the last captured number
    fn match_pattern<'t>(&self, text: &'t str) -> Option<(Vec<u64>, &'t str)> {
        self.patterns.iter().find_map(|pattern| {
            let caps = pattern.regex.captures(text)?;
            let mut components = Vec::new();
            let mut end = 0;

            for group in caps.iter().skip(1).flatten() {
                // The semantic pattern's tail group holds extra `.n` components
                components.extend(
                    self.digit_run_re
                        .find_iter(group.as_str())
                        .map(|m| parse_component(m.as_str())),
                );
                end = end.max(group.end());
            }

            tracing::trace!(pattern = pattern.name, ?components, "version pattern matched");
            Some((components, &text[end..]))
        })
    }

    fn extract_build_number(&self, rest: &str) -> Option<u64> {
        let caps = self.build_number_re.captures(rest)?;
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| parse_component(m.as_str()))
    }
}

impl Default for VersionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip an application-name prefix such as `firefox `, `google chrome `,
/// `version ` or `v` before the first digit
///
/// A prefix containing parentheses is kept, so `(1234)` is not mistaken for
/// a plain number.
fn strip_app_prefix(text: &str) -> &str {
    let Some(first_digit) = text.find(|c: char| c.is_ascii_digit()) else {
        return text;
    };
    let prefix = &text[..first_digit];
    if prefix.contains(['(', ')']) {
        text
    } else {
        &text[first_digit..]
    }
}

fn parse_component(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

fn pad(components: &mut Vec<u64>) {
    if components.len() < MIN_COMPONENTS {
        components.resize(MIN_COMPONENTS, 0);
    }
}
