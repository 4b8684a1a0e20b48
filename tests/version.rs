use std::cmp::Ordering;

use rstest::rstest;

use app_version_audit::version::{
    VersionInput, VersionTuple, compare, compare_versions, parse_version,
};

/// Release history in ascending order, written the way apps report it
const ASCENDING: &[&str] = &[
    "0.9",
    "1.0.0-alpha",
    "1.0.0-alpha.1",
    "1.0.0-beta",
    "1.0.0-rc.1",
    "1.0.0",
    "1.0.1",
    "1.0.1 (200)",
    "1.2",
    "v1.10.0",
    "2.0.0",
];

#[test]
fn sorting_by_compare_restores_release_order() {
    let mut shuffled: Vec<&str> = ASCENDING.iter().rev().copied().collect();
    shuffled.swap(2, 7);

    shuffled.sort_by(|a, b| compare(*a, *b));

    assert_eq!(shuffled, ASCENDING);
}

#[test]
fn compare_is_a_total_order_over_release_history() {
    for (i, a) in ASCENDING.iter().enumerate() {
        for (j, b) in ASCENDING.iter().enumerate() {
            assert_eq!(compare(*a, *b), i.cmp(&j), "{a} vs {b}");
            assert_eq!(compare(*a, *b), compare(*b, *a).reverse(), "{a} vs {b}");
        }
    }
}

#[rstest]
#[case("1.2")]
#[case("1.2.0")]
#[case("1.2.0.0")]
fn trailing_zero_components_do_not_change_ordering(#[case] version: &str) {
    assert_eq!(compare_versions(version, "1.2"), 0);
    assert_eq!(compare_versions(version, "1.2.1"), -1);
}

#[rstest]
#[case(&[1, 2, 3])]
#[case(&[10, 0, 0, 42])]
#[case(&[0, 0, 1])]
fn displayed_tuple_parses_back_to_itself(#[case] components: &[u64]) {
    let tuple = VersionTuple::new(components.to_vec());

    assert_eq!(parse_version(Some(&tuple.to_string())), Some(tuple));
}

#[test]
fn semver_build_metadata_never_affects_ordering() {
    assert_eq!(compare_versions("2.1.0+sha.1", "2.1.0+sha.2"), 0);
    assert_eq!(compare_versions("2.1.0+20240101", "2.1.0"), 0);
}

#[test]
fn app_build_numbers_break_ties() {
    assert_eq!(compare("14.2 (4512)", "14.2 (4513)"), Ordering::Less);
    assert_eq!(compare("3.2 Build 778", "3.2"), Ordering::Greater);
}

#[test]
fn unset_and_malformed_sort_before_real_versions() {
    assert_eq!(compare(None::<&str>, "unknown"), Ordering::Less);
    assert_eq!(compare("unknown", ""), Ordering::Less);
    assert_eq!(compare("", "0.0.1"), Ordering::Less);
    assert_eq!(compare("unknown", "n/a"), Ordering::Equal);
}

#[test]
fn malformed_tuple_elements_compare_as_malformed() {
    let malformed = VersionInput::from_parts(&["1", "x", "3"]);

    assert_eq!(compare(malformed, "abc"), Ordering::Equal);
    assert_eq!(
        compare(VersionInput::from_parts(&["1", "x"]), VersionTuple::from([0, 0, 1])),
        Ordering::Less
    );
}

#[test]
fn prerelease_stage_outranks_major_version_between_prereleases() {
    assert_eq!(compare_versions("1.0.0-beta", "2.0.0-alpha"), 1);
}
