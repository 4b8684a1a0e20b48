#![allow(dead_code)]

pub mod catalog;

pub use catalog::{StubCatalog, StubFailure};

pub fn apps(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, version)| (name.to_string(), version.to_string()))
        .collect()
}
