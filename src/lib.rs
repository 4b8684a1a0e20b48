//! Detect outdated applications from free-form version strings.
//!
//! - [`version`]: parsing and total ordering of inconsistently formatted versions
//! - [`matching`]: fuzzy name matching against catalog entries
//! - [`catalog`]: catalog trait and the Homebrew implementation
//! - [`pipeline`]: concurrent batch audit of an inventory snapshot
//! - [`inventory`]: inventory snapshot loading and filtering

pub mod catalog;
pub mod config;
pub mod inventory;
pub mod logging;
pub mod matching;
pub mod pipeline;
pub mod version;
