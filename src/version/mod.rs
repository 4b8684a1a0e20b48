//! Version parsing and ordering for free-form version strings
//!
//! Installed versions come from OS inventories and catalogs that follow no
//! single grammar. This module turns them into comparable values.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  raw text   │────▶│   Parser    │────▶│ Comparator  │
//! │ "v1.2 (45)" │     │  (tuple)    │     │ (-1, 0, 1)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                            ▼
//!                     ┌─────────────┐
//!                     │ Prerelease  │
//!                     │(side channel│
//!                     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`parser`]: normalization and pattern-based extraction
//! - [`prerelease`]: prerelease marker detection and suffix ordering
//! - [`compare`]: total ordering and version difference helpers
//! - [`types`]: `VersionTuple`, `ParsedVersion`, `VersionInput`

pub mod compare;
pub mod parser;
pub mod prerelease;
pub mod types;

pub use compare::{
    VersionChange, compare, compare_versions, get_version_difference, get_version_info,
    is_version_newer,
};
pub use parser::{is_malformed, parse_detailed, parse_version};
pub use types::{ParsedVersion, Prerelease, PrereleaseKind, PrereleaseSuffix, VersionInput, VersionTuple};
