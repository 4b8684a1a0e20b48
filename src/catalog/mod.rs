//! Package catalog abstraction
//!
//! The catalog knows the latest published version of each application. The
//! pipeline only talks to it through [`Catalog`], so network or process
//! access stays outside the core.
//!
//! # Modules
//!
//! - [`error`]: `CatalogError` and its transient/systemic classification
//! - [`homebrew`]: Homebrew cask API implementation

pub mod error;
pub mod homebrew;

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

pub use error::CatalogError;
pub use homebrew::HomebrewCatalog;

/// Latest known release of an application in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Catalog identifier (e.g. the Homebrew cask token)
    pub name: String,
    /// Latest version string as published by the catalog
    pub version: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Trait for looking up applications in a package catalog
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch the entry for an exact catalog name
    ///
    /// # Returns
    /// * `Ok(CatalogEntry)` - The entry with its latest version
    /// * `Err(CatalogError::NotFound)` - The catalog has no such entry
    /// * `Err(_)` - Transport failure; see [`CatalogError::is_transient`]
    async fn lookup(&self, name: &str) -> Result<CatalogEntry, CatalogError>;

    /// List catalog names that may correspond to `query`, in a stable order
    async fn search(&self, query: &str) -> Result<Vec<String>, CatalogError>;

    /// Upper bound for a single lookup; `None` uses the configured default
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
