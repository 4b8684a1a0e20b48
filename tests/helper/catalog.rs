//! Catalog test utilities

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use app_version_audit::catalog::{Catalog, CatalogEntry, CatalogError};

/// Failure a [`StubCatalog`] returns for a given name
#[derive(Debug, Clone, Copy)]
pub enum StubFailure {
    Timeout,
    InvalidResponse,
    Unavailable,
}

impl StubFailure {
    fn to_error(self, name: &str) -> CatalogError {
        match self {
            StubFailure::Timeout => CatalogError::Timeout(name.to_string()),
            StubFailure::InvalidResponse => {
                CatalogError::InvalidResponse(format!("Unexpected status: 502 ({name})"))
            }
            StubFailure::Unavailable => CatalogError::Unavailable("catalog offline".to_string()),
        }
    }
}

/// In-memory catalog with call accounting
#[derive(Default)]
pub struct StubCatalog {
    entries: Vec<(String, String)>,
    failures: HashMap<String, StubFailure>,
    fail_everything: Option<StubFailure>,
    delay: Option<Duration>,
    timeout: Option<Duration>,
    lookups: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: &str, version: &str) -> Self {
        self.entries.push((name.to_string(), version.to_string()));
        self
    }

    pub fn with_failure(mut self, name: &str, failure: StubFailure) -> Self {
        self.failures.insert(name.to_string(), failure);
        self
    }

    pub fn failing_with(mut self, failure: StubFailure) -> Self {
        self.fail_everything = Some(failure);
        self
    }

    /// Delay every lookup by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Highest number of lookups observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Catalog for StubCatalog {
    async fn lookup(&self, name: &str) -> Result<CatalogEntry, CatalogError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(failure) = self.fail_everything.or_else(|| self.failures.get(name).copied()) {
            return Err(failure.to_error(name));
        }

        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(entry, version)| CatalogEntry::new(entry.as_str(), version.as_str()))
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    async fn search(&self, _query: &str) -> Result<Vec<String>, CatalogError> {
        Ok(self.entries.iter().map(|(name, _)| name.clone()).collect())
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
