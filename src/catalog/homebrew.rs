//! Homebrew cask API implementation

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::catalog::error::CatalogError;
use crate::catalog::{Catalog, CatalogEntry};
use crate::config::LOOKUP_TIMEOUT_MS;

/// Default base URL for the Homebrew formulae API
pub const DEFAULT_BASE_URL: &str = "https://formulae.brew.sh";

/// Response from `/api/cask/{token}.json`
#[derive(Debug, Deserialize)]
struct CaskResponse {
    token: String,
    version: String,
}

/// Element of `/api/cask.json`
#[derive(Debug, Deserialize)]
struct CaskSummary {
    token: String,
}

/// Catalog backed by the Homebrew cask API
pub struct HomebrewCatalog {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    /// All cask tokens, fetched on first search
    tokens: OnceCell<Vec<String>>,
}

impl HomebrewCatalog {
    /// Creates a new HomebrewCatalog with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_millis(LOOKUP_TIMEOUT_MS))
    }

    /// Creates a new HomebrewCatalog whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("app-version-audit")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            tokens: OnceCell::new(),
        }
    }

    async fn fetch_tokens(&self) -> Result<Vec<String>, CatalogError> {
        let url = format!("{}/api/cask.json", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Homebrew API returned status {}: {}", status, url);
            return Err(CatalogError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let casks: Vec<CaskSummary> = response.json().await.map_err(|e| {
            warn!("Failed to parse Homebrew cask list: {}", e);
            CatalogError::InvalidResponse(e.to_string())
        })?;

        debug!("Fetched {} cask tokens", casks.len());
        Ok(casks.into_iter().map(|c| c.token).collect())
    }
}

impl Default for HomebrewCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Tokens are lowercase words joined by `-`, optionally with `@variant`
fn is_valid_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+'))
}

#[async_trait::async_trait]
impl Catalog for HomebrewCatalog {
    async fn lookup(&self, name: &str) -> Result<CatalogEntry, CatalogError> {
        if !is_valid_token(name) {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let url = format!("{}/api/cask/{}.json", self.base_url, name);
        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        if !status.is_success() {
            warn!("Homebrew API returned status {}: {}", status, url);
            return Err(CatalogError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let cask: CaskResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Homebrew cask response: {}", e);
            CatalogError::InvalidResponse(e.to_string())
        })?;

        Ok(CatalogEntry::new(cask.token, cask.version))
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, CatalogError> {
        let Some(keyword) = query.split('-').find(|word| !word.is_empty()) else {
            return Ok(Vec::new());
        };

        let tokens = self.tokens.get_or_try_init(|| self.fetch_tokens()).await?;

        Ok(tokens
            .iter()
            .filter(|token| token.contains(keyword))
            .cloned()
            .collect())
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}
