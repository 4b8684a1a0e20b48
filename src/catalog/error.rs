use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not found in catalog: {0}")]
    NotFound(String),

    #[error("Catalog request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The catalog cannot serve any request (missing tool, bad configuration)
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    /// Per-application failures that should be recorded and skipped.
    ///
    /// `Unavailable` is systemic and fails the whole batch; `NotFound` is an
    /// expected outcome rather than a failure.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CatalogError::Timeout(_) | CatalogError::Network(_) | CatalogError::InvalidResponse(_)
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CatalogError::Timeout(error.to_string())
        } else {
            CatalogError::Network(error)
        }
    }
}
