//! Concurrent batch audit of installed applications
//!
//! Each `(name, installed_version)` pair goes through:
//!
//! ```text
//! name ──▶ normalize ──▶ catalog.search ──▶ fuzzy match ──▶ catalog.lookup
//!                                                               │
//! installed_version ──────────────────────▶ compare ◀───────────┘
//!                                              │
//!                                              ▼
//!                                      ApplicationRecord
//! ```
//!
//! Apps are split into contiguous batches and at most `max_workers` batches
//! run at once. A failing app is recorded with an error status. A failing
//! batch counts toward [`MAX_BATCH_ERRORS`], and reaching it aborts the audit.
//!
//! # Modules
//!
//! - [`rate_limit`]: adaptive delay shared by all workers

pub mod rate_limit;

use std::cmp::Ordering as VersionOrdering;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, CatalogEntry, CatalogError};
use crate::config::{AuditConfig, MAX_BATCH_ERRORS};
use crate::matching::{find_best_match, normalize_app_name};
use crate::version::{compare, parse_version};

pub use rate_limit::AdaptiveRateLimiter;

/// Status of an audited application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    /// Not resolved yet, or a side has no usable version
    Unknown,
    /// Installed version equals the catalog's latest
    UpToDate,
    /// Installed version is older than the catalog's latest
    Outdated,
    /// Installed version is ahead of the catalog (beta channel, dev build)
    Newer,
    /// No catalog entry for the application
    NotFound,
    /// Catalog lookup failed for this application
    Error,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Unknown => "unknown",
            AppStatus::UpToDate => "up_to_date",
            AppStatus::Outdated => "outdated",
            AppStatus::Newer => "newer",
            AppStatus::NotFound => "not_found",
            AppStatus::Error => "error",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit result for one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationRecord {
    pub name: String,
    pub installed_version: String,
    pub catalog_name: Option<String>,
    pub latest_version: Option<String>,
    pub status: AppStatus,
    pub error: Option<String>,
}

impl ApplicationRecord {
    /// A record that has not been resolved yet
    pub fn pending(name: impl Into<String>, installed_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: installed_version.into(),
            catalog_name: None,
            latest_version: None,
            status: AppStatus::Unknown,
            error: None,
        }
    }

    /// Fill in the record from its catalog resolution
    pub fn complete(self, resolution: Resolution) -> Self {
        match resolution {
            Resolution::Found(entry) => {
                let status = classify(&self.installed_version, &entry.version);
                Self {
                    catalog_name: Some(entry.name),
                    latest_version: Some(entry.version),
                    status,
                    ..self
                }
            }
            Resolution::NotFound => Self {
                status: AppStatus::NotFound,
                ..self
            },
            Resolution::TransientError(message) => self.fail(message),
        }
    }

    fn fail(self, message: String) -> Self {
        Self {
            status: AppStatus::Error,
            error: Some(message),
            ..self
        }
    }
}

/// Outcome of resolving one application against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(CatalogEntry),
    NotFound,
    /// Timeout or transport failure; recorded, not propagated
    TransientError(String),
}

/// Progress notification sent after each completed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEvent {
    pub batch_index: usize,
    pub total_batches: usize,
    pub processed: usize,
    pub outdated: usize,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Audit aborted after {failures} failed batches: {last_error}")]
    Systemic { failures: usize, last_error: String },
}

/// Map installed vs latest to a status
///
/// Either side without a usable version (empty or no digits) is `Unknown`.
fn classify(installed: &str, latest: &str) -> AppStatus {
    let usable = |version: &str| {
        let version = version.trim();
        !version.is_empty() && parse_version(Some(version)).is_some()
    };
    if !usable(installed) || !usable(latest) {
        return AppStatus::Unknown;
    }

    match compare(installed, latest) {
        VersionOrdering::Less => AppStatus::Outdated,
        VersionOrdering::Equal => AppStatus::UpToDate,
        VersionOrdering::Greater => AppStatus::Newer,
    }
}

/// A batch that stopped before resolving all of its apps
struct BatchFailure {
    /// Records resolved before the failure
    completed: Vec<ApplicationRecord>,
    /// The failing app and every app after it
    unresolved: Vec<(String, String)>,
    error: String,
}

/// Per-app resolution shared by all batch tasks
struct Resolver {
    catalog: Arc<dyn Catalog>,
    rate_limiter: Option<Arc<AdaptiveRateLimiter>>,
    match_threshold: u8,
    timeout: Duration,
    /// Set once the audit gives up; running batches stop at the next app
    abort: AtomicBool,
}

impl Resolver {
    /// Resolve every app of a batch in order
    ///
    /// Only systemic catalog errors and an aborted audit fail the batch.
    async fn resolve_batch(
        &self,
        batch: Vec<(String, String)>,
    ) -> Result<Vec<ApplicationRecord>, BatchFailure> {
        let mut records = Vec::with_capacity(batch.len());
        let mut apps = batch.into_iter();

        while let Some((name, installed_version)) = apps.next() {
            let outcome = if self.abort.load(Ordering::SeqCst) {
                Err("audit aborted".to_string())
            } else {
                self.resolve(&name).await.map_err(|e| e.to_string())
            };

            match outcome {
                Ok(resolution) => {
                    debug!("Resolved {:?} ({}): {:?}", name, installed_version, resolution);
                    records.push(
                        ApplicationRecord::pending(name, installed_version).complete(resolution),
                    );
                }
                Err(error) => {
                    let mut unresolved = vec![(name, installed_version)];
                    unresolved.extend(apps);
                    return Err(BatchFailure {
                        completed: records,
                        unresolved,
                        error,
                    });
                }
            }
        }

        Ok(records)
    }

    async fn resolve(&self, name: &str) -> Result<Resolution, CatalogError> {
        let query = normalize_app_name(name);
        if query.is_empty() {
            return Ok(Resolution::NotFound);
        }

        let candidates = match self.call(self.catalog.search(&query)).await {
            Ok(candidates) => candidates,
            Err(CatalogError::NotFound(_)) => Vec::new(),
            Err(e) if e.is_transient() => {
                warn!("Catalog search failed for {:?}: {}", name, e);
                return Ok(Resolution::TransientError(e.to_string()));
            }
            Err(e) => return Err(e),
        };

        let choice = find_best_match(&query, &candidates, self.match_threshold).unwrap_or(query);

        match self.call(self.catalog.lookup(&choice)).await {
            Ok(entry) => Ok(Resolution::Found(entry)),
            Err(CatalogError::NotFound(_)) => Ok(Resolution::NotFound),
            Err(e) if e.is_transient() => {
                warn!("Catalog lookup failed for {:?}: {}", name, e);
                Ok(Resolution::TransientError(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Run one catalog call behind the rate limiter and the lookup timeout
    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, CatalogError>>,
    ) -> Result<T, CatalogError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let result = tokio::time::timeout(self.timeout, request)
            .await
            .unwrap_or_else(|_| {
                Err(CatalogError::Timeout(format!(
                    "no response within {:?}",
                    self.timeout
                )))
            });

        if let Some(limiter) = &self.rate_limiter {
            match &result {
                Err(e) if e.is_transient() => limiter.record_failure(),
                _ => limiter.record_success(),
            }
        }

        result
    }
}

/// Batch audit pipeline over a catalog
pub struct AuditPipeline {
    catalog: Arc<dyn Catalog>,
    config: AuditConfig,
    rate_limiter: Option<Arc<AdaptiveRateLimiter>>,
    progress: Option<UnboundedSender<BatchEvent>>,
}

impl AuditPipeline {
    pub fn new(catalog: Arc<dyn Catalog>, config: AuditConfig) -> Self {
        let config = config.normalized();
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(AdaptiveRateLimiter::new(&config.rate_limit)));

        Self {
            catalog,
            config,
            rate_limiter,
            progress: None,
        }
    }

    /// Share an existing rate limiter (e.g. across several pipelines)
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<AdaptiveRateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Send a [`BatchEvent`] for every completed batch
    pub fn with_progress(mut self, sender: UnboundedSender<BatchEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    pub fn with_match_threshold(mut self, threshold: u8) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    fn resolver(&self) -> Resolver {
        Resolver {
            catalog: Arc::clone(&self.catalog),
            rate_limiter: self.rate_limiter.clone(),
            match_threshold: self.config.match_threshold,
            timeout: self
                .catalog
                .timeout()
                .unwrap_or_else(|| self.config.lookup_timeout()),
            abort: AtomicBool::new(false),
        }
    }

    /// Audit all apps and return one record per app
    ///
    /// Records are ordered with outdated apps first, then everything else,
    /// each group sorted case-insensitively by name.
    ///
    /// Fails with [`PipelineError::Systemic`] once [`MAX_BATCH_ERRORS`] batches
    /// have failed; results of completed batches are discarded in that case.
    pub async fn check_outdated(
        &self,
        apps: Vec<(String, String)>,
    ) -> Result<Vec<ApplicationRecord>, PipelineError> {
        let total_apps = apps.len();
        let batches: Vec<Vec<(String, String)>> = apps
            .chunks(self.config.batch_size)
            .map(<[_]>::to_vec)
            .collect();
        let total_batches = batches.len();

        info!(
            "Auditing {} applications in {} batches ({} workers)",
            total_apps, total_batches, self.config.max_workers
        );

        let resolver = Arc::new(self.resolver());
        let failures = AtomicUsize::new(0);

        let mut outcomes = stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| {
                let resolver = Arc::clone(&resolver);
                async move {
                    let apps = batch.clone();
                    let outcome = tokio::spawn(async move { resolver.resolve_batch(batch).await })
                        .await;
                    (index, apps, outcome)
                }
            })
            .buffer_unordered(self.config.max_workers);

        let mut records = Vec::with_capacity(total_apps);

        while let Some((index, apps, outcome)) = outcomes.next().await {
            let failure = match outcome {
                Ok(Ok(batch_records)) => {
                    self.report_batch(index, total_batches, &batch_records);
                    records.extend(batch_records);
                    continue;
                }
                Ok(Err(failure)) => failure,
                // Nothing is known about a panicked batch's apps
                Err(join_error) => BatchFailure {
                    completed: Vec::new(),
                    unresolved: apps,
                    error: format!("batch task failed: {}", join_error),
                },
            };

            let failed = failures.fetch_add(1, Ordering::SeqCst) + 1;
            error!(
                "Batch {}/{} failed ({} of {} allowed): {}",
                index + 1,
                total_batches,
                failed,
                MAX_BATCH_ERRORS,
                failure.error
            );

            if failed >= MAX_BATCH_ERRORS {
                // Detached batch tasks see this before their next catalog call
                resolver.abort.store(true, Ordering::SeqCst);
                error!("Aborting audit after {} failed batches", failed);
                return Err(PipelineError::Systemic {
                    failures: failed,
                    last_error: failure.error,
                });
            }

            records.extend(failure.completed);
            let error = failure.error;
            records.extend(failure.unresolved.into_iter().map(|(name, version)| {
                ApplicationRecord::pending(name, version).fail(error.clone())
            }));
        }

        sort_records(&mut records);
        Ok(records)
    }

    fn report_batch(&self, index: usize, total_batches: usize, records: &[ApplicationRecord]) {
        let outdated = records
            .iter()
            .filter(|r| r.status == AppStatus::Outdated)
            .count();
        info!(
            "Batch {}/{} done: {} apps, {} outdated",
            index + 1,
            total_batches,
            records.len(),
            outdated
        );

        if let Some(sender) = &self.progress {
            // A dropped receiver only means nobody is watching
            let _ = sender.send(BatchEvent {
                batch_index: index,
                total_batches,
                processed: records.len(),
                outdated,
            });
        }
    }
}

/// Outdated records first, then the rest; each group by name, ignoring case
pub fn sort_records(records: &mut [ApplicationRecord]) {
    records.sort_by_cached_key(|r| (r.status != AppStatus::Outdated, r.name.to_lowercase()));
}

/// Audit `apps` against `catalog` with default settings apart from batching
pub async fn check_outdated(
    catalog: Arc<dyn Catalog>,
    apps: Vec<(String, String)>,
    batch_size: usize,
    max_workers: usize,
) -> Result<Vec<ApplicationRecord>, PipelineError> {
    let config = AuditConfig {
        batch_size,
        max_workers,
        ..AuditConfig::default()
    };
    AuditPipeline::new(catalog, config).check_outdated(apps).await
}
