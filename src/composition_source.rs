//! # Composition Sources
//!
//! Where the composition table comes from, and how long it is kept.
//!
//! - [`HttpCompositionSource`]: the remote lookup service (`?action=list`,
//!   `?q=`, `?action=get&id=`)
//! - [`FileCompositionSource`]: a JSON table on disk, re-read on each refresh
//! - [`StaticCompositionSource`]: an in-memory table (the bundled TACO sample
//!   by default)
//!
//! [`CachedCompositionTable`] wraps any source with a time-to-live snapshot
//! shared by every resolution. A failed refresh keeps serving the previous
//! snapshot when one exists, and the source is not asked again until
//! `stale_retry` has passed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::composition::{CompositionRecord, CompositionTable};
use crate::config::{CompositionConfig, DEFAULT_STALE_RETRY_SECS};
use crate::errors::TableError;

/// Provider of composition records
#[async_trait]
pub trait CompositionSource: Send + Sync {
    /// Fetch the full table
    async fn fetch_table(&self) -> Result<CompositionTable, TableError>;

    /// Fetch one record by id
    ///
    /// The default looks the id up in a freshly fetched table.
    async fn get_record(&self, id: u32) -> Result<Option<CompositionRecord>, TableError> {
        Ok(self.fetch_table().await?.get(id).cloned())
    }

    /// Records the source itself considers matching `query`
    ///
    /// `None` when the source has no search of its own; callers then rank
    /// the full table locally.
    async fn search(&self, _query: &str) -> Result<Option<Vec<CompositionRecord>>, TableError> {
        Ok(None)
    }

    /// Short name used in logs
    fn source_name(&self) -> &str;
}

/// Build the source described by the configuration
///
/// Endpoint wins over file; with neither, the bundled table is used.
pub fn source_from_config(
    config: &CompositionConfig,
) -> Result<Arc<dyn CompositionSource>, TableError> {
    if let Some(endpoint) = &config.endpoint {
        info!("Using composition lookup service at {}", endpoint);
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        return Ok(Arc::new(HttpCompositionSource::new(endpoint, timeout)?));
    }
    if let Some(path) = &config.file {
        info!("Using composition table file {}", path.display());
        return Ok(Arc::new(FileCompositionSource::new(path.clone())));
    }
    info!("Using bundled composition table");
    Ok(Arc::new(StaticCompositionSource::bundled()?))
}

/// In-memory table
#[derive(Debug, Clone)]
pub struct StaticCompositionSource {
    table: CompositionTable,
}

impl StaticCompositionSource {
    pub fn new(table: CompositionTable) -> Self {
        Self { table }
    }

    /// The TACO sample compiled into the crate
    pub fn bundled() -> Result<Self, TableError> {
        Ok(Self::new(CompositionTable::bundled()?))
    }
}

#[async_trait]
impl CompositionSource for StaticCompositionSource {
    async fn fetch_table(&self) -> Result<CompositionTable, TableError> {
        Ok(self.table.clone())
    }

    async fn get_record(&self, id: u32) -> Result<Option<CompositionRecord>, TableError> {
        Ok(self.table.get(id).cloned())
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

/// JSON table on disk
#[derive(Debug, Clone)]
pub struct FileCompositionSource {
    path: PathBuf,
}

impl FileCompositionSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CompositionSource for FileCompositionSource {
    async fn fetch_table(&self) -> Result<CompositionTable, TableError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TableError::Unavailable(format!("Cannot read {}: {e}", self.path.display()))
        })?;
        CompositionTable::from_json(&content)
    }

    fn source_name(&self) -> &str {
        "file"
    }
}

/// Body of a lookup service answer: a bare list or an envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordsResponse {
    List(Vec<CompositionRecord>),
    Envelope {
        #[serde(alias = "data", alias = "foods")]
        records: Vec<CompositionRecord>,
    },
}

impl RecordsResponse {
    fn into_records(self) -> Vec<CompositionRecord> {
        match self {
            RecordsResponse::List(records) | RecordsResponse::Envelope { records } => records,
        }
    }
}

/// Body of an `action=get` answer
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordResponse {
    Record(CompositionRecord),
    Envelope {
        #[serde(alias = "data", alias = "food")]
        record: Option<CompositionRecord>,
    },
}

/// Remote composition lookup service
#[derive(Debug, Clone)]
pub struct HttpCompositionSource {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpCompositionSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TableError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TableError::Unavailable(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn list_params() -> Vec<(&'static str, String)> {
        vec![("action", "list".to_string())]
    }

    fn search_params(query: &str) -> Vec<(&'static str, String)> {
        vec![("q", query.trim().to_string())]
    }

    fn detail_params(id: u32) -> Vec<(&'static str, String)> {
        vec![("action", "get".to_string()), ("id", id.to_string())]
    }

    /// Body of a GET, `None` on 404
    async fn get_body(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<Option<String>, TableError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TableError::Unavailable(format!(
                "HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }
        Ok(Some(response.text().await?))
    }
}

fn parse_records(body: &str) -> Result<Vec<CompositionRecord>, TableError> {
    serde_json::from_str::<RecordsResponse>(body)
        .map(RecordsResponse::into_records)
        .map_err(|e| TableError::Malformed(format!("Unexpected record list: {e}")))
}

fn parse_record(body: &str) -> Result<Option<CompositionRecord>, TableError> {
    if body.trim().is_empty() || body.trim() == "null" {
        return Ok(None);
    }
    match serde_json::from_str::<RecordResponse>(body) {
        Ok(RecordResponse::Record(record)) => Ok(Some(record)),
        Ok(RecordResponse::Envelope { record }) => Ok(record),
        Err(e) => Err(TableError::Malformed(format!("Unexpected record: {e}"))),
    }
}

#[async_trait]
impl CompositionSource for HttpCompositionSource {
    async fn fetch_table(&self) -> Result<CompositionTable, TableError> {
        let body = self
            .get_body(&Self::list_params())
            .await?
            .ok_or_else(|| TableError::Unavailable(format!("HTTP 404 at {}", self.base_url)))?;
        if body.trim().is_empty() {
            return Err(TableError::Unavailable(
                "Lookup service returned an empty body".to_string(),
            ));
        }

        let records = parse_records(&body)?;
        if records.is_empty() {
            return Err(TableError::Unavailable(
                "Lookup service returned no records".to_string(),
            ));
        }
        debug!("Lookup service returned {} records", records.len());
        Ok(CompositionTable::new(records))
    }

    async fn get_record(&self, id: u32) -> Result<Option<CompositionRecord>, TableError> {
        match self.get_body(&Self::detail_params(id)).await? {
            Some(body) => parse_record(&body),
            None => Ok(None),
        }
    }

    async fn search(&self, query: &str) -> Result<Option<Vec<CompositionRecord>>, TableError> {
        match self.get_body(&Self::search_params(query)).await? {
            Some(body) if !body.trim().is_empty() => parse_records(&body).map(Some),
            _ => Ok(Some(Vec::new())),
        }
    }

    fn source_name(&self) -> &str {
        "http"
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    table: Arc<CompositionTable>,
    fetched_at: DateTime<Utc>,
    expires_at: Instant,
}

/// Time-to-live snapshot of a composition source
///
/// Concurrent cold-cache loads may fetch more than once; the last fetch wins.
pub struct CachedCompositionTable {
    source: Arc<dyn CompositionSource>,
    ttl: Duration,
    fetch_timeout: Duration,
    stale_retry: Duration,
    cached: RwLock<Option<CacheEntry>>,
}

impl CachedCompositionTable {
    pub fn new(source: Arc<dyn CompositionSource>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            ttl,
            fetch_timeout,
            stale_retry: Duration::from_secs(DEFAULT_STALE_RETRY_SECS),
            cached: RwLock::new(None),
        }
    }

    /// How long a stale snapshot is served after a failed refresh
    pub fn with_stale_retry(mut self, stale_retry: Duration) -> Self {
        self.stale_retry = stale_retry;
        self
    }

    pub fn from_config(
        source: Arc<dyn CompositionSource>,
        config: &CompositionConfig,
    ) -> Self {
        Self::new(
            source,
            Duration::from_secs(config.ttl_secs),
            Duration::from_secs(config.fetch_timeout_secs),
        )
        .with_stale_retry(Duration::from_secs(config.stale_retry_secs))
    }

    /// Current table, fetching it when missing or expired
    pub async fn load(&self) -> Result<Arc<CompositionTable>, TableError> {
        let stale = {
            let cached = self.cached.read().await;
            match cached.as_ref() {
                Some(entry) if Instant::now() < entry.expires_at => {
                    return Ok(Arc::clone(&entry.table));
                }
                Some(entry) => Some(entry.clone()),
                None => None,
            }
        };

        match self.fetch().await {
            Ok(table) => {
                let table = Arc::new(table);
                *self.cached.write().await = Some(CacheEntry {
                    table: Arc::clone(&table),
                    fetched_at: Utc::now(),
                    expires_at: Instant::now() + self.ttl,
                });
                info!(
                    "Loaded composition table from {} source: {} records",
                    self.source.source_name(),
                    table.len()
                );
                Ok(table)
            }
            Err(e) => match stale {
                Some(entry) => {
                    warn!(
                        "Composition table refresh failed ({}), serving snapshot from {} for {:?}",
                        e, entry.fetched_at, self.stale_retry
                    );
                    let table = Arc::clone(&entry.table);
                    *self.cached.write().await = Some(CacheEntry {
                        expires_at: Instant::now() + self.stale_retry,
                        ..entry
                    });
                    Ok(table)
                }
                None => Err(e),
            },
        }
    }

    async fn fetch(&self) -> Result<CompositionTable, TableError> {
        tokio::time::timeout(self.fetch_timeout, self.source.fetch_table())
            .await
            .map_err(|_| {
                TableError::Timeout(format!(
                    "No table from {} source after {:?}",
                    self.source.source_name(),
                    self.fetch_timeout
                ))
            })?
    }

    /// One record by id, straight from the source
    pub async fn record(&self, id: u32) -> Result<Option<CompositionRecord>, TableError> {
        tokio::time::timeout(self.fetch_timeout, self.source.get_record(id))
            .await
            .map_err(|_| TableError::Timeout(format!("No record {id} after {:?}", self.fetch_timeout)))?
    }

    /// Server-side search of the source, bounded by the fetch timeout
    pub async fn search(&self, query: &str) -> Result<Option<Vec<CompositionRecord>>, TableError> {
        tokio::time::timeout(self.fetch_timeout, self.source.search(query))
            .await
            .map_err(|_| TableError::Timeout(format!("No search results after {:?}", self.fetch_timeout)))?
    }

    /// Drop the snapshot so the next load fetches again
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// When the current snapshot was fetched
    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.cached.read().await.as_ref().map(|e| e.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    struct CountingSource {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl CompositionSource for CountingSource {
        async fn fetch_table(&self) -> Result<CompositionTable, TableError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(TableError::Unavailable("service down".to_string()));
            }
            CompositionTable::bundled()
        }

        fn source_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_reused_within_ttl() {
        let source = Arc::new(CountingSource::new());
        let cache = CachedCompositionTable::new(
            source.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(5),
        );

        let first = cache.load().await.unwrap();
        let second = cache.load().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(cache.fetched_at().await.is_some());
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_refetched() {
        let source = Arc::new(CountingSource::new());
        let cache = CachedCompositionTable::new(source.clone(), Duration::ZERO, Duration::from_secs(5));

        cache.load().await.unwrap();
        cache.load().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_snapshot() {
        let source = Arc::new(CountingSource::new());
        let cache = CachedCompositionTable::new(source.clone(), Duration::ZERO, Duration::from_secs(5));

        let fresh = cache.load().await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        let stale = cache.load().await.unwrap();
        assert!(Arc::ptr_eq(&fresh, &stale));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // the failed source is left alone while the stale snapshot is served
        let again = cache.load().await.unwrap();
        assert!(Arc::ptr_eq(&fresh, &again));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        cache.invalidate().await;
        assert!(matches!(cache.load().await, Err(TableError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_retried_after_delay() {
        let source = Arc::new(CountingSource::new());
        let cache = CachedCompositionTable::new(source.clone(), Duration::ZERO, Duration::from_secs(5))
            .with_stale_retry(Duration::ZERO);

        cache.load().await.unwrap();
        source.failing.store(true, Ordering::SeqCst);
        cache.load().await.unwrap();
        cache.load().await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    struct HangingSource;

    #[async_trait]
    impl CompositionSource for HangingSource {
        async fn fetch_table(&self) -> Result<CompositionTable, TableError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            CompositionTable::bundled()
        }

        fn source_name(&self) -> &str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn test_hanging_source_times_out() {
        let cache = CachedCompositionTable::new(
            Arc::new(HangingSource),
            Duration::from_secs(60),
            Duration::from_millis(50),
        );
        assert!(matches!(cache.load().await, Err(TableError::Timeout(_))));
        assert!(cache.search("arroz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_source_and_record_lookup() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id": 9, "description": "Chuchu, cozido"}}]"#).unwrap();

        let source = Arc::new(FileCompositionSource::new(file.path().to_path_buf()));
        let cache = CachedCompositionTable::new(source, Duration::from_secs(60), Duration::from_secs(5));

        assert_eq!(cache.load().await.unwrap().len(), 1);
        assert_eq!(cache.record(9).await.unwrap().unwrap().description, "Chuchu, cozido");
        assert!(cache.record(10).await.unwrap().is_none());
    }

    #[test]
    fn test_lookup_service_bodies() {
        let list = r#"[{"id": 1, "description": "Arroz, integral, cozido"}]"#;
        assert_eq!(parse_records(list).unwrap().len(), 1);

        let envelope = r#"{"data": [{"id": 1, "description": "A"}, {"id": 2, "description": "B"}]}"#;
        assert_eq!(parse_records(envelope).unwrap().len(), 2);
        assert!(matches!(parse_records(""), Err(TableError::Malformed(_))));
        assert!(matches!(parse_records("<html>"), Err(TableError::Malformed(_))));

        let single = r#"{"id": 5, "description": "Feijão, preto, cozido"}"#;
        assert_eq!(parse_record(single).unwrap().unwrap().id, 5);
        assert!(parse_record(r#"{"data": null}"#).unwrap().is_none());
        assert!(parse_record("null").unwrap().is_none());
    }

    #[test]
    fn test_lookup_service_params() {
        assert_eq!(
            HttpCompositionSource::detail_params(42),
            vec![("action", "get".to_string()), ("id", "42".to_string())]
        );
        assert_eq!(
            HttpCompositionSource::search_params(" arroz "),
            vec![("q", "arroz".to_string())]
        );
        assert_eq!(
            HttpCompositionSource::list_params(),
            vec![("action", "list".to_string())]
        );
    }

    #[test]
    fn test_source_from_config_defaults_to_bundled() {
        let source = source_from_config(&CompositionConfig::default()).unwrap();
        assert_eq!(source.source_name(), "static");

        let http = source_from_config(&CompositionConfig {
            endpoint: Some("https://example.test/taco/".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(http.source_name(), "http");
    }
}
