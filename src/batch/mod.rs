//! # Batch Module
//!
//! Runs the pipeline over bounded sets of stored submissions. Items are
//! processed one at a time with a pacing delay between them, and every
//! item's failure is captured in its own outcome. Only a store failure
//! aborts a batch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitecheck::batch::{BatchConfig, BatchRunner};
//! use sitecheck::checker::CheckerConfig;
//! use sitecheck::classifier::OpenAiService;
//! use sitecheck::store::Database;
//!
//! # async fn example() -> sitecheck::Result<()> {
//! let store = Database::new_from_path("sitecheck.db").await?;
//! let runner: BatchRunner<Database, OpenAiService> =
//!     BatchRunner::new(store, &CheckerConfig::default(), BatchConfig::default())?;
//!
//! for outcome in runner.run_status_batch(50).await? {
//!     println!("{} {}", outcome.url, outcome.is_success());
//! }
//! # Ok(())
//! # }
//! ```

mod pacer;

pub use pacer::Pacer;

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::checker::url_policy::screen_submission;
use crate::checker::{CheckerConfig, ContentFetcher, ProbeResult, Prober};
use crate::classifier::{Classifier, CompletionService, ScanFailure, ScanResult};
use crate::error::{Error, Result};
use crate::store::{NewSubmission, ResultStore, ScanCandidate, ScanSummary, StoreError};

/// Pacing and default sizes for batch runs
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Delay between items of a status-check batch
    pub status_pacing: Duration,

    /// Delay between items of a content-scan batch
    pub scan_pacing: Duration,

    /// Default number of records per status-check batch
    pub status_limit: usize,

    /// Default number of records per content-scan batch
    pub scan_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            status_pacing: Duration::from_millis(500),
            scan_pacing: Duration::from_secs(1),
            status_limit: 50,
            scan_limit: 5,
        }
    }
}

/// What happened to one record in a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDetail {
    /// A probe ran and its result was stored
    Status(ProbeResult),
    /// A scan ran and its result was stored
    Scan(ScanResult),
    /// Nothing was stored for this item
    Failed(String),
}

/// Per-item outcome of a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    /// ID of the record
    pub id: i64,

    /// URL of the record
    pub url: String,

    /// Success/error tag
    pub success: bool,

    /// Result detail
    pub detail: OutcomeDetail,
}

impl ItemOutcome {
    fn status(id: i64, url: String, probe: ProbeResult) -> Self {
        Self {
            id,
            url,
            success: probe.is_accessible,
            detail: OutcomeDetail::Status(probe),
        }
    }

    fn scan(id: i64, url: String, scan: ScanResult) -> Self {
        Self {
            id,
            url,
            success: scan.verdict().is_some(),
            detail: OutcomeDetail::Scan(scan),
        }
    }

    fn failed(id: i64, url: String, reason: impl Into<String>) -> Self {
        Self {
            id,
            url,
            success: false,
            detail: OutcomeDetail::Failed(reason.into()),
        }
    }

    /// Whether this item is tagged as a success
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// The failure reason, whether or not a failure marker was stored
    pub fn failure(&self) -> Option<&str> {
        match &self.detail {
            OutcomeDetail::Failed(reason) => Some(reason),
            OutcomeDetail::Scan(scan) => scan.failure(),
            OutcomeDetail::Status(_) => None,
        }
    }
}

/// Drives status-check and content-scan batches against a result store
///
/// Owns its HTTP clients and optional classifier; nothing is shared through
/// process-wide state. Without a classifier every scan operation returns
/// [`Error::ScanDisabled`].
pub struct BatchRunner<S, C> {
    store: S,
    prober: Prober,
    fetcher: ContentFetcher,
    classifier: Option<Classifier<C>>,
    config: BatchConfig,
    max_content_length: usize,
    cancel: CancellationToken,
}

impl<S: ResultStore, C: CompletionService> BatchRunner<S, C> {
    /// Create a runner with no classifier
    pub fn new(store: S, checker: &CheckerConfig, config: BatchConfig) -> Result<Self> {
        let client = checker.http_client()?;

        Ok(Self {
            store,
            prober: Prober::with_client(client.clone()),
            fetcher: ContentFetcher::with_client(client, checker),
            classifier: None,
            config,
            max_content_length: checker.max_content_length,
            cancel: CancellationToken::new(),
        })
    }

    /// Enable content scans with the given classifier
    pub fn with_classifier(mut self, classifier: Classifier<C>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops a running batch between items
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The batch configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Whether content scans are enabled
    pub fn scan_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    /// Probe up to `limit` eligible records and store each result
    ///
    /// Unreachable sites are recorded with status 0 and tagged as errors.
    /// Returns one outcome per attempted record; cancellation stops the run
    /// between items.
    #[instrument(skip(self))]
    pub async fn run_status_batch(&self, limit: usize) -> Result<Vec<ItemOutcome>> {
        let candidates = self.store.select_eligible_for_status_check(limit).await?;
        info!("Running status check on {} records", candidates.len());

        let pacer = Pacer::new(self.config.status_pacing);
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if !pacer.wait(&self.cancel).await {
                warn!("Status batch cancelled after {} items", outcomes.len());
                break;
            }

            let probe = self.prober.probe(&candidate.url).await;
            self.store.write_status(candidate.id, &probe).await?;

            if probe.is_accessible {
                info!(id = candidate.id, status = probe.status_code, "Checked {}", candidate.url);
            } else {
                warn!(
                    id = candidate.id,
                    status = probe.status_code,
                    "Site not accessible: {}",
                    candidate.url
                );
            }
            outcomes.push(ItemOutcome::status(candidate.id, candidate.url, probe));
        }

        Ok(outcomes)
    }

    /// Fetch and classify up to `limit` eligible records
    ///
    /// Fetch and classifier failures are stored as failed scans, which takes
    /// the record out of the queue; `scan_one` retries it on demand.
    /// Unparseable answers are stored as fallback results. Both are tagged
    /// as errors.
    #[instrument(skip(self))]
    pub async fn run_scan_batch(&self, limit: usize) -> Result<Vec<ItemOutcome>> {
        let classifier = self.classifier.as_ref().ok_or(Error::ScanDisabled)?;

        let candidates = self.store.select_eligible_for_scan(limit).await?;
        info!("Running AI scan on {} records", candidates.len());

        let pacer = Pacer::new(self.config.scan_pacing);
        let mut outcomes = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if !pacer.wait(&self.cancel).await {
                warn!("Scan batch cancelled after {} items", outcomes.len());
                break;
            }
            outcomes.push(self.scan_candidate(classifier, candidate).await?);
        }

        Ok(outcomes)
    }

    /// Scan one record regardless of batch eligibility
    ///
    /// The record is probed first and its status stored; only a site that
    /// answers 200 is fetched and classified. Any previous result is
    /// replaced.
    #[instrument(skip(self))]
    pub async fn scan_one(&self, id: i64) -> Result<ItemOutcome> {
        let classifier = self.classifier.as_ref().ok_or(Error::ScanDisabled)?;

        let candidate = self
            .store
            .get_scan_candidate(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("website {}", id)))?;

        let probe = self.prober.probe(&candidate.url).await;
        self.store.write_status(candidate.id, &probe).await?;
        if probe.status_code != 200 {
            warn!(id, status = probe.status_code, "Skipping scan of {}", candidate.url);
            let reason = match &probe.error_detail {
                Some(detail) => format!("site not reachable: {}", detail),
                None => format!("site returned HTTP {}", probe.status_code),
            };
            return Ok(ItemOutcome::failed(candidate.id, candidate.url, reason));
        }

        Ok(self.scan_candidate(classifier, candidate).await?)
    }

    /// Screen, store and probe a new submission
    ///
    /// The URL is normalized and screened before anything is stored;
    /// duplicates are rejected. Returns the stored record's first probe.
    #[instrument(skip(self, description))]
    pub async fn submit(
        &self,
        url: &str,
        title: &str,
        description: &str,
        category_id: Option<i64>,
    ) -> Result<ItemOutcome> {
        if title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        let url = screen_submission(url)?;

        let id = self
            .store
            .add_submission(&NewSubmission {
                url: url.clone(),
                title: title.trim().to_string(),
                description: description.trim().to_string(),
                category_id,
            })
            .await?;
        info!(id, "Stored submission {}", url);

        let probe = self.prober.probe(&url).await;
        self.store.write_status(id, &probe).await?;

        Ok(ItemOutcome::status(id, url, probe))
    }

    /// Aggregates over all scanned records
    pub async fn read_summary(&self) -> Result<ScanSummary> {
        Ok(self.store.read_summary().await?)
    }

    async fn scan_candidate(
        &self,
        classifier: &Classifier<C>,
        candidate: ScanCandidate,
    ) -> std::result::Result<ItemOutcome, StoreError> {
        let scan = match self
            .fetcher
            .fetch(&candidate.url, self.max_content_length)
            .await
        {
            Ok(content) => match classifier.classify(&content, &candidate).await {
                Ok(scan) => scan,
                Err(e) => {
                    error!(id = candidate.id, "AI analysis failed for {}: {}", candidate.url, e);
                    ScanResult::Failed(ScanFailure::now(format!("analysis failed: {}", e)))
                }
            },
            Err(e) => {
                warn!(id = candidate.id, "Could not fetch {}: {}", candidate.url, e);
                ScanResult::Failed(ScanFailure::now(format!("fetch failed: {}", e)))
            }
        };

        if !self.store.write_scan(candidate.id, &scan).await? {
            warn!(id = candidate.id, "Record changed before scan could be stored");
            return Ok(ItemOutcome::failed(
                candidate.id,
                candidate.url,
                "record changed since selection",
            ));
        }

        match &scan {
            ScanResult::Verdict(verdict) => info!(
                id = candidate.id,
                quality = verdict.content_quality,
                malicious = verdict.is_malicious,
                "Scanned {}",
                candidate.url
            ),
            ScanResult::Unparsed(_) => warn!(
                id = candidate.id,
                "Stored unparseable analysis for {}", candidate.url
            ),
            ScanResult::Failed(_) => {
                debug!(id = candidate.id, "Stored failed scan for {}", candidate.url)
            }
        }
        Ok(ItemOutcome::scan(candidate.id, candidate.url, scan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::mock::MockCompletionService;
    use crate::classifier::{ClassifierConfig, ClassifyError};
    use crate::store::{Database, ReviewStatus, StatusCandidate, StoredScan};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use mockito::{Server, ServerGuard};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    #[derive(Debug, Clone)]
    struct FakeRow {
        id: i64,
        url: String,
        title: String,
        description: String,
        category_id: Option<i64>,
        status: ReviewStatus,
        http_status: Option<u16>,
        last_checked: Option<DateTime<Utc>>,
        scan: Option<ScanResult>,
    }

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<FakeRow>>,
        fail_writes: AtomicBool,
    }

    impl FakeStore {
        fn insert(&self, url: &str, http_status: Option<u16>) -> i64 {
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            rows.push(FakeRow {
                id,
                url: url.to_string(),
                title: "Example".to_string(),
                description: "An example site".to_string(),
                category_id: None,
                status: ReviewStatus::Pending,
                http_status,
                last_checked: http_status.map(|_| Utc::now()),
                scan: None,
            });
            id
        }

        fn row(&self, id: i64) -> FakeRow {
            self.rows.lock().unwrap()[(id - 1) as usize].clone()
        }

        fn candidate(row: &FakeRow) -> ScanCandidate {
            ScanCandidate {
                id: row.id,
                url: row.url.clone(),
                title: row.title.clone(),
                description: row.description.clone(),
                category_id: row.category_id,
            }
        }

        fn check_writable(&self) -> std::result::Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Connection("store offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ResultStore for FakeStore {
        async fn add_submission(
            &self,
            submission: &NewSubmission,
        ) -> std::result::Result<i64, StoreError> {
            if self.rows.lock().unwrap().iter().any(|r| r.url == submission.url) {
                return Err(StoreError::Duplicate(submission.url.clone()));
            }
            Ok(self.insert(&submission.url, None))
        }

        async fn select_eligible_for_status_check(
            &self,
            limit: usize,
        ) -> std::result::Result<Vec<StatusCandidate>, StoreError> {
            let cutoff = Utc::now() - chrono::Duration::hours(24);
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.last_checked.is_none_or(|at| at < cutoff))
                .take(limit)
                .map(|r| StatusCandidate {
                    id: r.id,
                    url: r.url.clone(),
                })
                .collect())
        }

        async fn select_eligible_for_scan(
            &self,
            limit: usize,
        ) -> std::result::Result<Vec<ScanCandidate>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|r| {
                    r.status == ReviewStatus::Pending
                        && r.scan.is_none()
                        && r.http_status == Some(200)
                })
                .take(limit)
                .map(Self::candidate)
                .collect())
        }

        async fn get_scan_candidate(
            &self,
            id: i64,
        ) -> std::result::Result<Option<ScanCandidate>, StoreError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .map(Self::candidate))
        }

        async fn write_status(
            &self,
            id: i64,
            probe: &ProbeResult,
        ) -> std::result::Result<(), StoreError> {
            self.check_writable()?;
            if let Some(row) = self.rows.lock().unwrap().iter_mut().find(|r| r.id == id) {
                row.http_status = Some(probe.status_code);
                row.last_checked = Some(probe.checked_at);
            }
            Ok(())
        }

        async fn write_scan(
            &self,
            id: i64,
            scan: &ScanResult,
        ) -> std::result::Result<bool, StoreError> {
            self.check_writable()?;
            let mut rows = self.rows.lock().unwrap();
            match rows
                .iter_mut()
                .find(|r| r.id == id && r.http_status == Some(200))
            {
                Some(row) => {
                    row.scan = Some(scan.clone());
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn read_scan(&self, id: i64) -> std::result::Result<Option<StoredScan>, StoreError> {
            Ok(self.row(id).scan.map(|analysis| StoredScan {
                analysis,
                scan_at: Some(Utc::now()),
            }))
        }

        async fn read_summary(&self) -> std::result::Result<ScanSummary, StoreError> {
            let rows = self.rows.lock().unwrap();
            let verdicts: Vec<_> = rows
                .iter()
                .filter_map(|r| r.scan.as_ref().and_then(ScanResult::verdict))
                .collect();
            Ok(ScanSummary {
                total_scanned: rows.iter().filter(|r| r.scan.is_some()).count() as u64,
                avg_content_quality: None,
                malicious_count: verdicts.iter().filter(|v| v.is_malicious).count() as u64,
                adult_content_count: verdicts.iter().filter(|v| v.is_adult_content).count() as u64,
            })
        }
    }

    fn test_checker_config() -> CheckerConfig {
        CheckerConfig::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .build()
    }

    fn unpaced() -> BatchConfig {
        BatchConfig {
            status_pacing: Duration::ZERO,
            scan_pacing: Duration::ZERO,
            ..BatchConfig::default()
        }
    }

    fn runner<S: ResultStore>(
        store: S,
        service: &MockCompletionService,
    ) -> BatchRunner<S, MockCompletionService> {
        BatchRunner::new(store, &test_checker_config(), unpaced())
            .unwrap()
            .with_classifier(Classifier::new(
                service.clone(),
                ClassifierConfig::default(),
            ))
    }

    /// A URL on a port nothing listens on
    async fn refused_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/", addr)
    }

    async fn serve_page(server: &mut ServerGuard, path: &str, title: &str) {
        server
            .mock("HEAD", path)
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(format!(
                "<html><head><title>{}</title></head><body><p>Welcome</p></body></html>",
                title
            ))
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn test_status_batch_isolates_failures() {
        let mut server = Server::new_async().await;
        serve_page(&mut server, "/one", "One").await;
        serve_page(&mut server, "/three", "Three").await;

        let store = FakeStore::default();
        store.insert(&format!("{}/one", server.url()), None);
        store.insert(&refused_url().await, None);
        store.insert(&format!("{}/three", server.url()), None);

        let runner = runner(store, &MockCompletionService::new());
        let outcomes = runner.run_status_batch(3).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[2].is_success());

        match &outcomes[1].detail {
            OutcomeDetail::Status(probe) => {
                assert_eq!(probe.status_code, 0);
                assert!(probe.error_detail.as_deref().is_some_and(|d| !d.is_empty()));
            }
            other => panic!("Expected status outcome, got {:?}", other),
        }

        let store = runner.store();
        assert_eq!(store.row(1).http_status, Some(200));
        assert_eq!(store.row(2).http_status, Some(0));
        assert_eq!(store.row(3).http_status, Some(200));
    }

    #[tokio::test]
    async fn test_status_batch_respects_limit() {
        let store = FakeStore::default();
        for _ in 0..3 {
            store.insert(&refused_url().await, None);
        }

        let runner = runner(store, &MockCompletionService::new());
        let outcomes = runner.run_status_batch(2).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(runner.store().row(3).http_status, None);
    }

    #[tokio::test]
    async fn test_unreachable_status_is_repeatable() {
        let store = FakeStore::default();
        let id = store.insert(&refused_url().await, None);

        let runner = runner(store, &MockCompletionService::new());
        let first = runner.run_status_batch(5).await.unwrap();

        // Make the record eligible again
        runner.store().rows.lock().unwrap()[(id - 1) as usize].last_checked = None;
        let second = runner.run_status_batch(5).await.unwrap();

        for outcomes in [&first, &second] {
            assert_eq!(outcomes.len(), 1);
            match &outcomes[0].detail {
                OutcomeDetail::Status(probe) => {
                    assert_eq!(probe.status_code, 0);
                    assert!(!probe.is_accessible);
                    assert!(probe.error_detail.is_some());
                }
                other => panic!("Expected status outcome, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_scan_batch_isolates_classifier_failure() {
        let mut server = Server::new_async().await;
        for path in ["/a", "/b", "/c"] {
            serve_page(&mut server, path, "Page").await;
        }

        let store = FakeStore::default();
        for path in ["/a", "/b", "/c"] {
            store.insert(&format!("{}{}", server.url(), path), Some(200));
        }

        let service = MockCompletionService::new();
        service.push_response(r#"{"content_quality": 7}"#).await;
        service
            .push_error(ClassifyError::Transport("connection reset".to_string()))
            .await;
        service.push_response(r#"{"content_quality": 9}"#).await;

        let runner = runner(store, &service);
        let outcomes = runner.run_scan_batch(3).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
        assert!(outcomes[1].failure().unwrap().contains("connection reset"));
        assert!(outcomes[2].is_success());

        let store = runner.store();
        assert!(store.row(1).scan.as_ref().is_some_and(|s| s.verdict().is_some()));
        let failed = store.row(2).scan.unwrap();
        assert!(failed.failure().unwrap().starts_with("analysis failed"));
        assert!(store.row(3).scan.as_ref().is_some_and(|s| s.verdict().is_some()));
        assert_eq!(service.requests().await.len(), 3);

        // Nothing is left in the queue
        assert!(runner.run_scan_batch(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_batch_stores_unparsed_answer() {
        let mut server = Server::new_async().await;
        serve_page(&mut server, "/", "Home").await;

        let store = FakeStore::default();
        store.insert(&format!("{}/", server.url()), Some(200));

        let service = MockCompletionService::new();
        service.push_response("I cannot analyze this site.").await;

        let runner = runner(store, &service);
        let outcomes = runner.run_scan_batch(5).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].is_success());
        match runner.store().row(1).scan {
            Some(ScanResult::Unparsed(unparsed)) => {
                assert_eq!(unparsed.raw_response, "I cannot analyze this site.");
            }
            other => panic!("Expected unparsed result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_batch_fetch_failure_skips_classifier() {
        let store = FakeStore::default();
        store.insert(&refused_url().await, Some(200));

        let service = MockCompletionService::new();
        let runner = runner(store, &service);
        let outcomes = runner.run_scan_batch(5).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].failure().unwrap().starts_with("fetch failed"));
        assert!(service.requests().await.is_empty());
        match runner.store().row(1).scan {
            Some(ScanResult::Failed(failure)) => assert!(failure.reason.starts_with("fetch failed")),
            other => panic!("Expected failed scan, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_scan_batch_skips_reviewed_records() {
        let store = FakeStore::default();
        let id = store.insert("https://example.org/", Some(200));
        store.rows.lock().unwrap()[(id - 1) as usize].status = ReviewStatus::Approved;

        let service = MockCompletionService::new();
        let runner = runner(store, &service);

        assert!(runner.run_scan_batch(5).await.unwrap().is_empty());
        assert!(service.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_scan_disabled_without_classifier() {
        let store = FakeStore::default();
        store.insert("https://example.org/", Some(200));

        let runner: BatchRunner<FakeStore, MockCompletionService> =
            BatchRunner::new(store, &test_checker_config(), unpaced()).unwrap();

        assert!(!runner.scan_enabled());
        assert!(matches!(
            runner.run_scan_batch(5).await,
            Err(Error::ScanDisabled)
        ));
        assert!(matches!(runner.scan_one(1).await, Err(Error::ScanDisabled)));
    }

    #[tokio::test]
    async fn test_store_failure_aborts_batch() {
        let store = FakeStore::default();
        store.insert(&refused_url().await, None);
        store.fail_writes.store(true, Ordering::SeqCst);

        let runner = runner(store, &MockCompletionService::new());
        let result = runner.run_status_batch(5).await;

        assert!(matches!(result, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn test_cancelled_batch_attempts_nothing() {
        let store = FakeStore::default();
        store.insert(&refused_url().await, None);

        let runner = runner(store, &MockCompletionService::new());
        runner.cancellation_token().cancel();

        let outcomes = runner.run_status_batch(5).await.unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(runner.store().row(1).http_status, None);
    }

    #[tokio::test]
    async fn test_pacing_spaces_items() {
        let store = FakeStore::default();
        for _ in 0..3 {
            store.insert(&refused_url().await, None);
        }

        let config = BatchConfig {
            status_pacing: Duration::from_millis(100),
            ..unpaced()
        };
        let runner: BatchRunner<FakeStore, MockCompletionService> =
            BatchRunner::new(store, &test_checker_config(), config).unwrap();

        let start = std::time::Instant::now();
        let outcomes = runner.run_status_batch(3).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_scan_one_replaces_previous_result() {
        let mut server = Server::new_async().await;
        serve_page(&mut server, "/", "Home").await;

        let store = FakeStore::default();
        let id = store.insert(&format!("{}/", server.url()), Some(200));

        let service = MockCompletionService::new();
        service.push_response(r#"{"summary": "first"}"#).await;
        service.push_response(r#"{"summary": "second"}"#).await;

        let runner = runner(store, &service);
        runner.scan_one(id).await.unwrap();
        let outcome = runner.scan_one(id).await.unwrap();

        assert!(outcome.is_success());
        let stored = runner.store().read_scan(id).await.unwrap().unwrap();
        assert_eq!(stored.analysis.summary(), "second");
    }

    #[tokio::test]
    async fn test_scan_one_skips_unreachable_site() {
        let store = FakeStore::default();
        let id = store.insert(&refused_url().await, Some(200));

        let service = MockCompletionService::new();
        let runner = runner(store, &service);
        let outcome = runner.scan_one(id).await.unwrap();

        assert!(!outcome.is_success());
        assert!(outcome.failure().unwrap().starts_with("site not reachable"));
        assert_eq!(runner.store().row(id).http_status, Some(0));
        assert!(service.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_scan_one_unknown_record() {
        let runner = runner(FakeStore::default(), &MockCompletionService::new());

        assert!(matches!(runner.scan_one(42).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_input() {
        let store = FakeStore::default();
        store.insert("http://example.org/", None);
        let runner = runner(store, &MockCompletionService::new());

        assert!(matches!(
            runner.submit("https://bit.ly/abc", "Short", "", None).await,
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            runner.submit("http://", "Empty", "", None).await,
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            runner.submit("example.org", "Example", "", None).await,
            Err(Error::DuplicateUrl(_))
        ));
        assert!(matches!(
            runner.submit("example.net", "  ", "", None).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(runner.store().rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_end_to_end_with_database() {
        let mut server = Server::new_async().await;
        serve_page(&mut server, "/", "Example Domain").await;

        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("e2e.db").to_string_lossy().to_string();
        let db = Database::new_from_path(&db_path).await.unwrap();

        let url = format!("{}/", server.url());
        let id = db
            .add_submission(&NewSubmission {
                url: url.clone(),
                title: "Example".to_string(),
                description: "Illustrative examples".to_string(),
                category_id: Some(1),
            })
            .await
            .unwrap();

        let service = MockCompletionService::new();
        service
            .push_response(
                r#"Here you go: {"content_quality": 8, "description_accuracy": 9, "summary": "Placeholder domain"}"#,
            )
            .await;
        let runner = runner(db, &service);

        let status = runner.run_status_batch(50).await.unwrap();
        assert_eq!(status.len(), 1);
        match &status[0].detail {
            OutcomeDetail::Status(probe) => assert_eq!(probe.status_code, 200),
            other => panic!("Expected status outcome, got {:?}", other),
        }

        let scans = runner.run_scan_batch(5).await.unwrap();
        assert_eq!(scans.len(), 1);
        assert!(scans[0].is_success());

        let requests = service.requests().await;
        assert!(requests[0].user_prompt.contains("Title: Example Domain"));
        assert!(requests[0].user_prompt.contains("Submitted Title: Example"));

        let record = runner.store().get_submission(id).await.unwrap().unwrap();
        let verdict = record.scan_result.as_ref().and_then(ScanResult::verdict).unwrap();
        assert_eq!(verdict.content_quality, 8);
        assert_eq!(verdict.description_accuracy, 9);
        assert_eq!(verdict.safety_score, 8);
        assert_eq!(verdict.category_match, 5);
        assert!(!verdict.is_malicious);
        assert!(!verdict.is_adult_content);
        assert_eq!(verdict.language, "unknown");
        assert!(verdict.recommendations.is_empty());
        assert!(verdict.red_flags.is_empty());
        assert_eq!(verdict.summary, "Placeholder domain");

        let summary = runner.read_summary().await.unwrap();
        assert_eq!(summary.total_scanned, 1);
        assert_eq!(summary.avg_content_quality, Some(8.0));
        assert_eq!(summary.malicious_count, 0);
    }

    #[tokio::test]
    async fn test_failing_record_does_not_block_scan_queue() {
        let mut server = Server::new_async().await;
        server
            .mock("HEAD", "/bad")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", "/bad")
            .with_status(500)
            .create_async()
            .await;
        serve_page(&mut server, "/good", "Good").await;

        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("queue.db").to_string_lossy().to_string();
        let db = Database::new_from_path(&db_path).await.unwrap();

        let mut ids = Vec::new();
        for path in ["/bad", "/good"] {
            let id = db
                .add_submission(&NewSubmission {
                    url: format!("{}{}", server.url(), path),
                    title: "Example".to_string(),
                    description: String::new(),
                    category_id: None,
                })
                .await
                .unwrap();
            ids.push(id);
        }

        let service = MockCompletionService::new();
        service.push_response(r#"{"content_quality": 6}"#).await;
        let runner = runner(db, &service);
        runner.run_status_batch(10).await.unwrap();

        let first = runner.run_scan_batch(1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, ids[0]);
        assert!(first[0].failure().unwrap().contains("500"));

        let second = runner.run_scan_batch(1).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, ids[1]);
        assert!(second[0].is_success());

        let bad = runner.store().read_scan(ids[0]).await.unwrap().unwrap();
        assert!(matches!(bad.analysis, ScanResult::Failed(_)));

        let summary = runner.read_summary().await.unwrap();
        assert_eq!(summary.total_scanned, 2);
        assert_eq!(summary.avg_content_quality, Some(6.0));
    }
}
