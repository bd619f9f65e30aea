// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Timeouts and retry with exponential backoff for ledger calls.
//
// Errors are classified into Transient (auto-retry), UserAction (report and
// stop) and Permanent (give up). Only transient errors are retried, and only
// on calls that are safe to repeat: reads, updates and status changes.
// `write` and `batch_write` get a timeout but a single attempt, since a write
// that timed out may still have landed.

use std::future::Future;
use std::time::Duration;

use hashmark_core::config::LedgerConfig;
use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{
    Claim, DocumentEntry, DocumentId, DocumentUpdate, ErrorClass, FileDigest, LedgerDocument,
    OwnerAddress,
};
use tracing::{debug, info, warn};

use crate::gateway::{LedgerGateway, Page};

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay between retries (exponential backoff).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for RetryConfig {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

/// Result of evaluating whether to retry.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after this delay.
    RetryAfter(Duration),
    /// Do not retry: the error is permanent or needs the user.
    GiveUp(ErrorClass),
    /// Maximum retries exhausted.
    Exhausted,
}

/// Classify a `HashmarkError` for retry decisions.
pub fn classify_error(err: &HashmarkError) -> ErrorClass {
    match err {
        HashmarkError::LedgerUnavailable(detail) => classify_ledger_detail(detail),
        HashmarkError::Database(_) => ErrorClass::Transient,
        HashmarkError::ReadError(_) => ErrorClass::Transient,

        HashmarkError::Unauthorized
        | HashmarkError::NoFileSelected
        | HashmarkError::UnsupportedInput
        | HashmarkError::FileTooLarge { .. }
        | HashmarkError::UnsupportedMediaType(_)
        | HashmarkError::MissingTitle
        | HashmarkError::TitleTooLong { .. }
        | HashmarkError::ReferenceUnavailable(_) => ErrorClass::UserAction,

        HashmarkError::LedgerRejected(_)
        | HashmarkError::LedgerResponse(_)
        | HashmarkError::PdfError(_)
        | HashmarkError::InvalidDigest(_)
        | HashmarkError::InvalidAddress(_)
        | HashmarkError::IntegrityMismatch { .. }
        | HashmarkError::Serialization(_)
        | HashmarkError::Config(_) => ErrorClass::Permanent,

        HashmarkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                ErrorClass::UserAction
            }
            _ => ErrorClass::Transient,
        },
    }
}

/// Classify the detail string of a `LedgerUnavailable`.
fn classify_ledger_detail(detail: &str) -> ErrorClass {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("user rejected") || lower.contains("user denied") {
        return ErrorClass::UserAction;
    }
    if lower.contains("execution reverted") || lower.contains("invalid opcode") {
        return ErrorClass::Permanent;
    }

    // Timeouts, refused connections, rate limits, busy nodes.
    ErrorClass::Transient
}

/// Decide whether to retry based on the error class and attempt count.
pub fn should_retry(err: &HashmarkError, attempt: u32, config: &RetryConfig) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            info!("permanent ledger error, not retrying");
            RetryDecision::GiveUp(ErrorClass::Permanent)
        }
        ErrorClass::UserAction => {
            info!("ledger error needs user action, not retrying");
            RetryDecision::GiveUp(ErrorClass::UserAction)
        }
        ErrorClass::Transient => {
            if attempt >= config.max_retries {
                warn!(attempt, max = config.max_retries, "retry limit exhausted");
                RetryDecision::Exhausted
            } else {
                let delay = compute_delay(attempt, config);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling retry");
                RetryDecision::RetryAfter(delay)
            }
        }
    }
}

/// delay = min(base * 2^attempt + jitter, max_delay), jitter in [0, base).
fn compute_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(10));
    let total_ms = exp_ms.saturating_add(jitter(base_ms, attempt));
    Duration::from_millis(total_ms.min(config.max_delay.as_millis() as u64))
}

/// Deterministic spread across [0, base).
fn jitter(base_ms: u64, attempt: u32) -> u64 {
    let hash = (attempt as u64 + 1).wrapping_mul(6364136223846793005);
    (hash >> 33) % base_ms.max(1)
}

/// Any gateway, with a per-call timeout and retries for transient failures.
#[derive(Debug)]
pub struct ResilientLedger<L> {
    inner: L,
    retry: RetryConfig,
    timeout: Duration,
}

impl<L: LedgerGateway> ResilientLedger<L> {
    pub fn new(inner: L, retry: RetryConfig, timeout: Duration) -> Self {
        Self {
            inner,
            retry,
            timeout,
        }
    }

    pub fn from_config(inner: L, config: &LedgerConfig) -> Self {
        Self::new(
            inner,
            RetryConfig::from(config),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// One attempt, bounded by the timeout.
    async fn attempt<T, Fut>(&self, op: &'static str, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>> + Send,
    {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            HashmarkError::LedgerUnavailable(format!(
                "{op} timed out after {}ms",
                self.timeout.as_millis()
            ))
        })?
    }

    /// Repeat `call` until it succeeds, fails for good, or runs out of retries.
    async fn with_retry<T, F, Fut>(&self, op: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let err = match self.attempt(op, call()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match should_retry(&err, attempt, &self.retry) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(op, attempt, %err, "ledger call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp(_) | RetryDecision::Exhausted => return Err(err),
            }
        }
    }
}

impl<L: LedgerGateway> LedgerGateway for ResilientLedger<L> {
    async fn lookup_ids_by_digest(&self, digest: &FileDigest) -> Result<Vec<DocumentId>> {
        self.with_retry("lookup_ids_by_digest", || self.inner.lookup_ids_by_digest(digest))
            .await
    }

    async fn read_by_id(&self, id: DocumentId) -> Result<LedgerDocument> {
        self.with_retry("read_by_id", || self.inner.read_by_id(id)).await
    }

    async fn list_ids_by_owner(&self, owner: &OwnerAddress) -> Result<Vec<DocumentId>> {
        self.with_retry("list_ids_by_owner", || self.inner.list_ids_by_owner(owner))
            .await
    }

    async fn paginate(&self, page: u32, page_size: u32, ids: &[DocumentId]) -> Result<Page> {
        self.with_retry("paginate", || self.inner.paginate(page, page_size, ids))
            .await
    }

    async fn total_slots(&self) -> Result<u64> {
        self.with_retry("total_slots", || self.inner.total_slots()).await
    }

    async fn write(&self, caller: &Claim, entry: DocumentEntry) -> Result<DocumentId> {
        self.attempt("write", self.inner.write(caller, entry)).await
    }

    async fn batch_write(&self, caller: &Claim, entries: Vec<DocumentEntry>) -> Result<Vec<DocumentId>> {
        self.attempt("batch_write", self.inner.batch_write(caller, entries))
            .await
    }

    async fn update(&self, caller: &Claim, id: DocumentId, update: DocumentUpdate) -> Result<()> {
        self.with_retry("update", || self.inner.update(caller, id, update.clone()))
            .await
    }

    async fn change_status(&self, caller: &Claim, id: DocumentId, active: bool) -> Result<()> {
        self.with_retry("change_status", || self.inner.change_status(caller, id, active))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryLedger;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn timeout_is_transient() {
        let err = HashmarkError::LedgerUnavailable("request timed out".into());
        assert_eq!(classify_error(&err), ErrorClass::Transient);
    }

    #[test]
    fn wallet_rejection_needs_the_user() {
        let err = HashmarkError::LedgerUnavailable("User rejected the request.".into());
        assert_eq!(classify_error(&err), ErrorClass::UserAction);
        assert_eq!(classify_error(&HashmarkError::Unauthorized), ErrorClass::UserAction);
    }

    #[test]
    fn rejected_is_permanent() {
        let err = HashmarkError::LedgerRejected("document 9 does not exist".into());
        assert!(matches!(
            should_retry(&err, 0, &RetryConfig::default()),
            RetryDecision::GiveUp(ErrorClass::Permanent)
        ));
    }

    #[test]
    fn retry_respects_max() {
        let config = RetryConfig {
            max_retries: 3,
            ..Default::default()
        };
        let err = HashmarkError::LedgerUnavailable("connection refused".into());
        assert!(matches!(should_retry(&err, 0, &config), RetryDecision::RetryAfter(_)));
        assert_eq!(should_retry(&err, 3, &config), RetryDecision::Exhausted);
    }

    #[test]
    fn delay_increases_with_attempts() {
        let config = RetryConfig::default();
        let d0 = compute_delay(0, &config);
        let d1 = compute_delay(1, &config);
        let d2 = compute_delay(2, &config);
        assert!(d1 > d0);
        assert!(d2 > d1);
    }

    #[test]
    fn delay_capped_at_max() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert!(compute_delay(20, &config) <= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let ledger = ResilientLedger::new(MemoryLedger::new(), fast(), Duration::from_secs(5));
        ledger.inner().fail_next(2);

        assert_eq!(ledger.total_slots().await.expect("third attempt succeeds"), 0);
        assert_eq!(ledger.inner().calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let ledger = ResilientLedger::new(MemoryLedger::new(), fast(), Duration::from_secs(5));
        ledger.inner().fail_next(10);

        assert!(matches!(
            ledger.total_slots().await,
            Err(HashmarkError::LedgerUnavailable(_))
        ));
        assert_eq!(ledger.inner().calls(), 4);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let ledger = ResilientLedger::new(MemoryLedger::new(), fast(), Duration::from_secs(5));
        assert!(ledger.read_by_id(DocumentId(1)).await.is_err());
        assert_eq!(ledger.inner().calls(), 1);
    }

    #[tokio::test]
    async fn slow_ledger_times_out() {
        let retry = RetryConfig {
            max_retries: 0,
            ..fast()
        };
        let ledger = ResilientLedger::new(MemoryLedger::new(), retry, Duration::from_millis(20));
        ledger.inner().set_latency(Some(Duration::from_millis(500)));

        match ledger.total_slots().await {
            Err(HashmarkError::LedgerUnavailable(detail)) => assert!(detail.contains("timed out")),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_are_attempted_once() {
        let ledger = ResilientLedger::new(MemoryLedger::new(), fast(), Duration::from_secs(5));
        ledger.inner().fail_next(1);
        let claim = Claim::for_owner(OwnerAddress::parse(&format!("0x{}", "ab".repeat(20))).expect("address"));
        let entry = DocumentEntry {
            name: "Record".into(),
            file_name: "a.pdf".into(),
            digest: FileDigest::from_bytes([1; 32]),
        };

        assert!(ledger.write(&claim, entry.clone()).await.is_err());
        assert_eq!(ledger.inner().calls(), 1);
        assert_eq!(ledger.write(&claim, entry).await.expect("write"), DocumentId(1));
    }
}
