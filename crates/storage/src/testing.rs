//! Test-support storage decorators
//!
//! `FlakyStore` wraps any `ActionStore` and fails upcoming calls with
//! `StorageUnavailable`, for exercising fault handling without a real flaky
//! backend. Writes (append/update) and scans are armed separately: the write
//! path retries with bounded backoff, while a failed scan must surface to
//! the query caller immediately instead of reading as an empty result.

use chronik_core::error::{Error, Result};
use chronik_core::record::{ActionDraft, ActionRecord, RecordPatch};
use chronik_core::traits::{ActionStore, EffectiveKey, ScanPlan};
use chronik_core::types::ActionId;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU32, Ordering};

/// Storage decorator with separately armed write and scan failures
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    write_failures: AtomicU32,
    scan_failures: AtomicU32,
}

impl<S> FlakyStore<S> {
    /// Wrap a store; no failures are armed initially
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            write_failures: AtomicU32::new(0),
            scan_failures: AtomicU32::new(0),
        }
    }

    /// Arm the next `n` write calls (append/update) to fail
    pub fn fail_writes(&self, n: u32) {
        self.write_failures.store(n, Ordering::SeqCst);
    }

    /// Arm the next `n` scan calls to fail
    pub fn fail_scans(&self, n: u32) {
        self.scan_failures.store(n, Ordering::SeqCst);
    }

    /// Remaining armed write failures
    pub fn pending_failures(&self) -> u32 {
        self.write_failures.load(Ordering::SeqCst)
    }

    /// Access the wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn consume(counter: &AtomicU32, what: &str) -> Result<()> {
        let mut current = counter.load(Ordering::SeqCst);
        while current > 0 {
            match counter.compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    return Err(Error::StorageUnavailable(format!(
                        "injected {what} failure"
                    )))
                }
                Err(actual) => current = actual,
            }
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        Self::consume(&self.write_failures, "write")
    }

    fn check_scan(&self) -> Result<()> {
        Self::consume(&self.scan_failures, "scan")
    }
}

impl<S: ActionStore> ActionStore for FlakyStore<S> {
    fn append(&self, key: EffectiveKey, draft: ActionDraft) -> Result<ActionRecord> {
        self.check_write()?;
        self.inner.append(key, draft)
    }

    fn update(
        &self,
        id: ActionId,
        expected_version: u64,
        patch: &RecordPatch,
    ) -> Result<ActionRecord> {
        self.check_write()?;
        self.inner.update(id, expected_version, patch)
    }

    fn most_recent(
        &self,
        kind: &str,
        key: &EffectiveKey,
        horizon: Duration,
        now: DateTime<Utc>,
        depth: usize,
    ) -> Result<Option<(ActionRecord, u64)>> {
        self.inner.most_recent(kind, key, horizon, now, depth)
    }

    fn fetch(&self, id: ActionId) -> Result<Option<ActionRecord>> {
        self.inner.fetch(id)
    }

    fn scan(&self, plan: &ScanPlan) -> Result<Vec<ActionId>> {
        self.check_scan()?;
        self.inner.scan(plan)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
