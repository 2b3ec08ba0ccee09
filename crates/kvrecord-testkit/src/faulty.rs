//! Fault injection for backend calls.
//!
//! [`FaultyBackend`] wraps a real backend and, on request, fails reads or
//! writes for chosen keys, delays reads, reports itself unavailable or
//! loses compare-and-swap races. It can also hide the optional operations
//! of the wrapped backend, and it records the order of writes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use kvrecord_backend::{Backend, BackendError, CasOutcome, Result};

/// A backend wrapper that misbehaves on demand.
pub struct FaultyBackend<B> {
    inner: B,
    failing_reads: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
    read_delay: Mutex<Option<Duration>>,
    unavailable: AtomicBool,
    lost_swaps: AtomicU32,
    without_cas: AtomicBool,
    without_scan: AtomicBool,
    writes: Mutex<Vec<String>>,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl<B: Backend> FaultyBackend<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            failing_reads: Mutex::new(HashSet::new()),
            failing_writes: Mutex::new(HashSet::new()),
            read_delay: Mutex::new(None),
            unavailable: AtomicBool::new(false),
            lost_swaps: AtomicU32::new(0),
            without_cas: AtomicBool::new(false),
            without_scan: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Fail every read of `key` until [`heal`](Self::heal).
    pub fn fail_reads(&self, key: impl Into<String>) {
        lock(&self.failing_reads).insert(key.into());
    }

    /// Fail every write (and compare-and-swap) of `key`.
    pub fn fail_writes(&self, key: impl Into<String>) {
        lock(&self.failing_writes).insert(key.into());
    }

    /// Delay every read by `delay`.
    pub fn delay_reads(&self, delay: Duration) {
        *lock(&self.read_delay) = Some(delay);
    }

    /// Make `is_available` report `false`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Report a mismatch on the next `count` compare-and-swap calls.
    pub fn lose_next_swaps(&self, count: u32) {
        self.lost_swaps.store(count, Ordering::SeqCst);
    }

    /// Behave like a backend without compare-and-swap.
    pub fn disable_compare_and_swap(&self) {
        self.without_cas.store(true, Ordering::SeqCst);
    }

    /// Behave like a backend that cannot enumerate keys.
    pub fn disable_scan_keys(&self) {
        self.without_scan.store(true, Ordering::SeqCst);
    }

    /// Clear every injected fault. Disabled operations stay disabled.
    pub fn heal(&self) {
        lock(&self.failing_reads).clear();
        lock(&self.failing_writes).clear();
        *lock(&self.read_delay) = None;
        self.unavailable.store(false, Ordering::SeqCst);
        self.lost_swaps.store(0, Ordering::SeqCst);
    }

    /// Keys of successful writes, in acknowledgement order.
    pub fn writes(&self) -> Vec<String> {
        lock(&self.writes).clone()
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if lock(&self.failing_writes).contains(key) {
            return Err(BackendError::Unavailable(format!("injected write failure: {}", key)));
        }
        Ok(())
    }

    fn take_lost_swap(&self) -> bool {
        self.lost_swaps
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<B: Backend> Backend for FaultyBackend<B> {
    async fn read(&self, key: &str) -> Result<Bytes> {
        let delay = *lock(&self.read_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing_reads).contains(key) {
            return Err(BackendError::Unavailable(format!("injected read failure: {}", key)));
        }
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: Bytes) -> Result<()> {
        self.check_write(key)?;
        self.inner.write(key, value).await?;
        lock(&self.writes).push(key.to_string());
        Ok(())
    }

    fn supports_compare_and_swap(&self) -> bool {
        !self.without_cas.load(Ordering::SeqCst) && self.inner.supports_compare_and_swap()
    }

    async fn compare_and_swap(&self, key: &str, expected: Bytes, new: Bytes) -> Result<CasOutcome> {
        if self.without_cas.load(Ordering::SeqCst) {
            return Err(BackendError::Unsupported("compare_and_swap"));
        }
        self.check_write(key)?;
        if self.take_lost_swap() {
            let current = self.inner.read(key).await?;
            return Ok(CasOutcome::Mismatch { current });
        }
        let outcome = self.inner.compare_and_swap(key, expected, new).await?;
        if outcome == CasOutcome::Swapped {
            lock(&self.writes).push(key.to_string());
        }
        Ok(outcome)
    }

    async fn scan_keys(&self, prefix: &str) -> Result<Vec<String>> {
        if self.without_scan.load(Ordering::SeqCst) {
            return Err(BackendError::Unsupported("scan_keys"));
        }
        self.inner.scan_keys(prefix).await
    }

    async fn is_available(&self) -> Result<bool> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.is_available().await
    }
}
