//! The record store: create, list, get and transition records kept in a
//! flat key/value backend.
//!
//! ## Layout
//!
//! Each record lives under `record_prefix + id`. One index entry holds
//! every id ever created. There is no other persisted state.
//!
//! ## Consistency
//!
//! The backend offers no multi-key transactions, so `create` orders its
//! writes: the record is written and acknowledged first, then the index.
//! Any id a reader finds in the index therefore resolves. A record whose
//! index update failed is an orphan: stored but not discoverable until a
//! repair pass adds it (see [`RecordStore::list_orphans`]).
//!
//! With [`IndexWriteMode::LastWriterWins`] two concurrent creates can race
//! on the index and one id can be lost unless the backend orders writes to
//! the same key (ledger-backed accessors do). With
//! [`IndexWriteMode::CompareAndSwap`] the append retries instead.
//!
//! The index is never cached; every mutation re-reads it.
//!
//! Listings are snapshots. They may miss a record created concurrently or
//! show a status from before a concurrent transition.
//!
//! ## Cancellation
//!
//! Every backend call runs under `call_timeout`. Dropping a `create` future
//! between the record write and the index write leaves an orphan; nothing
//! is rolled back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kvrecord_backend::{Backend, BackendError, CasOutcome};
use kvrecord_core::{
    preview, sort_for_listing, CoreError, Encoding, Index, Owner, Payload, Record, RecordId,
    Score, Status, Summary,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{IndexWriteMode, StoreConfig};
use crate::error::{RecordError, Result};
use crate::listing::{Listing, SkipReason, SkippedRecord};
use crate::oracle::{
    secs_from_millis, Clock, IdSource, RandomIds, RandomOracle, ScoringOracle, SystemClock,
};

/// Key-indexed record store over a [`Backend`].
///
/// Safe to share across tasks; all state lives in the backend.
pub struct RecordStore<B: Backend> {
    backend: Arc<B>,
    config: StoreConfig,
    oracle: Arc<dyn ScoringOracle>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl<B: Backend> RecordStore<B> {
    /// Create a store over `backend`.
    pub fn new(backend: B, config: StoreConfig) -> Self {
        Self::from_shared(Arc::new(backend), config)
    }

    /// Create a store over a backend that is also used elsewhere.
    pub fn from_shared(backend: Arc<B>, config: StoreConfig) -> Self {
        Self {
            backend,
            config,
            oracle: Arc::new(RandomOracle),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
        }
    }

    /// Replace the scoring oracle used by [`submit`](Self::submit).
    pub fn with_oracle(mut self, oracle: impl ScoringOracle + 'static) -> Self {
        self.oracle = Arc::new(oracle);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_id_source(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Score `payload` with the configured oracle, then [`create`](Self::create).
    pub async fn submit(&self, payload: Payload, owner: Owner) -> Result<RecordId> {
        let score = self.oracle.score(&payload);
        self.create(payload, owner, score).await
    }

    /// Store a new `Pending` record and add it to the index.
    ///
    /// The record write is acknowledged before the index is touched. If the
    /// index update fails the error is returned and the record stays behind
    /// as an orphan.
    ///
    /// Compare-and-swap index writes against a backend without CAS fail with
    /// [`RecordError::Unsupported`] before anything is written.
    pub async fn create(&self, payload: Payload, owner: Owner, score: Score) -> Result<RecordId> {
        payload.validate().map_err(payload_error)?;
        if matches!(self.config.index_write, IndexWriteMode::CompareAndSwap { .. })
            && !self.backend.supports_compare_and_swap()
        {
            return Err(RecordError::Unsupported("compare_and_swap"));
        }

        let now_millis = self.clock.now_millis();
        let id = self.fresh_id(now_millis).await?;
        let key = self.config.keys.record_key(&id);
        let record = Record::new(id.clone(), payload, owner, score, secs_from_millis(now_millis));

        let bytes = self
            .config
            .encoding
            .encode_record(&record)
            .map_err(|e| RecordError::corrupt(&key, e))?;
        self.write(&key, bytes).await?;

        if let Err(e) = self.append_to_index(&id).await {
            warn!(id = %id, error = %e, "index update failed; record is orphaned");
            return Err(e);
        }

        info!(id = %id, owner = %record.owner, score = record.score.value(), "record created");
        Ok(id)
    }

    /// Move a record along the status machine.
    ///
    /// Only the owner may transition a record. Rewrites the record key only;
    /// the index is not touched.
    pub async fn transition(&self, id: &RecordId, target: Status, actor: &Owner) -> Result<Record> {
        let mut record = self.get(id).await?;

        if !record.is_owned_by(actor) {
            return Err(RecordError::Unauthorized {
                id: id.clone(),
                actor: actor.clone(),
            });
        }

        let from = record.status;
        record
            .apply_transition(target)
            .map_err(|_| RecordError::InvalidTransition {
                id: id.clone(),
                from,
                to: target,
            })?;

        let key = self.config.keys.record_key(id);
        let bytes = self
            .config
            .encoding
            .encode_record(&record)
            .map_err(|e| RecordError::corrupt(&key, e))?;
        self.write(&key, bytes).await?;

        info!(id = %id, from = %from, to = %target, "record transitioned");
        Ok(record)
    }

    pub async fn verify(&self, id: &RecordId, actor: &Owner) -> Result<Record> {
        self.transition(id, Status::Verified, actor).await
    }

    pub async fn reject(&self, id: &RecordId, actor: &Owner) -> Result<Record> {
        self.transition(id, Status::Rejected, actor).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch a single record.
    pub async fn get(&self, id: &RecordId) -> Result<Record> {
        if self.config.keys.is_reserved(id) {
            return Err(RecordError::NotFound(id.clone()));
        }
        let key = self.config.keys.record_key(id);
        let bytes = self.read(&key).await?;
        if bytes.is_empty() {
            return Err(RecordError::NotFound(id.clone()));
        }
        self.config
            .encoding
            .decode_record(id, &bytes)
            .map_err(|e| RecordError::corrupt(key, e))
    }

    /// Every resolvable indexed record, newest first.
    pub async fn list(&self) -> Result<Vec<Record>> {
        Ok(self.list_detailed().await?.records)
    }

    /// Like [`list`](Self::list), also reporting records that were skipped.
    ///
    /// Record reads run concurrently, at most `list_concurrency` at a time.
    /// A record that is missing, corrupt or unreadable is skipped and
    /// logged; only index and availability failures fail the listing.
    pub async fn list_detailed(&self) -> Result<Listing> {
        if self.config.check_availability {
            debug!("backend availability check");
            let available = call(
                self.config.call_timeout,
                "availability check",
                self.backend.is_available(),
            )
            .await?;
            if !available {
                return Err(RecordError::unavailable(
                    "availability check",
                    "backend reports unavailable",
                ));
            }
        }

        let index = self.read_index().await?;
        let limit = Arc::new(Semaphore::new(self.config.list_concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut listing = Listing::default();

        for id in index.into_ids() {
            if self.config.keys.is_reserved(&id) {
                listing.skipped.push(SkippedRecord {
                    id,
                    reason: SkipReason::Missing,
                });
                continue;
            }
            let backend = Arc::clone(&self.backend);
            let limit = Arc::clone(&limit);
            let key = self.config.keys.record_key(&id);
            let encoding = self.config.encoding;
            let timeout = self.config.call_timeout;

            tasks.spawn(async move {
                let outcome = match limit.acquire_owned().await {
                    Ok(_permit) => fetch_record(&*backend, &key, &id, encoding, timeout).await,
                    Err(e) => Err(SkipReason::Unavailable(e.to_string())),
                };
                (id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (id, outcome) = joined.map_err(|e| RecordError::unavailable("list", e))?;
            match outcome {
                Ok(record) => listing.records.push(record),
                Err(reason) => {
                    warn!(id = %id, reason = %reason, "skipping unresolvable record");
                    listing.skipped.push(SkippedRecord { id, reason });
                }
            }
        }

        sort_for_listing(&mut listing.records);
        listing.skipped.sort_by(|a, b| a.id.cmp(&b.id));

        debug!(
            records = listing.records.len(),
            skipped = listing.skipped.len(),
            "listing complete"
        );
        Ok(listing)
    }

    /// Statistics over the current listing.
    pub async fn summarize(&self) -> Result<Summary> {
        Ok(self.list_detailed().await?.summary())
    }

    /// Read and decode the index. An absent index is empty.
    pub async fn read_index(&self) -> Result<Index> {
        let raw = self.read(&self.config.keys.index_key).await?;
        self.decode_index(&raw)
    }

    /// Ids that have a stored record but are missing from the index.
    ///
    /// Requires a backend that can scan keys.
    pub async fn list_orphans(&self) -> Result<Vec<RecordId>> {
        let keys = &self.config.keys;
        debug!(prefix = %keys.record_prefix, "backend scan");
        let stored = call(
            self.config.call_timeout,
            &format!("scan {}", keys.record_prefix),
            self.backend.scan_keys(&keys.record_prefix),
        )
        .await?;
        let index = self.read_index().await?;

        let mut orphans: Vec<RecordId> = stored
            .iter()
            .filter_map(|key| keys.id_from_key(key))
            .filter(|id| !index.contains(id))
            .collect();
        orphans.sort();

        if !orphans.is_empty() {
            warn!(count = orphans.len(), "found records missing from the index");
        }
        Ok(orphans)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn fresh_id(&self, now_millis: i64) -> Result<RecordId> {
        let attempts = self.config.max_id_attempts.max(1);
        for attempt in 1..=attempts {
            let id = self.ids.next_id(now_millis);
            if self.config.keys.is_reserved(&id) {
                warn!(id = %id, attempt, "generated id collides with the index key");
                continue;
            }
            let existing = self.read(&self.config.keys.record_key(&id)).await?;
            if existing.is_empty() {
                return Ok(id);
            }
            warn!(id = %id, attempt, "generated id already in use");
        }
        Err(RecordError::CollisionDetected { attempts })
    }

    async fn append_to_index(&self, id: &RecordId) -> Result<()> {
        let key = self.config.keys.index_key.as_str();

        match self.config.index_write {
            IndexWriteMode::LastWriterWins => {
                let current = self.read(key).await?;
                let mut index = self.decode_index(&current)?;
                if !index.insert(id.clone()) {
                    return Ok(());
                }
                let bytes = self.encode_index(&index)?;
                self.write(key, bytes).await
            }
            IndexWriteMode::CompareAndSwap { max_attempts } => {
                let attempts = max_attempts.max(1);
                let mut current = self.read(key).await?;
                for attempt in 1..=attempts {
                    let mut index = self.decode_index(&current)?;
                    if !index.insert(id.clone()) {
                        return Ok(());
                    }
                    let bytes = Bytes::from(self.encode_index(&index)?);
                    debug!(key, attempt, "backend compare-and-swap");
                    let outcome = call(
                        self.config.call_timeout,
                        &format!("compare-and-swap {}", key),
                        self.backend.compare_and_swap(key, current.clone(), bytes),
                    )
                    .await?;
                    match outcome {
                        CasOutcome::Swapped => return Ok(()),
                        CasOutcome::Mismatch { current: latest } => {
                            warn!(key, id = %id, attempt, "index changed concurrently; retrying");
                            current = latest;
                        }
                    }
                }
                Err(RecordError::IndexContention { attempts })
            }
        }
    }

    fn decode_index(&self, raw: &[u8]) -> Result<Index> {
        let key = self.config.keys.index_key.as_str();
        let ids = self
            .config
            .encoding
            .decode_index(raw)
            .map_err(|e| RecordError::corrupt(key, e))?;
        let total = ids.len();
        let index = Index::from_ids(ids);
        if index.len() < total {
            warn!(key, dropped = total - index.len(), "index contains duplicate ids");
        }
        Ok(index)
    }

    fn encode_index(&self, index: &Index) -> Result<Vec<u8>> {
        self.config
            .encoding
            .encode_index(index.as_slice())
            .map_err(|e| RecordError::corrupt(self.config.keys.index_key.as_str(), e))
    }

    async fn read(&self, key: &str) -> Result<Bytes> {
        debug!(key, "backend read");
        call(
            self.config.call_timeout,
            &format!("read {}", key),
            self.backend.read(key),
        )
        .await
    }

    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        debug!(key, len = value.len(), "backend write");
        call(
            self.config.call_timeout,
            &format!("write {}", key),
            self.backend.write(key, Bytes::from(value)),
        )
        .await
    }
}

/// Run one backend call under a deadline.
async fn call<T, F>(timeout: Duration, target: &str, fut: F) -> Result<T>
where
    F: Future<Output = kvrecord_backend::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(BackendError::Unsupported(operation))) => Err(RecordError::Unsupported(operation)),
        Ok(Err(e)) => Err(RecordError::unavailable(target, e)),
        Err(_) => Err(RecordError::unavailable(
            target,
            format!("timed out after {:?}", timeout),
        )),
    }
}

/// Resolve one indexed record for a listing.
async fn fetch_record<B: Backend + ?Sized>(
    backend: &B,
    key: &str,
    id: &RecordId,
    encoding: Encoding,
    timeout: Duration,
) -> std::result::Result<Record, SkipReason> {
    debug!(key, "backend read");
    let bytes = call(timeout, key, backend.read(key))
        .await
        .map_err(|e| SkipReason::Unavailable(e.to_string()))?;
    if bytes.is_empty() {
        return Err(SkipReason::Missing);
    }
    encoding
        .decode_record(id, &bytes)
        .map_err(|e| SkipReason::Corrupt(format!("{} (bytes {})", e, preview(&bytes))))
}

fn payload_error(e: CoreError) -> RecordError {
    match e {
        CoreError::InvalidPayload(reason) => RecordError::InvalidPayload(reason),
        other => RecordError::InvalidPayload(other.to_string()),
    }
}
