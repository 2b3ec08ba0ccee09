//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kvrecord::{Clock, FixedOracle, IdSource, RecordStore, StoreConfig};
use kvrecord_backend::{Backend, MemoryBackend};
use kvrecord_core::{Owner, Payload, RecordId, Score};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// 2025-01-14T16:00:00Z.
pub const START_MILLIS: i64 = 1_736_870_400_000;

/// Score handed out by the fixture oracle.
pub const FIXTURE_SCORE: u8 = 70;

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: Arc::new(AtomicI64::new(start_millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(START_MILLIS)
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Deterministic id source: the usual id shape from a seeded RNG.
pub struct SeededIds {
    rng: Mutex<StdRng>,
}

impl SeededIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl IdSource for SeededIds {
    fn next_id(&self, now_millis: i64) -> RecordId {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        RecordId::generate(now_millis, &mut *rng)
    }
}

/// Id source that always returns the same id.
#[derive(Debug, Clone)]
pub struct FixedIds(pub RecordId);

impl IdSource for FixedIds {
    fn next_id(&self, _now_millis: i64) -> RecordId {
        self.0.clone()
    }
}

/// A store with deterministic collaborators.
///
/// Ids come from [`SeededIds`], scores are always [`FIXTURE_SCORE`] and the
/// clock starts at [`START_MILLIS`].
pub struct StoreFixture<B: Backend = MemoryBackend> {
    pub store: RecordStore<B>,
    pub clock: ManualClock,
}

impl StoreFixture<MemoryBackend> {
    /// Fixture over a fresh in-memory backend.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::over(MemoryBackend::new(), config)
    }
}

impl Default for StoreFixture<MemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> StoreFixture<B> {
    /// Fixture over any backend.
    pub fn over(backend: B, config: StoreConfig) -> Self {
        let clock = ManualClock::default();
        let store = RecordStore::new(backend, config)
            .with_clock(clock.clone())
            .with_id_source(SeededIds::new(7))
            .with_oracle(FixedOracle(fixture_score()));
        Self { store, clock }
    }

    pub fn backend(&self) -> &B {
        self.store.backend()
    }

    /// Submit a sample payload with `answer` on behalf of `owner`.
    pub async fn submit(&self, answer: &str, owner_id: &str) -> kvrecord::Result<RecordId> {
        self.store
            .submit(sample_payload(answer), owner(owner_id))
            .await
    }

    /// Advance the clock by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }
}

/// Parse an owner, panicking on blank input.
pub fn owner(s: &str) -> Owner {
    Owner::new(s).expect("test owner must not be blank")
}

/// A small valid payload.
pub fn sample_payload(answer: &str) -> Payload {
    Payload::new("data:image/png;base64,iVBORw0KGgo=", answer)
}

fn fixture_score() -> Score {
    Score::new(u64::from(FIXTURE_SCORE)).unwrap_or_default()
}
