//! Collaborators consulted at creation time: the scoring oracle, the clock
//! and the id source.

use std::time::{SystemTime, UNIX_EPOCH};

use kvrecord_core::{Payload, RecordId, Score, UnixSeconds};
use rand::Rng;

/// Produces a creativity score for a payload.
///
/// Invoked once when a record is submitted. The store treats it as a black
/// box; the score is never recomputed.
pub trait ScoringOracle: Send + Sync {
    fn score(&self, payload: &Payload) -> Score;
}

/// Lowest score handed out by [`RandomOracle`].
pub const RANDOM_SCORE_FLOOR: u8 = 20;

/// Stub oracle: uniform random score in `20..=100`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOracle;

impl ScoringOracle for RandomOracle {
    fn score(&self, _payload: &Payload) -> Score {
        let value = rand::thread_rng().gen_range(RANDOM_SCORE_FLOOR..=Score::MAX);
        Score::new(u64::from(value)).unwrap_or_default()
    }
}

/// Oracle that always returns the same score.
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle(pub Score);

impl ScoringOracle for FixedOracle {
    fn score(&self, _payload: &Payload) -> Score {
        self.0
    }
}

/// Wall clock used for ids and creation timestamps.
///
/// Read once per `create`; the id prefix and `created_at` both come from
/// that one reading.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Whole seconds of a millisecond timestamp, rounding toward negative
/// infinity.
pub fn secs_from_millis(millis: i64) -> UnixSeconds {
    millis.div_euclid(1000)
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Source of fresh record ids.
pub trait IdSource: Send + Sync {
    fn next_id(&self, now_millis: i64) -> RecordId;
}

/// `<millis>-<random base36>` ids from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self, now_millis: i64) -> RecordId {
        RecordId::generate(now_millis, &mut rand::thread_rng())
    }
}
