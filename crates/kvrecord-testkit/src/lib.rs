//! # kvrecord Testkit
//!
//! Testing utilities for kvrecord.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A store over an in-memory backend with a manual clock,
//!   a fixed oracle and deterministic ids
//! - **Fault injection**: [`FaultyBackend`] fails, delays or contends
//!   selected backend calls
//! - **Legacy vectors**: Stored bytes as written by older clients, with the
//!   record each one must decode to
//! - **Generators**: Proptest strategies for ids, owners, payloads, records
//!
//! ## Test Fixtures
//!
//! ```rust
//! use kvrecord_testkit::fixtures::{owner, StoreFixture};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let fixture = StoreFixture::new();
//! let id = fixture.submit("a red circle", "0xAA").await.unwrap();
//! fixture.store.verify(&id, &owner("0xaa")).await.unwrap();
//! # });
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use kvrecord_testkit::generators::record;
//!
//! proptest! {
//!     #[test]
//!     fn json_round_trip(r in record()) {
//!         let bytes = Encoding::Json.encode_record(&r).unwrap();
//!         prop_assert_eq!(Encoding::Json.decode_record(&r.id, &bytes).unwrap(), r);
//!     }
//! }
//! ```

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use faulty::FaultyBackend;
pub use fixtures::{owner, sample_payload, ManualClock, SeededIds, StoreFixture};
pub use vectors::{legacy_vectors, LegacyVector};

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
