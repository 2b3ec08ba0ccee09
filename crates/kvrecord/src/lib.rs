//! # kvrecord
//!
//! A record collection kept in a flat key/value backend that offers only
//! single-key reads and writes.
//!
//! ## Overview
//!
//! Records are submitted, stored under their own key and listed through a
//! single index key holding every id. Each record carries a status that
//! moves one way: `Pending` to `Verified` or `Rejected`, and only its owner
//! may move it.
//!
//! - **Create**: Validate, pick a fresh id, write the record, append the id
//! - **List**: Resolve every indexed id concurrently, skip what is broken
//! - **Transition**: Owner-only, one-way status changes
//! - **Summarize**: Counts per status and the average verified score
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kvrecord::{Owner, Payload, RecordStore, StoreConfig};
//! use kvrecord::backend::SqliteBackend;
//!
//! async fn example() -> kvrecord::Result<()> {
//!     let backend = SqliteBackend::open("records.db").unwrap();
//!     let store = RecordStore::new(backend, StoreConfig::default());
//!
//!     let owner = Owner::new("0xAbC").unwrap();
//!     let id = store
//!         .submit(Payload::new("data:image/png;base64,AAAA", "a red circle"), owner.clone())
//!         .await?;
//!
//!     store.verify(&id, &owner).await?;
//!
//!     let summary = store.summarize().await?;
//!     println!("{} records, average score {}", summary.total, summary.average_score);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `kvrecord::core` - Data model, codec and key scheme
//! - `kvrecord::backend` - Backend trait, in-memory and SQLite backends

pub mod config;
pub mod error;
pub mod listing;
pub mod oracle;
pub mod store;

// Re-export component crates
pub use kvrecord_backend as backend;
pub use kvrecord_core as core;

// Re-export main types for convenience
pub use config::{IndexWriteMode, StoreConfig};
pub use error::{ErrorKind, RecordError, Result};
pub use listing::{Listing, SkipReason, SkippedRecord};
pub use oracle::{
    secs_from_millis, Clock, FixedOracle, IdSource, RandomIds, RandomOracle, ScoringOracle,
    SystemClock, RANDOM_SCORE_FLOOR,
};
pub use store::RecordStore;

// Re-export commonly used core types
pub use kvrecord_core::{
    Encoding, Index, KeyScheme, Owner, Payload, Record, RecordId, Score, Status, Summary,
};
