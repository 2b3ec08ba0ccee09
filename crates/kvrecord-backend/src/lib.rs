//! # kvrecord Backend
//!
//! The key/value seam underneath the record store. A backend is anything
//! that can `read(key)` and `write(key, bytes)`: a ledger contract, a remote
//! KV service, or a local database.
//!
//! ## Key Types
//!
//! - [`Backend`] - The async trait for all backend operations
//! - [`MemoryBackend`] - In-memory backend for tests
//! - [`SqliteBackend`] - SQLite-based durable backend
//! - [`CasOutcome`] - Result of a compare-and-swap write
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use kvrecord_backend::{Backend, SqliteBackend};
//!
//! async fn example() {
//!     let backend = SqliteBackend::open("records.db").unwrap();
//!     backend.write("greeting", Bytes::from_static(b"hello")).await.unwrap();
//!     let value = backend.read("greeting").await.unwrap();
//!     assert_eq!(&value[..], b"hello");
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Absent is empty**: reading a missing key returns empty bytes, and
//!   writing empty bytes removes the key.
//! - **No multi-key atomicity**: callers must order their writes.
//! - **Optional operations**: compare-and-swap and key scanning have
//!   `Unsupported` defaults so thin remote accessors only need two methods.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{BackendError, Result};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::{Backend, CasOutcome};
