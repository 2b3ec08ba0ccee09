//! # kvrecord Core
//!
//! Pure data model for a record collection kept in a flat key/value
//! backend: records, their status machine, the index of record ids, the
//! key scheme, the codec and derived summaries.
//!
//! This crate contains no I/O. Everything here is deterministic and can be
//! tested without a backend.
//!
//! ## Key Types
//!
//! - [`Record`] - One submission: payload, owner, creation time, status, score
//! - [`Status`] - `Pending -> Verified | Rejected`, both terminal
//! - [`Index`] - Insertion-ordered set of every known [`RecordId`]
//! - [`KeyScheme`] - Where records and the index live in the backend
//! - [`Encoding`] - JSON (ledger-compatible) or CBOR byte layout
//! - [`Summary`] - Counts per status and the average verified score

pub mod codec;
pub mod error;
pub mod index;
pub mod keys;
pub mod record;
pub mod status;
pub mod summary;
pub mod types;

pub use codec::{preview, Encoding};
pub use error::{CoreError, Result};
pub use index::Index;
pub use keys::{KeyScheme, DEFAULT_INDEX_KEY, DEFAULT_RECORD_PREFIX};
pub use record::{sort_for_listing, Payload, Record};
pub use status::Status;
pub use summary::{summarize, Summary};
pub use types::{Owner, RecordId, Score, UnixSeconds};
