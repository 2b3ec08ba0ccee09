//! Codec: byte representation of records and the index.
//!
//! Two encodings share one logical layout:
//!
//! - `Json` writes exactly what the deployed ledger client writes:
//!   `{"imageData","userAnswer","timestamp","owner","status","score"}` for a
//!   record and a JSON array of id strings for the index.
//! - `Cbor` carries the same fields as a CBOR map, for backends that charge
//!   per stored byte.
//!
//! The record id is not part of the record bytes; it is the key suffix and
//! is supplied to [`Encoding::decode_record`]. An `id` field, if present in
//! the bytes, must agree with it.
//!
//! Decoding is tolerant of legacy entries: an unknown or missing `status`
//! reads as `Pending` and a missing `score` reads as `0`. Missing required
//! fields and wrong types are decode errors.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};
use crate::record::{Payload, Record};
use crate::status::{self, Status};
use crate::types::{Owner, RecordId, Score, UnixSeconds};

/// Number of bytes shown by [`preview`].
const PREVIEW_LEN: usize = 16;

/// Serialization format for stored values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Json,
    Cbor,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRecordRef<'a> {
    image_data: &'a str,
    user_answer: &'a str,
    timestamp: UnixSeconds,
    owner: &'a str,
    status: Status,
    score: Score,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    #[serde(default)]
    id: Option<RecordId>,
    image_data: String,
    user_answer: String,
    timestamp: UnixSeconds,
    owner: Owner,
    #[serde(default, deserialize_with = "status::deserialize_lenient")]
    status: Status,
    #[serde(default, deserialize_with = "score_or_zero")]
    score: Score,
}

fn score_or_zero<'de, D>(deserializer: D) -> std::result::Result<Score, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Score>::deserialize(deserializer)?.unwrap_or_default())
}

impl Encoding {
    /// Encode a record's stored fields.
    pub fn encode_record(self, record: &Record) -> Result<Vec<u8>> {
        let wire = WireRecordRef {
            image_data: &record.payload.image_data,
            user_answer: &record.payload.answer,
            timestamp: record.created_at,
            owner: record.owner.as_str(),
            status: record.status,
            score: record.score,
        };
        self.encode(&wire)
    }

    /// Decode the bytes stored under the key of record `id`.
    pub fn decode_record(self, id: &RecordId, bytes: &[u8]) -> Result<Record> {
        if bytes.is_empty() {
            return Err(CoreError::Decoding("record bytes are empty".into()));
        }
        let wire: WireRecord = self.decode(bytes)?;

        if let Some(stored) = &wire.id {
            if stored != id {
                return Err(CoreError::Decoding(format!(
                    "record id mismatch: key says {}, bytes say {}",
                    id, stored
                )));
            }
        }

        Ok(Record {
            id: id.clone(),
            payload: Payload {
                image_data: wire.image_data,
                answer: wire.user_answer,
            },
            created_at: wire.timestamp,
            owner: wire.owner,
            status: wire.status,
            score: wire.score,
        })
    }

    /// Encode the index as a sequence of id strings.
    pub fn encode_index(self, ids: &[RecordId]) -> Result<Vec<u8>> {
        self.encode(&ids)
    }

    /// Decode the index. Empty bytes mean the store was never initialized.
    pub fn decode_index(self, bytes: &[u8]) -> Result<Vec<RecordId>> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        self.decode(bytes)
    }

    fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            Encoding::Json => {
                serde_json::to_vec(value).map_err(|e| CoreError::Encoding(e.to_string()))
            }
            Encoding::Cbor => {
                let mut buf = Vec::new();
                ciborium::into_writer(value, &mut buf)
                    .map_err(|e| CoreError::Encoding(e.to_string()))?;
                Ok(buf)
            }
        }
    }

    fn decode<T: for<'de> Deserialize<'de>>(self, bytes: &[u8]) -> Result<T> {
        match self {
            Encoding::Json => {
                serde_json::from_slice(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
            }
            Encoding::Cbor => {
                ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
            }
        }
    }
}

/// Short hex rendering of the start of `bytes`, for diagnostics.
pub fn preview(bytes: &[u8]) -> String {
    let head = &bytes[..bytes.len().min(PREVIEW_LEN)];
    if bytes.len() > PREVIEW_LEN {
        format!("{}..", hex::encode(head))
    } else {
        hex::encode(head)
    }
}
