//! Legacy test vectors.
//!
//! Record bytes as written by the ledger web client and its earlier
//! versions, with the outcome the JSON codec must produce for each. New
//! clients must keep reading all of them.

use kvrecord_core::{Encoding, Record, RecordId, Status};

/// What a vector must decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    pub answer: &'static str,
    pub owner: &'static str,
    pub created_at: i64,
    pub status: Status,
    pub score: u8,
}

/// A stored value and its expected decode outcome.
#[derive(Debug, Clone)]
pub struct LegacyVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Id the bytes are stored under.
    pub id: &'static str,
    /// Stored bytes.
    pub bytes: &'static [u8],
    /// `None` if the bytes must be rejected as corrupt.
    pub expected: Option<Expected>,
}

/// Get all legacy vectors.
pub fn legacy_vectors() -> Vec<LegacyVector> {
    vec![
        LegacyVector {
            name: "current client, pending",
            id: "1736870400000-k3j9x0a",
            bytes: br#"{"imageData":"data:image/png;base64,AAAA","userAnswer":"a red circle","timestamp":1736870400,"owner":"0xAbC","status":"pending","score":57}"#,
            expected: Some(Expected {
                answer: "a red circle",
                owner: "0xAbC",
                created_at: 1_736_870_400,
                status: Status::Pending,
                score: 57,
            }),
        },
        LegacyVector {
            name: "current client, verified",
            id: "1736870401000-zz00abc",
            bytes: br#"{"imageData":"data:image/png;base64,BBBB","userAnswer":"two cats","timestamp":1736870401,"owner":"0xdef","status":"verified","score":100}"#,
            expected: Some(Expected {
                answer: "two cats",
                owner: "0xdef",
                created_at: 1_736_870_401,
                status: Status::Verified,
                score: 100,
            }),
        },
        LegacyVector {
            name: "pre-status client",
            id: "1700000000000-aaaaaaa",
            bytes: br#"{"imageData":"img","userAnswer":"sun","timestamp":1700000000,"owner":"0x1"}"#,
            expected: Some(Expected {
                answer: "sun",
                owner: "0x1",
                created_at: 1_700_000_000,
                status: Status::Pending,
                score: 0,
            }),
        },
        LegacyVector {
            name: "unknown status and null score",
            id: "1700000000001-bbbbbbb",
            bytes: br#"{"imageData":"img","userAnswer":"moon","timestamp":1700000001,"owner":"0x2","status":"archived","score":null}"#,
            expected: Some(Expected {
                answer: "moon",
                owner: "0x2",
                created_at: 1_700_000_001,
                status: Status::Pending,
                score: 0,
            }),
        },
        LegacyVector {
            name: "extra fields and matching id",
            id: "1700000000002-ccccccc",
            bytes: br#"{"id":"1700000000002-ccccccc","imageData":"img","userAnswer":"tree","timestamp":1700000002,"owner":"0x3","status":"rejected","score":12,"client":"v0"}"#,
            expected: Some(Expected {
                answer: "tree",
                owner: "0x3",
                created_at: 1_700_000_002,
                status: Status::Rejected,
                score: 12,
            }),
        },
        LegacyVector {
            name: "mismatched id",
            id: "1700000000003-ddddddd",
            bytes: br#"{"id":"someone-else","imageData":"img","userAnswer":"x","timestamp":1,"owner":"0x4"}"#,
            expected: None,
        },
        LegacyVector {
            name: "score above range",
            id: "1700000000004-eeeeeee",
            bytes: br#"{"imageData":"img","userAnswer":"x","timestamp":1,"owner":"0x5","score":101}"#,
            expected: None,
        },
        LegacyVector {
            name: "missing owner",
            id: "1700000000005-fffffff",
            bytes: br#"{"imageData":"img","userAnswer":"x","timestamp":1}"#,
            expected: None,
        },
        LegacyVector {
            name: "truncated",
            id: "1700000000006-ggggggg",
            bytes: br#"{"imageData":"img","userAn"#,
            expected: None,
        },
    ]
}

/// Decode a vector with the JSON codec.
pub fn decode_vector(vector: &LegacyVector) -> Option<Record> {
    let id = RecordId::new(vector.id).ok()?;
    Encoding::Json.decode_record(&id, vector.bytes).ok()
}

/// Check every vector, returning `(name, passed)` pairs.
pub fn verify_all_vectors() -> Vec<(&'static str, bool)> {
    legacy_vectors()
        .iter()
        .map(|vector| {
            let decoded = decode_vector(vector);
            let passed = match (&decoded, &vector.expected) {
                (Some(record), Some(expected)) => {
                    record.id.as_str() == vector.id
                        && record.payload.answer == expected.answer
                        && record.owner.as_str() == expected.owner
                        && record.created_at == expected.created_at
                        && record.status == expected.status
                        && record.score.value() == expected.score
                }
                (None, None) => true,
                _ => false,
            };
            (vector.name, passed)
        })
        .collect()
}
