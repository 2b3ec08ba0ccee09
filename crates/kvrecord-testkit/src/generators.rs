//! Proptest generators for property-based testing.

use proptest::prelude::*;

use kvrecord_core::{Owner, Payload, Record, RecordId, Score, Status};

/// Generate an id in the usual `<millis>-<base36>` shape.
pub fn record_id() -> impl Strategy<Value = RecordId> {
    (0i64..=4_102_444_800_000i64, "[0-9a-z]{7}")
        .prop_filter_map("valid id", |(millis, suffix)| {
            RecordId::new(format!("{}-{}", millis, suffix)).ok()
        })
}

/// Generate an owner address with mixed-case hex.
pub fn owner() -> impl Strategy<Value = Owner> {
    "0x[0-9a-fA-F]{40}".prop_filter_map("non-blank owner", |s| Owner::new(s).ok())
}

pub fn score() -> impl Strategy<Value = Score> {
    (0u64..=100u64).prop_filter_map("in range", |v| Score::new(v).ok())
}

pub fn status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Pending),
        Just(Status::Verified),
        Just(Status::Rejected),
    ]
}

/// Generate a payload that passes validation.
pub fn payload() -> impl Strategy<Value = Payload> {
    ("[A-Za-z0-9+/]{1,64}", "[a-z]{1,12}( [a-z]{1,12}){0,3}").prop_map(|(data, answer)| {
        Payload::new(format!("data:image/png;base64,{}", data), answer)
    })
}

/// Creation time in seconds.
pub fn created_at() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800i64
}

/// Generate a record in any status.
pub fn record() -> impl Strategy<Value = Record> {
    (record_id(), payload(), owner(), score(), created_at(), status()).prop_map(
        |(id, payload, owner, score, created_at, status)| {
            let mut record = Record::new(id, payload, owner, score, created_at);
            record.status = status;
            record
        },
    )
}

/// Generate a batch of records with distinct ids.
pub fn records(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record(), 0..=max_len).prop_map(|mut records| {
        let mut seen = std::collections::HashSet::new();
        records.retain(|r| seen.insert(r.id.clone()));
        records
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvrecord_core::{sort_for_listing, summarize, Encoding};

    proptest! {
        #[test]
        fn test_generated_payloads_validate(p in payload()) {
            prop_assert!(p.validate().is_ok());
        }

        #[test]
        fn test_both_encodings_round_trip(r in record()) {
            for encoding in [Encoding::Json, Encoding::Cbor] {
                let bytes = encoding.encode_record(&r).unwrap();
                prop_assert_eq!(encoding.decode_record(&r.id, &bytes).unwrap(), r.clone());
            }
        }

        #[test]
        fn test_listing_order_is_total(mut rs in records(24)) {
            sort_for_listing(&mut rs);
            for pair in rs.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(
                    a.created_at > b.created_at
                        || (a.created_at == b.created_at && a.id < b.id)
                );
            }
        }

        #[test]
        fn test_summary_counts_partition(rs in records(24)) {
            let s = summarize(&rs);
            prop_assert_eq!(s.total, rs.len());
            prop_assert_eq!(s.verified_count + s.pending_count + s.rejected_count, s.total);
        }
    }
}
