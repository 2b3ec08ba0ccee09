//! Behaviour under backend failures, corruption, contention and latency.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kvrecord::backend::{Backend, MemoryBackend};
use kvrecord::{
    Encoding, ErrorKind, IndexWriteMode, RecordError, RecordId, RecordStore, SkipReason,
    StoreConfig,
};
use kvrecord_testkit::fixtures::{owner, sample_payload, FixedIds, StoreFixture};
use kvrecord_testkit::{init_tracing, FaultyBackend};

fn faulty(config: StoreConfig) -> StoreFixture<FaultyBackend<MemoryBackend>> {
    init_tracing();
    StoreFixture::over(FaultyBackend::new(MemoryBackend::new()), config)
}

#[tokio::test]
async fn test_record_is_written_before_index() {
    let fixture = faulty(StoreConfig::default());
    let id = fixture.submit("ordered", "0xAA").await.unwrap();

    let keys = &fixture.store.config().keys;
    assert_eq!(
        fixture.backend().writes(),
        vec![keys.record_key(&id), keys.index_key.clone()]
    );
}

#[tokio::test]
async fn test_failed_index_write_leaves_orphan() {
    let fixture = faulty(StoreConfig::default());
    let kept = fixture.submit("kept", "0xAA").await.unwrap();

    let index_key = fixture.store.config().keys.index_key.clone();
    fixture.backend().fail_writes(index_key);

    let err = fixture.submit("lost", "0xAA").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert!(err.is_transient());

    fixture.backend().heal();

    let listed: Vec<_> = fixture
        .store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(listed, vec![kept]);

    let orphans = fixture.store.list_orphans().await.unwrap();
    assert_eq!(orphans.len(), 1);
    let orphan = fixture.store.get(&orphans[0]).await.unwrap();
    assert_eq!(orphan.payload.answer, "lost");
}

#[tokio::test]
async fn test_failed_record_write_touches_nothing_else() {
    init_tracing();
    // Pin the id so the failing key is known up front.
    let id = RecordId::new("1-pinned").unwrap();
    let store = RecordStore::new(FaultyBackend::new(MemoryBackend::new()), StoreConfig::default())
        .with_id_source(FixedIds(id.clone()));
    store
        .backend()
        .fail_writes(store.config().keys.record_key(&id));

    let err = store.submit(sample_payload("x"), owner("0xAA")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    assert!(store.backend().writes().is_empty());
    assert!(store.read_index().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_and_missing_records_are_skipped() {
    let fixture = faulty(StoreConfig::default());
    let good = fixture.submit("good", "0xAA").await.unwrap();
    let bad = fixture.submit("bad", "0xAA").await.unwrap();
    let gone = fixture.submit("gone", "0xAA").await.unwrap();
    let unreadable = fixture.submit("unreadable", "0xAA").await.unwrap();

    let keys = fixture.store.config().keys.clone();
    let inner = fixture.backend().inner();
    inner
        .write(&keys.record_key(&bad), Bytes::from_static(b"\x00\x01garbage"))
        .await
        .unwrap();
    inner.write(&keys.record_key(&gone), Bytes::new()).await.unwrap();
    fixture.backend().fail_reads(keys.record_key(&unreadable));

    let listing = fixture.store.list_detailed().await.unwrap();
    assert_eq!(listing.records.len(), 1);
    assert_eq!(listing.records[0].id, good);
    assert_eq!(listing.skipped.len(), 3);
    assert_eq!(listing.summary().total, 1);

    for skipped in &listing.skipped {
        if skipped.id == bad {
            assert!(matches!(&skipped.reason, SkipReason::Corrupt(r) if r.contains("0001")));
        } else if skipped.id == gone {
            assert_eq!(skipped.reason, SkipReason::Missing);
        } else {
            assert_eq!(skipped.id, unreadable);
            assert!(matches!(skipped.reason, SkipReason::Unavailable(_)));
        }
    }

    let err = fixture.store.get(&bad).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptData);
    let err = fixture.store.get(&gone).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unreadable_index_fails_listing() {
    let fixture = faulty(StoreConfig::default());
    fixture.submit("x", "0xAA").await.unwrap();

    let index_key = fixture.store.config().keys.index_key.clone();
    fixture.backend().fail_reads(index_key);

    let err = fixture.store.list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
}

#[tokio::test]
async fn test_unavailable_backend_fails_fast() {
    let fixture = faulty(StoreConfig::default());
    fixture.backend().set_unavailable(true);

    let err = fixture.store.list().await.unwrap_err();
    assert!(matches!(err, RecordError::BackendUnavailable { .. }));

    let unchecked = faulty(StoreConfig::default().with_availability_check(false));
    unchecked.backend().set_unavailable(true);
    assert!(unchecked.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_collision_exhausts_attempts() {
    init_tracing();
    let id = RecordId::new("1736870400000-aaaaaaa").unwrap();
    let store = RecordStore::new(MemoryBackend::new(), StoreConfig::default().with_max_id_attempts(4))
        .with_id_source(FixedIds(id.clone()));

    let first = store.submit(sample_payload("one"), owner("0xAA")).await.unwrap();
    assert_eq!(first, id);

    let err = store
        .submit(sample_payload("two"), owner("0xAA"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::CollisionDetected { attempts: 4 }));
    assert!(err.is_transient());

    // The existing record was not overwritten.
    assert_eq!(store.get(&id).await.unwrap().payload.answer, "one");
    assert_eq!(store.read_index().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_read_timeout_is_unavailable() {
    let fixture = faulty(StoreConfig::default().with_call_timeout(Duration::from_millis(20)));
    fixture.backend().delay_reads(Duration::from_millis(500));

    let err = fixture.store.list().await.unwrap_err();
    match err {
        RecordError::BackendUnavailable { reason, .. } => assert!(reason.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_compare_and_swap_retries_lost_races() {
    let config = StoreConfig::default()
        .with_index_write(IndexWriteMode::CompareAndSwap { max_attempts: 3 });
    let fixture = faulty(config);

    fixture.backend().lose_next_swaps(2);
    let id = fixture.submit("retried", "0xAA").await.unwrap();
    assert_eq!(fixture.store.read_index().await.unwrap().as_slice(), &[id]);

    fixture.backend().lose_next_swaps(5);
    let err = fixture.submit("starved", "0xAA").await.unwrap_err();
    assert!(matches!(err, RecordError::IndexContention { attempts: 3 }));
    assert_eq!(fixture.store.list_orphans().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_with_compare_and_swap() {
    init_tracing();
    let config = StoreConfig::default()
        .with_index_write(IndexWriteMode::CompareAndSwap { max_attempts: 64 });
    let store = Arc::new(RecordStore::new(MemoryBackend::new(), config));

    let mut handles = Vec::new();
    for n in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .submit(sample_payload(&format!("c{}", n)), owner("0xAA"))
                .await
        }));
    }

    let mut created = Vec::new();
    for handle in handles {
        created.push(handle.await.unwrap().unwrap());
    }

    let index = store.read_index().await.unwrap();
    assert_eq!(index.len(), 32);
    for id in &created {
        assert!(index.contains(id));
    }
    assert_eq!(store.list().await.unwrap().len(), 32);
}

#[tokio::test]
async fn test_listing_respects_concurrency_limit_of_one() {
    let fixture = faulty(StoreConfig::default().with_list_concurrency(1));
    for n in 0..5 {
        fixture.submit(&format!("s{}", n), "0xAA").await.unwrap();
    }
    assert_eq!(fixture.store.list().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_compare_and_swap_mode_needs_backend_support() {
    let config = StoreConfig::default()
        .with_index_write(IndexWriteMode::CompareAndSwap { max_attempts: 3 });
    let fixture = faulty(config);
    fixture.backend().disable_compare_and_swap();

    for n in 0..3 {
        let err = fixture.submit(&format!("r{}", n), "0xAA").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(!err.is_transient());
    }

    // Refused up front: no record, no orphan.
    assert!(fixture.backend().writes().is_empty());
    assert!(fixture.backend().inner().is_empty());
}

#[tokio::test]
async fn test_orphan_scan_needs_backend_support() {
    let fixture = faulty(StoreConfig::default());
    fixture.submit("x", "0xAA").await.unwrap();
    fixture.backend().disable_scan_keys();

    let err = fixture.store.list_orphans().await.unwrap_err();
    assert!(matches!(err, RecordError::Unsupported("scan_keys")));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_transition_writes_only_the_record_key() {
    let fixture = faulty(StoreConfig::default());
    let verified = fixture.submit("v", "0xAA").await.unwrap();
    let rejected = fixture.submit("r", "0xAA").await.unwrap();
    let before = fixture.backend().writes().len();

    fixture.store.verify(&verified, &owner("0xAA")).await.unwrap();
    fixture.store.reject(&rejected, &owner("0xAA")).await.unwrap();

    // Refused transitions write nothing at all.
    fixture.store.reject(&verified, &owner("0xAA")).await.unwrap_err();
    fixture.store.verify(&rejected, &owner("0xBB")).await.unwrap_err();

    let keys = &fixture.store.config().keys;
    assert_eq!(
        fixture.backend().writes()[before..],
        [keys.record_key(&verified), keys.record_key(&rejected)]
    );
}

#[tokio::test]
async fn test_duplicate_index_entries_are_collapsed_on_next_write() {
    let fixture = faulty(StoreConfig::default());
    let first = fixture.submit("first", "0xAA").await.unwrap();

    let index_key = fixture.store.config().keys.index_key.clone();
    let doubled = Encoding::Json
        .encode_index(&[first.clone(), first.clone()])
        .unwrap();
    fixture
        .backend()
        .inner()
        .write(&index_key, Bytes::from(doubled))
        .await
        .unwrap();

    // Reads collapse the duplicate without rewriting.
    assert_eq!(fixture.store.list().await.unwrap().len(), 1);
    assert_eq!(fixture.store.read_index().await.unwrap().len(), 1);

    let second = fixture.submit("second", "0xAA").await.unwrap();

    let raw = fixture.backend().read(&index_key).await.unwrap();
    assert_eq!(
        Encoding::Json.decode_index(&raw).unwrap(),
        vec![first, second]
    );
    assert_eq!(fixture.store.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_index_key_is_never_a_record_id() {
    init_tracing();
    let reserved = RecordId::new("keys").unwrap();
    let store = RecordStore::new(
        FaultyBackend::new(MemoryBackend::new()),
        StoreConfig::default().with_max_id_attempts(2),
    )
    .with_id_source(FixedIds(reserved.clone()));

    let err = store
        .submit(sample_payload("x"), owner("0xAA"))
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::CollisionDetected { attempts: 2 }));
    assert!(store.backend().writes().is_empty());

    // Reads of the reserved id never decode the index as a record.
    let index_key = store.config().keys.index_key.clone();
    store
        .backend()
        .write(&index_key, Bytes::from_static(br#"["keys"]"#))
        .await
        .unwrap();
    assert!(matches!(
        store.get(&reserved).await,
        Err(RecordError::NotFound(_))
    ));
    assert!(matches!(
        store.verify(&reserved, &owner("0xAA")).await,
        Err(RecordError::NotFound(_))
    ));

    let listing = store.list_detailed().await.unwrap();
    assert!(listing.records.is_empty());
    assert_eq!(listing.skipped.len(), 1);
    assert_eq!(listing.skipped[0].reason, SkipReason::Missing);
}
