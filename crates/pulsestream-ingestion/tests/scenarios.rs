//! End-to-end scenarios over in-memory fakes covering idempotent retries,
//! tenant isolation, rate limiting, partial-batch success, concurrent
//! duplicate races, and timestamp boundary validation.

use chrono::Utc;
use pulsestream_ingestion::{process_batch, IngestionConfig, IngestionCoordinator, Validator};
use pulsestream_storage::fakes::{
    AlwaysFailingWorkerQueue, InMemoryBackend, InMemoryRateLimiter, InMemoryWorkerQueue,
};
use pulsestream_types::event::{EventSubmission, RawSource};
use pulsestream_types::ports::store::Store;
use pulsestream_types::{Tenant, TenantId};

fn tenant(limit: u32) -> Tenant {
    Tenant {
        id: TenantId::new(),
        name: "T".to_string(),
        slug: "t".to_string(),
        contact_email: "ops@t.test".to_string(),
        api_credential: "cred".to_string(),
        active: true,
        max_events_per_minute: limit,
        monthly_event_quota: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn submission(event_id: Option<&str>, title: &str) -> EventSubmission {
    EventSubmission {
        event_type: Some("api_call".to_string()),
        event_id: event_id.map(|s| s.to_string()),
        timestamp: None,
        title: Some(title.to_string()),
        message: None,
        severity: Some("info".to_string()),
        source: Some(RawSource {
            service: Some("s".to_string()),
            endpoint: None,
            method: None,
            version: None,
            environment: None,
        }),
        context: None,
        metrics: None,
        payload: None,
    }
}

#[tokio::test]
async fn scenario_a_idempotent_retry() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = InMemoryWorkerQueue::new();
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t1 = tenant(100);

    let first = coordinator
        .ingest(&t1, submission(Some("evt-1"), "x"))
        .await
        .expect("first ingest succeeds");
    assert!(!first.duplicate);

    let second = coordinator
        .ingest(&t1, submission(Some("evt-1"), "x"))
        .await
        .expect("duplicate ingest still succeeds");
    assert!(second.duplicate);
    assert_eq!(first.event_id, second.event_id);

    let filter = pulsestream_types::event::EventFilter::default();
    let (events, total) = store.search_events(t1.id, &filter).await.unwrap();
    let _ = events;
    assert_eq!(total, 1, "exactly one stored row for evt-1");
}

#[tokio::test]
async fn scenario_b_tenant_isolation() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = InMemoryWorkerQueue::new();
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t1 = tenant(100);
    let t2 = tenant(100);

    for i in 0..3 {
        coordinator
            .ingest(&t1, submission(None, &format!("t1-{i}")))
            .await
            .unwrap();
    }
    for i in 0..2 {
        coordinator
            .ingest(&t2, submission(None, &format!("t2-{i}")))
            .await
            .unwrap();
    }

    let filter = pulsestream_types::event::EventFilter::default();
    let (t1_events, t1_total) = store.search_events(t1.id, &filter).await.unwrap();
    let (t2_events, t2_total) = store.search_events(t2.id, &filter).await.unwrap();
    assert_eq!(t1_total, 3);
    assert_eq!(t2_total, 2);
    assert!(t1_events.iter().all(|e| e.tenant_id == t1.id));
    assert!(t2_events.iter().all(|e| e.tenant_id == t2.id));
}

#[tokio::test]
async fn scenario_c_rate_limit_enforcement() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = InMemoryWorkerQueue::new();
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t3 = tenant(10);
    let mut success = 0;
    let mut rejected = 0;

    for i in 0..15 {
        match coordinator.ingest(&t3, submission(None, &format!("e{i}"))).await {
            Ok(_) => success += 1,
            Err(pulsestream_types::PulseError::RateLimited { retry_after_seconds }) => {
                assert!(retry_after_seconds > 0 && retry_after_seconds <= 60);
                rejected += 1;
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(success, 10);
    assert_eq!(rejected, 5);

    let filter = pulsestream_types::event::EventFilter::default();
    let (_, total) = store.search_events(t3.id, &filter).await.unwrap();
    assert_eq!(total, 10);
}

#[tokio::test]
async fn scenario_d_partial_batch() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = InMemoryWorkerQueue::new();
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t1 = tenant(100);
    let mut events: Vec<_> = (0..10).map(|i| submission(None, &format!("b{i}"))).collect();
    events[5].event_type = None;

    let result = process_batch(&coordinator, &t1, 1000, events).await.unwrap();

    assert_eq!(result.successful_count, 9);
    assert_eq!(result.failed_count, 1);
    assert!(!result.all_failed());

    let filter = pulsestream_types::event::EventFilter::default();
    let (_, total) = store.search_events(t1.id, &filter).await.unwrap();
    assert_eq!(total, 9);
}

#[tokio::test]
async fn scenario_e_late_arriving_duplicate() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = InMemoryWorkerQueue::new();
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t1 = tenant(100);

    // Two racers submit the same external id concurrently; whichever wins
    // the insert should be observed identically by both. `tokio::join!`
    // interleaves both futures on this task, which is enough to exercise
    // the fake store's reservation-based serialization (see
    // InMemoryTransaction::insert_event).
    let (first, second) = tokio::join!(
        coordinator.ingest(&t1, submission(Some("evt-2"), "racer-a")),
        coordinator.ingest(&t1, submission(Some("evt-2"), "racer-b")),
    );
    let first = first.expect("racer a succeeds");
    let second = second.expect("racer b succeeds");

    assert_eq!(first.event_id, second.event_id, "both racers observe the same id");
    assert!(first.duplicate ^ second.duplicate, "exactly one racer wins the insert");

    let filter = pulsestream_types::event::EventFilter::default();
    let (_, total) = store.search_events(t1.id, &filter).await.unwrap();
    assert_eq!(total, 1, "exactly one row exists for evt-2");
}

#[tokio::test]
async fn scenario_f_validation_timestamp() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = InMemoryWorkerQueue::new();
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t1 = tenant(100);

    let mut ten_days_old = submission(None, "ok");
    ten_days_old.timestamp = Some((Utc::now() - chrono::Duration::days(10)).to_rfc3339());
    assert!(coordinator.ingest(&t1, ten_days_old).await.is_ok());

    let mut forty_days_old = submission(None, "too-old");
    forty_days_old.timestamp = Some((Utc::now() - chrono::Duration::days(40)).to_rfc3339());
    let err = coordinator.ingest(&t1, forty_days_old).await.unwrap_err();
    match err {
        pulsestream_types::PulseError::InvalidEvent(fields) => {
            assert!(fields.iter().any(|f| f.path == "timestamp"));
        }
        other => panic!("expected InvalidEvent, got {other:?}"),
    }
}

#[tokio::test]
async fn enqueue_failure_does_not_fail_the_request() {
    let backend = InMemoryBackend::new();
    let store = backend.store();
    let tx_manager = backend.transaction_manager();
    let rate_limiter = InMemoryRateLimiter::new();
    let worker_queue = AlwaysFailingWorkerQueue;
    let coordinator = IngestionCoordinator::new(
        Validator::new(IngestionConfig::default()),
        &store,
        &tx_manager,
        &rate_limiter,
        &worker_queue,
    );

    let t1 = tenant(100);
    let outcome = coordinator.ingest(&t1, submission(None, "x")).await;
    assert!(outcome.is_ok(), "enqueue failure must be swallowed, not propagated");
}
