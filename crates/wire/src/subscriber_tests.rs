// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use flowjs_core::AuditStatus;
use uuid::Uuid;

#[test]
fn decode_accepts_a_well_formed_audit_event_payload() {
    let event = AuditEvent::lifecycle(Uuid::new_v4(), "orders-sync", AuditStatus::Completed, serde_json::Value::Null, None, 12);
    let payload = serde_json::to_vec(&event).unwrap();
    let decoded = decode(&payload).unwrap();
    assert_eq!(decoded.flow_id, "orders-sync");
}

#[test]
fn decode_drops_malformed_payloads_without_panicking() {
    assert!(decode(b"not json").is_none());
    assert!(decode(b"{}").is_none());
}

/// Exercises the subscribe/decode/forward path against a real NATS
/// server. Requires `NATS_URL` to point at a reachable instance.
#[tokio::test]
#[ignore = "requires a live NATS instance reachable at NATS_URL"]
async fn run_forwards_decoded_events_to_the_batcher() {
    let nats_url = std::env::var("NATS_URL").expect("NATS_URL must be set for this test");
    let client = connect(&nats_url).await.unwrap();
    let publisher = client.clone();

    let received: Arc<parking_lot::Mutex<Vec<AuditEvent>>> = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let recorded = received.clone();
    let flush_fn: flowjs_storage::FlushFn = Arc::new(move |batch| {
        let recorded = recorded.clone();
        Box::pin(async move {
            recorded.lock().extend(batch);
            Ok(())
        })
    });
    let batcher = Arc::new(AuditBatcher::new(10, Duration::from_millis(50), flush_fn));
    let subscriber = AuditSubscriber::new(client, batcher.clone());

    let run_handle = tokio::spawn({
        let subscriber = Arc::new(subscriber);
        let subscriber_for_stop = subscriber.clone();
        async move {
            tokio::spawn(async move { subscriber.run().await });
            tokio::time::sleep(Duration::from_millis(200)).await;
            subscriber_for_stop.stop().await;
        }
    });

    let event = AuditEvent::lifecycle(Uuid::new_v4(), "orders-sync", AuditStatus::Completed, serde_json::Value::Null, None, 1);
    publisher.publish(SUBJECT, serde_json::to_vec(&event).unwrap().into()).await.unwrap();
    publisher.flush().await.unwrap();

    let _ = run_handle.await;
    batcher.stop().await;
    assert_eq!(received.lock().len(), 1);
}
