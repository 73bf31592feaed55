use super::*;
use crate::steps::ProvisioningStep;
use tokio::sync::mpsc;

fn event(tenant: &str, step: ProvisioningStep) -> ProgressEvent {
    ProgressEvent::step(tenant, step, step.label())
}

#[tokio::test]
async fn test_publish_reaches_only_subscribed_tenant() {
    let registry = BroadcastRegistry::new();
    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    let session_a = Uuid::new_v4();
    let session_b = Uuid::new_v4();

    registry.join(session_a, "acme", tx_a);
    registry.join(session_b, "globex", tx_b);

    let delivered = registry.publish(&event("acme", ProvisioningStep::RunningMigrations));
    assert_eq!(delivered, 1);

    let received = rx_a.recv().await.unwrap();
    assert_eq!(received.tenant_id, "acme");
    assert!(rx_b.try_recv().is_err());
}

#[tokio::test]
async fn test_multiple_sessions_per_tenant() {
    let registry = BroadcastRegistry::new();
    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();

    registry.join(Uuid::new_v4(), "acme", tx1);
    registry.join(Uuid::new_v4(), "acme", tx2);
    assert_eq!(registry.subscriber_count("acme"), 2);

    let delivered = registry.publish(&event("acme", ProvisioningStep::SeedingData));
    assert_eq!(delivered, 2);
    assert!(rx1.recv().await.is_some());
    assert!(rx2.recv().await.is_some());
}

#[test]
fn test_join_is_idempotent() {
    let registry = BroadcastRegistry::new();
    let session = Uuid::new_v4();
    let (tx, _rx) = mpsc::unbounded_channel();

    registry.join(session, "acme", tx.clone());
    registry.join(session, "acme", tx);
    assert_eq!(registry.subscriber_count("acme"), 1);
}

#[test]
fn test_leave_absent_membership_is_safe() {
    let registry = BroadcastRegistry::new();
    registry.leave(Uuid::new_v4(), "acme");
    assert_eq!(registry.subscriber_count("acme"), 0);
}

#[tokio::test]
async fn test_dead_subscriber_does_not_block_others() {
    let registry = BroadcastRegistry::new();
    let (tx_dead, rx_dead) = mpsc::unbounded_channel();
    let (tx_live, mut rx_live) = mpsc::unbounded_channel();
    drop(rx_dead);

    registry.join(Uuid::new_v4(), "acme", tx_dead);
    registry.join(Uuid::new_v4(), "acme", tx_live);

    let delivered = registry.publish(&event("acme", ProvisioningStep::Activating));
    assert_eq!(delivered, 1);
    assert!(rx_live.recv().await.is_some());

    // The dead channel was pruned in passing.
    assert_eq!(registry.subscriber_count("acme"), 1);
}

#[test]
fn test_session_closed_removes_all_memberships() {
    let registry = BroadcastRegistry::new();
    let session = Uuid::new_v4();
    let (tx, _rx) = mpsc::unbounded_channel();

    registry.join(session, "acme", tx.clone());
    registry.join(session, "globex", tx);
    assert_eq!(registry.session_count(), 1);

    registry.on_session_closed(session);
    assert_eq!(registry.subscriber_count("acme"), 0);
    assert_eq!(registry.subscriber_count("globex"), 0);
    assert_eq!(registry.session_count(), 0);
}

#[tokio::test]
async fn test_late_joiner_gets_last_event_replayed() {
    let registry = BroadcastRegistry::new();

    // Engine finishes before anyone is watching.
    registry.publish(&ProgressEvent::completed("acme", "tenant ready"));

    let (tx, _rx) = mpsc::unbounded_channel();
    let replayed = registry.join(Uuid::new_v4(), "acme", tx);
    let replayed = replayed.expect("last event should be replayed on join");
    assert!(replayed.is_completed);
    assert_eq!(replayed.tenant_id, "acme");
}

#[test]
fn test_publish_with_no_subscribers_is_fire_and_forget() {
    let registry = BroadcastRegistry::new();
    let delivered = registry.publish(&event("acme", ProvisioningStep::Initializing));
    assert_eq!(delivered, 0);
    // State is still retained for late joiners.
    assert!(registry.last_event("acme").is_some());
}
