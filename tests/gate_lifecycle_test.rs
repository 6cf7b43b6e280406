use session_gate::session::{
    ActivityKind, GateConfig, GateState, MemorySessionStore, SessionController, SessionStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

// Real-clock tests use wide timing margins to avoid flaky behavior on slow
// CI runners: timeouts of a few hundred ms, waits bounded at several seconds.

fn short_lived_gate(secret: &str, timeout_ms: u64) -> (SessionController, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::new());
    let config = GateConfig::new(secret)
        .with_timeout_ms(timeout_ms)
        .with_check_interval_ms(50);
    let controller =
        SessionController::new(config, Arc::clone(&store) as Arc<dyn SessionStore>);
    (controller, store)
}

/// Full lifecycle: locked at first, unlocked on the right secret, re-locked
/// by the background staleness checker with no interaction at all
#[tokio::test]
async fn test_gate_relocks_after_inactivity() {
    let (controller, store) = short_lived_gate("open-sesame", 300);

    assert_eq!(controller.initialize().await, GateState::Locked);
    assert!(!controller.attempt_unlock("wrong").await);
    assert!(controller.attempt_unlock("open-sesame").await);
    assert_eq!(controller.state(), GateState::Unlocked);

    // Wait for the checker to notice the idle session
    let mut rx = controller.subscribe();
    timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("gate never re-locked")
        .unwrap();

    assert_eq!(*rx.borrow(), GateState::Locked);
    assert!(!controller.is_authenticated().await);
    assert!(store.raw("authenticated").await.is_none());
}

/// Steady activity through the attached event source keeps the session
/// alive well past the inactivity timeout
#[tokio::test]
async fn test_activity_source_keeps_gate_open() {
    let (controller, _store) = short_lived_gate("open-sesame", 400);

    controller.initialize().await;
    assert!(controller.attempt_unlock("open-sesame").await);

    let (tx, rx) = mpsc::unbounded_channel();
    controller.attach_activity_source(rx).await;

    // 8 x 100ms of activity: twice the timeout, refreshed throughout
    for _ in 0..8 {
        sleep(Duration::from_millis(100)).await;
        tx.send(ActivityKind::PointerClick).unwrap();
    }

    assert_eq!(controller.state(), GateState::Unlocked);
    assert!(controller.is_authenticated().await);

    // Stop interacting: the gate must close on its own
    let mut state_rx = controller.subscribe();
    timeout(Duration::from_secs(5), state_rx.changed())
        .await
        .expect("gate never re-locked after activity stopped")
        .unwrap();
    assert_eq!(*state_rx.borrow(), GateState::Locked);
}

/// Shutdown tears down the staleness checker, so an idle session is no
/// longer revoked in the background
#[tokio::test]
async fn test_shutdown_stops_background_checks() {
    let (controller, _store) = short_lived_gate("open-sesame", 200);

    controller.initialize().await;
    controller.attempt_unlock("open-sesame").await;
    controller.shutdown().await;

    sleep(Duration::from_millis(600)).await;

    // Nothing re-locked the gate while the checker was down
    assert_eq!(controller.state(), GateState::Unlocked);
}

/// A zero timeout disables expiry entirely; the session survives arbitrary
/// idle gaps and no checker is running
#[tokio::test]
async fn test_disabled_auto_lock_never_relocks() {
    let (controller, _store) = short_lived_gate("open-sesame", 0);

    controller.initialize().await;
    controller.attempt_unlock("open-sesame").await;

    sleep(Duration::from_millis(400)).await;

    assert_eq!(controller.state(), GateState::Unlocked);
    assert!(controller.is_authenticated().await);
}

/// A second controller sharing the store recovers the session written by
/// the first, then resolves staleness on its own
#[tokio::test]
async fn test_session_recovered_across_controllers() {
    let store = Arc::new(MemorySessionStore::new());

    let first = SessionController::new(
        GateConfig::new("open-sesame").with_timeout_ms(10_000),
        Arc::clone(&store) as Arc<dyn SessionStore>,
    );
    first.initialize().await;
    first.attempt_unlock("open-sesame").await;
    first.shutdown().await;
    drop(first);

    let second = SessionController::new(
        GateConfig::new("open-sesame").with_timeout_ms(10_000),
        Arc::clone(&store) as Arc<dyn SessionStore>,
    );
    assert_eq!(second.initialize().await, GateState::Unlocked);
    assert!(second.is_authenticated().await);
}
