//! Tests for host shutdown signalling

use cbo_domain::ports::ShutdownCoordinator;
use cbo_infrastructure::lifecycle::DefaultShutdownCoordinator;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_initial_state() {
    let coordinator = DefaultShutdownCoordinator::new();
    assert!(!coordinator.is_shutting_down());
}

#[test]
fn test_signal_is_idempotent() {
    let coordinator = DefaultShutdownCoordinator::default();
    coordinator.signal_shutdown();
    coordinator.signal_shutdown();
    assert!(coordinator.is_shutting_down());
}

#[tokio::test]
async fn test_wait_returns_after_signal() {
    let coordinator = Arc::new(DefaultShutdownCoordinator::new());
    let waiter = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.wait_for_shutdown().await })
    };
    tokio::task::yield_now().await;
    coordinator.signal_shutdown();

    tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("waiter should wake")
        .unwrap();
}

#[tokio::test]
async fn test_wait_returns_immediately_when_already_signalled() {
    let coordinator = DefaultShutdownCoordinator::new();
    coordinator.signal_shutdown();
    tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_shutdown())
        .await
        .expect("already signalled");
}

#[test]
fn test_usable_as_port() {
    let coordinator: Arc<dyn ShutdownCoordinator> = Arc::new(DefaultShutdownCoordinator::new());
    coordinator.signal_shutdown();
    assert!(coordinator.is_shutting_down());
}
