//! Lifecycle Ports
//!
//! The host's graceful-shutdown signal and the startup component contract.

use crate::error::Result;
use async_trait::async_trait;

/// Shutdown coordination interface
///
/// The host signals graceful shutdown through this port so MainDom release
/// callbacks run before the process exits.
///
/// # Example
///
/// ```no_run
/// use cbo_domain::ports::ShutdownCoordinator;
/// use std::sync::Arc;
///
/// fn handle_shutdown(coordinator: Arc<dyn ShutdownCoordinator>) {
///     if coordinator.is_shutting_down() {
///         println!("Shutdown in progress, stopping work");
///     }
///     coordinator.signal_shutdown();
/// }
/// ```
#[async_trait]
pub trait ShutdownCoordinator: Send + Sync {
    /// Signal all components to begin shutdown
    fn signal_shutdown(&self);

    /// Check if shutdown has been signaled
    fn is_shutting_down(&self) -> bool;

    /// Wait until shutdown is signalled
    ///
    /// Returns immediately when shutdown was already signalled.
    async fn wait_for_shutdown(&self);
}

/// Startup component discovered through capability markers
pub trait Component: Send + Sync {
    /// Component name
    fn name(&self) -> &str;

    /// Called once after the container is frozen
    fn initialize(&self) -> Result<()>;

    /// Called once when the runtime stops or MainDom is lost
    fn terminate(&self) {}
}
