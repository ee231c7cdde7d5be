//! Built-in components

use super::registry::{COMPONENTS, ComponentEntry};
use crate::config::AppConfig;
use crate::di::{Injectable, Resolver};
use cbo_domain::error::Result;
use cbo_domain::ports::Component;
use cbo_domain::value_objects::{Capability, DiscoveredTypes, RuntimeHash};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Publishes and unpublishes content on schedule
///
/// Runs in the MainDom process only; a second instance publishing the same
/// schedule would publish twice.
pub struct ScheduledPublishing {
    application_id: String,
    running: AtomicBool,
}

impl ScheduledPublishing {
    /// Component name
    pub const NAME: &'static str = "scheduled-publishing";

    /// Whether the scheduler is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Injectable for ScheduledPublishing {
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self> {
        let config = resolver.get::<AppConfig>()?;
        Ok(Self {
            application_id: config.global.application_id.clone(),
            running: AtomicBool::new(false),
        })
    }
}

impl Component for ScheduledPublishing {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        info!(application = %self.application_id, "Scheduled publishing started");
        Ok(())
    }

    fn terminate(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(application = %self.application_id, "Scheduled publishing stopped");
        }
    }
}

#[linkme::distributed_slice(COMPONENTS)]
static SCHEDULED_PUBLISHING: ComponentEntry = ComponentEntry {
    name: ScheduledPublishing::NAME,
    module: module_path!(),
    capabilities: &[Capability::Component, Capability::BackgroundTask],
    factory: |resolver| Ok(Arc::new(ScheduledPublishing::inject(resolver)?)),
};

/// Reports the runtime surface at startup
pub struct RuntimeReport {
    runtime_hash: Arc<RuntimeHash>,
    discovered: Arc<DiscoveredTypes>,
}

impl RuntimeReport {
    /// Component name
    pub const NAME: &'static str = "runtime-report";

    /// Runtime hash the report was built for
    pub fn runtime_hash(&self) -> &RuntimeHash {
        &self.runtime_hash
    }
}

impl Injectable for RuntimeReport {
    fn inject(resolver: &mut Resolver<'_>) -> Result<Self> {
        Ok(Self {
            runtime_hash: resolver.get()?,
            discovered: resolver.get()?,
        })
    }
}

impl Component for RuntimeReport {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(&self) -> Result<()> {
        info!(
            runtime_hash = %self.runtime_hash,
            components = self.discovered.len(),
            "Runtime surface"
        );
        Ok(())
    }
}

#[linkme::distributed_slice(COMPONENTS)]
static RUNTIME_REPORT: ComponentEntry = ComponentEntry {
    name: RuntimeReport::NAME,
    module: module_path!(),
    capabilities: &[Capability::Component, Capability::HealthCheck],
    factory: |resolver| Ok(Arc::new(RuntimeReport::inject(resolver)?)),
};
