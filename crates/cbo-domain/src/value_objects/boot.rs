//! Boot phase state machine
//!
//! Phases progress strictly forward:
//!
//! ```text
//! NotStarted -> Configuring -> Resolving -> AcquiringMainDom -> Finalizing -> Running
//!      \______________\____________\______________\________________\-> Failed
//! ```
//!
//! `Failed` is terminal and reachable from every non-terminal phase.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered runtime boot stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BootPhase {
    /// Boot has not begun
    #[default]
    NotStarted,
    /// Validating configuration and wiring logging
    Configuring,
    /// Discovering types, selecting providers and populating the container
    Resolving,
    /// Acquiring the cross-process MainDom lock
    AcquiringMainDom,
    /// Freezing the container and initializing components
    Finalizing,
    /// Boot completed
    Running,
    /// Boot failed
    Failed,
}

impl BootPhase {
    /// Position of the phase in the forward sequence
    ///
    /// `Failed` has no position in the sequence.
    pub fn ordinal(self) -> Option<u8> {
        match self {
            Self::NotStarted => Some(0),
            Self::Configuring => Some(1),
            Self::Resolving => Some(2),
            Self::AcquiringMainDom => Some(3),
            Self::Finalizing => Some(4),
            Self::Running => Some(5),
            Self::Failed => None,
        }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Running | Self::Failed)
    }

    /// Whether `next` is a legal transition from this phase
    pub fn can_advance_to(self, next: BootPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.ordinal(), next.ordinal()) {
            (_, None) => true,
            (Some(current), Some(next)) => next == current + 1,
            (None, Some(_)) => false,
        }
    }

    /// Human-readable phase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Configuring => "configuring",
            Self::Resolving => "resolving",
            Self::AcquiringMainDom => "acquiring-main-dom",
            Self::Finalizing => "finalizing",
            Self::Running => "running",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure record kept by the boot state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootFailure {
    /// Phase that was active when boot failed
    pub phase: BootPhase,
    /// Rendered cause
    pub message: String,
}

/// Current boot phase plus failure record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootState {
    phase: BootPhase,
    failure: Option<BootFailure>,
}

impl BootState {
    /// Fresh state at `NotStarted`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase
    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    /// Failure record, set once the state reaches `Failed`
    pub fn failure(&self) -> Option<&BootFailure> {
        self.failure.as_ref()
    }

    /// Whether boot completed
    pub fn is_running(&self) -> bool {
        self.phase == BootPhase::Running
    }

    /// Whether boot failed
    pub fn is_failed(&self) -> bool {
        self.phase == BootPhase::Failed
    }

    /// Move to the next phase
    ///
    /// Only the immediate successor is accepted; use [`BootState::fail`] to
    /// reach `Failed`.
    pub fn advance(&mut self, next: BootPhase) -> Result<()> {
        if next == BootPhase::Failed || !self.phase.can_advance_to(next) {
            return Err(Error::internal(format!(
                "Illegal boot transition {} -> {}",
                self.phase, next
            )));
        }
        self.phase = next;
        Ok(())
    }

    /// Record a failure in the current phase and move to `Failed`
    ///
    /// Returns the failure record. Failing an already terminal state keeps the
    /// original outcome.
    pub fn fail(&mut self, message: impl Into<String>) -> BootFailure {
        if let Some(existing) = &self.failure {
            return existing.clone();
        }
        let failure = BootFailure {
            phase: self.phase,
            message: message.into(),
        };
        if !self.phase.is_terminal() {
            self.phase = BootPhase::Failed;
            self.failure = Some(failure.clone());
        }
        failure
    }
}
