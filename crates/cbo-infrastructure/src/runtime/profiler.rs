//! Boot profiling
//!
//! With `hosting.debug` set, the sequencer times every boot phase and logs
//! how long each one took.

use cbo_domain::value_objects::BootPhase;
use std::time::{Duration, Instant};
use tracing::info;

/// Time spent in one boot phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Phase that was timed
    pub phase: BootPhase,
    /// Time from entering the phase to leaving it
    pub elapsed: Duration,
}

impl PhaseTiming {
    /// Elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Phase timer; does nothing unless enabled
#[derive(Debug, Default)]
pub struct BootProfiler {
    enabled: bool,
    current: Option<(BootPhase, Instant)>,
    timings: Vec<PhaseTiming>,
}

impl BootProfiler {
    /// Profiler that records only when `enabled`
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    /// Whether phases are timed
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Close the running phase and start timing `phase`
    pub fn enter(&mut self, phase: BootPhase) {
        if !self.enabled {
            return;
        }
        self.finish();
        self.current = Some((phase, Instant::now()));
    }

    /// Close the running phase
    pub fn finish(&mut self) {
        let Some((phase, started)) = self.current.take() else {
            return;
        };
        let timing = PhaseTiming {
            phase,
            elapsed: started.elapsed(),
        };
        info!(phase = %phase, elapsed_ms = timing.elapsed_ms(), "Boot phase completed");
        self.timings.push(timing);
    }

    /// Completed phases, in boot order
    pub fn timings(&self) -> &[PhaseTiming] {
        &self.timings
    }
}
