//! Runtime bootstrap
//!
//! [`BootSequencer`] turns a configuration snapshot into a [`BootedRuntime`]
//! holding the frozen [`Factory`](crate::di::Factory).

mod hash;
mod profiler;
mod sequencer;

pub use hash::RuntimeHashBuilder;
pub use profiler::{BootProfiler, PhaseTiming};
pub use sequencer::{BootSequencer, BootedRuntime};
