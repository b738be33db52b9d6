//! Logging setup and per-frame statistics.
//!
//! The crate logs through the `log` facade. [`init_logger`] installs
//! `env_logger` with an `info` default that `RUST_LOG` overrides. Hosts with
//! their own logger simply don't call it.
//!
//! With the `diagnostics` feature, every [`FrameReport`](crate::game::FrameReport)
//! carries a [`FrameStats`] and each frame's numbers are traced at `trace`
//! level.

#[cfg(feature = "diagnostics")]
use std::time::Duration;

/// Install `env_logger`. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Timing and entity counts for one frame.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Wall time spent in update steps (hooks, collisions, flush).
    pub update_time: Duration,
    /// Wall time spent rendering.
    pub render_time: Duration,
    /// Entities in the active scene after the frame.
    pub entities: usize,
    /// Collision pairs after the last step.
    pub pairs: usize,
    pub spawned: u32,
    pub destroyed: u32,
}

#[cfg(feature = "diagnostics")]
impl FrameStats {
    pub(crate) fn trace(&self, frame: u64) {
        log::trace!(
            "frame {frame}: update {:.3}ms render {:.3}ms, {} entities (+{} -{}), {} pairs",
            self.update_time.as_secs_f64() * 1000.0,
            self.render_time.as_secs_f64() * 1000.0,
            self.entities,
            self.spawned,
            self.destroyed,
            self.pairs,
        );
    }
}
