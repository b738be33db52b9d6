//! # Game Loop: Variable and Fixed Timesteps
//!
//! Decides how many update steps a frame runs, and how long each step is.
//!
//! ```text
//! Variable:  frame delta ──clamp──▶ 1 update(delta)
//!
//! Fixed:     frame delta ──clamp──▶ accumulator += delta
//!                                   while accumulator >= step:
//!                                       update(step); accumulator -= step
//!                                   alpha = accumulator / step
//! ```
//!
//! Fixed mode is deterministic: the accumulator is a [`Duration`] (integer
//! nanoseconds), so the same sequence of frame deltas always produces the same
//! sequence of steps. A frame that would need more than `max_steps` steps
//! drops the excess whole steps instead of trying to catch up, which would
//! only make the next frame slower still.

use std::time::Duration;

/// How the loop turns frame time into update steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// One update per frame with the frame's clamped delta.
    Variable { max_delta: Duration },
    /// Zero or more updates of exactly `step` per frame.
    Fixed {
        step: Duration,
        max_delta: Duration,
        max_steps: u32,
    },
}

impl LoopMode {
    /// Upper bound applied to every frame delta.
    pub fn max_delta(&self) -> Duration {
        match *self {
            LoopMode::Variable { max_delta } | LoopMode::Fixed { max_delta, .. } => max_delta,
        }
    }
}

impl Default for LoopMode {
    fn default() -> Self {
        LoopMode::Variable {
            max_delta: Duration::from_millis(250),
        }
    }
}

/// The steps one frame should run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    /// Number of update steps.
    pub steps: u32,
    /// Length of each step.
    pub step: Duration,
    /// Whole steps discarded by the `max_steps` guard.
    pub dropped: u32,
    /// Interpolation fraction left in the accumulator.
    pub alpha: f32,
}

/// Accumulator state for [`LoopMode`].
#[derive(Debug, Clone)]
pub struct FrameStepper {
    mode: LoopMode,
    accumulator: Duration,
}

impl FrameStepper {
    pub fn new(mode: LoopMode) -> Self {
        Self {
            mode,
            accumulator: Duration::ZERO,
        }
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    /// Empty the accumulator.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }

    /// Clamp a raw frame delta to the mode's `max_delta`.
    pub fn clamp(&self, real_delta: Duration) -> Duration {
        real_delta.min(self.mode.max_delta())
    }

    /// Plan the update steps for a frame whose clamped delta is `delta`.
    pub fn advance(&mut self, delta: Duration) -> FramePlan {
        match self.mode {
            LoopMode::Variable { .. } => FramePlan {
                steps: 1,
                step: delta,
                dropped: 0,
                alpha: 0.0,
            },
            LoopMode::Fixed { step, .. } if step.is_zero() => {
                log::warn!("fixed step is zero, running no updates");
                FramePlan {
                    steps: 0,
                    step,
                    dropped: 0,
                    alpha: 0.0,
                }
            }
            LoopMode::Fixed {
                step, max_steps, ..
            } => {
                self.accumulator += delta;
                let mut steps = 0;
                while self.accumulator >= step && steps < max_steps {
                    self.accumulator -= step;
                    steps += 1;
                }

                let mut dropped = 0;
                if self.accumulator >= step {
                    dropped = (self.accumulator.as_nanos() / step.as_nanos()) as u32;
                    self.accumulator -= step * dropped;
                    log::warn!(
                        "frame needed more than {max_steps} fixed steps, dropped {dropped}"
                    );
                }

                FramePlan {
                    steps,
                    step,
                    dropped,
                    alpha: self.accumulator.as_secs_f32() / step.as_secs_f32(),
                }
            }
        }
    }
}
