//! Game time: per-step delta, elapsed total, frame counter.
//!
//! The [`Time`] value is advanced by the game driver once per frame, before
//! any update runs. Scenes read it through their context to get frame delta
//! time, total elapsed time, and the fixed-step interpolation fraction.
//!
//! Where the time comes from is abstracted behind [`Clock`]: [`SystemClock`]
//! reads the monotonic OS clock, [`ManualClock`] replays scripted deltas for
//! tests and headless runs.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame timing. Reset on start and updated each frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    /// Clamped duration of the current frame.
    delta: Duration,
    /// Sum of clamped deltas since start.
    elapsed: Duration,
    /// Frame counter.
    frame_count: u64,
    /// Leftover fraction of a fixed step, in `[0, 1)`.
    alpha: f32,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero everything. Called when the loop starts.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start a new frame with an already-clamped delta.
    pub(crate) fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    pub(crate) fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Duration of the current frame, clamped to the loop's `max_delta`.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// [`delta`](Time::delta) as `f32` seconds, ready to multiply velocities by.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total game time since start.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total game time in seconds (f32).
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames since start, including the current one.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the current frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }

    /// How far the fixed-step accumulator is into the next step, in `[0, 1)`.
    ///
    /// Renderers can interpolate between the previous and current simulation
    /// state with it. Always `0.0` in variable-step mode.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

// ── Clock ───────────────────────────────────────────────────────────────

/// A source of frame deltas for [`Game::run`](crate::game::Game::run).
pub trait Clock {
    /// Time elapsed since the previous call. The first call returns zero.
    fn tick(&mut self) -> Duration;

    /// Block until `budget` has passed since the last [`tick`](Clock::tick).
    fn wait(&mut self, budget: Duration);
}

/// Wall-clock time from [`Instant`].
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Option<Instant>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = self.last.map_or(Duration::ZERO, |last| now - last);
        self.last = Some(now);
        delta
    }

    fn wait(&mut self, budget: Duration) {
        if let Some(last) = self.last {
            let spent = last.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
    }
}

/// A clock that never looks at the OS.
///
/// Each tick returns the next scripted delta, or the fixed `step` once the
/// script runs out. Waiting returns immediately.
#[derive(Debug, Clone)]
pub struct ManualClock {
    step: Duration,
    script: VecDeque<Duration>,
    ticks: u64,
}

impl ManualClock {
    /// A clock that advances by `step` every tick.
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            script: VecDeque::new(),
            ticks: 0,
        }
    }

    /// A clock that replays `deltas` in order, then advances by `step`.
    pub fn scripted(deltas: impl IntoIterator<Item = Duration>, step: Duration) -> Self {
        Self {
            step,
            script: deltas.into_iter().collect(),
            ticks: 0,
        }
    }

    /// Queue one more delta.
    pub fn push(&mut self, delta: Duration) {
        self.script.push_back(delta);
    }

    /// Number of ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Clock for ManualClock {
    fn tick(&mut self) -> Duration {
        self.ticks += 1;
        if self.ticks == 1 {
            return Duration::ZERO;
        }
        self.script.pop_front().unwrap_or(self.step)
    }

    fn wait(&mut self, _budget: Duration) {}
}
