//! Game configuration.
//!
//! Everything is optional: a missing field takes its default, so `{}` is a
//! valid config. Read from JSON with [`GameConfig::from_json_str`] or
//! [`GameConfig::from_file`], or build in code:
//!
//! ```ignore
//! let config = GameConfig::new("Asteroids")
//!     .size(800.0, 600.0)
//!     .fixed_step(1.0 / 60.0)
//!     .mask_mode(MaskMode::Directional);
//! ```
//!
//! ```json
//! {
//!   "title": "Asteroids",
//!   "width": 800, "height": 600,
//!   "target_fps": 60,
//!   "loop": { "mode": "fixed", "fixed_step": 0.016666, "max_delta": 0.25, "max_steps": 8 },
//!   "collision": { "mask_mode": "either", "broad_phase": "sweep_and_prune" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::collision::{BroadPhase, MaskMode};
use crate::error::ConfigError;
use crate::game_loop::LoopMode;

/// Top-level game settings. Validated by [`Game::new`](crate::game::Game::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub title: String,
    /// Logical view width.
    pub width: f32,
    /// Logical view height.
    pub height: f32,
    /// Frame rate [`Game::run`](crate::game::Game::run) paces itself to.
    pub target_fps: u32,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    pub collision: CollisionConfig,
}

/// Variable or fixed timestep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    #[default]
    Variable,
    Fixed,
}

/// Loop timing. Durations are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub mode: StepMode,
    /// Frame deltas are clamped to this.
    pub max_delta: f64,
    /// Step length in fixed mode.
    pub fixed_step: f64,
    /// Most fixed steps a single frame may run.
    pub max_steps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub mask_mode: MaskMode,
    pub broad_phase: BroadPhase,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "blaze".to_string(),
            width: 800.0,
            height: 600.0,
            target_fps: 60,
            loop_config: LoopConfig::default(),
            collision: CollisionConfig::default(),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            mode: StepMode::Variable,
            max_delta: 0.25,
            fixed_step: 1.0 / 60.0,
            max_steps: 8,
        }
    }
}

impl GameConfig {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field. Called before the loop ever runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0) || !self.width.is_finite() || !self.height.is_finite() {
            return Err(ConfigError::NonPositiveSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.target_fps == 0 {
            return Err(ConfigError::InvalidTargetFps(self.target_fps));
        }
        self.loop_config.validate()
    }

    // ── Builder ──────────────────────────────────────────────────────

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Switch to a fixed timestep of `seconds`.
    pub fn fixed_step(mut self, seconds: f64) -> Self {
        self.loop_config.mode = StepMode::Fixed;
        self.loop_config.fixed_step = seconds;
        self
    }

    pub fn variable_step(mut self) -> Self {
        self.loop_config.mode = StepMode::Variable;
        self
    }

    pub fn max_delta(mut self, seconds: f64) -> Self {
        self.loop_config.max_delta = seconds;
        self
    }

    pub fn max_steps(mut self, steps: u32) -> Self {
        self.loop_config.max_steps = steps;
        self
    }

    pub fn mask_mode(mut self, mode: MaskMode) -> Self {
        self.collision.mask_mode = mode;
        self
    }

    pub fn broad_phase(mut self, broad_phase: BroadPhase) -> Self {
        self.collision.broad_phase = broad_phase;
        self
    }

    /// Time budget of one frame at `target_fps`.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_delta > 0.0 && self.max_delta.is_finite()) {
            return Err(ConfigError::InvalidMaxDelta(self.max_delta));
        }
        if self.mode == StepMode::Fixed {
            let representable = Duration::try_from_secs_f64(self.fixed_step)
                .is_ok_and(|step| !step.is_zero());
            if !(representable && self.fixed_step <= self.max_delta) {
                return Err(ConfigError::InvalidStep {
                    step: self.fixed_step,
                    max_delta: self.max_delta,
                });
            }
            if self.max_steps == 0 {
                return Err(ConfigError::InvalidMaxSteps);
            }
        }
        Ok(())
    }

    /// The [`LoopMode`] this config describes. Invalid durations fall back to
    /// the defaults.
    pub fn to_mode(&self) -> LoopMode {
        let defaults = LoopConfig::default();
        let seconds = |value: f64, fallback: f64| {
            Duration::try_from_secs_f64(value).unwrap_or_else(|_| Duration::from_secs_f64(fallback))
        };
        let max_delta = seconds(self.max_delta, defaults.max_delta);
        match self.mode {
            StepMode::Variable => LoopMode::Variable { max_delta },
            StepMode::Fixed => LoopMode::Fixed {
                step: seconds(self.fixed_step, defaults.fixed_step),
                max_delta,
                max_steps: self.max_steps.max(1),
            },
        }
    }
}
