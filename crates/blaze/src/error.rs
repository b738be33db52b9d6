//! Error types.
//!
//! Only failures a caller can react to are modelled as errors. Misuse of the
//! entity store (double destroy, duplicate components) is logged and ignored
//! instead, so one bad call can't take down a running game.

/// A scene or asset failed to load.
///
/// Delivered to whoever awaits the [`SceneTransition`](crate::scene_manager::SceneTransition).
/// The previously active scene keeps running.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// The scene's own load step reported a failure.
    #[error("scene `{scene}` failed to load: {reason}")]
    Scene { scene: String, reason: String },

    /// An asset requested during load could not be fetched or decoded.
    #[error("asset `{path}` failed to load: {reason}")]
    Asset { path: String, reason: String },

    /// The load was discarded before it could activate (loop stopped, or the
    /// manager was shut down).
    #[error("loading scene `{scene}` was cancelled")]
    Cancelled { scene: String },
}

impl LoadError {
    pub fn scene(scene: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Scene {
            scene: scene.into(),
            reason: reason.to_string(),
        }
    }

    pub fn asset(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Asset {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Invalid construction parameters. Raised before the loop ever runs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("window size must be positive, got {width}x{height}")]
    NonPositiveSize { width: f32, height: f32 },

    #[error("fixed step must be positive and no larger than max_delta ({max_delta}s), got {step}s")]
    InvalidStep { step: f64, max_delta: f64 },

    #[error("max_delta must be positive, got {0}s")]
    InvalidMaxDelta(f64),

    #[error("max_steps must be at least 1")]
    InvalidMaxSteps,

    #[error("target_fps must be positive, got {0}")]
    InvalidTargetFps(u32),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// A failure inside a scene's update or render hook.
///
/// Caught at the loop boundary and logged with scene and frame context; the
/// next frame proceeds normally.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
