//! Convenience re-exports: `use blaze::prelude::*` for the common items.

// Core
pub use crate::asset::{AssetLoader, Assets, FileLoader, ImageHandle, ImageInfo, MemoryLoader};
pub use crate::config::{CollisionConfig, GameConfig, LoopConfig, StepMode};
pub use crate::ecs::{Entity, World};
pub use crate::error::{ConfigError, LoadError, SceneError};
pub use crate::game::{FrameReport, Game, LoopHandle};
pub use crate::game_loop::LoopMode;
pub use crate::input::{InputSnapshot, InputState, Pointer, SharedInput};
pub use crate::math::{Rect, Vec2};
pub use crate::scene::{EntityBuilder, LoadFuture, Scene, SceneContext, SceneState, SceneView};
pub use crate::scene_manager::{SceneManager, SceneTransition};
pub use crate::time::{Clock, ManualClock, SystemClock, Time};

// Collision
pub use crate::collision::{
    BroadPhase, Collider, CollisionEvent, CollisionKind, CollisionLayers, CollisionWorld, MaskMode,
};

// Drawing
pub use crate::render::{Align, Color, CommandBuffer, DrawCommand, RectStyle, Renderer, TextStyle};
pub use crate::sprite::Sprite;

#[cfg(feature = "diagnostics")]
pub use crate::diag::FrameStats;
