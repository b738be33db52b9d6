//! # Scenes: Lifecycle Hooks and Context
//!
//! A scene is a level, a menu, a game-over screen: a set of entities plus the
//! code that drives them. Each scene owns its own [`World`] and
//! [`CollisionWorld`], so a scene that is still loading can never see, or be
//! seen by, the one that is running.
//!
//! ## Lifecycle
//!
//! ```text
//!            set_scene
//! Unloaded ────────────▶ Loading ──load ok──▶ Loaded ──on_start──▶ Running
//!    ▲                      │                                      │    ▲
//!    │                  load failed                          pause │    │ resume
//!    │◀─────────────────────┘                                      ▼    │
//!    │                                                            Paused
//!    │                                                               │
//!    └──────── teardown ◀── Stopping ◀── replaced / shutdown ────────┘
//! ```
//!
//! Hooks receive everything they need through [`SceneContext`]; there is no
//! global engine to look up. Rendering gets a [`SceneView`] instead, which
//! only hands out shared references, so a render hook cannot change game
//! state.
//!
//! # Example
//!
//! ```ignore
//! struct Level { score: u32 }
//!
//! impl Scene for Level {
//!     fn name(&self) -> &str { "level" }
//!
//!     fn on_start(&mut self, ctx: &mut SceneContext) {
//!         ctx.spawn("player")
//!             .insert(Sprite::new().size(16.0, 16.0))
//!             .insert(Collider::new(0.0, 0.0, 16.0, 16.0))
//!             .tag("player");
//!     }
//!
//!     fn on_update(&mut self, ctx: &mut SceneContext, dt: f32) -> Result<(), SceneError> {
//!         if ctx.input.key_pressed("Escape") {
//!             ctx.set_scene(Menu::default());
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use futures::future::{FutureExt, LocalBoxFuture};

use crate::asset::Assets;
use crate::collision::CollisionWorld;
use crate::ecs::{Component, Entity, World};
use crate::error::{LoadError, SceneError};
use crate::input::InputSnapshot;
use crate::render::Renderer;
use crate::scene_manager::{SceneRequest, SceneTransition};
use crate::sprite::render_sprites;
use crate::time::Time;

/// The asynchronous part of a scene load.
pub type LoadFuture = LocalBoxFuture<'static, Result<(), LoadError>>;

/// A load that has nothing left to wait for.
pub fn ready() -> LoadFuture {
    futures::future::ready(Ok(())).boxed_local()
}

/// Where a scene is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneState {
    Unloaded,
    Loading,
    Loaded,
    Running,
    Paused,
    Stopping,
}

/// Lifecycle hooks of a scene. Every hook except [`name`](Scene::name) has a
/// default that does nothing (or, for rendering, draws the scene's sprites).
pub trait Scene {
    /// Used in logs and returned by [`SceneManager::active_name`](crate::scene_manager::SceneManager::active_name).
    fn name(&self) -> &str;

    /// Prepare the scene. Runs once, before the scene becomes active.
    ///
    /// The synchronous part may spawn entities and request assets. The
    /// returned future is polled once per frame until it resolves; the scene
    /// starts only if it resolves to `Ok`. On error, every entity spawned here
    /// is discarded and the previous scene keeps running.
    fn on_load(&mut self, ctx: &mut SceneContext<'_>) -> LoadFuture {
        let _ = ctx;
        ready()
    }

    /// Called once when the scene becomes the active one.
    fn on_start(&mut self, ctx: &mut SceneContext<'_>) {
        let _ = ctx;
    }

    /// Called every update step while the scene is running. `dt` is the step
    /// length in seconds.
    fn on_update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) -> Result<(), SceneError> {
        let _ = (ctx, dt);
        Ok(())
    }

    /// Called after the frame's updates, while running or paused.
    fn on_render(&self, view: &SceneView<'_>, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        render_sprites(view.world, renderer);
        Ok(())
    }

    /// Called before the scene's entities are torn down.
    fn on_stop(&mut self, ctx: &mut SceneContext<'_>) {
        let _ = ctx;
    }
}

// ── SceneContext ─────────────────────────────────────────────────────────

/// Requests a hook makes of the scene manager, applied once the hook returns.
#[derive(Default)]
pub(crate) struct SceneCommands {
    pub(crate) requests: Vec<SceneRequest>,
    pub(crate) pause: bool,
    pub(crate) stop: bool,
}

/// Everything a scene hook can touch.
pub struct SceneContext<'a> {
    /// This scene's entities.
    pub world: &'a mut World,
    /// This scene's colliders' pair state and handlers.
    pub collisions: &'a mut CollisionWorld,
    /// Frame timing.
    pub time: &'a Time,
    /// Input captured at the start of the frame.
    pub input: &'a InputSnapshot,
    /// Image registry shared by all scenes.
    pub assets: &'a mut Assets,
    pub(crate) commands: &'a mut SceneCommands,
}

impl<'a> SceneContext<'a> {
    /// New entity that [`World::named`] can find again.
    pub fn spawn(&mut self, name: &str) -> EntityBuilder<'_> {
        let entity = self.world.spawn(name);
        EntityBuilder {
            world: self.world,
            entity,
        }
    }

    /// New anonymous entity.
    pub fn create(&mut self) -> EntityBuilder<'_> {
        let entity = self.world.spawn_empty();
        EntityBuilder {
            world: self.world,
            entity,
        }
    }

    /// Mark an entity for destruction at the end of the current update step.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.world.destroy(entity)
    }

    /// Queue a switch to `scene`. The returned transition resolves once the
    /// new scene is running, or with the reason it never started.
    pub fn set_scene(&mut self, scene: impl Scene + 'static) -> SceneTransition {
        let (request, transition) = SceneRequest::new(Box::new(scene));
        self.commands.requests.push(request);
        transition
    }

    /// Pause this scene once the current hook returns. It keeps rendering.
    pub fn pause(&mut self) {
        self.commands.pause = true;
    }

    /// Ask the game loop to stop after the current frame.
    pub fn request_stop(&mut self) {
        self.commands.stop = true;
    }
}

// ── SceneView ────────────────────────────────────────────────────────────

/// Read-only view of a scene, handed to [`Scene::on_render`].
#[derive(Clone, Copy)]
pub struct SceneView<'a> {
    pub world: &'a World,
    pub collisions: &'a CollisionWorld,
    pub time: &'a Time,
    pub input: &'a InputSnapshot,
}

// ── EntityBuilder ────────────────────────────────────────────────────────

/// Chains components and a tag onto an entity that was just created.
///
/// Returned by [`SceneContext::spawn`] and [`SceneContext::create`]. Chain
/// `.insert()` calls to add components, and optionally `.tag()` to tag the
/// entity.
///
/// # Example
///
/// ```ignore
/// ctx.spawn("player")
///     .insert(Sprite::new().tint(Color::GREEN).size(40.0, 40.0))
///     .tag("player");
/// ```
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl<'w> EntityBuilder<'w> {
    /// Attach `component`, replacing an existing one of the same type.
    pub fn insert<T: Component>(self, component: T) -> Self {
        self.world.insert(self.entity, component);
        self
    }

    /// Put the entity in `tag`'s group (see [`World::tagged`]).
    pub fn tag(self, tag: &str) -> Self {
        self.world.set_tag(self.entity, tag);
        self
    }

    /// Get the entity ID.
    pub fn id(&self) -> Entity {
        self.entity
    }
}
