//! # Game: the Frame Driver
//!
//! [`Game`] ties the pieces together: it owns the [`SceneManager`], the
//! frame [`Time`], the timestep accumulator, the shared input state and the
//! asset registry, and turns frame deltas into update and render calls.
//!
//! ```text
//! frame(real_delta)
//!   │
//!   ├─ clamp delta, advance Time, plan steps (variable: 1, fixed: 0..=max_steps)
//!   ├─ capture input snapshot
//!   ├─ scene transitions (start queued load, poll the one in flight)
//!   ├─ for each step: on_update → collisions → flush destroyed entities
//!   └─ render (skipped if no step ran)
//! ```
//!
//! A host with its own event loop calls [`Game::frame`] once per tick. A
//! headless or native host can hand a [`Clock`] to [`Game::run`] instead,
//! which blocks until the game is stopped.
//!
//! # Example
//!
//! ```ignore
//! let mut game = Game::new(GameConfig::new("Asteroids").fixed_step(1.0 / 60.0))?;
//! game.set_scene(Title::default());
//! game.run(&mut SystemClock::new(), &mut my_renderer);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
#[cfg(feature = "diagnostics")]
use std::time::Instant;

use crate::asset::{AssetLoader, Assets};
use crate::config::GameConfig;
#[cfg(feature = "diagnostics")]
use crate::diag::FrameStats;
use crate::error::ConfigError;
use crate::game_loop::FrameStepper;
use crate::input::{self, SharedInput};
use crate::render::Renderer;
use crate::scene::Scene;
use crate::scene_manager::{FrameEnv, SceneManager, SceneTransition};
use crate::time::{Clock, Time};

/// What one call to [`Game::frame`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Frame number, starting at 1. Zero if the game was not running.
    pub frame: u64,
    /// Update steps the active scene ran.
    pub updates: u32,
    /// Fixed steps discarded by the `max_steps` guard.
    pub dropped_steps: u32,
    /// Whether the active scene was rendered.
    pub rendered: bool,
    /// Hook failures caught this frame.
    pub errors: u32,
    #[cfg(feature = "diagnostics")]
    pub stats: FrameStats,
}

/// Stops a running [`Game`] from anywhere, including another thread.
///
/// The frame in progress completes; the game halts at the start of the next.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Arc<AtomicBool>,
}

impl LoopHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

pub struct Game {
    config: GameConfig,
    scenes: SceneManager,
    time: Time,
    stepper: FrameStepper,
    input: SharedInput,
    assets: Assets,
    running: Arc<AtomicBool>,
    started: bool,
}

impl Game {
    /// Validate `config` and build a stopped game with no scene.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let stepper = FrameStepper::new(config.loop_config.to_mode());
        let scenes = SceneManager::new(config.collision.mask_mode, config.collision.broad_phase);
        log::debug!("`{}` configured: {:?}", config.title, stepper.mode());
        Ok(Self {
            config,
            scenes,
            time: Time::new(),
            stepper,
            input: SharedInput::default(),
            assets: Assets::default(),
            running: Arc::new(AtomicBool::new(false)),
            started: false,
        })
    }

    /// Use `loader` for images (builder pattern).
    pub fn with_loader(mut self, loader: impl AssetLoader + 'static) -> Self {
        self.assets = Assets::new(loader);
        self
    }

    /// Read input from `input`, which the host writes to (builder pattern).
    pub fn with_input(mut self, input: SharedInput) -> Self {
        self.input = input;
        self
    }

    /// Queue a switch to `scene`. See [`SceneManager::set_scene`].
    pub fn set_scene(&mut self, scene: impl Scene + 'static) -> SceneTransition {
        self.scenes.set_scene(Box::new(scene))
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the loop. Calling it again while running does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            log::debug!("`{}` already running", self.config.title);
            return;
        }
        if self.started {
            // A handle stopped the loop and no frame has applied it yet.
            self.stop();
        }
        self.time.reset();
        self.stepper.reset();
        self.running.store(true, Ordering::Release);
        self.started = true;
        log::info!("`{}` started", self.config.title);
    }

    /// Halt the loop and cancel any pending scene load. The active scene
    /// stays in place, and [`start`](Game::start) resumes it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if !self.started {
            return;
        }
        self.started = false;
        self.scenes.cancel_pending();
        log::info!(
            "`{}` stopped after {} frames",
            self.config.title,
            self.time.frame_count()
        );
    }

    /// Stop, then run the active scene's `on_stop` and tear it down.
    pub fn shutdown(&mut self) {
        self.stop();
        let input = input::capture(&self.input);
        let mut env = FrameEnv {
            time: &self.time,
            input: &input,
            assets: &mut self.assets,
        };
        self.scenes.shutdown(&mut env);
    }

    // ── Frames ───────────────────────────────────────────────────────

    /// Run one frame with `real_delta` of wall time behind it.
    ///
    /// Does nothing while stopped. If a [`LoopHandle`] stopped the game since
    /// the last frame, this frame halts it instead of running.
    ///
    /// Render follows the frame's update steps and is skipped when a fixed
    /// step frame runs none. A paused scene is the exception: its updates are
    /// skipped but it still renders every frame that has a step.
    pub fn frame(&mut self, real_delta: Duration, renderer: &mut dyn Renderer) -> FrameReport {
        if !self.started {
            return FrameReport::default();
        }
        if !self.running.load(Ordering::Acquire) {
            self.stop();
            return FrameReport::default();
        }

        let delta = self.stepper.clamp(real_delta);
        if delta < real_delta {
            log::debug!("frame delta {real_delta:?} clamped to {delta:?}");
        }
        self.time.advance(delta);
        let plan = self.stepper.advance(delta);
        self.time.set_alpha(plan.alpha);
        let input = input::capture(&self.input);

        let mut report = FrameReport {
            frame: self.time.frame_count(),
            dropped_steps: plan.dropped,
            ..FrameReport::default()
        };
        let mut env = FrameEnv {
            time: &self.time,
            input: &input,
            assets: &mut self.assets,
        };
        self.scenes.process_transitions(&mut env);

        #[cfg(feature = "diagnostics")]
        let update_start = Instant::now();
        let mut pairs = 0;
        for _ in 0..plan.steps {
            let outcome = self.scenes.update(plan.step, &mut env);
            if outcome.updated {
                report.updates += 1;
            }
            report.errors += outcome.errors;
            pairs = outcome.pairs;
        }
        #[cfg(feature = "diagnostics")]
        let update_time = update_start.elapsed();

        // A fixed-step frame with no step has nothing new to show.
        #[cfg(feature = "diagnostics")]
        let render_start = Instant::now();
        if plan.steps > 0 {
            if let Some(errors) = self.scenes.render(renderer, &env) {
                report.rendered = true;
                report.errors += errors;
            }
        }

        #[cfg(feature = "diagnostics")]
        {
            let render_time = render_start.elapsed();
            let (spawned, destroyed) = self
                .scenes
                .world_mut()
                .map_or((0, 0), |world| world.take_frame_counts());
            report.stats = FrameStats {
                update_time,
                render_time,
                entities: self.scenes.world().map_or(0, |world| world.entity_count()),
                pairs,
                spawned,
                destroyed,
            };
            report.stats.trace(report.frame);
        }
        #[cfg(not(feature = "diagnostics"))]
        let _ = pairs;

        if self.scenes.take_stop_request() {
            log::info!("stop requested by scene on frame {}", report.frame);
            self.stop();
        }
        report
    }

    /// Start the game and drive frames from `clock` until it is stopped,
    /// pacing to `target_fps`. Returns the number of frames run.
    pub fn run(&mut self, clock: &mut impl Clock, renderer: &mut dyn Renderer) -> u64 {
        self.start();
        let budget = self.config.frame_budget();
        clock.tick();

        let mut frames = 0;
        while self.is_running() {
            let delta = clock.tick();
            self.frame(delta, renderer);
            frames += 1;
            clock.wait(budget);
        }
        // A handle stop between the last frame and the check above.
        self.stop();
        frames
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.started && self.running.load(Ordering::Acquire)
    }

    /// A handle that can stop the loop from elsewhere.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            running: self.running.clone(),
        }
    }

    /// Shared input state for the host to write events into.
    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    pub fn assets_mut(&mut self) -> &mut Assets {
        &mut self.assets
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("title", &self.config.title)
            .field("running", &self.is_running())
            .field("frame", &self.time.frame_count())
            .field("scenes", &self.scenes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LoadError, SceneError};
    use crate::render::CommandBuffer;
    use crate::scene::{SceneContext, SceneState};
    use crate::time::ManualClock;
    use futures::future::FutureExt;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[derive(Default)]
    struct Counter {
        updates: u32,
        stop_after: Option<u32>,
        fail: bool,
    }

    impl Scene for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn on_update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> Result<(), SceneError> {
            self.updates += 1;
            ctx.world.insert_resource(self.updates);
            if self.stop_after == Some(self.updates) {
                ctx.request_stop();
            }
            if self.fail {
                return Err(SceneError::msg("bad frame"));
            }
            Ok(())
        }
    }

    fn updates(game: &Game) -> u32 {
        game.scenes()
            .world()
            .and_then(|world| world.get_resource::<u32>().copied())
            .unwrap_or(0)
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Game::new(GameConfig::default().size(0.0, 0.0)).is_err());
    }

    #[test]
    fn frame_before_start_does_nothing() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter::default());
        let report = game.frame(ms(16), &mut CommandBuffer::new());
        assert_eq!(report, FrameReport::default());
        assert_eq!(game.scenes().active_name(), None);
    }

    #[test]
    fn start_is_idempotent() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter::default());
        game.start();
        let mut buffer = CommandBuffer::new();
        game.frame(ms(16), &mut buffer);
        game.start();
        game.frame(ms(16), &mut buffer);

        assert_eq!(game.time().frame_count(), 2);
        assert_eq!(updates(&game), 2);
    }

    #[test]
    fn fixed_frame_without_step_skips_render() {
        let mut game = Game::new(GameConfig::default().fixed_step(0.010)).unwrap();
        game.set_scene(Counter::default());
        game.start();
        let mut buffer = CommandBuffer::new();

        let short = game.frame(ms(4), &mut buffer);
        assert_eq!((short.updates, short.rendered), (0, false));
        let long = game.frame(ms(25), &mut buffer);
        assert_eq!((long.updates, long.rendered), (2, true));
        assert!((game.time().alpha() - 0.9).abs() < 1e-4);
    }

    #[test]
    fn scene_can_request_stop() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter {
            stop_after: Some(5),
            ..Counter::default()
        });
        let frames = game.run(&mut ManualClock::new(ms(16)), &mut CommandBuffer::new());
        assert_eq!(frames, 5);
        assert!(!game.is_running());
        assert_eq!(game.scenes().active_state(), SceneState::Running);
    }

    #[test]
    fn handle_stops_from_another_thread() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter::default());
        game.start();
        let handle = game.handle();
        let mut buffer = CommandBuffer::new();
        game.frame(ms(16), &mut buffer);

        std::thread::spawn(move || handle.stop()).join().unwrap();
        let report = game.frame(ms(16), &mut buffer);
        assert_eq!(report.updates, 0);
        assert!(!game.is_running());
        assert_eq!(updates(&game), 1);
    }

    #[test]
    fn start_after_handle_stop_restarts() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter::default());
        game.start();
        let mut buffer = CommandBuffer::new();
        game.frame(ms(16), &mut buffer);

        game.handle().stop();
        game.start();
        let report = game.frame(ms(16), &mut buffer);
        assert!(game.is_running());
        assert_eq!(report.updates, 1);
        assert_eq!(game.time().frame_count(), 1);
        assert_eq!(updates(&game), 2);
    }

    #[test]
    fn step_too_small_to_represent_is_rejected() {
        assert!(matches!(
            Game::new(GameConfig::default().fixed_step(1e-10)),
            Err(ConfigError::InvalidStep { .. })
        ));
    }

    #[test]
    fn paused_scene_renders_without_updating() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter::default());
        game.start();
        let mut buffer = CommandBuffer::new();
        game.frame(ms(16), &mut buffer);

        game.scenes_mut().pause();
        let report = game.frame(ms(16), &mut buffer);
        assert_eq!((report.updates, report.rendered), (0, true));
        assert_eq!(updates(&game), 1);
    }

    #[test]
    fn hook_errors_do_not_stop_the_loop() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter {
            fail: true,
            ..Counter::default()
        });
        game.start();
        let mut buffer = CommandBuffer::new();
        let first = game.frame(ms(16), &mut buffer);
        let second = game.frame(ms(16), &mut buffer);
        assert_eq!((first.errors, second.errors), (1, 1));
        assert!(game.is_running());
    }

    #[test]
    fn stop_cancels_pending_load() {
        struct Never;
        impl Scene for Never {
            fn name(&self) -> &str {
                "never"
            }
            fn on_load(&mut self, _ctx: &mut SceneContext<'_>) -> crate::scene::LoadFuture {
                futures::future::pending().boxed_local()
            }
        }

        let mut game = Game::new(GameConfig::default()).unwrap();
        let mut transition = game.set_scene(Never);
        game.start();
        game.frame(ms(16), &mut CommandBuffer::new());
        assert!(game.scenes().is_loading());

        game.stop();
        assert!(!game.scenes().is_loading());
        assert_eq!(
            transition.try_result(),
            Some(Err(LoadError::Cancelled {
                scene: "never".into()
            }))
        );
    }

    #[test]
    fn shutdown_unloads_active_scene() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Counter::default());
        game.start();
        game.frame(ms(16), &mut CommandBuffer::new());
        game.shutdown();
        assert_eq!(game.scenes().active_name(), None);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn report_carries_stats() {
        struct Spawner;
        impl Scene for Spawner {
            fn name(&self) -> &str {
                "spawner"
            }
            fn on_update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> Result<(), SceneError> {
                ctx.create();
                Ok(())
            }
        }

        let mut game = Game::new(GameConfig::default()).unwrap();
        game.set_scene(Spawner);
        game.start();
        let mut buffer = CommandBuffer::new();
        game.frame(ms(16), &mut buffer);
        let report = game.frame(ms(16), &mut buffer);
        assert_eq!(report.stats.entities, 2);
        assert_eq!(report.stats.spawned, 1);
    }
}
