//! # Scene Manager: Transitions and Frame Dispatch
//!
//! Owns the active scene, at most one scene that is loading, and a FIFO
//! queue of requested scenes behind it.
//!
//! ```text
//!   set_scene(B)  set_scene(C)
//!        │             │
//!        ▼             ▼
//!   queue: [B, C] ──▶ loading: B (polled once per frame)
//!                         │ Ok
//!                         ▼
//!        active A: on_stop → teardown → Unloaded
//!        active B: on_start → Running        ──▶ transition B resolves Ok
//!                                                 next frame: C starts loading
//! ```
//!
//! A scene's load future is polled with a no-op waker: the game loop polls
//! every frame anyway, so nothing needs waking. The running scene keeps
//! updating and rendering while another one loads.
//!
//! Every hook call is guarded. An error or a panic in a hook is logged with
//! the scene name and frame number and counted; it never unwinds into the
//! game loop.

use std::collections::VecDeque;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::channel::oneshot;

use crate::asset::Assets;
use crate::collision::{BroadPhase, CollisionWorld, MaskMode};
use crate::ecs::World;
use crate::error::{LoadError, SceneError};
use crate::input::InputSnapshot;
use crate::render::Renderer;
use crate::scene::{LoadFuture, Scene, SceneCommands, SceneContext, SceneState, SceneView};
use crate::time::Time;

// ── SceneTransition ─────────────────────────────────────────────────────

type Reply = Result<(), LoadError>;

/// A queued scene switch, as seen by the manager.
pub(crate) struct SceneRequest {
    scene: Box<dyn Scene>,
    reply: oneshot::Sender<Reply>,
}

impl SceneRequest {
    pub(crate) fn new(scene: Box<dyn Scene>) -> (Self, SceneTransition) {
        let (reply, rx) = oneshot::channel();
        let transition = SceneTransition {
            scene: scene.name().to_string(),
            rx,
            settled: None,
        };
        (Self { scene, reply }, transition)
    }
}

/// Outcome of a [`set_scene`](SceneManager::set_scene) call.
///
/// Resolves to `Ok(())` once the new scene is running, or to the
/// [`LoadError`] that kept it from starting. Can be awaited, or checked
/// from a frame callback with [`try_result`](SceneTransition::try_result).
/// Dropping it does not cancel the transition.
#[derive(Debug)]
pub struct SceneTransition {
    scene: String,
    rx: oneshot::Receiver<Reply>,
    settled: Option<Reply>,
}

impl SceneTransition {
    /// Name of the scene being switched to.
    pub fn scene(&self) -> &str {
        &self.scene
    }

    /// The outcome, if the transition has finished.
    pub fn try_result(&mut self) -> Option<Reply> {
        if self.settled.is_none() {
            self.settled = match self.rx.try_recv() {
                Ok(Some(reply)) => Some(reply),
                Ok(None) => None,
                Err(oneshot::Canceled) => Some(Err(self.cancelled())),
            };
        }
        self.settled.clone()
    }

    fn cancelled(&self) -> LoadError {
        LoadError::Cancelled {
            scene: self.scene.clone(),
        }
    }
}

impl Future for SceneTransition {
    type Output = Reply;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Reply> {
        if let Some(reply) = self.settled.clone() {
            return Poll::Ready(reply);
        }
        let reply = match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(reply)) => reply,
            Poll::Ready(Err(oneshot::Canceled)) => Err(self.cancelled()),
            Poll::Pending => return Poll::Pending,
        };
        self.settled = Some(reply.clone());
        Poll::Ready(reply)
    }
}

// ── Slots ───────────────────────────────────────────────────────────────

/// Per-frame state lent to the manager by the game.
pub(crate) struct FrameEnv<'a> {
    pub time: &'a Time,
    pub input: &'a InputSnapshot,
    pub assets: &'a mut Assets,
}

/// A scene together with the world it owns.
struct SceneSlot {
    scene: Box<dyn Scene>,
    world: World,
    collisions: CollisionWorld,
    state: SceneState,
}

impl SceneSlot {
    fn name(&self) -> &str {
        self.scene.name()
    }

    /// Run `f` with the scene and a context over this slot's world.
    fn with_context<R>(
        &mut self,
        env: &mut FrameEnv<'_>,
        commands: &mut SceneCommands,
        f: impl FnOnce(&mut dyn Scene, &mut SceneContext<'_>) -> R,
    ) -> R {
        let mut ctx = SceneContext {
            world: &mut self.world,
            collisions: &mut self.collisions,
            time: env.time,
            input: env.input,
            assets: &mut *env.assets,
            commands,
        };
        f(self.scene.as_mut(), &mut ctx)
    }

    fn teardown(&mut self) {
        self.world.clear();
        self.collisions.clear();
        self.state = SceneState::Unloaded;
    }
}

struct PendingLoad {
    slot: SceneSlot,
    load: LoadFuture,
    reply: oneshot::Sender<Reply>,
}

/// What one update step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Whether a running scene was updated.
    pub updated: bool,
    /// Hook failures caught during the step.
    pub errors: u32,
    /// Collision pairs after the step.
    pub pairs: usize,
    /// Entities removed by the end-of-step flush.
    pub flushed: usize,
}

// ── SceneManager ────────────────────────────────────────────────────────

pub struct SceneManager {
    active: Option<SceneSlot>,
    loading: Option<PendingLoad>,
    queue: VecDeque<SceneRequest>,
    mask_mode: MaskMode,
    broad_phase: BroadPhase,
    stop_requested: bool,
}

impl SceneManager {
    pub fn new(mask_mode: MaskMode, broad_phase: BroadPhase) -> Self {
        Self {
            active: None,
            loading: None,
            queue: VecDeque::new(),
            mask_mode,
            broad_phase,
            stop_requested: false,
        }
    }

    /// Queue a switch to `scene`. Transitions run one at a time, in the order
    /// they were requested.
    pub fn set_scene(&mut self, scene: Box<dyn Scene>) -> SceneTransition {
        let (request, transition) = SceneRequest::new(scene);
        log::debug!("queued scene `{}`", transition.scene());
        self.queue.push_back(request);
        transition
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(SceneSlot::name)
    }

    pub fn active_state(&self) -> SceneState {
        self.active
            .as_ref()
            .map_or(SceneState::Unloaded, |slot| slot.state)
    }

    /// The active scene's world.
    pub fn world(&self) -> Option<&World> {
        self.active.as_ref().map(|slot| &slot.world)
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.active.as_mut().map(|slot| &mut slot.world)
    }

    /// The active scene's collision state.
    pub fn collisions(&self) -> Option<&CollisionWorld> {
        self.active.as_ref().map(|slot| &slot.collisions)
    }

    /// Name of the scene currently loading.
    pub fn loading_name(&self) -> Option<&str> {
        self.loading.as_ref().map(|pending| pending.slot.name())
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Transitions waiting behind the one in flight.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` once, after a scene asked the loop to stop.
    pub(crate) fn take_stop_request(&mut self) -> bool {
        std::mem::take(&mut self.stop_requested)
    }

    // ── Pause ────────────────────────────────────────────────────────

    /// Stop updating the active scene. It keeps rendering.
    pub fn pause(&mut self) {
        if let Some(slot) = self.active.as_mut() {
            if slot.state == SceneState::Running {
                slot.state = SceneState::Paused;
                log::info!("scene `{}` paused", slot.name());
            }
        }
    }

    pub fn resume(&mut self) {
        if let Some(slot) = self.active.as_mut() {
            if slot.state == SceneState::Paused {
                slot.state = SceneState::Running;
                log::info!("scene `{}` resumed", slot.name());
            }
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Start the next queued load if none is in flight, then poll the one in
    /// flight once. At most one transition completes per call.
    pub(crate) fn process_transitions(&mut self, env: &mut FrameEnv<'_>) {
        if self.loading.is_none() {
            if let Some(request) = self.queue.pop_front() {
                self.begin_load(request, env);
            }
        }

        let Some(mut pending) = self.loading.take() else {
            return;
        };
        match poll_load(&mut pending) {
            Poll::Pending => self.loading = Some(pending),
            Poll::Ready(Ok(())) => self.activate(pending, env),
            Poll::Ready(Err(err)) => fail_load(pending, err),
        }
    }

    fn begin_load(&mut self, request: SceneRequest, env: &mut FrameEnv<'_>) {
        let SceneRequest { scene, reply } = request;
        let mut slot = SceneSlot {
            scene,
            world: World::new(),
            collisions: CollisionWorld::new(self.mask_mode, self.broad_phase),
            state: SceneState::Loading,
        };
        let name = slot.name().to_string();
        log::info!("loading scene `{name}`");

        let mut commands = SceneCommands::default();
        let load = slot.with_context(env, &mut commands, |scene, ctx| {
            catch_unwind(AssertUnwindSafe(|| scene.on_load(ctx)))
        });
        self.apply(commands);

        let load: LoadFuture = match load {
            Ok(load) => load,
            Err(panic) => {
                let reason = format!("on_load panicked: {}", panic_message(&panic));
                Box::pin(futures::future::ready(Err(LoadError::scene(&name, reason))))
            }
        };
        self.loading = Some(PendingLoad { slot, load, reply });
    }

    fn activate(&mut self, pending: PendingLoad, env: &mut FrameEnv<'_>) {
        let PendingLoad {
            mut slot, reply, ..
        } = pending;
        slot.state = SceneState::Loaded;

        if let Some(old) = self.active.take() {
            self.stop_slot(old, env);
        }

        let mut commands = SceneCommands::default();
        let started = slot.with_context(env, &mut commands, |scene, ctx| {
            catch_unwind(AssertUnwindSafe(|| scene.on_start(ctx)))
        });
        if let Err(panic) = started {
            log::error!(
                "scene `{}` on_start panicked on frame {}: {}",
                slot.name(),
                env.time.frame_count(),
                panic_message(&panic)
            );
        }
        slot.state = SceneState::Running;
        log::info!("scene `{}` running", slot.name());
        self.active = Some(slot);
        self.apply(commands);

        // The caller may have dropped its transition; that's fine.
        let _ = reply.send(Ok(()));
    }

    fn stop_slot(&mut self, mut slot: SceneSlot, env: &mut FrameEnv<'_>) {
        slot.state = SceneState::Stopping;
        let mut commands = SceneCommands::default();
        let stopped = slot.with_context(env, &mut commands, |scene, ctx| {
            catch_unwind(AssertUnwindSafe(|| scene.on_stop(ctx)))
        });
        if let Err(panic) = stopped {
            log::error!(
                "scene `{}` on_stop panicked on frame {}: {}",
                slot.name(),
                env.time.frame_count(),
                panic_message(&panic)
            );
        }
        slot.teardown();
        log::info!("scene `{}` unloaded", slot.name());
        self.apply(commands);
    }

    /// Discard the load in flight and every queued request.
    ///
    /// The in-flight load is polled one last time so a load that is ready
    /// settles, but it is never activated.
    pub(crate) fn cancel_pending(&mut self) {
        if let Some(mut pending) = self.loading.take() {
            let name = pending.slot.name().to_string();
            let reply = match poll_load(&mut pending) {
                Poll::Ready(Err(err)) => Err(err),
                _ => Err(LoadError::Cancelled { scene: name.clone() }),
            };
            pending.slot.teardown();
            log::info!("cancelled loading scene `{name}`");
            let _ = pending.reply.send(reply);
        }
        for request in self.queue.drain(..) {
            log::debug!("dropped queued scene `{}`", request.scene.name());
            let _ = request.reply.send(Err(LoadError::Cancelled {
                scene: request.scene.name().to_string(),
            }));
        }
    }

    /// Cancel pending loads, then stop and unload the active scene.
    pub(crate) fn shutdown(&mut self, env: &mut FrameEnv<'_>) {
        self.cancel_pending();
        if let Some(slot) = self.active.take() {
            self.stop_slot(slot, env);
        }
        // Anything requested from on_stop has nowhere to go.
        self.cancel_pending();
    }

    fn apply(&mut self, commands: SceneCommands) {
        self.queue.extend(commands.requests);
        if commands.pause {
            self.pause();
        }
        if commands.stop {
            self.stop_requested = true;
        }
    }

    // ── Frame dispatch ───────────────────────────────────────────────

    /// Run one update step of the active scene: `on_update`, then the
    /// collision step, then the destruction flush.
    pub(crate) fn update(&mut self, step: Duration, env: &mut FrameEnv<'_>) -> StepOutcome {
        let mut outcome = StepOutcome::default();
        let Some(slot) = self.active.as_mut() else {
            return outcome;
        };
        if slot.state != SceneState::Running {
            return outcome;
        }
        outcome.updated = true;
        let frame = env.time.frame_count();

        let mut commands = SceneCommands::default();
        let updated = slot.with_context(env, &mut commands, |scene, ctx| {
            catch_unwind(AssertUnwindSafe(|| scene.on_update(ctx, step.as_secs_f32())))
        });
        if let Some(message) = hook_failure(updated) {
            log::error!("scene `{}` update failed on frame {frame}: {message}", slot.name());
            outcome.errors += 1;
        }

        let (world, collisions) = (&mut slot.world, &mut slot.collisions);
        match catch_unwind(AssertUnwindSafe(|| collisions.step(world))) {
            Ok(pairs) => outcome.pairs = pairs,
            Err(panic) => {
                log::error!(
                    "scene `{}` collision handler panicked on frame {frame}: {}",
                    slot.scene.name(),
                    panic_message(&panic)
                );
                outcome.errors += 1;
            }
        }

        outcome.flushed = slot.world.flush();
        if outcome.flushed > 0 {
            slot.collisions.prune(&slot.world);
        }
        self.apply(commands);
        outcome
    }

    /// Render the active scene. Returns `None` if there was nothing to
    /// render, otherwise the number of caught failures (0 or 1).
    pub(crate) fn render(&self, renderer: &mut dyn Renderer, env: &FrameEnv<'_>) -> Option<u32> {
        let slot = self.active.as_ref()?;
        if !matches!(slot.state, SceneState::Running | SceneState::Paused) {
            return None;
        }
        let view = SceneView {
            world: &slot.world,
            collisions: &slot.collisions,
            time: env.time,
            input: env.input,
        };
        let rendered = catch_unwind(AssertUnwindSafe(|| slot.scene.on_render(&view, renderer)));
        match hook_failure(rendered) {
            Some(message) => {
                log::error!(
                    "scene `{}` render failed on frame {}: {message}",
                    slot.name(),
                    env.time.frame_count()
                );
                Some(1)
            }
            None => Some(0),
        }
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(MaskMode::default(), BroadPhase::default())
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("active", &self.active_name())
            .field("state", &self.active_state())
            .field("loading", &self.loading_name())
            .field("queued", &self.queue.len())
            .finish()
    }
}

fn poll_load(pending: &mut PendingLoad) -> Poll<Reply> {
    let waker = futures::task::noop_waker();
    let mut cx = Context::from_waker(&waker);
    match catch_unwind(AssertUnwindSafe(|| pending.load.as_mut().poll(&mut cx))) {
        Ok(poll) => poll,
        Err(panic) => Poll::Ready(Err(LoadError::scene(
            pending.slot.name(),
            format!("load panicked: {}", panic_message(&panic)),
        ))),
    }
}

fn fail_load(mut pending: PendingLoad, err: LoadError) {
    log::error!("scene `{}` failed to load: {err}", pending.slot.name());
    pending.slot.teardown();
    let _ = pending.reply.send(Err(err));
}

/// Flatten a guarded hook result into an error message.
fn hook_failure(
    result: std::thread::Result<Result<(), SceneError>>,
) -> Option<String> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err.to_string()),
        Err(panic) => Some(format!("panicked: {}", panic_message(&panic))),
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
