//! # Collision World: Pair Tracking and Events
//!
//! Each step rebuilds the set of overlapping collider pairs from the entity
//! store and diffs it against the previous step:
//!
//! ```text
//! previous: {(1,2), (2,5)}          current: {(1,2), (3,4)}
//!
//!   (1,2) in both        → Stay
//!   (3,4) only current   → Enter
//!   (2,5) only previous  → Exit
//! ```
//!
//! Only the previous step's pairs are kept. All events of a step are computed
//! before any handler runs, so a handler that moves or disables a collider
//! affects the next step, not the rest of this one. Events come out as
//! enter/stay in pair order, then exits in pair order.

use std::collections::{BTreeMap, HashMap};

use crate::ecs::{Entity, World};
use crate::math::Rect;

use super::broad_phase::{BroadPhase, CollisionPair, overlapping_pairs};
use super::collider::Collider;
use super::layers::MaskMode;

/// Phase of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionKind {
    Enter,
    Stay,
    Exit,
}

/// One contact event, addressed to `entity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub kind: CollisionKind,
    /// The collider receiving the event.
    pub entity: Entity,
    /// The collider it touched.
    pub other: Entity,
}

/// Callback invoked with the receiving scene's world.
pub type CollisionHandler = Box<dyn FnMut(&mut World, &CollisionEvent)>;

#[derive(Default)]
struct Handlers {
    enter: Vec<CollisionHandler>,
    stay: Vec<CollisionHandler>,
    exit: Vec<CollisionHandler>,
    any: Vec<CollisionHandler>,
}

/// Pair state and handlers for one scene.
pub struct CollisionWorld {
    mask_mode: MaskMode,
    broad_phase: BroadPhase,
    /// Pairs found by the last step, with `(a_receives, b_receives)`.
    previous: BTreeMap<CollisionPair, (bool, bool)>,
    events: Vec<CollisionEvent>,
    handlers: HashMap<Entity, Handlers>,
}

impl CollisionWorld {
    pub fn new(mask_mode: MaskMode, broad_phase: BroadPhase) -> Self {
        Self {
            mask_mode,
            broad_phase,
            previous: BTreeMap::new(),
            events: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn mask_mode(&self) -> MaskMode {
        self.mask_mode
    }

    pub fn broad_phase(&self) -> BroadPhase {
        self.broad_phase
    }

    // ── Handlers ─────────────────────────────────────────────────────

    /// Call `handler` when `entity` starts touching another collider.
    pub fn on_enter(
        &mut self,
        entity: Entity,
        handler: impl FnMut(&mut World, &CollisionEvent) + 'static,
    ) {
        self.handlers
            .entry(entity)
            .or_default()
            .enter
            .push(Box::new(handler));
    }

    /// Call `handler` every step `entity` keeps touching another collider.
    pub fn on_stay(
        &mut self,
        entity: Entity,
        handler: impl FnMut(&mut World, &CollisionEvent) + 'static,
    ) {
        self.handlers
            .entry(entity)
            .or_default()
            .stay
            .push(Box::new(handler));
    }

    /// Call `handler` when `entity` stops touching another collider.
    pub fn on_exit(
        &mut self,
        entity: Entity,
        handler: impl FnMut(&mut World, &CollisionEvent) + 'static,
    ) {
        self.handlers
            .entry(entity)
            .or_default()
            .exit
            .push(Box::new(handler));
    }

    /// Call `handler` for every event addressed to `entity`, after the
    /// kind-specific handlers.
    pub fn on_collision(
        &mut self,
        entity: Entity,
        handler: impl FnMut(&mut World, &CollisionEvent) + 'static,
    ) {
        self.handlers
            .entry(entity)
            .or_default()
            .any
            .push(Box::new(handler));
    }

    /// Drop every handler and pair involving `entity`, without exit events.
    pub fn forget(&mut self, entity: Entity) {
        self.handlers.remove(&entity);
        self.previous.retain(|pair, _| !pair.contains(entity));
    }

    /// Drop handlers of entities that no longer exist in `world`.
    ///
    /// Pairs are kept so the surviving side still gets its exit event.
    pub fn prune(&mut self, world: &World) {
        self.handlers
            .retain(|&e, _| world.is_alive(e) || world.is_pending_destroy(e));
    }

    /// Forget all pairs, events and handlers.
    pub fn clear(&mut self) {
        self.previous.clear();
        self.events.clear();
        self.handlers.clear();
    }

    // ── Step ─────────────────────────────────────────────────────────

    /// Detect pairs, derive events and dispatch them to handlers.
    ///
    /// Returns the number of active pairs.
    pub fn step(&mut self, world: &mut World) -> usize {
        self.events = self.detect(world);
        self.dispatch(world);
        self.previous.len()
    }

    fn detect(&mut self, world: &World) -> Vec<CollisionEvent> {
        let colliders: HashMap<Entity, Collider> = world
            .query_entities::<(&Collider,)>()
            .filter(|&e| world.is_alive(e))
            .filter_map(|e| world.get::<Collider>(e).map(|c| (e, *c)))
            .filter(|(_, c)| c.enabled)
            .collect();

        let mut boxes: Vec<(Entity, Rect)> =
            colliders.iter().map(|(&e, c)| (e, c.rect())).collect();
        boxes.sort_unstable_by_key(|(e, _)| *e);

        let mut current = BTreeMap::new();
        let mut events = Vec::new();

        for pair in overlapping_pairs(&boxes, self.broad_phase) {
            let (ca, cb) = (&colliders[&pair.a], &colliders[&pair.b]);
            let receivers = self
                .mask_mode
                .receivers(ca.layer, ca.mask, cb.layer, cb.mask);
            if receivers == (false, false) {
                continue;
            }
            let before = self.previous.get(&pair).copied().unwrap_or((false, false));
            for (side, receives, received) in sides(pair, receivers, before) {
                if receives {
                    let kind = if received {
                        CollisionKind::Stay
                    } else {
                        CollisionKind::Enter
                    };
                    events.push(event(kind, pair, side));
                }
            }
            current.insert(pair, receivers);
        }

        // A side exits when it stops receiving, whether the pair separated or
        // its masks changed while still overlapping.
        for (pair, &before) in &self.previous {
            let now = current.get(pair).copied().unwrap_or((false, false));
            for (side, receives, received) in sides(*pair, now, before) {
                if received && !receives && world.is_alive(side) {
                    events.push(event(CollisionKind::Exit, *pair, side));
                }
            }
        }

        self.previous = current;
        events
    }

    fn dispatch(&mut self, world: &mut World) {
        for event in &self.events {
            let Some(handlers) = self.handlers.get_mut(&event.entity) else {
                continue;
            };
            let specific = match event.kind {
                CollisionKind::Enter => &mut handlers.enter,
                CollisionKind::Stay => &mut handlers.stay,
                CollisionKind::Exit => &mut handlers.exit,
            };
            for handler in specific.iter_mut() {
                handler(world, event);
            }
            for handler in handlers.any.iter_mut() {
                handler(world, event);
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Events produced by the last step.
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    /// Number of pairs found by the last step.
    pub fn active_pairs(&self) -> usize {
        self.previous.len()
    }

    /// Whether the last step found `a` and `b` overlapping.
    pub fn is_colliding(&self, a: Entity, b: Entity) -> bool {
        self.previous.contains_key(&CollisionPair::new(a, b))
    }

    /// Live, enabled colliders on a layer in `mask` that overlap `rect`, in
    /// entity creation order. Reads the world directly, not the last step.
    pub fn overlapping(&self, world: &World, rect: Rect, mask: u32) -> Vec<Entity> {
        world
            .query_entities::<(&Collider,)>()
            .filter(|&e| world.is_alive(e))
            .filter(|&e| {
                world.get::<Collider>(e).is_some_and(|c| {
                    c.enabled && c.layer & mask != 0 && c.rect().intersects(&rect)
                })
            })
            .collect()
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(MaskMode::default(), BroadPhase::default())
    }
}

impl std::fmt::Debug for CollisionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionWorld")
            .field("mask_mode", &self.mask_mode)
            .field("broad_phase", &self.broad_phase)
            .field("pairs", &self.previous.len())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// `(entity, receives now, received last step)` for both ends of `pair`.
fn sides(
    pair: CollisionPair,
    (a_now, b_now): (bool, bool),
    (a_before, b_before): (bool, bool),
) -> [(Entity, bool, bool); 2] {
    [(pair.a, a_now, a_before), (pair.b, b_now, b_before)]
}

fn event(kind: CollisionKind, pair: CollisionPair, receiver: Entity) -> CollisionEvent {
    let other = if receiver == pair.a { pair.b } else { pair.a };
    CollisionEvent {
        kind,
        entity: receiver,
        other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionLayers;
    use crate::math::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn spawn_collider(world: &mut World, collider: Collider) -> Entity {
        let e = world.spawn_empty();
        world.insert(e, collider);
        e
    }

    fn kinds_for(events: &[CollisionEvent], entity: Entity) -> Vec<CollisionKind> {
        events
            .iter()
            .filter(|ev| ev.entity == entity)
            .map(|ev| ev.kind)
            .collect()
    }

    #[test]
    fn enter_stay_exit_sequence() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        let a = spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0));
        let b = spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0));

        let mut seen = Vec::new();
        for frame in 1..=4 {
            if frame == 4 {
                world.get_mut::<Collider>(b).unwrap().set_position(Vec2::new(50.0, 50.0));
            }
            collisions.step(&mut world);
            seen.extend(kinds_for(collisions.events(), a));
        }
        assert_eq!(
            seen,
            vec![
                CollisionKind::Enter,
                CollisionKind::Stay,
                CollisionKind::Stay,
                CollisionKind::Exit
            ]
        );
        assert!(!collisions.is_colliding(a, b));
    }

    #[test]
    fn mutual_masks_both_receive_enter() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        let a = spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0).layer(1).mask(2));
        let b = spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0).layer(2).mask(1));

        assert_eq!(collisions.step(&mut world), 1);
        assert_eq!(
            collisions.events(),
            &[
                CollisionEvent { kind: CollisionKind::Enter, entity: a, other: b },
                CollisionEvent { kind: CollisionKind::Enter, entity: b, other: a },
            ]
        );
    }

    #[test]
    fn filtered_out_pairs_produce_nothing() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0).layer(1).mask(4));
        spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0).layer(2).mask(8));

        for _ in 0..3 {
            assert_eq!(collisions.step(&mut world), 0);
            assert!(collisions.events().is_empty());
        }
    }

    #[test]
    fn directional_mode_only_notifies_listener() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::new(MaskMode::Directional, BroadPhase::Naive);
        let sensor = spawn_collider(
            &mut world,
            Collider::new(0.0, 0.0, 10.0, 10.0)
                .layer(CollisionLayers::TRIGGER)
                .mask(CollisionLayers::PLAYER),
        );
        let player = spawn_collider(
            &mut world,
            Collider::new(5.0, 5.0, 10.0, 10.0)
                .layer(CollisionLayers::PLAYER)
                .mask(CollisionLayers::ENEMY),
        );

        collisions.step(&mut world);
        assert_eq!(kinds_for(collisions.events(), sensor), vec![CollisionKind::Enter]);
        assert!(kinds_for(collisions.events(), player).is_empty());
    }

    #[test]
    fn directional_mask_change_while_overlapping() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::new(MaskMode::Directional, BroadPhase::Naive);
        let sensor = spawn_collider(
            &mut world,
            Collider::new(0.0, 0.0, 10.0, 10.0)
                .layer(CollisionLayers::TRIGGER)
                .mask(CollisionLayers::PLAYER),
        );
        let player = spawn_collider(
            &mut world,
            Collider::new(5.0, 5.0, 10.0, 10.0)
                .layer(CollisionLayers::PLAYER)
                .mask(CollisionLayers::ENEMY),
        );
        collisions.step(&mut world);

        world.get_mut::<Collider>(player).unwrap().mask = CollisionLayers::TRIGGER;
        collisions.step(&mut world);
        assert_eq!(kinds_for(collisions.events(), sensor), vec![CollisionKind::Stay]);
        assert_eq!(kinds_for(collisions.events(), player), vec![CollisionKind::Enter]);

        world.get_mut::<Collider>(player).unwrap().mask = CollisionLayers::ENEMY;
        collisions.step(&mut world);
        assert_eq!(kinds_for(collisions.events(), sensor), vec![CollisionKind::Stay]);
        assert_eq!(kinds_for(collisions.events(), player), vec![CollisionKind::Exit]);

        world.get_mut::<Collider>(sensor).unwrap().mask = 0;
        collisions.step(&mut world);
        assert_eq!(kinds_for(collisions.events(), sensor), vec![CollisionKind::Exit]);
        assert!(kinds_for(collisions.events(), player).is_empty());
        assert_eq!(collisions.active_pairs(), 0);
    }

    #[test]
    fn disabled_and_destroyed_colliders_skip() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0));
        spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0).disabled());
        let c = spawn_collider(&mut world, Collider::new(2.0, 2.0, 4.0, 4.0));

        world.destroy(c);
        assert_eq!(collisions.step(&mut world), 0);
    }

    #[test]
    fn destroyed_partner_gives_exit_to_survivor_only() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        let a = spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0));
        let b = spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0));
        collisions.step(&mut world);

        world.destroy(b);
        world.flush();
        collisions.prune(&world);
        collisions.step(&mut world);
        assert_eq!(
            collisions.events(),
            &[CollisionEvent { kind: CollisionKind::Exit, entity: a, other: b }]
        );
    }

    #[test]
    fn handlers_run_after_detection() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        let a = spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0));
        let b = spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0));

        let log = Rc::new(RefCell::new(Vec::new()));
        let entered = log.clone();
        collisions.on_enter(a, move |world, event| {
            entered.borrow_mut().push(("enter", event.other));
            // Disabling mid-dispatch doesn't cancel b's own event this step.
            world.get_mut::<Collider>(event.other).unwrap().enabled = false;
        });
        let any = log.clone();
        collisions.on_collision(b, move |_, event| {
            any.borrow_mut().push(("any", event.other));
        });
        let exited = log.clone();
        collisions.on_exit(a, move |_, event| {
            exited.borrow_mut().push(("exit", event.other));
        });

        collisions.step(&mut world);
        collisions.step(&mut world);
        assert_eq!(
            *log.borrow(),
            vec![("enter", b), ("any", a), ("exit", b), ("any", a)]
        );
    }

    #[test]
    fn overlapping_region_query() {
        let mut world = World::new();
        let collisions = CollisionWorld::default();
        let a = spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0).layer(1));
        let _b = spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0).layer(2));
        let _far = spawn_collider(&mut world, Collider::new(100.0, 0.0, 10.0, 10.0).layer(1));

        let hits = collisions.overlapping(&world, Rect::new(5.0, 5.0, 1.0, 1.0), 1);
        assert_eq!(hits, vec![a]);
    }

    #[test]
    fn forget_drops_pairs_without_exit() {
        let mut world = World::new();
        let mut collisions = CollisionWorld::default();
        spawn_collider(&mut world, Collider::new(0.0, 0.0, 10.0, 10.0));
        let b = spawn_collider(&mut world, Collider::new(5.0, 5.0, 10.0, 10.0));
        collisions.step(&mut world);

        collisions.forget(b);
        world.get_mut::<Collider>(b).unwrap().enabled = false;
        collisions.step(&mut world);
        assert!(collisions.events().is_empty());
    }
}
