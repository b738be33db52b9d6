use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use blaze::prelude::*;

type Events = Rc<RefCell<Vec<(String, CollisionKind)>>>;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Two boxes, `a` and `b`. Each update moves `b` to the next scripted x.
struct Arena {
    a: Collider,
    b: Collider,
    script: Vec<f32>,
    events: Events,
}

impl Arena {
    fn new(a: Collider, b: Collider, events: &Events) -> Self {
        Self {
            a,
            b,
            script: Vec::new(),
            events: events.clone(),
        }
    }

    fn script(mut self, xs: &[f32]) -> Self {
        self.script = xs.iter().rev().copied().collect();
        self
    }
}

impl Scene for Arena {
    fn name(&self) -> &str {
        "arena"
    }

    fn on_start(&mut self, ctx: &mut SceneContext<'_>) {
        for (name, collider) in [("a", self.a), ("b", self.b)] {
            let entity = ctx.spawn(name).insert(collider).id();
            let events = self.events.clone();
            ctx.collisions.on_collision(entity, move |world, event| {
                let name = world.name(event.entity).unwrap_or("?").to_string();
                events.borrow_mut().push((name, event.kind));
            });
        }
    }

    fn on_update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> Result<(), SceneError> {
        let Some(x) = self.script.pop() else {
            return Ok(());
        };
        let mover = ctx
            .world
            .named("b")
            .ok_or_else(|| SceneError::msg("mover missing"))?;
        if let Some(collider) = ctx.world.get_mut::<Collider>(mover) {
            collider.position.x = x;
        }
        Ok(())
    }
}

fn run_frames(scene: Arena, frames: usize) -> Game {
    let mut game = Game::new(GameConfig::default()).unwrap();
    game.set_scene(scene);
    game.start();
    let mut buffer = CommandBuffer::new();
    for _ in 0..frames {
        game.frame(ms(16), &mut buffer);
    }
    game
}

fn kinds_for(events: &Events, name: &str) -> Vec<CollisionKind> {
    events
        .borrow()
        .iter()
        .filter(|(who, _)| who == name)
        .map(|(_, kind)| *kind)
        .collect()
}

#[test]
fn overlap_for_three_frames_then_separate() {
    let events = Events::default();
    let a = Collider::new(0.0, 0.0, 10.0, 10.0);
    let b = Collider::new(5.0, 0.0, 10.0, 10.0);
    let arena = Arena::new(a, b, &events).script(&[5.0, 6.0, 7.0, 50.0]);
    run_frames(arena, 4);

    use CollisionKind::*;
    assert_eq!(kinds_for(&events, "a"), vec![Enter, Stay, Stay, Exit]);
    assert_eq!(kinds_for(&events, "b"), vec![Enter, Stay, Stay, Exit]);
}

#[test]
fn reciprocal_masks_notify_both() {
    let events = Events::default();
    let a = Collider::new(0.0, 0.0, 10.0, 10.0).layer(1).mask(2);
    let b = Collider::new(5.0, 5.0, 10.0, 10.0).layer(2).mask(1);
    let game = run_frames(Arena::new(a, b, &events), 1);

    assert_eq!(kinds_for(&events, "a"), vec![CollisionKind::Enter]);
    assert_eq!(kinds_for(&events, "b"), vec![CollisionKind::Enter]);
    let collisions = game.scenes().collisions().unwrap();
    assert_eq!(collisions.active_pairs(), 1);
}

#[test]
fn disjoint_masks_never_collide() {
    for mode in [MaskMode::Either, MaskMode::Directional, MaskMode::Both] {
        let events = Events::default();
        let a = Collider::new(0.0, 0.0, 10.0, 10.0)
            .layer(CollisionLayers::PLAYER)
            .mask(CollisionLayers::ENEMY);
        let b = Collider::new(0.0, 0.0, 10.0, 10.0)
            .layer(CollisionLayers::PICKUP)
            .mask(CollisionLayers::ENVIRONMENT);

        let mut game = Game::new(GameConfig::default().mask_mode(mode)).unwrap();
        game.set_scene(Arena::new(a, b, &events));
        game.start();
        for _ in 0..3 {
            game.frame(ms(16), &mut CommandBuffer::new());
        }
        assert!(events.borrow().is_empty(), "{mode:?}");
        assert_eq!(game.scenes().collisions().unwrap().active_pairs(), 0);
    }
}

#[test]
fn directional_mask_notifies_only_the_listener() {
    let events = Events::default();
    let a = Collider::new(0.0, 0.0, 10.0, 10.0).layer(1).mask(2);
    let b = Collider::new(5.0, 5.0, 10.0, 10.0).layer(2).mask(0);

    let mut game = Game::new(GameConfig::default().mask_mode(MaskMode::Directional)).unwrap();
    game.set_scene(Arena::new(a, b, &events));
    game.start();
    game.frame(ms(16), &mut CommandBuffer::new());

    assert_eq!(kinds_for(&events, "a"), vec![CollisionKind::Enter]);
    assert!(kinds_for(&events, "b").is_empty());
}

#[test]
fn handler_can_destroy_what_it_hits() {
    struct Shooter;

    impl Scene for Shooter {
        fn name(&self) -> &str {
            "shooter"
        }

        fn on_start(&mut self, ctx: &mut SceneContext<'_>) {
            let bullet = ctx
                .spawn("bullet")
                .insert(
                    Collider::new(0.0, 0.0, 2.0, 2.0)
                        .layer(CollisionLayers::PROJECTILE)
                        .mask(CollisionLayers::ENEMY),
                )
                .id();
            ctx.spawn("enemy").insert(
                Collider::new(1.0, 1.0, 8.0, 8.0)
                    .layer(CollisionLayers::ENEMY)
                    .mask(CollisionLayers::PROJECTILE),
            );
            ctx.collisions.on_enter(bullet, |world, event| {
                world.destroy(event.entity);
                world.destroy(event.other);
            });
        }
    }

    let mut game = Game::new(GameConfig::default()).unwrap();
    game.set_scene(Shooter);
    game.start();
    let mut buffer = CommandBuffer::new();
    game.frame(ms(16), &mut buffer);
    game.frame(ms(16), &mut buffer);

    let world = game.scenes().world().unwrap();
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.named("enemy"), None);
    let collisions = game.scenes().collisions().unwrap();
    assert_eq!(collisions.active_pairs(), 0);
    // Both ends are gone, so nobody is left to receive the exit.
    assert!(collisions.events().is_empty());
}
