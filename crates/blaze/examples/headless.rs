//! Headless: a title screen, an asteroid field, no window.
//!
//! Runs two scenes on a [`ManualClock`] at a fixed 60 Hz step and records
//! every draw call into a [`CommandBuffer`]:
//!
//! - **title** waits half a second, then switches to the field
//! - **field** loads its ship image, drifts rocks towards the ship and
//!   destroys whatever it touches, then stops the game after three seconds
//!
//! Run with: `RUST_LOG=debug cargo run -p blaze --example headless`

use std::time::Duration;

use blaze::prelude::*;

// ── Components ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Velocity(Vec2);

// ── Title ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Title {
    leaving: bool,
}

impl Scene for Title {
    fn name(&self) -> &str {
        "title"
    }

    fn on_update(&mut self, ctx: &mut SceneContext<'_>, _dt: f32) -> Result<(), SceneError> {
        if ctx.time.elapsed_secs() >= 0.5 && !self.leaving {
            ctx.set_scene(Field::default());
            self.leaving = true;
        }
        Ok(())
    }

    fn on_render(&self, _view: &SceneView<'_>, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        renderer.draw_screen_rect(Rect::new(0.0, 0.0, 800.0, 600.0), Color::hex(0x101020), RectStyle::Filled);
        renderer.draw_text(
            "ASTEROIDS",
            Vec2::new(400.0, 280.0),
            &TextStyle::new(48.0).align(Align::Center),
        );
        Ok(())
    }
}

// ── Field ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Field {
    ship_image: Option<ImageHandle>,
    hits: u32,
}

impl Scene for Field {
    fn name(&self) -> &str {
        "field"
    }

    fn on_load(&mut self, ctx: &mut SceneContext<'_>) -> LoadFuture {
        let (image, load) = ctx.assets.load_image("ship.png");
        self.ship_image = Some(image);
        load
    }

    fn on_start(&mut self, ctx: &mut SceneContext<'_>) {
        let mut ship = Sprite::new().at(400.0, 300.0).anchor(0.5, 0.5);
        if let Some(image) = self.ship_image.clone() {
            ship = ship.image(image);
        }
        let mut collider = Collider::new(0.0, 0.0, 32.0, 32.0)
            .layer(CollisionLayers::PLAYER)
            .mask(CollisionLayers::ENEMY);
        collider.center_on(Vec2::new(400.0, 300.0));
        let ship = ctx.spawn("ship").insert(ship).insert(collider).tag("player").id();

        for i in 0..8 {
            let angle = i as f32 * std::f32::consts::TAU / 8.0;
            let direction = Vec2::new(angle.cos(), angle.sin());
            let position = Vec2::new(400.0, 300.0) + direction * 350.0;
            ctx.create()
                .insert(Sprite::new().at(position.x, position.y).size(24.0, 24.0).tint(Color::hex(0x886644)))
                .insert(
                    Collider::new(position.x, position.y, 24.0, 24.0)
                        .layer(CollisionLayers::ENEMY)
                        .mask(CollisionLayers::PLAYER),
                )
                .insert(Velocity(-direction * (90.0 + 10.0 * i as f32)))
                .tag("rock");
        }

        ctx.collisions.on_enter(ship, |world, event| {
            log::info!("ship hit by rock {}", event.other);
            world.destroy(event.other);
        });
    }

    fn on_update(&mut self, ctx: &mut SceneContext<'_>, dt: f32) -> Result<(), SceneError> {
        ctx.world.query::<(&Velocity, &mut Sprite, &mut Collider)>(|_, (velocity, sprite, collider)| {
            sprite.position += velocity.0 * dt;
            collider.set_position(sprite.position);
        });

        let rocks = ctx.world.tagged("rock").len() as u32;
        self.hits = 8 - rocks;
        if ctx.time.elapsed_secs() >= 3.5 {
            log::info!("{} rocks destroyed, {} left", self.hits, rocks);
            ctx.request_stop();
        }
        Ok(())
    }

    fn on_render(&self, view: &SceneView<'_>, renderer: &mut dyn Renderer) -> Result<(), SceneError> {
        blaze::sprite::render_sprites(view.world, renderer);
        renderer.draw_text(
            &format!("hits {}", self.hits),
            Vec2::new(8.0, 8.0),
            &TextStyle::new(14.0).color(Color::GREEN),
        );
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    blaze::diag::init_logger();

    let config = GameConfig::new("headless").fixed_step(1.0 / 60.0);
    let mut game = Game::new(config)?.with_loader(MemoryLoader::new().with_image("ship.png", 32, 32));
    game.set_scene(Title::default());

    let mut clock = ManualClock::new(Duration::from_nanos(16_666_667));
    let mut buffer = CommandBuffer::new();
    let frames = game.run(&mut clock, &mut buffer);
    game.shutdown();

    log::info!(
        "ran {frames} frames ({:.2}s of game time), recorded {} draw commands",
        game.time().elapsed_secs(),
        buffer.len()
    );
    Ok(())
}
