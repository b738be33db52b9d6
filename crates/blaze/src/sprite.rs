//! Sprite component and the default sprite pass.
//!
//! A [`Sprite`] is a positioned, tinted rectangle, optionally showing an
//! image. [`render_sprites`] draws every visible sprite of a world back to
//! front by `z_index`; sprites with equal `z_index` keep entity creation order
//! (a stable sort), so the output is a pure function of world state.

use crate::asset::ImageHandle;
use crate::ecs::World;
use crate::math::{Rect, Vec2};
use crate::render::{Color, RectStyle, Renderer};

/// A 2D sprite component.
///
/// Without an image, the sprite renders as a solid quad in its tint color.
#[derive(Debug, Clone)]
pub struct Sprite {
    /// World position of the anchor point.
    pub position: Vec2,
    /// Size in world units. If zero, sized from the image once it loads.
    pub size: Vec2,
    /// Which point of the sprite sits at `position`, normalized: `(0, 0)` is
    /// the top-left corner, `(0.5, 0.5)` the center.
    pub anchor: Vec2,
    /// Tint color multiplied with the image.
    pub tint: Color,
    pub visible: bool,
    /// Draw order; higher values are drawn later (on top).
    pub z_index: i32,
    /// Rotation in radians around the anchor. Carried for hosts that draw
    /// sprites themselves; the rect-based [`Renderer`] draws unrotated.
    pub rotation: f32,
    /// Image to draw. `None` draws a filled rect.
    pub image: Option<ImageHandle>,
}

impl Sprite {
    /// Create a new sprite with default values (white, zero-sized, top-left anchor).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the anchor position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the size in world units.
    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    /// Set the normalized anchor.
    pub fn anchor(mut self, x: f32, y: f32) -> Self {
        self.anchor = Vec2::new(x, y);
        self
    }

    /// Set the tint color.
    pub fn tint(mut self, color: Color) -> Self {
        self.tint = color;
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// Set the image.
    pub fn image(mut self, image: ImageHandle) -> Self {
        self.image = Some(image);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Size actually drawn: `size`, or the image dimensions when `size` is zero.
    pub fn effective_size(&self) -> Vec2 {
        if self.size != Vec2::ZERO {
            return self.size;
        }
        self.image
            .as_ref()
            .and_then(ImageHandle::info)
            .map_or(Vec2::ZERO, |info| {
                Vec2::new(info.width as f32, info.height as f32)
            })
    }

    /// Unrotated world-space bounds.
    pub fn bounds(&self) -> Rect {
        let size = self.effective_size();
        Rect::from_origin_size(self.position - size * self.anchor, size)
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            anchor: Vec2::ZERO,
            tint: Color::WHITE,
            visible: true,
            z_index: 0,
            rotation: 0.0,
            image: None,
        }
    }
}

/// Draw every visible sprite in `world`, ordered by `z_index`.
///
/// Sprites whose image hasn't loaded yet draw as a filled rect in their tint.
pub fn render_sprites(world: &World, renderer: &mut dyn Renderer) {
    let mut sprites: Vec<&Sprite> = world
        .query_entities::<(&Sprite,)>()
        .filter_map(|e| world.get::<Sprite>(e))
        .filter(|s| s.visible)
        .collect();
    sprites.sort_by_key(|s| s.z_index);

    for sprite in sprites {
        let dest = sprite.bounds();
        match &sprite.image {
            Some(image) if image.is_loaded() => renderer.draw_image(image, dest, sprite.tint),
            _ => renderer.draw_rect(dest, sprite.tint, RectStyle::Filled),
        }
    }
}
