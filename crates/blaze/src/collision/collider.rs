use crate::math::{Rect, Vec2};

use super::layers::CollisionLayers;

/// An axis-aligned box collider component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Top-left corner in world space.
    pub position: Vec2,
    pub size: Vec2,
    /// Layer bits this collider sits on.
    pub layer: u32,
    /// Layer bits this collider wants to hear about.
    pub mask: u32,
    /// Disabled colliders never pair.
    pub enabled: bool,
}

impl Collider {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_rect(Rect::new(x, y, width, height))
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self {
            position: rect.origin(),
            size: rect.size(),
            layer: CollisionLayers::DEFAULT,
            mask: CollisionLayers::ALL,
            enabled: true,
        }
    }

    pub fn layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    pub fn mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    /// Move the collider's top-left corner.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Center the collider on `center`, keeping its size.
    pub fn center_on(&mut self, center: Vec2) {
        self.position = center - self.size * 0.5;
    }

    /// One-off overlap check. Ignores layers and masks.
    pub fn intersects(&self, other: &Collider) -> bool {
        self.enabled && other.enabled && self.rect().intersects(&other.rect())
    }
}
