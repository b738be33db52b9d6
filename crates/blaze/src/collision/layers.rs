//! Collision layers and mask filtering.
//!
//! Every collider sits on one or more layer bits (`layer`) and names the
//! layers it wants to hear about (`mask`). [`MaskMode`] decides how the two
//! sides' masks combine.
//!
//! ```text
//!                     A.mask∩B.layer   B.mask∩A.layer   A gets   B gets
//! Either      (def.)        ✓                ✗            ✓        ✓
//! Directional               ✓                ✗            ✓        ✗
//! Both                      ✓                ✗            ✗        ✗
//! ```

use serde::{Deserialize, Serialize};

/// Named layer bits.
pub struct CollisionLayers;

impl CollisionLayers {
    /// No collision layer
    pub const NONE: u32 = 0;

    /// All collision layers
    pub const ALL: u32 = u32::MAX;

    /// Layer assigned to colliders that don't pick one.
    pub const DEFAULT: u32 = 1 << 0;

    pub const PLAYER: u32 = 1 << 1;
    pub const ENEMY: u32 = 1 << 2;
    /// Projectiles (bullets, missiles, etc.)
    pub const PROJECTILE: u32 = 1 << 3;
    /// Static level geometry.
    pub const ENVIRONMENT: u32 = 1 << 4;
    /// Trigger volumes (no physical response)
    pub const TRIGGER: u32 = 1 << 5;
    /// Pickups and collectibles
    pub const PICKUP: u32 = 1 << 6;

    /// User-defined layer `n` (bits 8-31).
    ///
    /// # Panics
    ///
    /// Panics if `n` is outside `8..32`.
    pub const fn custom(n: u32) -> u32 {
        assert!(n >= 8 && n < 32, "custom collision layers use bits 8-31");
        1 << n
    }
}

/// How two colliders' masks decide whether they interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskMode {
    /// Either side's mask accepting the other's layer is enough, and both
    /// sides receive events.
    #[default]
    Either,
    /// Either side's mask is enough to pair them, but a collider only
    /// receives events when its own mask accepts the other's layer.
    Directional,
    /// Both masks must accept the other's layer.
    Both,
}

impl MaskMode {
    /// Which of the two colliders receive events for an overlap, as
    /// `(a_receives, b_receives)`. `(false, false)` means the pair is ignored.
    pub fn receivers(self, a_layer: u32, a_mask: u32, b_layer: u32, b_mask: u32) -> (bool, bool) {
        let a_wants = a_mask & b_layer != 0;
        let b_wants = b_mask & a_layer != 0;
        match self {
            MaskMode::Either => {
                let pair = a_wants || b_wants;
                (pair, pair)
            }
            MaskMode::Directional => (a_wants, b_wants),
            MaskMode::Both => {
                let pair = a_wants && b_wants;
                (pair, pair)
            }
        }
    }

    /// Whether the two colliders interact at all.
    pub fn should_collide(self, a_layer: u32, a_mask: u32, b_layer: u32, b_mask: u32) -> bool {
        let (a, b) = self.receivers(a_layer, a_mask, b_layer, b_mask);
        a || b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u32 = CollisionLayers::PLAYER;
    const B: u32 = CollisionLayers::ENEMY;

    #[test]
    fn disjoint_masks_never_collide() {
        for mode in [MaskMode::Either, MaskMode::Directional, MaskMode::Both] {
            assert!(!mode.should_collide(A, CollisionLayers::PICKUP, B, CollisionLayers::NONE));
        }
    }

    #[test]
    fn one_sided_mask() {
        // A listens for B, B listens for nothing.
        assert_eq!(MaskMode::Either.receivers(A, B, B, 0), (true, true));
        assert_eq!(MaskMode::Directional.receivers(A, B, B, 0), (true, false));
        assert_eq!(MaskMode::Both.receivers(A, B, B, 0), (false, false));
    }

    #[test]
    fn mutual_masks() {
        for mode in [MaskMode::Either, MaskMode::Directional, MaskMode::Both] {
            assert_eq!(mode.receivers(A, B, B, A), (true, true));
        }
    }

    #[test]
    fn custom_layers() {
        assert_eq!(CollisionLayers::custom(8), 256);
        assert_eq!(CollisionLayers::custom(31), 1 << 31);
    }

    #[test]
    fn mask_mode_serde_names() {
        let mode: MaskMode = serde_json::from_str("\"directional\"").unwrap();
        assert_eq!(mode, MaskMode::Directional);
        assert_eq!(serde_json::to_string(&MaskMode::Both).unwrap(), "\"both\"");
    }
}
