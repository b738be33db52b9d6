//! # Collision: AABB Overlap with Layer/Mask Filtering
//!
//! Axis-aligned box colliders, found by a broad-phase pass every step and
//! reported as enter / stay / exit events.
//!
//! ## Usage
//!
//! ```ignore
//! let ship = ctx.spawn("ship")
//!     .insert(Collider::new(0.0, 0.0, 16.0, 16.0)
//!         .layer(CollisionLayers::PLAYER)
//!         .mask(CollisionLayers::ENEMY | CollisionLayers::PICKUP))
//!     .id();
//!
//! ctx.collisions.on_enter(ship, |world, event| {
//!     world.destroy(event.other);
//! });
//! ```
//!
//! The scene manager steps the scene's [`CollisionWorld`] after every update
//! step, then flushes destroyed entities.
//!
//! ## Comparison
//!
//! - **Unity / Godot**: layer + mask bitfields, enter/stay/exit callbacks. We
//!   match the callback shape but stop at overlap; there is no contact
//!   resolution or physics response.
//! - **rapier**: interaction groups use the same two-bitfield idea, with an
//!   AND/OR choice exposed much like [`MaskMode`].

pub mod broad_phase;
pub mod collider;
pub mod layers;
pub mod world;

pub use broad_phase::{BroadPhase, CollisionPair};
pub use collider::Collider;
pub use layers::{CollisionLayers, MaskMode};
pub use world::{CollisionEvent, CollisionHandler, CollisionKind, CollisionWorld};
