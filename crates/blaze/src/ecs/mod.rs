//! # Entity Component Store
//!
//! A small entity-component store, one per scene. Components live in
//! per-type columns keyed by entity; iteration follows entity creation order.
//!
//! ## Module Overview
//!
//! - [`entity`]: Process-wide unique entity ids
//! - [`component`]: Type-erased per-type storage (`Box<dyn Any>`)
//! - [`world`]: Central container (entities + components + resources)
//! - [`query`]: Closure-based iteration over matching entities

pub(crate) mod component;
pub mod entity;
pub(crate) mod query;
pub mod world;

pub use component::Component;
pub use entity::Entity;
pub use query::QueryParam;
pub use world::World;
