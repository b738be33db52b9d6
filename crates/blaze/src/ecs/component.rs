//! # Component: Type-Erased Per-Type Storage
//!
//! A component is any plain value attached to an entity: a `Sprite`, a
//! `Collider`, a game's own `Health`. Scenes bring their own component types,
//! so the world cannot name them. It keeps one [`ComponentColumn`] per
//! [`TypeId`] instead, each mapping entities to boxed values.
//!
//! ## Why a table per type?
//!
//! Each component type gets its own column keyed by [`Entity`]. Looking up one
//! component is a single hash lookup, adding or removing a component never
//! moves the entity's other components, and queries walk the world's entity
//! list in insertion order, so iteration order stays stable within a frame.
//!
//! Values are stored as `Box<dyn Any + Send + Sync>` and accessed via
//! `downcast_ref`/`downcast_mut`. No unsafe code.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::entity::Entity;

/// Marker trait for anything that can be attached to an entity.
///
/// Implemented automatically for every `'static + Send + Sync` type.
pub trait Component: 'static + Send + Sync {}

impl<T: 'static + Send + Sync> Component for T {}

/// A type-erased table of components of one type, keyed by entity.
///
/// A column only ever holds one type. Asking it for another one panics, since
/// the world keys columns by `TypeId` and that can only happen through a bug
/// here.
pub struct ComponentColumn {
    data: HashMap<Entity, Box<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl ComponentColumn {
    /// Create an empty column for components of type `T`.
    pub fn new<T: Component>() -> Self {
        Self {
            data: HashMap::new(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Insert a component, returning the previous one if the entity already
    /// had a component of this type.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Option<T> {
        self.type_name = std::any::type_name::<T>();
        self.data
            .insert(entity, Box::new(value))
            .map(|old| *Self::downcast_box::<T>(old))
    }

    /// Get a shared reference to the entity's component.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.data.get(&entity).map(|b| {
            b.downcast_ref::<T>().unwrap_or_else(|| {
                panic!(
                    "Component type mismatch: expected `{}` in column `{}`",
                    std::any::type_name::<T>(),
                    self.type_name
                )
            })
        })
    }

    /// Get a mutable reference to the entity's component.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        let type_name = self.type_name;
        self.data.get_mut(&entity).map(|b| {
            b.downcast_mut::<T>().unwrap_or_else(|| {
                panic!(
                    "Component type mismatch: expected `{}` in column `{}`",
                    std::any::type_name::<T>(),
                    type_name
                )
            })
        })
    }

    /// Remove and return the entity's component.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.data
            .remove(&entity)
            .map(|old| *Self::downcast_box::<T>(old))
    }

    /// Drop the entity's component without knowing its type. Returns whether
    /// anything was removed.
    pub(crate) fn remove_any(&mut self, entity: Entity) -> bool {
        self.data.remove(&entity).is_some()
    }

    /// Returns `true` if the entity has a component in this column.
    pub fn contains(&self, entity: Entity) -> bool {
        self.data.contains_key(&entity)
    }

    /// Number of components stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fully-qualified name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn downcast_box<T: Component>(b: Box<dyn Any + Send + Sync>) -> Box<T> {
        b.downcast::<T>().unwrap_or_else(|_| {
            panic!(
                "Component type mismatch: expected `{}`",
                std::any::type_name::<T>()
            )
        })
    }
}

/// Map from component type to its column.
pub(crate) type Columns = HashMap<TypeId, ComponentColumn>;

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u64) -> Entity {
        Entity { id }
    }

    #[test]
    fn insert_and_get() {
        let mut col = ComponentColumn::new::<f32>();
        col.insert(entity(1), 1.0f32);
        col.insert(entity(2), 2.0f32);
        assert_eq!(col.get::<f32>(entity(1)), Some(&1.0));
        assert_eq!(col.get::<f32>(entity(2)), Some(&2.0));
        assert_eq!(col.get::<f32>(entity(3)), None);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn insert_returns_replaced_value() {
        let mut col = ComponentColumn::new::<u32>();
        assert_eq!(col.insert(entity(1), 10u32), None);
        assert_eq!(col.insert(entity(1), 20u32), Some(10));
        assert_eq!(col.get::<u32>(entity(1)), Some(&20));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn remove_typed_and_untyped() {
        let mut col = ComponentColumn::new::<u64>();
        col.insert(entity(1), 42u64);
        col.insert(entity(2), 99u64);
        assert_eq!(col.remove::<u64>(entity(1)), Some(42));
        assert!(col.remove_any(entity(2)));
        assert!(!col.remove_any(entity(2)));
        assert!(col.is_empty());
    }

    #[test]
    fn drop_called_on_remove() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);
        let mut col = ComponentColumn::new::<Tracked>();
        col.insert(entity(1), Tracked);
        col.insert(entity(2), Tracked);
        col.remove_any(entity(1));
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 1);
        drop(col);
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn wrong_type_panics() {
        let mut col = ComponentColumn::new::<u32>();
        col.insert(entity(1), 1u32);
        let _ = col.get::<i64>(entity(1));
    }
}
