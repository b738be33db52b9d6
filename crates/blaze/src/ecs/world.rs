//! # World: The Entity Store
//!
//! The [`World`] owns all entities, components, and resources of one scene.
//! It's the single source of truth for that scene's game state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ World (one per scene)                               │
//! │                                                     │
//! │  order: Vec<Entity>         insertion order         │
//! │  records: HashMap<Entity, EntityRecord>             │
//! │    name, tag, liveness flag                         │
//! │                                                     │
//! │  columns: HashMap<TypeId, ComponentColumn>          │
//! │    one table per component type, keyed by entity    │
//! │                                                     │
//! │  pending_destroy: Vec<Entity>                       │
//! │    removed together at the next flush()             │
//! │                                                     │
//! │  resources: HashMap<TypeId, Box<dyn Any>>           │
//! │    score, timers, anything one-per-scene            │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deferred Destruction
//!
//! [`destroy`](World::destroy) only marks an entity: [`is_alive`](World::is_alive)
//! turns false right away, but the entity and its components stay in storage
//! (and keep showing up in queries) until [`flush`](World::flush). The scene
//! manager flushes once after every update step, so a scene can destroy
//! entities in the middle of a query without disturbing the iteration.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};

use super::component::{Columns, Component, ComponentColumn};
use super::entity::{Entity, EntityAllocator};
use super::query::QueryParam;

/// Per-entity bookkeeping.
struct EntityRecord {
    name: Option<String>,
    tag: String,
    alive: bool,
}

/// The entity store: entities, their components, and global resources.
pub struct World {
    allocator: EntityAllocator,
    /// Every stored entity, in creation order.
    order: Vec<Entity>,
    records: HashMap<Entity, EntityRecord>,
    columns: Columns,
    /// Tag → entities carrying it, in tagging order.
    tags: HashMap<String, Vec<Entity>>,
    pending_destroy: Vec<Entity>,
    /// One value per type, not attached to any entity.
    resources: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    /// Number of entities spawned since the last stats read (diagnostics only).
    #[cfg(feature = "diagnostics")]
    spawned_this_frame: u32,
    /// Number of entities flushed since the last stats read (diagnostics only).
    #[cfg(feature = "diagnostics")]
    destroyed_this_frame: u32,
}

impl World {
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            order: Vec::new(),
            records: HashMap::new(),
            columns: HashMap::new(),
            tags: HashMap::new(),
            pending_destroy: Vec::new(),
            resources: HashMap::new(),
            #[cfg(feature = "diagnostics")]
            spawned_this_frame: 0,
            #[cfg(feature = "diagnostics")]
            destroyed_this_frame: 0,
        }
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Store a per-scene singleton, such as a score or a spawn timer. A
    /// previous value of the same type is dropped.
    pub fn insert_resource<T: Component>(&mut self, value: T) {
        self.resources.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// The scene's `T` resource.
    ///
    /// # Panics
    ///
    /// If no `T` was inserted. Use [`get_resource`](World::get_resource)
    /// when it may be absent.
    pub fn resource<T: Component>(&self) -> &T {
        match self.get_resource::<T>() {
            Some(value) => value,
            None => missing_resource::<T>(),
        }
    }

    /// Mutable form of [`resource`](World::resource). Same panic.
    pub fn resource_mut<T: Component>(&mut self) -> &mut T {
        match self.get_resource_mut::<T>() {
            Some(value) => value,
            None => missing_resource::<T>(),
        }
    }

    pub fn get_resource<T: Component>(&self) -> Option<&T> {
        let boxed = self.resources.get(&TypeId::of::<T>())?;
        boxed.downcast_ref()
    }

    pub fn get_resource_mut<T: Component>(&mut self) -> Option<&mut T> {
        let boxed = self.resources.get_mut(&TypeId::of::<T>())?;
        boxed.downcast_mut()
    }

    pub fn has_resource<T: Component>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<T>())
    }

    /// Take the `T` resource out of the world.
    pub fn resource_remove<T: Component>(&mut self) -> Option<T> {
        let boxed = self.resources.remove(&TypeId::of::<T>())?;
        boxed.downcast().ok().map(|value| *value)
    }

    // ── Create / Destroy ─────────────────────────────────────────────

    /// Create a named entity with no components.
    ///
    /// Names are labels for lookup via [`named`](World::named) and for log
    /// output; they don't have to be unique.
    pub fn spawn(&mut self, name: &str) -> Entity {
        self.spawn_record(Some(name.to_string()))
    }

    /// Create an unnamed entity with no components.
    pub fn spawn_empty(&mut self) -> Entity {
        self.spawn_record(None)
    }

    fn spawn_record(&mut self, name: Option<String>) -> Entity {
        let entity = self.allocator.allocate();
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_frame += 1;
        }
        self.order.push(entity);
        self.records.insert(
            entity,
            EntityRecord {
                name,
                tag: String::new(),
                alive: true,
            },
        );
        entity
    }

    /// Mark an entity for destruction at the next [`flush`](World::flush).
    ///
    /// Returns `true` if the entity was alive. Destroying an entity twice, or
    /// one this world doesn't know, is logged and ignored.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        match self.records.get_mut(&entity) {
            Some(record) if record.alive => {
                record.alive = false;
                self.pending_destroy.push(entity);
                true
            }
            Some(_) => {
                log::warn!("destroy({entity:?}): already marked for destruction, ignoring");
                false
            }
            None => {
                log::warn!("destroy({entity:?}): unknown or already removed entity, ignoring");
                false
            }
        }
    }

    /// Mark every live entity for destruction.
    pub fn destroy_all(&mut self) {
        for &entity in &self.order {
            if let Some(record) = self.records.get_mut(&entity) {
                if record.alive {
                    record.alive = false;
                    self.pending_destroy.push(entity);
                }
            }
        }
    }

    /// Remove every entity marked by [`destroy`](World::destroy), together
    /// with all of its components, its tag and its name.
    ///
    /// Returns the number of entities removed.
    pub fn flush(&mut self) -> usize {
        if self.pending_destroy.is_empty() {
            return 0;
        }
        let doomed: HashSet<Entity> = self.pending_destroy.drain(..).collect();
        self.order.retain(|e| !doomed.contains(e));

        for &entity in &doomed {
            if let Some(record) = self.records.remove(&entity) {
                if !record.tag.is_empty() {
                    self.untag(entity, &record.tag);
                }
            }
            for column in self.columns.values_mut() {
                column.remove_any(entity);
            }
            self.allocator.release();
        }

        #[cfg(feature = "diagnostics")]
        {
            self.destroyed_this_frame += doomed.len() as u32;
        }
        log::trace!("flushed {} destroyed entities", doomed.len());
        doomed.len()
    }

    /// Destroy and flush everything, keeping resources.
    pub fn clear(&mut self) {
        self.destroy_all();
        self.flush();
    }

    /// Returns `true` if the entity exists and hasn't been marked for destruction.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.records.get(&entity).is_some_and(|r| r.alive)
    }

    /// Returns `true` if the entity is marked for destruction but not yet flushed.
    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.records.get(&entity).is_some_and(|r| !r.alive)
    }

    /// Number of stored entities, including ones awaiting the next flush.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Number of entities marked for destruction.
    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroy.len()
    }

    /// Iterate over every stored entity in creation order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    // ── Names & Tags ─────────────────────────────────────────────────

    /// The entity's name, if it was spawned with one.
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.records.get(&entity)?.name.as_deref()
    }

    /// The first live entity (in creation order) with the given name.
    pub fn named(&self, name: &str) -> Option<Entity> {
        self.order.iter().copied().find(|e| {
            self.records
                .get(e)
                .is_some_and(|r| r.alive && r.name.as_deref() == Some(name))
        })
    }

    /// Set the entity's tag, replacing any previous one. An empty tag clears it.
    pub fn set_tag(&mut self, entity: Entity, tag: &str) {
        let Some(record) = self.records.get_mut(&entity) else {
            log::warn!("set_tag({entity:?}, {tag:?}): unknown entity, ignoring");
            return;
        };
        let old = std::mem::replace(&mut record.tag, tag.to_string());
        if !old.is_empty() {
            self.untag(entity, &old);
        }
        if !tag.is_empty() {
            self.tags.entry(tag.to_string()).or_default().push(entity);
        }
    }

    /// The entity's tag, or `None` if it has none.
    pub fn tag(&self, entity: Entity) -> Option<&str> {
        self.records
            .get(&entity)
            .map(|r| r.tag.as_str())
            .filter(|t| !t.is_empty())
    }

    /// All live entities with the given tag, in tagging order.
    pub fn tagged(&self, tag: &str) -> Vec<Entity> {
        self.tags
            .get(tag)
            .map(|list| {
                list.iter()
                    .copied()
                    .filter(|&e| self.is_alive(e))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn untag(&mut self, entity: Entity, tag: &str) {
        if let Some(list) = self.tags.get_mut(tag) {
            list.retain(|&e| e != entity);
            if list.is_empty() {
                self.tags.remove(tag);
            }
        }
    }

    // ── Per-Entity Component Access ──────────────────────────────────

    /// Attach a component, returning a mutable reference to it.
    ///
    /// An entity holds at most one component per type: inserting a second one
    /// replaces the first (debug builds log the replacement). Inserting on a
    /// dead entity is logged and the component is dropped.
    pub fn insert<T: Component>(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        if !self.is_alive(entity) {
            log::warn!(
                "insert `{}` on dead entity {entity:?}, ignoring",
                std::any::type_name::<T>()
            );
            return None;
        }
        let column = self
            .columns
            .entry(TypeId::of::<T>())
            .or_insert_with(ComponentColumn::new::<T>);
        if column.insert(entity, component).is_some() {
            #[cfg(debug_assertions)]
            log::warn!(
                "{entity:?} already had a `{}`; replaced",
                std::any::type_name::<T>()
            );
        }
        column.get_mut::<T>(entity)
    }

    /// `entity`'s `T`, if it has one.
    ///
    /// Returns `None` if the entity was flushed or doesn't have the component.
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.columns.get(&TypeId::of::<T>())?.get::<T>(entity)
    }

    /// Mutable form of [`get`](World::get).
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.columns.get_mut(&TypeId::of::<T>())?.get_mut::<T>(entity)
    }

    /// Returns `true` if the entity has a component of type `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.columns
            .get(&TypeId::of::<T>())
            .is_some_and(|c| c.contains(entity))
    }

    /// Detach and return a component.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.columns.get_mut(&TypeId::of::<T>())?.remove::<T>(entity)
    }

    // ── Query ────────────────────────────────────────────────────────

    /// Visit every entity that has the requested component types, in
    /// creation order.
    ///
    /// Entities marked for destruction are still visited until the next
    /// flush; check [`is_alive`](World::is_alive) to skip them.
    ///
    /// # Example
    ///
    /// ```ignore
    /// world.query::<(&mut Sprite, &Velocity)>(|entity, (sprite, vel)| {
    ///     sprite.position += vel.0;
    /// });
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `Q` names the same component type twice.
    pub fn query<Q: QueryParam>(&mut self, mut f: impl FnMut(Entity, Q::Item<'_>)) {
        assert_distinct::<Q>();
        let order = &self.order;
        let mut guard = ColumnGuard::<Q> {
            cols: Some(Q::extract(&mut self.columns)),
            columns: &mut self.columns,
        };
        if let Some(cols) = guard.cols.as_mut() {
            for &entity in order {
                if Q::matches(cols, entity) {
                    f(entity, Q::fetch(cols, entity));
                }
            }
        }
    }

    /// Like [`query`](World::query), but only visits entities that also have
    /// a marker component `F`. The marker is not yielded.
    pub fn query_filtered<Q: QueryParam, F: Component>(
        &mut self,
        mut f: impl FnMut(Entity, Q::Item<'_>),
    ) {
        let marker = TypeId::of::<F>();
        let with_marker: HashSet<Entity> = match self.columns.get(&marker) {
            Some(column) => self
                .order
                .iter()
                .copied()
                .filter(|&e| column.contains(e))
                .collect(),
            None => return,
        };
        self.query::<Q>(|entity, item| {
            if with_marker.contains(&entity) {
                f(entity, item);
            }
        });
    }

    /// Lazily iterate the entities that have every component in `Q`, in
    /// creation order. Call again to restart.
    pub fn query_entities<Q: QueryParam>(&self) -> impl Iterator<Item = Entity> + '_ {
        let required = Q::required();
        self.order.iter().copied().filter(move |&entity| {
            required.iter().all(|tid| {
                self.columns
                    .get(tid)
                    .is_some_and(|column| column.contains(entity))
            })
        })
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Read and reset the per-frame spawn/destroy counters.
    #[cfg(feature = "diagnostics")]
    pub(crate) fn take_frame_counts(&mut self) -> (u32, u32) {
        let counts = (self.spawned_this_frame, self.destroyed_this_frame);
        self.spawned_this_frame = 0;
        self.destroyed_this_frame = 0;
        counts
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("World");
        s.field("entities", &self.order.len())
            .field("pending_destroy", &self.pending_destroy.len())
            .field("component_types", &self.columns.len())
            .field("resources", &self.resources.len());
        #[cfg(feature = "diagnostics")]
        s.field("total_spawned", &self.allocator.total_allocated());
        s.finish()
    }
}

fn missing_resource<T>() -> ! {
    panic!(
        "no `{}` resource in this scene's world; insert it first",
        std::any::type_name::<T>()
    )
}

/// Puts extracted query columns back even if the query closure panics.
struct ColumnGuard<'w, Q: QueryParam> {
    cols: Option<Q::Column>,
    columns: &'w mut Columns,
}

impl<Q: QueryParam> Drop for ColumnGuard<'_, Q> {
    fn drop(&mut self) {
        if let Some(cols) = self.cols.take() {
            Q::restore(cols, self.columns);
        }
    }
}

fn assert_distinct<Q: QueryParam>() {
    let ids = Q::accessed();
    let unique: HashSet<&TypeId> = ids.iter().collect();
    assert!(
        unique.len() == ids.len(),
        "query `{}` requests the same component type more than once",
        std::any::type_name::<Q>()
    );
}
