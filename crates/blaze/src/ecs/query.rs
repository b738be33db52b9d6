//! # Query: Visiting Entities by Component Type
//!
//! A query names the components it reads and writes as a type, and the world
//! calls a closure once for every entity that has the required ones:
//!
//! ```text
//! world.query::<(&Collider, &mut Sprite, Option<&Tint>)>(|entity, (col, sprite, tint)| ..)
//!
//!   columns: { Collider, Sprite, Tint, Health, .. }
//!                 │        │      │
//!           borrow out of the map for the duration of the query
//!                 │        │      │
//!   for entity in creation order:
//!       has Collider && has Sprite ?      (Option<..> never filters)
//!           └─ yes: closure(entity, (&Collider, &mut Sprite, Option<&Tint>))
//!
//!   put the columns back (also on panic)
//! ```
//!
//! Each parameter takes its column *out* of the world's map while the query
//! runs. Two `&mut` columns then live in two separate locals, so handing out
//! both references needs no unsafe code. The world's entity order list is a
//! separate field, so walking it while the columns are out is also fine.
//!
//! ## Parameters
//!
//! | Param             | Item               | Filters?                    |
//! |-------------------|--------------------|-----------------------------|
//! | `&T`              | `&T`               | yes                         |
//! | `&mut T`          | `&mut T`           | yes                         |
//! | `Option<&T>`      | `Option<&T>`       | no                          |
//! | `Option<&mut T>`  | `Option<&mut T>`   | no                          |
//! | `(P1, .., P8)`    | tuple of items     | if any member does          |
//!
//! ## Comparison
//!
//! - **hecs**: the same `Query` trait on tuples, but it yields through an
//!   iterator over archetype pointers instead of a closure.
//! - **bevy_ecs**: `Option<&T>` works the same way; `With`/`Without` filters
//!   map to [`World::query_filtered`](super::world::World::query_filtered).

use std::any::TypeId;

use super::component::{Columns, Component, ComponentColumn};
use super::entity::Entity;

/// Something a query can fetch per entity.
///
/// Implemented for `&T`, `&mut T`, `Option<&T>`, `Option<&mut T>` and tuples
/// of up to eight of those.
pub trait QueryParam {
    /// Per-entity value handed to the closure.
    type Item<'w>;

    /// Columns held while the query runs.
    type Column;

    /// Every component type touched, required or not.
    fn accessed() -> Vec<TypeId>;

    /// Component types an entity must have to be visited.
    fn required() -> Vec<TypeId>;

    /// Take the column(s) out of the map. A missing column comes out empty.
    fn extract(columns: &mut Columns) -> Self::Column;

    /// Put the column(s) back.
    fn restore(col: Self::Column, columns: &mut Columns);

    /// Whether `entity` should be visited.
    fn matches(col: &Self::Column, entity: Entity) -> bool;

    /// Fetch the item for `entity`. Only called after [`matches`](Self::matches).
    fn fetch(col: &mut Self::Column, entity: Entity) -> Self::Item<'_>;
}

/// One column on loan from the world.
pub struct Borrowed {
    type_id: TypeId,
    column: ComponentColumn,
    /// The world had no column for this type; one was made for the query.
    scratch: bool,
}

impl Borrowed {
    fn take<T: Component>(columns: &mut Columns) -> Self {
        let type_id = TypeId::of::<T>();
        let (column, scratch) = match columns.remove(&type_id) {
            Some(column) => (column, false),
            None => (ComponentColumn::new::<T>(), true),
        };
        Self {
            type_id,
            column,
            scratch,
        }
    }

    fn give_back(self, columns: &mut Columns) {
        if self.scratch && self.column.is_empty() {
            return;
        }
        columns.insert(self.type_id, self.column);
    }
}

fn missing<T>(entity: Entity) -> ! {
    panic!(
        "query matched {entity:?} but it has no `{}`",
        std::any::type_name::<T>()
    )
}

impl<T: Component> QueryParam for &T {
    type Item<'w> = &'w T;
    type Column = Borrowed;

    fn accessed() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn required() -> Vec<TypeId> {
        Self::accessed()
    }

    fn extract(columns: &mut Columns) -> Borrowed {
        Borrowed::take::<T>(columns)
    }

    fn restore(col: Borrowed, columns: &mut Columns) {
        col.give_back(columns);
    }

    fn matches(col: &Borrowed, entity: Entity) -> bool {
        col.column.contains(entity)
    }

    fn fetch(col: &mut Borrowed, entity: Entity) -> &T {
        col.column
            .get::<T>(entity)
            .unwrap_or_else(|| missing::<T>(entity))
    }
}

impl<T: Component> QueryParam for &mut T {
    type Item<'w> = &'w mut T;
    type Column = Borrowed;

    fn accessed() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn required() -> Vec<TypeId> {
        Self::accessed()
    }

    fn extract(columns: &mut Columns) -> Borrowed {
        Borrowed::take::<T>(columns)
    }

    fn restore(col: Borrowed, columns: &mut Columns) {
        col.give_back(columns);
    }

    fn matches(col: &Borrowed, entity: Entity) -> bool {
        col.column.contains(entity)
    }

    fn fetch(col: &mut Borrowed, entity: Entity) -> &mut T {
        col.column
            .get_mut::<T>(entity)
            .unwrap_or_else(|| missing::<T>(entity))
    }
}

impl<T: Component> QueryParam for Option<&T> {
    type Item<'w> = Option<&'w T>;
    type Column = Borrowed;

    fn accessed() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn required() -> Vec<TypeId> {
        Vec::new()
    }

    fn extract(columns: &mut Columns) -> Borrowed {
        Borrowed::take::<T>(columns)
    }

    fn restore(col: Borrowed, columns: &mut Columns) {
        col.give_back(columns);
    }

    fn matches(_col: &Borrowed, _entity: Entity) -> bool {
        true
    }

    fn fetch(col: &mut Borrowed, entity: Entity) -> Option<&T> {
        col.column.get::<T>(entity)
    }
}

impl<T: Component> QueryParam for Option<&mut T> {
    type Item<'w> = Option<&'w mut T>;
    type Column = Borrowed;

    fn accessed() -> Vec<TypeId> {
        vec![TypeId::of::<T>()]
    }

    fn required() -> Vec<TypeId> {
        Vec::new()
    }

    fn extract(columns: &mut Columns) -> Borrowed {
        Borrowed::take::<T>(columns)
    }

    fn restore(col: Borrowed, columns: &mut Columns) {
        col.give_back(columns);
    }

    fn matches(_col: &Borrowed, _entity: Entity) -> bool {
        true
    }

    fn fetch(col: &mut Borrowed, entity: Entity) -> Option<&mut T> {
        col.column.get_mut::<T>(entity)
    }
}

macro_rules! tuple_param {
    ($($name:ident $col:ident),+) => {
        impl<$($name: QueryParam),+> QueryParam for ($($name,)+) {
            type Item<'w> = ($($name::Item<'w>,)+);
            type Column = ($($name::Column,)+);

            fn accessed() -> Vec<TypeId> {
                [$($name::accessed()),+].concat()
            }

            fn required() -> Vec<TypeId> {
                [$($name::required()),+].concat()
            }

            fn extract(columns: &mut Columns) -> Self::Column {
                ($($name::extract(columns),)+)
            }

            fn restore(col: Self::Column, columns: &mut Columns) {
                let ($($col,)+) = col;
                $($name::restore($col, columns);)+
            }

            fn matches(col: &Self::Column, entity: Entity) -> bool {
                let ($($col,)+) = col;
                $($name::matches($col, entity))&&+
            }

            fn fetch(col: &mut Self::Column, entity: Entity) -> Self::Item<'_> {
                let ($($col,)+) = col;
                ($($name::fetch($col, entity),)+)
            }
        }
    };
}

tuple_param!(A a);
tuple_param!(A a, B b);
tuple_param!(A a, B b, C c);
tuple_param!(A a, B b, C c, D d);
tuple_param!(A a, B b, C c, D d, E e);
tuple_param!(A a, B b, C c, D d, E e, F f);
tuple_param!(A a, B b, C c, D d, E e, F f, G g);
tuple_param!(A a, B b, C c, D d, E e, F f, G g, H h);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pos(i32);
    #[derive(Debug, PartialEq)]
    struct Vel(i32);

    fn columns() -> (Columns, Entity, Entity) {
        let mut alloc = super::super::entity::EntityAllocator::new();
        let (moving, still) = (alloc.allocate(), alloc.allocate());
        let mut pos = ComponentColumn::new::<Pos>();
        pos.insert(moving, Pos(0));
        pos.insert(still, Pos(5));
        let mut vel = ComponentColumn::new::<Vel>();
        vel.insert(moving, Vel(2));

        let mut columns = Columns::new();
        columns.insert(TypeId::of::<Pos>(), pos);
        columns.insert(TypeId::of::<Vel>(), vel);
        (columns, moving, still)
    }

    #[test]
    fn required_skips_optional_members() {
        assert_eq!(
            <(&mut Pos, Option<&Vel>)>::accessed(),
            vec![TypeId::of::<Pos>(), TypeId::of::<Vel>()]
        );
        assert_eq!(<(&mut Pos, Option<&Vel>)>::required(), vec![TypeId::of::<Pos>()]);
    }

    #[test]
    fn tuple_matches_only_when_all_present() {
        let (mut columns, moving, still) = columns();
        let mut cols = <(&Pos, &mut Vel)>::extract(&mut columns);
        assert!(columns.is_empty());

        assert!(<(&Pos, &mut Vel)>::matches(&cols, moving));
        assert!(!<(&Pos, &mut Vel)>::matches(&cols, still));
        let (pos, vel) = <(&Pos, &mut Vel)>::fetch(&mut cols, moving);
        vel.0 += pos.0 + 1;

        <(&Pos, &mut Vel)>::restore(cols, &mut columns);
        assert_eq!(columns[&TypeId::of::<Vel>()].get::<Vel>(moving), Some(&Vel(3)));
    }

    #[test]
    fn optional_fetch_yields_none() {
        let (mut columns, moving, still) = columns();
        let mut cols = <Option<&Vel>>::extract(&mut columns);
        assert!(<Option<&Vel>>::matches(&cols, still));
        assert_eq!(<Option<&Vel>>::fetch(&mut cols, still), None);
        assert_eq!(<Option<&Vel>>::fetch(&mut cols, moving), Some(&Vel(2)));
        <Option<&Vel>>::restore(cols, &mut columns);
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn missing_column_leaves_no_trace() {
        struct Shield;
        let (mut columns, moving, _) = columns();
        let cols = <(&Pos, &Shield)>::extract(&mut columns);
        assert!(!<(&Pos, &Shield)>::matches(&cols, moving));
        <(&Pos, &Shield)>::restore(cols, &mut columns);
        assert!(!columns.contains_key(&TypeId::of::<Shield>()));
        assert_eq!(columns.len(), 2);
    }
}
