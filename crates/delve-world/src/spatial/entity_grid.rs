//! Hash grid keyed through a position-bearing entity trait.

use std::hash::Hash;
use std::marker::PhantomData;

use delve_common::EntityId;
use glam::Vec2;

use super::hash_grid::SpatialHashGrid;

/// An entity that knows its own key and position.
pub trait GridEntity {
    /// Identity used to track the entity in the grid.
    type Key: Copy + Eq + Hash;

    /// Returns the entity's grid key.
    fn grid_key(&self) -> Self::Key;

    /// Returns the entity's current world position.
    fn grid_position(&self) -> Vec2;
}

/// Spatial hash grid for [`GridEntity`] values.
///
/// Entities are tracked by key; callers keep ownership of the entities and
/// call [`EntityGrid::update`] after moving them.
pub struct EntityGrid<E: GridEntity> {
    grid: SpatialHashGrid<E::Key>,
    _entity: PhantomData<fn(&E)>,
}

impl<E: GridEntity> std::fmt::Debug for EntityGrid<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityGrid")
            .field("cell_size", &self.grid.cell_size())
            .field("entities", &self.grid.len())
            .field("buckets", &self.grid.bucket_count())
            .finish()
    }
}

impl<E: GridEntity> EntityGrid<E> {
    /// Creates an empty grid with square cells of `cell_size` world units.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            grid: SpatialHashGrid::new(cell_size),
            _entity: PhantomData,
        }
    }

    /// Number of tracked entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// Returns true if no entities are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Checks whether an entity is tracked.
    #[must_use]
    pub fn contains(&self, entity: &E) -> bool {
        self.grid.contains(entity.grid_key())
    }

    /// Starts tracking an entity at its current position.
    pub fn insert(&mut self, entity: &E) {
        let p = entity.grid_position();
        self.grid.insert(entity.grid_key(), p.x, p.y);
    }

    /// Re-buckets an entity after it moved. Returns true if it changed cell.
    pub fn update(&mut self, entity: &E) -> bool {
        let p = entity.grid_position();
        self.grid.update(entity.grid_key(), p.x, p.y)
    }

    /// Stops tracking an entity.
    pub fn remove(&mut self, entity: &E) -> bool {
        self.grid.remove(entity.grid_key())
    }

    /// Stops tracking an entity by key.
    pub fn remove_key(&mut self, key: E::Key) -> bool {
        self.grid.remove(key)
    }

    /// Keys of entities within `radius` of `center`.
    pub fn query_radius(&mut self, center: Vec2, radius: f32) -> &[E::Key] {
        self.grid.query_radius(center.x, center.y, radius)
    }

    /// Keys of entities inside the box `[min, max]`.
    pub fn query_rect(&mut self, min: Vec2, max: Vec2) -> &[E::Key] {
        self.grid.query_rect(min.x, min.y, max.x, max.y)
    }

    /// Removes every entity.
    pub fn clear(&mut self) {
        self.grid.clear();
    }
}

/// A positioned entity handle, convenient for grids over plain IDs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tracked {
    /// Entity identity
    pub id: EntityId,
    /// World position
    pub position: Vec2,
}

impl GridEntity for Tracked {
    type Key = EntityId;

    fn grid_key(&self) -> EntityId {
        self.id
    }

    fn grid_position(&self) -> Vec2 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::EntityIdAllocator;

    #[test]
    fn test_entity_roundtrip() {
        let mut ids = EntityIdAllocator::new();
        let mut grid = EntityGrid::new(2.0);
        let mut bat = Tracked {
            id: ids.allocate(),
            position: Vec2::new(3.0, 3.0),
        };
        let slime = Tracked {
            id: ids.allocate(),
            position: Vec2::new(30.0, 3.0),
        };
        grid.insert(&bat);
        grid.insert(&slime);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.query_radius(bat.position, 0.01), &[bat.id]);

        bat.position = Vec2::new(29.0, 3.0);
        assert!(grid.update(&bat));
        let mut near_slime = grid.query_radius(slime.position, 2.0).to_vec();
        near_slime.sort();
        assert_eq!(near_slime, vec![bat.id, slime.id]);

        assert!(grid.remove(&bat));
        assert!(!grid.contains(&bat));
        assert_eq!(
            grid.query_rect(Vec2::new(0.0, 0.0), Vec2::new(40.0, 40.0)),
            &[slime.id]
        );
        assert!(grid.remove_key(slime.id));
        assert!(grid.is_empty());
    }
}
