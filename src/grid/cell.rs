use super::{constants::*, types::TerrainKind};
use bevy::prelude::*;

/// Smallest addressable unit of world space
///
/// A cell knows its global grid position, what kind of ground it is, and
/// which placed object (if any) sits on it. The grid position is fixed at
/// creation; only terrain and occupant change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    grid_position: IVec2,
    terrain: TerrainKind,
    occupant: Option<Entity>,
}

impl Cell {
    pub fn new(grid_position: IVec2, terrain: TerrainKind) -> Self {
        Self {
            grid_position,
            terrain,
            occupant: None,
        }
    }

    /// Position in the global cell grid, unique across the whole world
    pub fn grid_position(&self) -> IVec2 {
        self.grid_position
    }

    /// World position of the cell's origin corner, always on the ground plane
    pub fn world_position(&self) -> Vec3 {
        Vec3::new(
            self.grid_position.x as f32 * CELL_SIZE,
            GROUND_LEVEL,
            self.grid_position.y as f32 * CELL_SIZE,
        )
    }

    /// World position of the middle of the cell
    pub fn center(&self) -> Vec3 {
        self.world_position() + Vec3::new(CELL_HALF, 0.0, CELL_HALF)
    }

    pub fn terrain(&self) -> TerrainKind {
        self.terrain
    }

    /// True when nothing occupies the cell
    pub fn is_empty(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn occupant(&self) -> Option<Entity> {
        self.occupant
    }

    /// Register an object on this cell, returning whatever was there before
    pub fn set_occupant(&mut self, occupant: Entity) -> Option<Entity> {
        self.occupant.replace(occupant)
    }

    /// Free the cell, returning the previous occupant
    pub fn clear_occupant(&mut self) -> Option<Entity> {
        self.occupant.take()
    }
}
