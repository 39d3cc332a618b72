use super::{cell::Cell, constants::*, types::*};
use bevy::prelude::*;

/// Cell storage for one chunk
///
/// Cells are stored row-major: index `local_z * size + local_x`. Iterating
/// `cells()` therefore visits rows of increasing Z, each row left to right.
#[derive(Debug, Clone)]
pub struct ChunkGrid {
    position: ChunkPos,
    size: usize,
    cells: Vec<Cell>,
}

impl ChunkGrid {
    /// Build a chunk with every cell on open ground
    pub fn new(position: ChunkPos, size: usize) -> Self {
        Self::generate_with(position, size, |_| TerrainKind::Open)
    }

    /// Build a chunk in one pass, asking `terrain` for each cell's ground kind
    /// by global grid position
    pub fn generate_with<F>(position: ChunkPos, size: usize, terrain: F) -> Self
    where
        F: Fn(IVec2) -> TerrainKind,
    {
        let origin = position.origin_cell(size as i32);
        let mut cells = Vec::with_capacity(size * size);

        for z in 0..size {
            for x in 0..size {
                let grid_pos = origin + IVec2::new(x as i32, z as i32);
                cells.push(Cell::new(grid_pos, terrain(grid_pos)));
            }
        }

        Self {
            position,
            size,
            cells,
        }
    }

    pub fn position(&self) -> ChunkPos {
        self.position
    }

    /// Cells per edge
    pub fn size(&self) -> usize {
        self.size
    }

    /// World position of the chunk's origin corner
    pub fn origin(&self) -> Vec3 {
        self.position.to_world(self.size as i32)
    }

    /// World position of the middle of the chunk
    pub fn center(&self) -> Vec3 {
        let half = self.size as f32 * CELL_SIZE * 0.5;
        self.origin() + Vec3::new(half, 0.0, half)
    }

    /// Local index of a global grid position, if it belongs to this chunk
    pub fn grid_to_local(&self, grid_pos: IVec2) -> Option<(usize, usize)> {
        let local = grid_pos - self.position.origin_cell(self.size as i32);
        let size = self.size as i32;
        if local.x < 0 || local.y < 0 || local.x >= size || local.y >= size {
            return None;
        }
        Some((local.x as usize, local.y as usize))
    }

    fn index(&self, local_x: usize, local_z: usize) -> Option<usize> {
        if local_x >= self.size || local_z >= self.size {
            return None;
        }
        Some(local_z * self.size + local_x)
    }

    /// Get cell at local chunk coordinates (0..size, 0..size)
    pub fn get_cell(&self, local_x: usize, local_z: usize) -> Option<&Cell> {
        self.index(local_x, local_z).map(|i| &self.cells[i])
    }

    pub fn get_cell_mut(&mut self, local_x: usize, local_z: usize) -> Option<&mut Cell> {
        self.index(local_x, local_z).map(|i| &mut self.cells[i])
    }

    /// Get cell by its global grid position
    pub fn cell_by_grid(&self, grid_pos: IVec2) -> Option<&Cell> {
        let (x, z) = self.grid_to_local(grid_pos)?;
        self.get_cell(x, z)
    }

    pub fn cell_by_grid_mut(&mut self, grid_pos: IVec2) -> Option<&mut Cell> {
        let (x, z) = self.grid_to_local(grid_pos)?;
        self.get_cell_mut(x, z)
    }

    /// Get the cell containing a world position, if it lies inside this chunk
    pub fn cell_at_world(&self, world_pos: Vec3) -> Option<&Cell> {
        self.cell_by_grid(coords::world_to_cell(world_pos))
    }

    pub fn cell_at_world_mut(&mut self, world_pos: Vec3) -> Option<&mut Cell> {
        self.cell_by_grid_mut(coords::world_to_cell(world_pos))
    }

    /// All cells in storage order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Cells that currently hold an object
    pub fn occupied_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| !cell.is_empty())
    }
}

/// Helper functions for cell coordinate conversions
pub mod coords {
    use super::*;

    /// Convert world position to the global grid position of the cell containing it
    pub fn world_to_cell(world_pos: Vec3) -> IVec2 {
        IVec2::new(
            (world_pos.x / CELL_SIZE).floor() as i32,
            (world_pos.z / CELL_SIZE).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::world::World;

    #[test]
    fn test_grid_assigns_global_positions() {
        let grid = ChunkGrid::new(ChunkPos::new(2, -1), 16);

        assert_eq!(grid.cells().count(), 256);
        assert_eq!(grid.get_cell(0, 0).unwrap().grid_position(), IVec2::new(32, -16));
        assert_eq!(grid.get_cell(5, 10).unwrap().grid_position(), IVec2::new(37, -6));
        assert_eq!(grid.get_cell(15, 15).unwrap().grid_position(), IVec2::new(47, -1));
        assert!(grid.cells().all(|cell| cell.is_empty() && cell.terrain() == TerrainKind::Open));

        for z in 0..16 {
            for x in 0..16 {
                let expected = IVec2::new(32 + x as i32, -16 + z as i32);
                assert_eq!(grid.get_cell(x, z).unwrap().grid_position(), expected);
                assert_eq!(grid.grid_to_local(expected), Some((x, z)));
            }
        }
    }

    #[test]
    fn test_storage_order_is_row_major() {
        let grid = ChunkGrid::new(ChunkPos::new(0, 0), 3);
        let order: Vec<IVec2> = grid.cells().map(|cell| cell.grid_position()).collect();

        assert_eq!(order[0], IVec2::new(0, 0));
        assert_eq!(order[1], IVec2::new(1, 0));
        assert_eq!(order[3], IVec2::new(0, 1));
        assert_eq!(order[8], IVec2::new(2, 2));
    }

    #[test]
    fn test_get_cell_out_of_bounds() {
        let mut grid = ChunkGrid::new(ChunkPos::new(0, 0), 4);

        assert!(grid.get_cell(4, 0).is_none());
        assert!(grid.get_cell(0, 4).is_none());
        assert!(grid.get_cell_mut(4, 4).is_none());
        assert!(grid.get_cell_mut(3, 3).is_some());
        assert!(grid.grid_to_local(IVec2::new(-1, 0)).is_none());
        assert!(grid.grid_to_local(IVec2::new(0, 4)).is_none());
    }

    #[test]
    fn test_generate_with_terrain_policy() {
        let grid = ChunkGrid::generate_with(ChunkPos::new(-1, 0), 4, |cell| {
            if cell.x == -1 {
                TerrainKind::Impassable
            } else {
                TerrainKind::Open
            }
        });

        let water = grid
            .cells()
            .filter(|cell| cell.terrain() == TerrainKind::Impassable)
            .count();
        assert_eq!(water, 4);
        assert_eq!(grid.get_cell(3, 2).unwrap().terrain(), TerrainKind::Impassable);
    }

    #[test]
    fn test_cell_at_world() {
        let grid = ChunkGrid::new(ChunkPos::new(-1, -1), 16);

        let cell = grid.cell_at_world(Vec3::new(-0.5, 0.0, -15.2)).unwrap();
        assert_eq!(cell.grid_position(), IVec2::new(-1, -16));

        assert!(grid.cell_at_world(Vec3::new(0.0, 0.0, -1.0)).is_none());
        assert!(grid.cell_at_world(Vec3::new(-17.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn test_occupied_cells() {
        let mut world = World::new();
        let mut grid = ChunkGrid::new(ChunkPos::new(0, 0), 4);
        let tree = world.spawn_empty().id();

        grid.cell_by_grid_mut(IVec2::new(2, 1)).unwrap().set_occupant(tree);

        let occupied: Vec<IVec2> = grid.occupied_cells().map(|cell| cell.grid_position()).collect();
        assert_eq!(occupied, vec![IVec2::new(2, 1)]);
    }
}
