use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Chunk position in chunk coordinates (not world/cell coordinates)
///
/// The world is laid out on the horizontal X/Z plane; `y` here holds the
/// chunk index along world Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert from a world position to the chunk containing it
    /// Uses floor division so negative coordinates land in negative chunks
    pub fn from_world(world_pos: Vec3, chunk_size: i32) -> Self {
        let size = chunk_size as f32 * super::CELL_SIZE;
        Self {
            x: (world_pos.x / size).floor() as i32,
            y: (world_pos.z / size).floor() as i32,
        }
    }

    /// Convert from a global cell position to the chunk owning it
    pub fn from_cell(cell_pos: IVec2, chunk_size: i32) -> Self {
        Self {
            x: cell_pos.x.div_euclid(chunk_size),
            y: cell_pos.y.div_euclid(chunk_size),
        }
    }

    /// Global cell position of this chunk's first cell (local 0, 0)
    pub fn origin_cell(&self, chunk_size: i32) -> IVec2 {
        IVec2::new(self.x * chunk_size, self.y * chunk_size)
    }

    /// Get world position of chunk's origin corner (minimum X and Z)
    pub fn to_world(&self, chunk_size: i32) -> Vec3 {
        let size = chunk_size as f32 * super::CELL_SIZE;
        Vec3::new(self.x as f32 * size, super::GROUND_LEVEL, self.y as f32 * size)
    }

    /// Get all chunks whose offset from this one lies inside a disc of `radius`
    /// A negative radius yields no chunks
    pub fn chunks_in_disc(&self, radius: i32) -> Vec<ChunkPos> {
        if radius < 0 {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let mut chunks = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius_sq {
                    chunks.push(ChunkPos::new(self.x + dx, self.y + dy));
                }
            }
        }
        chunks
    }

    /// Squared Euclidean distance between two chunk positions
    pub fn distance_squared(&self, other: &ChunkPos) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Whether `other` lies inside the disc of `radius` centred here
    pub fn within_disc(&self, other: &ChunkPos, radius: i32) -> bool {
        radius >= 0 && self.distance_squared(other) <= radius * radius
    }
}

impl From<(i32, i32)> for ChunkPos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Ground classification of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainKind {
    /// Grass; walkable and buildable
    #[default]
    Open,
    /// Water and the like
    Impassable,
    /// Roads; faster travel
    FastPath,
}

impl TerrainKind {
    /// Only open ground receives procedural objects
    pub fn is_placeable(&self) -> bool {
        matches!(self, TerrainKind::Open)
    }
}
