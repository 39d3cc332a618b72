/// Default number of cells along each edge of a chunk
pub const DEFAULT_CHUNK_SIZE: i32 = 32;

/// Default radius of the loaded disc around the observer, in chunks
pub const DEFAULT_VIEW_DISTANCE: i32 = 4;

/// Edge length of a single cell in world units
pub const CELL_SIZE: f32 = 1.0;

/// Offset from a cell's origin corner to its center on each horizontal axis
pub const CELL_HALF: f32 = CELL_SIZE * 0.5;

/// Height of the ground plane every cell sits on
pub const GROUND_LEVEL: f32 = 0.0;
