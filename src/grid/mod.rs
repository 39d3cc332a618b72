pub mod cell;
pub mod chunk;
pub mod constants;
pub mod types;

// Re-export commonly used items
pub use cell::Cell;
pub use chunk::ChunkGrid;
pub use constants::*;
pub use types::{ChunkPos, TerrainKind};
