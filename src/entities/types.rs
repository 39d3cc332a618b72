use bevy::prelude::*;

/// Marker component for a chunk's visual root
/// Trees spawned into the chunk are its children
#[derive(Component, Debug, Clone, Copy)]
pub struct ChunkVisual;

/// A tree placed by world generation
#[derive(Component, Debug, Clone, Copy)]
pub struct Tree {
    /// Global grid position of the cell the tree occupies
    pub cell: IVec2,
}

impl Tree {
    pub fn new(cell: IVec2) -> Self {
        Self { cell }
    }
}
