use super::{ChunkVisual, Tree};
use crate::grid::{ChunkGrid, ChunkPos, CELL_SIZE};
use crate::world::Placement;
use bevy::prelude::*;

/// Screen pixels per world unit (one cell)
pub const PIXELS_PER_UNIT: f32 = 16.0;

/// Draw order for the ground quads and the trees on top of them
pub const CHUNK_Z: f32 = 0.0;
pub const TREE_Z: f32 = 1.0;

/// Size of a tree sprite at scale 1.0, in pixels
pub const TREE_SIZE: f32 = 12.0;

const GRASS_LIGHT: Color = Color::srgb(0.45, 0.65, 0.35);
const GRASS_DARK: Color = Color::srgb(0.40, 0.59, 0.31);
const TREE_COLOR: Color = Color::srgb(0.13, 0.35, 0.16);

/// Project a world position (X/Z ground plane) onto the 2D screen plane
pub fn world_to_screen(world_pos: Vec3) -> Vec2 {
    Vec2::new(world_pos.x, world_pos.z) * PIXELS_PER_UNIT
}

/// Inverse of `world_to_screen`, landing on the ground plane
pub fn screen_to_world(screen_pos: Vec2) -> Vec3 {
    let pos = screen_pos / PIXELS_PER_UNIT;
    Vec3::new(pos.x, 0.0, pos.y)
}

/// Alternate the grass tint per chunk so chunk edges are visible
pub fn chunk_tint(position: ChunkPos) -> Color {
    if (position.x + position.y).rem_euclid(2) == 0 {
        GRASS_LIGHT
    } else {
        GRASS_DARK
    }
}

/// Spawns the ground quad for a chunk, returning the entity and its screen center
pub fn spawn_chunk_visual(commands: &mut Commands, grid: &ChunkGrid) -> (Entity, Vec2) {
    let edge = grid.size() as f32 * CELL_SIZE * PIXELS_PER_UNIT;
    let center = world_to_screen(grid.center());

    let entity = commands
        .spawn((
            ChunkVisual,
            Sprite::from_color(chunk_tint(grid.position()), Vec2::splat(edge)),
            Transform::from_xyz(center.x, center.y, CHUNK_Z),
        ))
        .id();

    (entity, center)
}

/// Spawns a tree for an accepted placement
///
/// With a parent, the transform is relative to `parent_center` (the parent's
/// screen position) and the tree despawns along with its chunk.
pub fn spawn_tree(
    commands: &mut Commands,
    placement: &Placement,
    parent: Option<(Entity, Vec2)>,
) -> Entity {
    let screen = world_to_screen(placement.position);
    let local = match parent {
        Some((_, parent_center)) => screen - parent_center,
        None => screen,
    };

    let transform = Transform::from_xyz(local.x, local.y, TREE_Z)
        .with_rotation(Quat::from_rotation_z(placement.rotation))
        .with_scale(Vec3::splat(placement.scale));

    let mut tree = commands.spawn((
        Tree::new(placement.cell),
        Sprite::from_color(TREE_COLOR, Vec2::splat(TREE_SIZE)),
        transform,
    ));
    if let Some((parent, _)) = parent {
        tree.insert(ChildOf(parent));
    }

    tree.id()
}
