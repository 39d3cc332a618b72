use super::placement::{PlaceableFactory, Placement};
use super::streamer::{ChunkPresenter, ChunkStreamer};
use crate::entities::{self, Tree};
use crate::grid::ChunkGrid;
use bevy::prelude::*;

/// How far from the observer, in cells, a tree can be felled
pub const FELL_REACH: i32 = 2;

/// The streamer as an ECS resource
#[derive(Resource, Deref, DerefMut)]
pub struct WorldStreamer(pub ChunkStreamer);

/// Presenter that turns chunks and placements into sprites through `Commands`
pub struct SpritePresenter<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    /// Chunk entity being populated and its screen center
    chunk_root: Option<(Entity, Vec2)>,
}

impl<'a, 'w, 's> SpritePresenter<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>) -> Self {
        Self {
            commands,
            chunk_root: None,
        }
    }
}

impl ChunkPresenter for SpritePresenter<'_, '_, '_> {
    fn build_chunk(&mut self, grid: &ChunkGrid) -> Option<Entity> {
        let (entity, center) = entities::spawn_chunk_visual(self.commands, grid);
        self.chunk_root = Some((entity, center));
        Some(entity)
    }

    fn destroy_chunk(&mut self, _grid: &ChunkGrid, handle: Option<Entity>) {
        // Trees are children of the chunk and go with it
        if let Some(entity) = handle {
            self.commands.entity(entity).despawn();
        }
    }

    fn placeable_factory(&mut self) -> Option<&mut dyn PlaceableFactory> {
        Some(self)
    }
}

impl PlaceableFactory for SpritePresenter<'_, '_, '_> {
    fn instantiate(&mut self, placement: &Placement, parent: Option<Entity>) -> Entity {
        let root = parent.and_then(|parent| match self.chunk_root {
            Some((entity, center)) if entity == parent => Some((entity, center)),
            _ => None,
        });
        entities::spawn_tree(self.commands, placement, root)
    }
}

/// Current observer position on the ground plane, taken from the camera
fn observer_position(camera_query: &Query<&Transform, With<Camera2d>>) -> Option<Vec3> {
    let camera_transform = camera_query.single().ok()?;
    Some(entities::screen_to_world(camera_transform.translation.truncate()))
}

/// System to push the camera position into the streamer
/// Chunks are created and destroyed only when the camera changes chunk
pub fn stream_chunks_around_camera(
    mut commands: Commands,
    mut streamer: ResMut<WorldStreamer>,
    camera_query: Query<&Transform, With<Camera2d>>,
) {
    let Some(observer) = observer_position(&camera_query) else {
        return;
    };

    let mut presenter = SpritePresenter::new(&mut commands);
    let delta = streamer.on_observer_moved(observer, &mut presenter);
    if delta.is_empty() {
        return;
    }

    debug!(
        "Created {:?}, destroyed {:?}",
        delta.created, delta.destroyed
    );

    #[cfg(feature = "debug_chunks")]
    print_chunk_grid(&streamer);
}

/// System to fell the tree nearest the camera when F is pressed
/// The tree's cell is freed before its entity is despawned
pub fn fell_nearest_tree(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    mut streamer: ResMut<WorldStreamer>,
    camera_query: Query<&Transform, With<Camera2d>>,
    tree_query: Query<&Tree>,
) {
    if !keyboard.just_pressed(KeyCode::KeyF) {
        return;
    }
    let Some(observer) = observer_position(&camera_query) else {
        return;
    };

    let mut nearest: Option<(IVec2, f32)> = None;
    for dz in -FELL_REACH..=FELL_REACH {
        for dx in -FELL_REACH..=FELL_REACH {
            let point = observer + Vec3::new(dx as f32, 0.0, dz as f32);
            let Some(cell) = streamer.cell_at_world(point) else {
                continue;
            };
            if cell.is_empty() {
                continue;
            }
            let distance = cell.center().distance_squared(observer);
            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((cell.grid_position(), distance));
            }
        }
    }

    let Some((cell, _)) = nearest else {
        info!("No tree within reach");
        return;
    };

    let Some(entity) = fell_at(&mut streamer, cell, &mut commands) else {
        return;
    };
    match tree_query.get(entity) {
        Ok(tree) => info!("Felled tree at cell {:?}", tree.cell),
        Err(_) => warn!("Removed untracked object at cell {:?}", cell),
    }
}

/// Free `cell` and despawn whatever occupied it
fn fell_at(streamer: &mut ChunkStreamer, cell: IVec2, commands: &mut Commands) -> Option<Entity> {
    let entity = streamer.vacate(cell)?;
    commands.entity(entity).despawn();
    Some(entity)
}

/// System to drop every chunk when R is pressed; streaming runs right after
/// in the same frame and rebuilds the area around the camera
pub fn reset_world(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut commands: Commands,
    mut streamer: ResMut<WorldStreamer>,
) {
    if !keyboard.just_pressed(KeyCode::KeyR) {
        return;
    }

    let mut presenter = SpritePresenter::new(&mut commands);
    streamer.unload_all(&mut presenter);
}

/// System to log world statistics for debugging
pub fn log_world_stats(streamer: Res<WorldStreamer>) {
    debug!("World stats: {}", streamer.stats());
}

/// Print a visual representation of live chunks around the observer
#[cfg(feature = "debug_chunks")]
fn print_chunk_grid(streamer: &ChunkStreamer) {
    use crate::grid::ChunkPos;

    let Some(observer_chunk) = streamer.observer_chunk() else {
        return;
    };
    let view_distance = streamer.config().view_distance.max(0);
    let view_radius = (view_distance + 1).max(6);

    let mut grid = String::new();
    grid.push_str("\n╔═══════════════ Chunk Grid ═══════════════╗\n");

    for y in (observer_chunk.y - view_radius..=observer_chunk.y + view_radius).rev() {
        grid.push_str(&format!("{:4}", y));

        for x in observer_chunk.x - view_radius..=observer_chunk.x + view_radius {
            let pos = ChunkPos::new(x, y);
            let is_active = streamer.is_active(&pos);
            let in_disc = observer_chunk.within_disc(&pos, view_distance);

            let symbol = if pos == observer_chunk {
                " @ " // Observer position
            } else if is_active && in_disc {
                " █ " // Live chunk inside the disc
            } else if is_active {
                " ▓ " // Live chunk outside the disc (should not happen)
            } else if in_disc {
                " ░ " // Required but missing (should not happen)
            } else {
                " · " // Not loaded
            };

            grid.push_str(symbol);
        }
        grid.push('\n');
    }

    grid.push_str("╚══════════════════════════════════════════╝\n");
    grid.push_str("Legend: @ = Observer  █ = Loaded  ▓ = Stale  ░ = Missing  · = Unloaded\n");
    grid.push_str(&format!(
        "{} | View Distance: {}\n",
        streamer.stats(),
        view_distance
    ));

    info!("{}", grid);
}
