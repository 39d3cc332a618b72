pub mod config;
pub mod loader;
pub mod placement;
pub mod streamer;

// Re-export commonly used items
pub use config::{ConfigError, WorldConfig};
pub use loader::WorldStreamer;
pub use placement::{PlaceableFactory, Placement, PlacementGenerator};
pub use streamer::{ActiveChunk, ChunkDelta, ChunkPresenter, ChunkStreamer, StreamStats};

use bevy::{prelude::*, time::common_conditions::on_timer};
use std::time::Duration;

/// How often world statistics are logged
const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// Plugin for chunk streaming around the camera
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldConfig>()
            .add_systems(Startup, setup_streamer)
            .add_systems(
                Update,
                (
                    loader::reset_world,
                    loader::stream_chunks_around_camera.after(loader::reset_world),
                    loader::fell_nearest_tree.after(loader::stream_chunks_around_camera),
                    loader::log_world_stats.run_if(on_timer(STATS_INTERVAL)),
                )
                    .run_if(resource_exists::<WorldStreamer>),
            );
    }
}

/// Build the streamer from the configured knobs; an invalid configuration
/// ends the app
fn setup_streamer(
    mut commands: Commands,
    config: Res<WorldConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    match ChunkStreamer::new(*config) {
        Ok(streamer) => {
            info!(
                "World ready: {} cells per chunk, view distance {}",
                config.chunk_size, config.view_distance
            );
            commands.insert_resource(WorldStreamer(streamer));
        }
        Err(e) => {
            error!("Invalid world configuration: {}", e);
            exit.write(AppExit::error());
        }
    }
}
