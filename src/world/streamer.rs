use super::config::{ConfigError, WorldConfig};
use super::placement::{PlaceableFactory, PlacementGenerator};
use crate::grid::{Cell, ChunkGrid, ChunkPos};
use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use std::collections::{HashMap, HashSet};

/// Host-side hooks the streamer drives when chunks come and go
///
/// `build_chunk` runs after the grid exists and before placement; the handle
/// it returns is passed to the placeable factory as the parent of every
/// object in the chunk, and handed back to `destroy_chunk` on unload.
pub trait ChunkPresenter {
    fn build_chunk(&mut self, grid: &ChunkGrid) -> Option<Entity>;

    fn destroy_chunk(&mut self, grid: &ChunkGrid, handle: Option<Entity>);

    /// Factory used to instantiate placed objects, if the host has one
    fn placeable_factory(&mut self) -> Option<&mut dyn PlaceableFactory> {
        None
    }
}

/// Headless presenter: no visuals, no objects
impl ChunkPresenter for () {
    fn build_chunk(&mut self, _grid: &ChunkGrid) -> Option<Entity> {
        None
    }

    fn destroy_chunk(&mut self, _grid: &ChunkGrid, _handle: Option<Entity>) {}
}

/// A chunk that is currently streamed in
#[derive(Debug)]
pub struct ActiveChunk {
    pub grid: ChunkGrid,
    /// Presentation handle returned by the host
    pub handle: Option<Entity>,
}

/// Chunks created and destroyed by one streaming pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChunkDelta {
    pub created: Vec<ChunkPos>,
    pub destroyed: Vec<ChunkPos>,
}

impl ChunkDelta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty()
    }
}

/// Keeps the set of live chunks in step with a single moving observer
///
/// Work happens only when the observer crosses into a different chunk: the
/// required disc is recomputed, missing chunks are built and populated, and
/// chunks outside the disc are released. Each pass completes before
/// `on_observer_moved` returns.
pub struct ChunkStreamer<N = Perlin> {
    config: WorldConfig,
    generator: PlacementGenerator<N>,
    active: HashMap<ChunkPos, ActiveChunk>,
    observer_chunk: Option<ChunkPos>,
}

impl ChunkStreamer<Perlin> {
    pub fn new(config: WorldConfig) -> Result<Self, ConfigError> {
        let generator = PlacementGenerator::new(&config)?;
        Self::with_generator(config, generator)
    }
}

impl<N: NoiseFn<f64, 2>> ChunkStreamer<N> {
    /// Stream with a custom placement generator
    pub fn with_generator(
        config: WorldConfig,
        generator: PlacementGenerator<N>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            generator,
            active: HashMap::new(),
            observer_chunk: None,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Chunk the observer was last seen in
    pub fn observer_chunk(&self) -> Option<ChunkPos> {
        self.observer_chunk
    }

    /// Convert a world position to the chunk containing it
    pub fn chunk_at(&self, world_pos: Vec3) -> ChunkPos {
        ChunkPos::from_world(world_pos, self.config.chunk_size)
    }

    /// Feed the observer's latest position
    ///
    /// Does nothing unless the position maps to a different chunk than the
    /// previous call.
    pub fn on_observer_moved(
        &mut self,
        position: Vec3,
        presenter: &mut dyn ChunkPresenter,
    ) -> ChunkDelta {
        let current = self.chunk_at(position);
        if self.observer_chunk == Some(current) {
            return ChunkDelta::default();
        }

        self.observer_chunk = Some(current);
        info!("Observer moved to chunk {:?}", current);

        let delta = self.stream_around(current, presenter);
        info!(
            "Streamed chunks: {} created, {} destroyed, {} active",
            delta.created.len(),
            delta.destroyed.len(),
            self.active.len()
        );
        delta
    }

    /// Chunks that must be live with the observer in `center`
    pub fn required_chunks(&self, center: ChunkPos) -> Vec<ChunkPos> {
        center.chunks_in_disc(self.config.view_distance)
    }

    fn stream_around(&mut self, center: ChunkPos, presenter: &mut dyn ChunkPresenter) -> ChunkDelta {
        let required = self.required_chunks(center);
        let required_set: HashSet<ChunkPos> = required.iter().copied().collect();
        let mut delta = ChunkDelta::default();

        for pos in required {
            if self.active.contains_key(&pos) {
                continue;
            }
            let chunk = self.create_chunk(pos, presenter);
            self.active.insert(pos, chunk);
            delta.created.push(pos);
        }

        let mut to_remove: Vec<ChunkPos> = self
            .active
            .keys()
            .filter(|pos| !required_set.contains(pos))
            .copied()
            .collect();
        to_remove.sort_by_key(|pos| (pos.y, pos.x));

        for pos in to_remove {
            self.destroy_chunk(pos, presenter);
            delta.destroyed.push(pos);
        }

        delta
    }

    /// Build the grid, its visuals and its objects; nothing is visible to
    /// callers until the finished chunk is inserted
    fn create_chunk(&self, pos: ChunkPos, presenter: &mut dyn ChunkPresenter) -> ActiveChunk {
        let mut grid = ChunkGrid::new(pos, self.config.chunk_cells());
        let handle = presenter.build_chunk(&grid);
        let placements = self
            .generator
            .populate(&mut grid, presenter.placeable_factory(), handle);

        debug!(
            "Created chunk {:?} with {} trees",
            pos,
            placements.len()
        );
        ActiveChunk { grid, handle }
    }

    fn destroy_chunk(&mut self, pos: ChunkPos, presenter: &mut dyn ChunkPresenter) {
        if let Some(chunk) = self.active.remove(&pos) {
            presenter.destroy_chunk(&chunk.grid, chunk.handle);
            debug!("Destroyed chunk {:?}", pos);
        }
    }

    /// Release every live chunk and forget the observer, so the next move
    /// streams from scratch
    pub fn unload_all(&mut self, presenter: &mut dyn ChunkPresenter) -> ChunkDelta {
        let mut positions = self.active_positions();
        positions.sort_by_key(|pos| (pos.y, pos.x));
        for &pos in &positions {
            self.destroy_chunk(pos, presenter);
        }
        self.observer_chunk = None;

        info!("Unloaded all {} chunks", positions.len());
        ChunkDelta {
            created: Vec::new(),
            destroyed: positions,
        }
    }

    /// Check if a chunk is currently live
    pub fn is_active(&self, pos: &ChunkPos) -> bool {
        self.active.contains_key(pos)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_positions(&self) -> Vec<ChunkPos> {
        self.active.keys().copied().collect()
    }

    pub fn get_chunk(&self, pos: &ChunkPos) -> Option<&ActiveChunk> {
        self.active.get(pos)
    }

    /// Get the cell containing a world position, if its chunk is live
    pub fn cell_at_world(&self, world_pos: Vec3) -> Option<&Cell> {
        let pos = self.chunk_at(world_pos);
        self.active.get(&pos)?.grid.cell_at_world(world_pos)
    }

    pub fn cell_at_world_mut(&mut self, world_pos: Vec3) -> Option<&mut Cell> {
        let pos = self.chunk_at(world_pos);
        self.active.get_mut(&pos)?.grid.cell_at_world_mut(world_pos)
    }

    /// Free the cell at a global grid position, returning its former occupant
    ///
    /// Called when a placed object is destroyed by its own logic.
    pub fn vacate(&mut self, cell: IVec2) -> Option<Entity> {
        let pos = ChunkPos::from_cell(cell, self.config.chunk_size);
        self.active
            .get_mut(&pos)?
            .grid
            .cell_by_grid_mut(cell)?
            .clear_occupant()
    }

    /// Get statistics about the streamed world
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            active_chunks: self.active.len(),
            occupied_cells: self
                .active
                .values()
                .map(|chunk| chunk.grid.occupied_cells().count())
                .sum(),
            observer_chunk: self.observer_chunk,
        }
    }
}

/// Statistics about the current streaming state
#[derive(Debug, Clone)]
pub struct StreamStats {
    pub active_chunks: usize,
    pub occupied_cells: usize,
    pub observer_chunk: Option<ChunkPos>,
}

impl std::fmt::Display for StreamStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Active: {}, Trees: {}, Observer: {:?}",
            self.active_chunks, self.occupied_cells, self.observer_chunk
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::placement::Placement;
    use bevy::ecs::world::World;

    /// Presenter that spawns bare entities and logs every hook call
    struct RecordingPresenter {
        world: World,
        built: Vec<ChunkPos>,
        destroyed: Vec<(ChunkPos, Option<Entity>)>,
        objects: usize,
        with_factory: bool,
    }

    impl RecordingPresenter {
        fn new(with_factory: bool) -> Self {
            Self {
                world: World::new(),
                built: Vec::new(),
                destroyed: Vec::new(),
                objects: 0,
                with_factory,
            }
        }
    }

    impl ChunkPresenter for RecordingPresenter {
        fn build_chunk(&mut self, grid: &ChunkGrid) -> Option<Entity> {
            self.built.push(grid.position());
            Some(self.world.spawn_empty().id())
        }

        fn destroy_chunk(&mut self, grid: &ChunkGrid, handle: Option<Entity>) {
            self.destroyed.push((grid.position(), handle));
        }

        fn placeable_factory(&mut self) -> Option<&mut dyn PlaceableFactory> {
            if self.with_factory {
                Some(self)
            } else {
                None
            }
        }
    }

    impl PlaceableFactory for RecordingPresenter {
        fn instantiate(&mut self, _placement: &Placement, _parent: Option<Entity>) -> Entity {
            self.objects += 1;
            self.world.spawn_empty().id()
        }
    }

    fn set_of(positions: &[(i32, i32)]) -> HashSet<ChunkPos> {
        positions.iter().copied().map(ChunkPos::from).collect()
    }

    fn active_set<N: NoiseFn<f64, 2>>(streamer: &ChunkStreamer<N>) -> HashSet<ChunkPos> {
        streamer.active_positions().into_iter().collect()
    }

    fn small_world(view_distance: i32) -> ChunkStreamer {
        let config = WorldConfig::default()
            .with_chunk_size(16)
            .with_view_distance(view_distance);
        ChunkStreamer::new(config).unwrap()
    }

    #[test]
    fn test_initial_load_is_a_disc() {
        let mut streamer = small_world(1);
        let delta = streamer.on_observer_moved(Vec3::ZERO, &mut ());

        let expected = set_of(&[(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)]);
        assert_eq!(active_set(&streamer), expected);
        assert_eq!(delta.created.len(), 5);
        assert!(delta.destroyed.is_empty());
        assert_eq!(streamer.observer_chunk(), Some(ChunkPos::new(0, 0)));
    }

    #[test]
    fn test_crossing_one_chunk_east() {
        let mut streamer = small_world(1);
        streamer.on_observer_moved(Vec3::new(8.0, 0.0, 8.0), &mut ());

        let delta = streamer.on_observer_moved(Vec3::new(20.0, 0.0, 8.0), &mut ());

        let created: HashSet<ChunkPos> = delta.created.iter().copied().collect();
        let destroyed: HashSet<ChunkPos> = delta.destroyed.iter().copied().collect();
        assert_eq!(created, set_of(&[(2, 0), (1, 1), (1, -1)]));
        assert_eq!(destroyed, set_of(&[(-1, 0), (0, 1), (0, -1)]));
        assert_eq!(
            active_set(&streamer),
            set_of(&[(1, 0), (2, 0), (0, 0), (1, 1), (1, -1)])
        );
    }

    #[test]
    fn test_same_chunk_movement_is_a_no_op() {
        let mut streamer = small_world(2);
        let mut presenter = RecordingPresenter::new(true);

        streamer.on_observer_moved(Vec3::new(1.0, 0.0, 1.0), &mut presenter);
        let built = presenter.built.len();

        let delta = streamer.on_observer_moved(Vec3::new(15.9, 3.0, 0.1), &mut presenter);

        assert!(delta.is_empty());
        assert_eq!(presenter.built.len(), built);
        assert!(presenter.destroyed.is_empty());
    }

    #[test]
    fn test_active_set_matches_required_disc_after_long_walk() {
        let mut streamer = small_world(3);
        let path = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(-40.0, 0.0, 5.0),
            Vec3::new(-41.0, 0.0, 90.0),
            Vec3::new(200.0, 0.0, -300.0),
            Vec3::new(-0.5, 0.0, -0.5),
        ];

        for position in path {
            streamer.on_observer_moved(position, &mut ());

            let center = ChunkPos::from_world(position, 16);
            let expected: HashSet<ChunkPos> = (center.x - 4..=center.x + 4)
                .flat_map(|x| (center.y - 4..=center.y + 4).map(move |y| ChunkPos::new(x, y)))
                .filter(|pos| center.distance_squared(pos) <= 9)
                .collect();
            assert_eq!(active_set(&streamer), expected);
        }
    }

    #[test]
    fn test_negative_view_distance_loads_nothing() {
        let mut streamer = small_world(-1);
        let delta = streamer.on_observer_moved(Vec3::ZERO, &mut ());

        assert!(delta.is_empty());
        assert_eq!(streamer.active_count(), 0);
        assert!(streamer.cell_at_world(Vec3::ZERO).is_none());
    }

    #[test]
    fn test_rejects_invalid_side_length() {
        let config = WorldConfig::default().with_chunk_size(0);
        assert!(matches!(
            ChunkStreamer::new(config),
            Err(ConfigError::NonPositiveSideLength(0))
        ));
    }

    #[test]
    fn test_presenter_hooks_follow_lifecycle() {
        let mut streamer = small_world(1);
        let mut presenter = RecordingPresenter::new(true);

        streamer.on_observer_moved(Vec3::ZERO, &mut presenter);
        let handle = streamer.get_chunk(&ChunkPos::new(-1, 0)).unwrap().handle;
        assert!(handle.is_some());
        assert_eq!(presenter.built.len(), 5);

        streamer.on_observer_moved(Vec3::new(16.0, 0.0, 0.0), &mut presenter);

        assert_eq!(presenter.built.len(), 8);
        assert_eq!(presenter.destroyed.len(), 3);
        assert!(presenter
            .destroyed
            .contains(&(ChunkPos::new(-1, 0), handle)));
    }

    #[test]
    fn test_revisited_chunk_is_identical() {
        let config = WorldConfig::default()
            .with_chunk_size(16)
            .with_view_distance(0)
            .with_noise(0.2, 0.4)
            .with_min_spacing(2.0);
        let mut streamer = ChunkStreamer::new(config).unwrap();
        let mut presenter = RecordingPresenter::new(true);
        let home = ChunkPos::new(-2, 3);
        let home_pos = Vec3::new(-24.0, 0.0, 56.0);

        streamer.on_observer_moved(home_pos, &mut presenter);
        let first: Vec<IVec2> = streamer
            .get_chunk(&home)
            .unwrap()
            .grid
            .occupied_cells()
            .map(|cell| cell.grid_position())
            .collect();

        streamer.on_observer_moved(Vec3::new(500.0, 0.0, 500.0), &mut presenter);
        assert!(!streamer.is_active(&home));

        streamer.on_observer_moved(home_pos, &mut presenter);
        let second: Vec<IVec2> = streamer
            .get_chunk(&home)
            .unwrap()
            .grid
            .occupied_cells()
            .map(|cell| cell.grid_position())
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_factory_still_streams() {
        let config = WorldConfig::default()
            .with_chunk_size(8)
            .with_view_distance(1)
            .with_noise(0.5, 0.0);
        let mut streamer = ChunkStreamer::new(config).unwrap();
        let mut presenter = RecordingPresenter::new(false);

        streamer.on_observer_moved(Vec3::ZERO, &mut presenter);

        assert_eq!(streamer.active_count(), 5);
        assert_eq!(presenter.objects, 0);
        assert_eq!(streamer.stats().occupied_cells, 0);
    }

    #[test]
    fn test_cell_queries_and_vacate() {
        let config = WorldConfig::default()
            .with_chunk_size(8)
            .with_view_distance(1)
            .with_noise(0.5, 0.0)
            .with_min_spacing(0.0);
        let mut streamer = ChunkStreamer::new(config).unwrap();
        let mut presenter = RecordingPresenter::new(true);
        streamer.on_observer_moved(Vec3::ZERO, &mut presenter);

        // Threshold zero and no spacing: every open cell holds a tree
        let cell = streamer.cell_at_world(Vec3::new(-0.5, 0.0, 3.2)).unwrap();
        assert_eq!(cell.grid_position(), IVec2::new(-1, 3));
        let tree = cell.occupant();
        assert!(tree.is_some());

        assert_eq!(streamer.vacate(IVec2::new(-1, 3)), tree);
        assert!(streamer
            .cell_at_world(Vec3::new(-0.5, 0.0, 3.2))
            .unwrap()
            .is_empty());
        assert_eq!(streamer.vacate(IVec2::new(-1, 3)), None);

        // Diagonal chunk (1, 1) is outside the radius 1 disc
        assert!(streamer.cell_at_world(Vec3::new(9.0, 0.0, 9.0)).is_none());
        assert_eq!(streamer.vacate(IVec2::new(9, 9)), None);

        let cell = streamer.cell_at_world_mut(Vec3::new(3.0, 0.0, -3.0)).unwrap();
        assert!(cell.clear_occupant().is_some());
    }

    #[test]
    fn test_unload_all_resets_observer() {
        let mut streamer = small_world(2);
        let mut presenter = RecordingPresenter::new(true);
        streamer.on_observer_moved(Vec3::ZERO, &mut presenter);
        let loaded = streamer.active_count();

        let delta = streamer.unload_all(&mut presenter);

        assert_eq!(delta.destroyed.len(), loaded);
        assert_eq!(streamer.active_count(), 0);
        assert_eq!(streamer.observer_chunk(), None);

        // Same position streams again after a reset
        let delta = streamer.on_observer_moved(Vec3::ZERO, &mut presenter);
        assert_eq!(delta.created.len(), loaded);
    }

    #[test]
    fn test_stats_display() {
        let mut streamer = small_world(0);
        streamer.on_observer_moved(Vec3::new(-1.0, 0.0, -1.0), &mut ());

        let stats = streamer.stats();
        assert_eq!(stats.active_chunks, 1);
        assert_eq!(
            stats.to_string(),
            "Active: 1, Trees: 0, Observer: Some(ChunkPos { x: -1, y: -1 })"
        );
    }
}
