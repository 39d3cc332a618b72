use super::config::{ConfigError, WorldConfig};
use crate::grid::ChunkGrid;
use bevy::prelude::*;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One accepted tree: where it goes and how it is dressed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Global grid position of the occupied cell
    pub cell: IVec2,
    /// Cell center; the point the spacing rule is measured from
    pub anchor: Vec3,
    /// Anchor plus a small planar jitter
    pub position: Vec3,
    /// Yaw in radians
    pub rotation: f32,
    pub scale: f32,
}

/// Something that can turn a placement into a live object
///
/// The returned entity is stored as the cell's occupant.
pub trait PlaceableFactory {
    fn instantiate(&mut self, placement: &Placement, parent: Option<Entity>) -> Entity;
}

/// Deterministic tree placement for freshly built chunks
///
/// Candidates are visited in the grid's storage order (rows of increasing Z,
/// each row by increasing X). When two candidates are closer than the minimum
/// spacing, the one visited first wins. Spacing is only checked against trees
/// in the same chunk, so trees on either side of a chunk edge may sit closer.
pub struct PlacementGenerator<N = Perlin> {
    noise: N,
    config: WorldConfig,
}

impl PlacementGenerator<Perlin> {
    pub fn new(config: &WorldConfig) -> Result<Self, ConfigError> {
        Self::with_noise(config, Perlin::new(Perlin::DEFAULT_SEED))
    }
}

impl<N: NoiseFn<f64, 2>> PlacementGenerator<N> {
    /// Use a custom coherent noise source
    pub fn with_noise(config: &WorldConfig, noise: N) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            noise,
            config: *config,
        })
    }

    /// Normalised (0..1) noise value for a global cell position
    pub fn sample(&self, cell: IVec2) -> f64 {
        let seed = self.config.world_seed;
        let scale = self.config.noise_scale;
        let raw = self.noise.get([
            (cell.x as f64 + seed) * scale,
            (cell.y as f64 + seed) * scale,
        ]);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Decide which cells of `grid` get a tree, without touching the grid
    pub fn plan(&self, grid: &ChunkGrid) -> Vec<Placement> {
        let min_spacing_sq = self.config.min_spacing * self.config.min_spacing;
        let mut accepted: Vec<Vec2> = Vec::new();
        let mut placements = Vec::new();

        for cell in grid.cells() {
            if !cell.is_empty() || !cell.terrain().is_placeable() {
                continue;
            }

            // A NaN sample never reaches the threshold
            if !(self.sample(cell.grid_position()) >= self.config.placement_threshold) {
                continue;
            }

            let anchor = cell.center();
            let planar = Vec2::new(anchor.x, anchor.z);
            if accepted
                .iter()
                .any(|other| other.distance_squared(planar) < min_spacing_sq)
            {
                continue;
            }

            accepted.push(planar);
            placements.push(self.dress(cell.grid_position(), anchor));
        }

        placements
    }

    /// Plan the chunk, create every tree through `factory` and register each
    /// one as its cell's occupant
    ///
    /// Without a factory the chunk is left unpopulated.
    pub fn populate(
        &self,
        grid: &mut ChunkGrid,
        factory: Option<&mut dyn PlaceableFactory>,
        parent: Option<Entity>,
    ) -> Vec<Placement> {
        let Some(factory) = factory else {
            warn!(
                "No placeable factory configured, chunk {:?} left unpopulated",
                grid.position()
            );
            return Vec::new();
        };

        let placements = self.plan(grid);
        for placement in &placements {
            let object = factory.instantiate(placement, parent);
            if let Some(cell) = grid.cell_by_grid_mut(placement.cell) {
                cell.set_occupant(object);
            }
        }

        debug!(
            "Placed {} trees in chunk {:?}",
            placements.len(),
            grid.position()
        );
        placements
    }

    /// Per-object variation drawn from the cell's own random stream
    fn dress(&self, cell: IVec2, anchor: Vec3) -> Placement {
        let mut rng = cell_rng(self.config.world_seed, cell);
        let jitter = self.config.position_jitter;
        let variation = self.config.scale_variation;

        let offset = Vec3::new(
            rng.random_range(-jitter..=jitter),
            0.0,
            rng.random_range(-jitter..=jitter),
        );
        let rotation = rng.random_range(0.0..=self.config.max_rotation);
        let scale = self.config.base_scale + rng.random_range(-variation..=variation);

        Placement {
            cell,
            anchor,
            position: anchor + offset,
            rotation,
            scale,
        }
    }
}

/// Random stream owned by one cell of one world
///
/// The same seed and cell always yield the same sequence, no matter which
/// chunk load triggered the draw.
pub fn cell_rng(world_seed: f64, cell: IVec2) -> ChaCha8Rng {
    let mut state = splitmix64(world_seed.to_bits());
    state = splitmix64(state ^ cell.x as u32 as u64);
    state = splitmix64(state ^ ((cell.y as u32 as u64) << 32));
    ChaCha8Rng::seed_from_u64(state)
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
