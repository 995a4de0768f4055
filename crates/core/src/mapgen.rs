//! Procedural floor generation split into layout algorithms, feature stamping and population.

pub mod model;

mod arena;
mod cellular;
mod generator;
mod grid;
mod partition;
mod rooms;
mod seed;
mod spawns;

pub use generator::MapGenerator;
pub use model::{Algorithm, GeneratedFloor, Spawn, SpawnKind};
pub use seed::{derive_floor_seed, mix_seed_stream};

use crate::config::SimConfig;
use crate::error::GenerationError;

pub fn generate_floor(
    run_seed: u64,
    floor: u32,
    config: &SimConfig,
) -> Result<GeneratedFloor, GenerationError> {
    MapGenerator::new(run_seed, config).generate(floor)
}
