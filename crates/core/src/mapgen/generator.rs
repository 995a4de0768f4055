//! Floor generation orchestration: algorithm policy, features, population and validation
//! with bounded retries.

use tracing::{debug, info_span, warn};

use crate::config::SimConfig;
use crate::content::is_boss_floor;
use crate::error::GenerationError;
use crate::map::Map;
use crate::types::RoomType;

use super::grid::walkable_component_count;
use super::model::{Algorithm, GeneratedFloor, SpawnKind};
use super::rooms::{assign_room_types, place_features, reachable_without_doors};
use super::seed::{attempt_rng, derive_floor_seed, policy_rng};
use super::spawns::{SpawnContext, populate};
use super::{arena, cellular, partition};

/// Cave and arena floors need at least this many rooms to assign start, stairs and boss.
const MIN_IRREGULAR_ROOMS: usize = 3;

pub struct MapGenerator<'a> {
    run_seed: u64,
    config: &'a SimConfig,
}

impl<'a> MapGenerator<'a> {
    pub fn new(run_seed: u64, config: &'a SimConfig) -> Self {
        Self { run_seed, config }
    }

    /// Fixed per floor: retries reuse the same algorithm.
    pub fn algorithm_for(&self, floor: u32) -> Algorithm {
        let floor_seed = derive_floor_seed(self.run_seed, floor);
        let mut rng = policy_rng(floor_seed);
        let mut partition_if = |chance: f64| {
            if rng.chance(chance) { Algorithm::Partition } else { Algorithm::Cellular }
        };
        match floor {
            f if f == self.config.final_floor => Algorithm::Arena,
            0..=3 => Algorithm::Partition,
            4 => partition_if(0.6),
            5 => partition_if(0.4),
            6 => partition_if(0.2),
            7..=9 => Algorithm::Cellular,
            f if f % 2 == 0 => Algorithm::Partition,
            _ => Algorithm::Cellular,
        }
    }

    pub fn generate(&self, floor: u32) -> Result<GeneratedFloor, GenerationError> {
        let span = info_span!("generate_floor", floor, seed = self.run_seed);
        let _guard = span.enter();

        let floor_seed = derive_floor_seed(self.run_seed, floor);
        let algorithm = self.algorithm_for(floor);
        let attempts = self.config.generation_retries.max(1);
        for attempt in 0..attempts {
            debug!(floor, attempt, ?algorithm, floor_seed, "generating floor");
            match self.attempt(floor, floor_seed, algorithm, attempt) {
                Ok(generated) => return Ok(generated),
                Err(reason) => warn!(floor, attempt, reason, "floor rejected, retrying"),
            }
        }
        Err(GenerationError::RetriesExhausted { floor, attempts })
    }

    fn attempt(
        &self,
        floor: u32,
        floor_seed: u64,
        algorithm: Algorithm,
        attempt: u32,
    ) -> Result<GeneratedFloor, &'static str> {
        let mut rng = attempt_rng(floor_seed, attempt);
        let mut map = Map::new(self.config.map_width, self.config.map_height);
        match algorithm {
            Algorithm::Partition => partition::generate(&mut map, &mut rng, self.config),
            Algorithm::Cellular => cellular::generate(&mut map, &mut rng, self.config),
            Algorithm::Arena => arena::generate(&mut map),
        }

        let min_rooms = match algorithm {
            Algorithm::Partition => self.config.partition_min_rooms,
            Algorithm::Cellular | Algorithm::Arena => MIN_IRREGULAR_ROOMS,
        };
        if map.rooms.len() < min_rooms {
            return Err("too few rooms");
        }

        let boss_floor = is_boss_floor(floor, self.config);
        assign_room_types(&mut map, &mut rng, boss_floor);
        let features = place_features(&mut map, &mut rng, floor).ok_or("no legal feature tiles")?;
        if boss_floor && (map.room_of_type(RoomType::Boss).is_none() || features.key.is_none()) {
            return Err("boss floor without boss room or key");
        }
        if walkable_component_count(&map) != 1 {
            return Err("walkable tiles are disconnected");
        }

        let context = SpawnContext { map: &map, floor, config: self.config, features: &features };
        let spawns = populate(&context, &mut rng);
        if boss_floor {
            let open = reachable_without_doors(&map, features.start);
            let boss_exposed = spawns
                .iter()
                .any(|spawn| matches!(spawn.kind, SpawnKind::Boss(_)) && open.contains(&spawn.pos));
            if boss_exposed {
                return Err("boss reachable without the key");
            }
        }
        Ok(GeneratedFloor {
            floor,
            algorithm,
            attempt,
            start: features.start,
            stairs: features.stairs,
            map,
            spawns,
        })
    }
}
