//! Tunable simulation constants, loadable from TOML.
//! Every field has a documented default; a partial file only overrides what it names.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub map_width: usize,
    pub map_height: usize,

    /// Energy an entity must hold before it may act; one action costs this much.
    pub energy_threshold: i32,
    pub player_speed: i32,
    pub player_max_hp: i32,
    pub player_attack: i32,
    pub player_defense: i32,
    pub player_crit_chance: f64,
    pub inventory_capacity: usize,

    pub player_fov_radius: i32,
    pub enemy_fov_radius: i32,
    pub blinded_fov_radius: i32,

    pub cave_wall_chance: f64,
    pub cave_smoothing_passes: usize,
    pub cave_wall_threshold: usize,
    pub cave_floor_threshold: usize,
    pub cave_min_region_tiles: usize,
    pub cave_max_region_tiles: usize,

    pub partition_min_leaf_width: usize,
    pub partition_min_leaf_height: usize,
    pub partition_room_min_width: usize,
    pub partition_room_max_width: usize,
    pub partition_room_min_height: usize,
    pub partition_room_max_height: usize,
    pub partition_max_depth: u32,
    pub partition_min_rooms: usize,

    pub generation_retries: u32,

    /// Damage variance as a percentage of the raw value.
    pub damage_variance_percent: i32,
    pub crit_multiplier: f64,
    pub xp_per_level: u32,

    pub melee_flee_fraction: f64,
    pub ranged_flee_fraction: f64,
    pub boss_phase_fraction: f64,

    pub final_floor: u32,
    pub max_npc_actions_per_tick: u32,

    pub flavor_timeout_ms: u64,
    pub flavor_max_in_flight: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_width: 80,
            map_height: 50,
            energy_threshold: 100,
            player_speed: 100,
            player_max_hp: 50,
            player_attack: 5,
            player_defense: 2,
            player_crit_chance: 0.05,
            inventory_capacity: 20,
            player_fov_radius: 8,
            enemy_fov_radius: 6,
            blinded_fov_radius: 2,
            cave_wall_chance: 0.45,
            cave_smoothing_passes: 5,
            cave_wall_threshold: 5,
            cave_floor_threshold: 3,
            cave_min_region_tiles: 20,
            cave_max_region_tiles: 100,
            partition_min_leaf_width: 12,
            partition_min_leaf_height: 10,
            partition_room_min_width: 4,
            partition_room_max_width: 12,
            partition_room_min_height: 4,
            partition_room_max_height: 10,
            partition_max_depth: 4,
            partition_min_rooms: 4,
            generation_retries: 10,
            damage_variance_percent: 20,
            crit_multiplier: 1.5,
            xp_per_level: 150,
            melee_flee_fraction: 0.25,
            ranged_flee_fraction: 0.20,
            boss_phase_fraction: 0.5,
            final_floor: 10,
            max_npc_actions_per_tick: 1_000,
            flavor_timeout_ms: 5_000,
            flavor_max_in_flight: 3,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn flavor_timeout(&self) -> Duration {
        Duration::from_millis(self.flavor_timeout_ms)
    }
}
