//! Stable fingerprints of a run for determinism checks and replay verification.
//! Flavor text is left out: it arrives asynchronously and never affects the simulation.

use std::hash::Hasher;
use std::io::{self, Write};

use serde::Serialize;
use tracing::warn;
use xxhash_rust::xxh3::Xxh3;

use super::{Game, SNAPSHOT_FORMAT_VERSION};
use crate::config::SimConfig;
use crate::events::RunSummary;
use crate::world::World;

#[derive(Serialize)]
struct Fingerprinted<'a> {
    config: &'a SimConfig,
    world: &'a World,
    outcome: &'a Option<RunSummary>,
}

/// Streams serialized bytes straight into the hasher.
struct HashWriter<'a>(&'a mut Xxh3);

impl Write for HashWriter<'_> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.update(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Game {
    /// xxh3 over the canonical encoding of config, world and outcome.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u16(SNAPSHOT_FORMAT_VERSION);
        let state =
            Fingerprinted { config: &self.config, world: &self.world, outcome: &self.outcome };
        if let Err(error) = serde_json::to_writer(HashWriter(&mut hasher), &state) {
            warn!(%error, "world state could not be encoded for hashing");
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerAction;

    #[test]
    fn identical_runs_hash_identically_and_diverge_after_different_actions() {
        let start = || Game::start_run(Some(314), SimConfig::default()).expect("floor generates");
        let (mut first, mut second) = (start(), start());
        assert_eq!(first.snapshot_hash(), second.snapshot_hash());

        first.submit_action(PlayerAction::Wait).expect("wait is legal");
        assert_ne!(first.snapshot_hash(), second.snapshot_hash());
        second.submit_action(PlayerAction::Wait).expect("wait is legal");
        assert_eq!(first.snapshot_hash(), second.snapshot_hash());
    }

    #[test]
    fn flavor_text_does_not_move_the_hash() {
        let mut game = Game::start_run(Some(2), SimConfig::default()).expect("floor generates");
        let before = game.snapshot_hash();
        let player = game.world.player_id;
        if let Some(detail) = game.inspect_entity(player) {
            game.flavor.insert(detail.flavor_key, "A tired adventurer.".to_owned());
        }
        assert_eq!(game.snapshot_hash(), before);
    }
}
