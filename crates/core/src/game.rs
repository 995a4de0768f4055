//! The run façade. A `Game` owns one world and advances it one player action at a time;
//! each subsystem lives in its own submodule as methods on the per-tick [`Tick`] context.

mod actions;
mod ai;
mod combat;
mod effects;
mod hash;
mod items;
mod pathfinding;
mod progression;
mod traps;
mod turn;
mod view;
mod visibility;

#[cfg(test)]
mod test_support;

use std::mem;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

pub use ai::{AiAction, decide, sees_player};
pub use combat::{
    DamageRoll, effective_attack, effective_defense, effective_speed, fov_radius, roll_damage,
};
pub use pathfinding::{DistanceField, UNREACHABLE, astar};
pub use progression::{score, summarize, xp_to_next};
pub use view::{build_view, flavor_key};
pub use visibility::{bresenham, can_see, compute_fov, line_of_sight};

use crate::config::SimConfig;
use crate::error::{ActionError, GenerationError, RestoreError};
use crate::events::{EntityDetail, GameEvent, RunSummary, TurnResult, WorldView};
use crate::flavor::{
    FlavorCache, FlavorDispatcher, FlavorKey, FlavorRequest, FlavorSubject, fallback_for,
};
use crate::mapgen::{generate_floor, mix_seed_stream};
use crate::types::{EntityId, PlayerAction, RunOutcome};
use crate::world::World;

pub const SNAPSHOT_FORMAT_VERSION: u16 = 1;

const CLOCK_SEED_STREAM: u64 = 0x5EED;

/// Mutable context for one tick: the world, the rules, and the events raised so far.
pub(crate) struct Tick<'a> {
    pub(crate) world: &'a mut World,
    pub(crate) config: &'a SimConfig,
    pub(crate) events: Vec<GameEvent>,
}

impl<'a> Tick<'a> {
    pub(crate) fn new(world: &'a mut World, config: &'a SimConfig) -> Self {
        Self { world, config, events: Vec::new() }
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    config: SimConfig,
    world: World,
    flavor: FlavorCache,
    outcome: Option<RunSummary>,
    /// Flavor keys waiting to be handed to a dispatcher. Not part of the snapshot.
    flavor_queue: Vec<FlavorKey>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u16,
    config: &'a SimConfig,
    world: &'a World,
    outcome: &'a Option<RunSummary>,
    flavor: &'a FlavorCache,
}

#[derive(Deserialize)]
struct Snapshot {
    config: SimConfig,
    world: World,
    outcome: Option<RunSummary>,
    #[serde(default)]
    flavor: FlavorCache,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u16,
}

impl Game {
    /// Starts a run on floor 1. Without a seed, one is derived from the clock.
    pub fn start_run(seed: Option<u64>, config: SimConfig) -> Result<Self, GenerationError> {
        let seed = seed.unwrap_or_else(clock_seed);
        let span = info_span!("start_run", seed);
        let _entered = span.enter();

        let mut world = World::new(seed, &config);
        let first = generate_floor(seed, 1, &config)?;
        world.install_floor(first, &config);
        Tick::new(&mut world, &config).refresh_player_view();
        info!(seed, rooms = world.map.rooms.len(), "run started");
        Ok(Self {
            config,
            world,
            flavor: FlavorCache::default(),
            outcome: None,
            flavor_queue: Vec::new(),
        })
    }

    /// Validates and resolves one player action. A rejected action leaves the world untouched.
    pub fn submit_action(&mut self, action: PlayerAction) -> Result<TurnResult, ActionError> {
        let span = info_span!("submit_action", turn = self.world.turn, floor = self.world.floor);
        let _entered = span.enter();
        if self.outcome.is_some() {
            return Err(ActionError::RunOver);
        }
        let intent = actions::validate(&self.world, &self.config, &action)?;

        let mut tick = Tick::new(&mut self.world, &self.config);
        tick.run(intent);
        let outcome = tick.outcome();
        let events = tick.events;

        for event in &events {
            if let GameEvent::FloorChanged { floor } = event {
                info!(floor, "descended");
            }
        }
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
        Ok(TurnResult {
            turn: self.world.turn,
            events,
            view: self.view(),
            outcome: self.outcome.clone(),
        })
    }

    fn finish(&mut self, outcome: RunOutcome) {
        let summary = summarize(&self.world, outcome);
        info!(
            ?outcome,
            floor = summary.floor,
            turns = summary.turns,
            score = summary.score,
            "run ended"
        );
        if let Some(key) = Self::epitaph_key(&summary) {
            self.flavor_queue.push(key);
        }
        self.outcome = Some(summary);
    }

    pub fn view(&self) -> WorldView {
        build_view(&self.world, &self.config)
    }

    /// Details for a visible or carried entity. Queues a flavor request when no
    /// generated text is cached for it yet.
    pub fn inspect_entity(&mut self, id: EntityId) -> Option<EntityDetail> {
        let detail = view::inspect(&self.world, &self.flavor, id)?;
        if !detail.flavor_cached && !self.flavor_queue.contains(&detail.flavor_key) {
            self.flavor_queue.push(detail.flavor_key.clone());
        }
        Some(detail)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn outcome(&self) -> Option<&RunSummary> {
        self.outcome.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn flavor(&self) -> &FlavorCache {
        &self.flavor
    }

    /// Hands queued flavor keys to `dispatcher`, then merges whatever has finished.
    /// Keys the dispatcher refuses stay queued for the next call. Must run inside a
    /// tokio runtime.
    pub fn pump_flavor(&mut self, dispatcher: &mut FlavorDispatcher) -> usize {
        let queued = mem::take(&mut self.flavor_queue);
        for key in queued {
            if self.flavor.contains(&key) {
                continue;
            }
            if !dispatcher.dispatch(FlavorRequest::for_key(key.clone())) {
                self.flavor_queue.push(key);
            }
        }
        dispatcher.drain_into(&mut self.flavor)
    }

    pub fn pending_flavor(&self) -> &[FlavorKey] {
        &self.flavor_queue
    }

    fn epitaph_key(summary: &RunSummary) -> Option<FlavorKey> {
        let cause = summary.cause_of_death.clone()?;
        Some(FlavorKey {
            seed: summary.seed,
            floor: summary.floor,
            subject: FlavorSubject::Epitaph { cause, level: summary.level },
            index: 0,
        })
    }

    /// Closing line for a lost run: generated if it has arrived, authored otherwise.
    pub fn epitaph(&self) -> Option<String> {
        let key = Self::epitaph_key(self.outcome.as_ref()?)?;
        Some(self.flavor.get(&key).unwrap_or_else(|| fallback_for(&key)).to_owned())
    }

    /// Serializes the whole run, random stream position included.
    pub fn snapshot(&self) -> Result<Vec<u8>, RestoreError> {
        let snapshot = SnapshotRef {
            format_version: SNAPSHOT_FORMAT_VERSION,
            config: &self.config,
            world: &self.world,
            outcome: &self.outcome,
            flavor: &self.flavor,
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    pub fn restore(bytes: &[u8]) -> Result<Self, RestoreError> {
        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        if probe.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(RestoreError::UnsupportedVersion {
                found: probe.format_version,
                expected: SNAPSHOT_FORMAT_VERSION,
            });
        }
        let snapshot: Snapshot = serde_json::from_slice(bytes)?;
        info!(seed = snapshot.world.run_seed, turn = snapshot.world.turn, "run restored");
        Ok(Self {
            config: snapshot.config,
            world: snapshot.world,
            flavor: snapshot.flavor,
            outcome: snapshot.outcome,
            flavor_queue: Vec::new(),
        })
    }
}

fn clock_seed() -> u64 {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_nanos());
    mix_seed_stream(nanos as u64, CLOCK_SEED_STREAM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EquipSlot;

    fn start(seed: u64) -> Game {
        Game::start_run(Some(seed), SimConfig::default()).expect("floor 1 generates")
    }

    #[test]
    fn a_new_run_stands_on_floor_one_with_something_in_view() {
        let game = start(42);
        let view = game.view();
        assert_eq!(view.floor, 1);
        assert_eq!(view.turn, 0);
        assert!(view.tiles.len() > 1);
        assert!(view.tiles.len() < game.world().map.width * game.world().map.height);
        assert!(view.player.is_some());
    }

    #[test]
    fn rejected_actions_leave_no_trace() {
        let mut game = start(7);
        let before = game.snapshot_hash();
        assert_eq!(
            game.submit_action(PlayerAction::UseItem(9)),
            Err(ActionError::NoSuchInventorySlot(9))
        );
        assert_eq!(
            game.submit_action(PlayerAction::UnequipSlot(EquipSlot::Ring)),
            Err(ActionError::SlotEmpty(EquipSlot::Ring))
        );
        assert_eq!(game.snapshot_hash(), before);
    }

    #[test]
    fn waiting_advances_the_clock() {
        let mut game = start(11);
        let result = game.submit_action(PlayerAction::Wait).expect("wait is always legal");
        assert_eq!(result.turn, 1);
        assert_eq!(result.view.turn, 1);
        assert_eq!(game.world().turn, 1);
    }

    #[test]
    fn finished_runs_refuse_further_actions_and_offer_an_epitaph() {
        let mut game = start(5);
        let player = game.world.player_id;
        if let Some(health) = game.world.player_mut().and_then(|p| p.health.as_mut()) {
            health.current = 1;
        }
        let mut tick = Tick::new(&mut game.world, &game.config);
        tick.damage(player, 5, None, "Spike Trap");
        game.finish(RunOutcome::Defeat);

        assert_eq!(game.submit_action(PlayerAction::Wait), Err(ActionError::RunOver));
        let summary = game.outcome().expect("run is over");
        assert_eq!(summary.cause_of_death.as_deref(), Some("Spike Trap"));
        assert!(game.epitaph().is_some());
        assert_eq!(game.pending_flavor().len(), 1);
    }

    #[test]
    fn snapshots_restore_to_the_same_hash() {
        let mut game = start(99);
        for _ in 0..3 {
            game.submit_action(PlayerAction::Wait).expect("wait is always legal");
        }
        let bytes = game.snapshot().expect("snapshot encodes");
        let restored = Game::restore(&bytes).expect("snapshot decodes");
        assert_eq!(restored.snapshot_hash(), game.snapshot_hash());
    }

    #[test]
    fn restore_rejects_garbage_and_future_versions() {
        assert!(matches!(Game::restore(b"not json"), Err(RestoreError::NoResumableSave(_))));
        let future = br#"{"format_version": 99}"#;
        assert!(matches!(
            Game::restore(future),
            Err(RestoreError::UnsupportedVersion { found: 99, expected: SNAPSHOT_FORMAT_VERSION })
        ));
    }
}
