//! Tick sequencing: the player's intent, energy grants, the non-player loop,
//! status upkeep, then the player's view.

use std::collections::BTreeSet;
use std::mem;

use tracing::{debug, warn};

use super::Tick;
use super::actions::Intent;
use super::combat::effective_speed;
use super::pathfinding::DistanceField;
use super::visibility::compute_fov;
use crate::events::GameEvent;
use crate::types::{EntityId, RunOutcome, StatusKind};

impl Tick<'_> {
    /// Resolves one validated intent and everything it sets in motion.
    pub(crate) fn run(&mut self, intent: Intent) {
        if intent.is_free() {
            self.perform(intent);
            return;
        }
        self.world.turn += 1;
        let stunned = self.world.player().is_some_and(|p| p.has_status(StatusKind::Stunned));
        let descending = matches!(intent, Intent::Descend(_)) && !stunned;
        self.perform(intent);
        if descending {
            // Nothing on the new floor has had time to act yet.
            self.refresh_player_view();
            return;
        }

        self.grant_energy();
        self.run_npcs();
        if self.world.player_alive() {
            self.tick_statuses();
        }
        self.reap_dead();
        self.refresh_player_view();
    }

    fn grant_energy(&mut self) {
        let grants: Vec<(EntityId, i32)> = self
            .world
            .energy
            .keys()
            .filter_map(|&id| self.world.get(id).map(|entity| (id, effective_speed(entity))))
            .collect();
        for (id, speed) in grants {
            *self.world.energy.entry(id).or_insert(0) += speed;
        }
    }

    /// Lets the lowest-id entity at or above the threshold act until nobody qualifies.
    /// Every decision this tick shares one distance field seeded at the player.
    fn run_npcs(&mut self) {
        let threshold = self.config.energy_threshold;
        let cap = self.config.max_npc_actions_per_tick;
        let field =
            DistanceField::compute(&self.world.map, &[self.world.player_pos()], &BTreeSet::new());
        let mut actions = 0;
        while self.world.player_alive() {
            let Some(id) = self
                .world
                .energy
                .iter()
                .find(|&(_, &energy)| energy >= threshold)
                .map(|(&id, _)| id)
            else {
                break;
            };
            if actions >= cap {
                warn!(turn = self.world.turn, actions, "non-player action cap reached");
                break;
            }
            actions += 1;
            if let Some(energy) = self.world.energy.get_mut(&id) {
                *energy -= threshold;
            }
            self.npc_turn(id, &field);
        }
        debug!(turn = self.world.turn, actions, "non-player actions resolved");
    }

    /// Clears out anything left at zero health that did not go through a kill.
    fn reap_dead(&mut self) {
        let player_id = self.world.player_id;
        let dead: Vec<EntityId> = self
            .world
            .entities
            .values()
            .filter(|entity| entity.id != player_id)
            .filter(|entity| entity.health.is_some_and(|health| health.current <= 0))
            .map(|entity| entity.id)
            .collect();
        for id in dead {
            self.handle_death(id, None);
        }
    }

    /// Recomputes the player's field of view, explores what it covers and reports
    /// hostiles that came into sight since the last refresh.
    pub(crate) fn refresh_player_view(&mut self) {
        let radius = self.player_fov_radius();
        let Some(pos) = self.world.player().map(|player| player.pos) else {
            return;
        };
        let visible = compute_fov(&self.world.map, pos, radius);
        for &tile in &visible {
            self.world.map.reveal(tile);
        }
        let in_view: Vec<(EntityId, String)> = self
            .world
            .hostiles()
            .filter(|entity| visible.contains(&entity.pos))
            .map(|entity| (entity.id, entity.name.clone()))
            .collect();
        let Some(fov) = self.world.player_mut().and_then(|player| player.fov.as_mut()) else {
            return;
        };
        let previously = mem::take(&mut fov.spotted);
        fov.spotted = in_view.iter().map(|(id, _)| *id).collect();
        fov.visible = visible;
        fov.radius = radius;
        fov.dirty = false;
        for (entity, name) in in_view {
            if !previously.contains(&entity) {
                self.events.push(GameEvent::EnemySpotted { entity, name });
            }
        }
    }

    /// Death outranks victory when both happen in the same tick.
    pub(crate) fn outcome(&self) -> Option<RunOutcome> {
        if !self.world.player_alive() {
            Some(RunOutcome::Defeat)
        } else if self.world.final_boss_slain {
            Some(RunOutcome::Victory)
        } else {
            None
        }
    }
}
