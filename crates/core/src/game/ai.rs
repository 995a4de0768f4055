//! Non-player decision making. `decide` is a pure read of the world and the tick's
//! shared distance field; `execute` applies the chosen action.

use std::collections::BTreeSet;

use tracing::trace;

use super::Tick;
use super::combat::fov_radius;
use super::pathfinding::{DistanceField, astar};
use super::visibility::{can_see, line_of_sight};
use crate::config::SimConfig;
use crate::content::{content, make_enemy};
use crate::entity::{AiBehavior, BossPhase, EnemySpecial, Entity};
use crate::events::GameEvent;
use crate::types::{Direction, EntityId, Pos, StatusKind};
use crate::world::World;

const BOSS_PHASE_SPEED: i32 = 20;
const BOSS_PHASE_ATTACK: i32 = 3;
const AREA_ATTACK_SCALE: f64 = 1.5;
/// Own actions between blinks while the player is adjacent.
const TELEPORT_INTERVAL: u32 = 3;
const TELEPORT_MIN_DISTANCE: u32 = 3;
const TELEPORT_MAX_DISTANCE: u32 = 6;
const TELEPORT_MAX_PATH: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiAction {
    MeleeAttack,
    RangedAttack,
    MoveTo(Pos),
    Wander,
    Wait,
    Summon,
    AreaAttack,
    Teleport,
}

/// Whether the periodic special fires on this entity's next action.
fn special_due(entity: &Entity, interval: u32) -> bool {
    let interval = match entity.ai {
        Some(AiBehavior::Boss(BossPhase::Phase2)) => interval.saturating_sub(1).max(1),
        _ => interval.max(1),
    };
    (entity.action_count + 1) % interval == 0
}

/// Enemy-perspective sight check, computed on demand. An invisible player is only
/// noticed from an adjacent tile.
pub fn sees_player(world: &World, config: &SimConfig, entity: &Entity) -> bool {
    let Some(player) = world.player().filter(|player| player.is_alive()) else {
        return false;
    };
    if player.has_status(StatusKind::Invisible) && !entity.pos.is_adjacent(player.pos) {
        return false;
    }
    can_see(&world.map, entity.pos, player.pos, fov_radius(entity, config))
}

pub fn decide(world: &World, config: &SimConfig, id: EntityId, field: &DistanceField) -> AiAction {
    let Some(entity) = world.get(id) else {
        return AiAction::Wait;
    };
    if entity.has_status(StatusKind::Confused) {
        return AiAction::Wander;
    }
    let player_pos = world.player_pos();
    let adjacent = world.player_alive() && entity.pos.is_adjacent(player_pos);
    let sees = sees_player(world, config, entity);
    let occupied = |pos: Pos| world.blocker_at(pos).is_some();

    if sees && let Some(special) = &entity.special {
        match special {
            EnemySpecial::Summon { interval, .. } if special_due(entity, *interval) => {
                return AiAction::Summon;
            }
            EnemySpecial::AreaAttack { interval, radius }
                if special_due(entity, *interval)
                    && entity.pos.distance_squared(player_pos) <= i64::from(radius * radius) =>
            {
                return AiAction::AreaAttack;
            }
            EnemySpecial::TeleportWhenAdjacent
                if adjacent && special_due(entity, TELEPORT_INTERVAL) =>
            {
                return AiAction::Teleport;
            }
            _ => {}
        }
    }

    match entity.ai {
        Some(AiBehavior::Melee | AiBehavior::Boss(_)) => {
            if adjacent {
                AiAction::MeleeAttack
            } else if sees {
                field.best_neighbor(entity.pos, occupied).map_or(AiAction::Wait, AiAction::MoveTo)
            } else {
                AiAction::Wander
            }
        }
        Some(AiBehavior::Ranged { range, preferred_distance }) => {
            let distance = entity.pos.chebyshev(player_pos);
            if sees && distance <= range && line_of_sight(&world.map, entity.pos, player_pos) {
                AiAction::RangedAttack
            } else if sees && distance < preferred_distance {
                field.flee_neighbor(entity.pos, occupied).map_or(AiAction::Wait, AiAction::MoveTo)
            } else if sees && distance > range {
                field.best_neighbor(entity.pos, occupied).map_or(AiAction::Wait, AiAction::MoveTo)
            } else {
                AiAction::Wander
            }
        }
        Some(AiBehavior::Fleeing) => match field.flee_neighbor(entity.pos, occupied) {
            Some(step) => AiAction::MoveTo(step),
            None if adjacent => AiAction::MeleeAttack,
            None => AiAction::Wait,
        },
        Some(AiBehavior::Passive) | None => AiAction::Wait,
    }
}

impl Tick<'_> {
    /// One-way behaviour transitions, checked once before each action.
    pub(crate) fn update_behavior(&mut self, id: EntityId) {
        let config = self.config;
        let Some(entity) = self.world.get_mut(id) else {
            return;
        };
        let fraction = entity.health_fraction();
        match entity.ai {
            Some(AiBehavior::Melee) if fraction < config.melee_flee_fraction => {
                entity.ai = Some(AiBehavior::Fleeing);
                self.events.push(GameEvent::BehaviorChanged {
                    entity: id,
                    behavior: AiBehavior::Fleeing,
                });
            }
            Some(AiBehavior::Ranged { .. }) if fraction < config.ranged_flee_fraction => {
                entity.ai = Some(AiBehavior::Fleeing);
                self.events.push(GameEvent::BehaviorChanged {
                    entity: id,
                    behavior: AiBehavior::Fleeing,
                });
            }
            Some(AiBehavior::Boss(BossPhase::Phase1)) if fraction < config.boss_phase_fraction => {
                entity.ai = Some(AiBehavior::Boss(BossPhase::Phase2));
                if let Some(combat) = entity.combat.as_mut() {
                    combat.base_speed += BOSS_PHASE_SPEED;
                    combat.base_attack += BOSS_PHASE_ATTACK;
                }
                self.events.push(GameEvent::PhaseChanged { entity: id });
            }
            _ => {}
        }
    }

    /// Full non-player turn: transitions, stun handling, decision and execution.
    pub(crate) fn npc_turn(&mut self, id: EntityId, field: &DistanceField) {
        self.update_behavior(id);
        let Some(entity) = self.world.get(id) else {
            return;
        };
        if entity.has_status(StatusKind::Stunned) {
            self.events.push(GameEvent::TurnSkipped { entity: id, reason: StatusKind::Stunned });
            self.consume_status_turn(id, StatusKind::Stunned);
            return;
        }
        let confused = entity.has_status(StatusKind::Confused);
        let action = decide(self.world, self.config, id, field);
        trace!(entity = id.0, ?action, "npc action");
        self.execute(id, action);
        if confused {
            self.consume_status_turn(id, StatusKind::Confused);
        }
        if let Some(entity) = self.world.get_mut(id) {
            entity.action_count += 1;
        }
    }

    pub(crate) fn execute(&mut self, id: EntityId, action: AiAction) {
        let player = self.world.player_id;
        match action {
            AiAction::MeleeAttack => self.attack(id, player, false, 1.0),
            AiAction::RangedAttack => self.attack(id, player, true, 1.0),
            AiAction::MoveTo(pos) => self.move_npc(id, pos),
            AiAction::Wander => {
                let Some(&direction) = self.world.rng.pick(&Direction::ALL) else {
                    return;
                };
                if let Some(from) = self.world.get(id).map(|entity| entity.pos) {
                    self.move_npc(id, from.step(direction));
                }
            }
            AiAction::Wait => {}
            AiAction::Summon => self.summon(id),
            AiAction::AreaAttack => self.area_attack(id),
            AiAction::Teleport => self.blink_away(id),
        }
    }

    fn move_npc(&mut self, id: EntityId, to: Pos) {
        if !self.world.is_free(to) {
            return;
        }
        if let Some(entity) = self.world.get_mut(id) {
            let from = entity.pos;
            entity.pos = to;
            self.events.push(GameEvent::Moved { entity: id, from, to });
        }
    }

    fn summon(&mut self, id: EntityId) {
        let Some(summoner) = self.world.get(id) else {
            return;
        };
        let Some(EnemySpecial::Summon { minion, .. }) = &summoner.special else {
            return;
        };
        let Some(template) = content().enemy(minion) else {
            return;
        };
        let free: Vec<Pos> =
            summoner.pos.neighbors().into_iter().filter(|&pos| self.world.is_free(pos)).collect();
        let Some(&pos) = self.world.rng.pick(&free) else {
            return;
        };
        let minion_id = self.world.alloc_id();
        let minion = make_enemy(template, minion_id, pos, self.world.floor, self.config);
        self.world.spawn(minion);
        self.events.push(GameEvent::Summoned { summoner: id, minion: minion_id });
    }

    fn area_attack(&mut self, id: EntityId) {
        let Some(EnemySpecial::AreaAttack { radius, .. }) =
            self.world.get(id).and_then(|entity| entity.special.clone())
        else {
            return;
        };
        self.events.push(GameEvent::AreaAttack { attacker: id, radius });
        let origin = self.world.get(id).map(|entity| entity.pos);
        let player_pos = self.world.player_pos();
        if origin.is_some_and(|pos| pos.distance_squared(player_pos) <= i64::from(radius * radius))
        {
            let player = self.world.player_id;
            self.attack(id, player, false, AREA_ATTACK_SCALE);
        }
    }

    /// Jumps to a free tile a few steps from the player that is still reachable on foot.
    /// Falls back to a melee swing when no such tile exists.
    fn blink_away(&mut self, id: EntityId) {
        let Some(from) = self.world.get(id).map(|entity| entity.pos) else {
            return;
        };
        let player_pos = self.world.player_pos();
        let occupied: BTreeSet<Pos> =
            self.world.entities.values().filter(|e| e.blocks_movement).map(|e| e.pos).collect();
        let candidates: Vec<Pos> = self
            .world
            .map
            .floor_positions()
            .into_iter()
            .filter(|&pos| {
                (TELEPORT_MIN_DISTANCE..=TELEPORT_MAX_DISTANCE).contains(&pos.chebyshev(player_pos))
            })
            .filter(|&pos| self.world.is_free(pos))
            .filter(|&pos| {
                astar(&self.world.map, from, pos, &occupied)
                    .is_some_and(|path| path.len() <= TELEPORT_MAX_PATH)
            })
            .collect();
        let Some(&to) = self.world.rng.pick(&candidates) else {
            let player = self.world.player_id;
            self.attack(id, player, false, 1.0);
            return;
        };
        if let Some(entity) = self.world.get_mut(id) {
            entity.pos = to;
            self.events.push(GameEvent::Teleported { entity: id, from, to });
        }
    }
}
