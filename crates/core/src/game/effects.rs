//! Status application, refresh and per-tick countdown.

use super::Tick;
use crate::entity::{PERMANENT, StatusEffect};
use crate::events::GameEvent;
use crate::types::{EntityId, StatusKind};

/// Statuses whose countdown is consumed by the afflicted entity's own turns.
fn counts_down_on_action(kind: StatusKind) -> bool {
    matches!(kind, StatusKind::Stunned | StatusKind::Confused)
}

impl Tick<'_> {
    /// Adds or refreshes a status. A repeat application never creates a second instance:
    /// the surviving one takes the larger duration and the larger magnitude.
    pub(crate) fn apply_status(
        &mut self,
        target: EntityId,
        kind: StatusKind,
        duration: u32,
        magnitude: i32,
        source: &str,
    ) {
        let Some(entity) = self.world.get_mut(target) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        if entity.is_boss() && counts_down_on_action(kind) {
            self.events.push(GameEvent::StatusResisted { entity: target, kind });
            return;
        }
        let applied = match entity.status_effects.iter_mut().find(|effect| effect.kind == kind) {
            Some(existing) => {
                existing.duration = existing.duration.max(duration);
                existing.magnitude = existing.magnitude.max(magnitude);
                existing.duration
            }
            None => {
                entity.status_effects.push(StatusEffect {
                    kind,
                    duration,
                    magnitude,
                    source: source.to_owned(),
                });
                duration
            }
        };
        if let Some(fov) = entity.fov.as_mut() {
            fov.dirty = true;
        }
        self.events.push(GameEvent::StatusApplied { entity: target, kind, duration: applied });
    }

    pub(crate) fn remove_status(&mut self, target: EntityId, kind: StatusKind) -> bool {
        let Some(entity) = self.world.get_mut(target) else {
            return false;
        };
        let before = entity.status_effects.len();
        entity.status_effects.retain(|effect| effect.kind != kind);
        let removed = entity.status_effects.len() != before;
        if removed {
            if let Some(fov) = entity.fov.as_mut() {
                fov.dirty = true;
            }
            self.events.push(GameEvent::StatusExpired { entity: target, kind });
        }
        removed
    }

    /// Strips every harmful status.
    pub(crate) fn cure_negative(&mut self, target: EntityId) {
        let negative: Vec<StatusKind> = self
            .world
            .get(target)
            .map(|entity| {
                entity
                    .status_effects
                    .iter()
                    .map(|effect| effect.kind)
                    .filter(|kind| kind.is_negative())
                    .collect()
            })
            .unwrap_or_default();
        for kind in negative {
            self.remove_status(target, kind);
        }
    }

    /// Spends one turn of a stun or confusion after it has taken effect.
    pub(crate) fn consume_status_turn(&mut self, target: EntityId, kind: StatusKind) {
        let Some(effect) = self
            .world
            .get_mut(target)
            .and_then(|entity| entity.status_effects.iter_mut().find(|effect| effect.kind == kind))
        else {
            return;
        };
        if effect.duration != PERMANENT {
            effect.duration = effect.duration.saturating_sub(1);
        }
        if effect.duration == 0 {
            self.remove_status(target, kind);
        }
    }

    /// End-of-tick pass over every entity: periodic damage and healing, then countdown.
    pub(crate) fn tick_statuses(&mut self) {
        let afflicted: Vec<EntityId> = self
            .world
            .entities
            .values()
            .filter(|entity| !entity.status_effects.is_empty())
            .map(|entity| entity.id)
            .collect();
        for id in afflicted {
            self.tick_entity_statuses(id);
        }
    }

    fn tick_entity_statuses(&mut self, id: EntityId) {
        let player_id = self.world.player_id;
        let Some(effects) = self.world.get(id).map(|entity| entity.status_effects.clone()) else {
            return;
        };
        for effect in &effects {
            let alive = self.world.get(id).is_some_and(|entity| entity.is_alive());
            if !alive {
                return;
            }
            // Periodic damage on a hostile can only have come from the player.
            let credit = (id != player_id).then_some(player_id);
            match effect.kind {
                StatusKind::Poison => {
                    self.damage(id, effect.magnitude.max(2), credit, "poison");
                }
                StatusKind::Burning => {
                    self.damage(id, effect.magnitude.max(3), credit, "flames");
                }
                StatusKind::Regenerating => self.heal(id, effect.magnitude.max(2)),
                _ => {}
            }
        }

        let Some(entity) = self.world.get_mut(id) else {
            return;
        };
        let mut expired = Vec::new();
        for effect in &mut entity.status_effects {
            if effect.duration == PERMANENT || counts_down_on_action(effect.kind) {
                continue;
            }
            effect.duration = effect.duration.saturating_sub(1);
            if effect.duration == 0 {
                expired.push(effect.kind);
            }
        }
        for kind in expired {
            self.remove_status(id, kind);
        }
    }

    pub(crate) fn heal(&mut self, target: EntityId, amount: i32) {
        let Some(health) = self.world.get_mut(target).and_then(|entity| entity.health.as_mut())
        else {
            return;
        };
        let healed = amount.min(health.max - health.current).max(0);
        health.current += healed;
        if healed > 0 {
            self.events.push(GameEvent::Healed { entity: target, amount: healed });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::game::test_support::{arena_world, spawn_enemy};
    use crate::types::Pos;

    #[test]
    fn reapplying_refreshes_instead_of_stacking() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(player, StatusKind::Poison, 3, 2, "test");
        tick.apply_status(player, StatusKind::Poison, 5, 1, "test");
        tick.apply_status(player, StatusKind::Poison, 2, 4, "test");
        let poison: Vec<_> = tick
            .world
            .player()
            .map(|p| p.status_effects.iter().filter(|e| e.kind == StatusKind::Poison).collect())
            .unwrap_or_default();
        assert_eq!(poison.len(), 1);
        assert_eq!((poison[0].duration, poison[0].magnitude), (5, 4));
    }

    #[test]
    fn poison_ticks_damage_and_expires_with_an_event() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(player, StatusKind::Poison, 2, 1, "test");
        tick.tick_statuses();
        tick.tick_statuses();
        let hp = tick.world.player().and_then(|p| p.health).map(|h| h.current);
        assert_eq!(hp, Some(config.player_max_hp - 4), "poison deals at least 2 per tick");
        assert!(!tick.world.player().is_some_and(|p| p.has_status(StatusKind::Poison)));
        assert!(tick.events.contains(&GameEvent::StatusExpired {
            entity: player,
            kind: StatusKind::Poison
        }));
    }

    #[test]
    fn permanent_effects_never_count_down() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(player, StatusKind::Regenerating, PERMANENT, 1, "Ring of Regeneration");
        for _ in 0..50 {
            tick.tick_statuses();
        }
        let effect = tick.world.player().and_then(|p| p.status(StatusKind::Regenerating).cloned());
        assert_eq!(effect.map(|e| e.duration), Some(PERMANENT));
    }

    #[test]
    fn bosses_shrug_off_stun_and_confusion() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let king = spawn_enemy(&mut world, &config, "Goblin King", Pos { y: 5, x: 9 });
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(king, StatusKind::Stunned, 2, 0, "test");
        tick.apply_status(king, StatusKind::Poison, 2, 2, "test");
        let boss = tick.world.get(king).expect("boss exists");
        assert!(!boss.has_status(StatusKind::Stunned));
        assert!(boss.has_status(StatusKind::Poison));
        assert!(
            tick.events
                .contains(&GameEvent::StatusResisted { entity: king, kind: StatusKind::Stunned })
        );
    }

    #[test]
    fn stuns_survive_the_tick_and_wear_off_on_action() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let rat = spawn_enemy(&mut world, &config, "Rat", Pos { y: 5, x: 9 });
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(rat, StatusKind::Stunned, 1, 0, "Mace");
        tick.tick_statuses();
        assert!(tick.world.get(rat).is_some_and(|r| r.has_status(StatusKind::Stunned)));
        tick.consume_status_turn(rat, StatusKind::Stunned);
        assert!(!tick.world.get(rat).is_some_and(|r| r.has_status(StatusKind::Stunned)));
    }

    #[test]
    fn cure_removes_only_harmful_statuses() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(player, StatusKind::Poison, 4, 2, "test");
        tick.apply_status(player, StatusKind::Blinded, 4, 0, "test");
        tick.apply_status(player, StatusKind::Hasted, 4, 30, "test");
        tick.cure_negative(player);
        let kinds: Vec<StatusKind> = tick
            .world
            .player()
            .map(|p| p.status_effects.iter().map(|e| e.kind).collect())
            .unwrap_or_default();
        assert_eq!(kinds, vec![StatusKind::Hasted]);
    }
}
