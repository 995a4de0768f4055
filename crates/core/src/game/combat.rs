//! Effective stats, the shared damage formula and everything that follows a hit:
//! shields, on-hit procs, behaviour switches and death.

use tracing::info;

use super::Tick;
use super::visibility::line_of_sight;
use crate::config::SimConfig;
use crate::entity::{AiBehavior, EnemySpecial, Entity, ItemEffect};
use crate::events::GameEvent;
use crate::rng::SimRng;
use crate::types::{EntityId, EquipSlot, StatusKind};

const STRENGTHENED_ATTACK: i32 = 3;
const WEAKENED_ATTACK: i32 = 3;
const WEAKENED_DEFENSE: i32 = 2;
const HASTED_SPEED: i32 = 30;
const SLOWED_SPEED: i32 = 30;
const MIN_SPEED: i32 = 10;
const MAX_SPEED: i32 = 200;

fn slot_power(entity: &Entity, slot: EquipSlot) -> i32 {
    entity.equipped(slot).and_then(|item| item.item).map_or(0, |props| props.power)
}

fn ring_bonus(entity: &Entity, wanted: ItemEffect) -> i32 {
    entity
        .equipped(EquipSlot::Ring)
        .and_then(|item| item.item)
        .filter(|props| props.effect == Some(wanted))
        .map_or(0, |props| props.power)
}

pub fn effective_attack(entity: &Entity) -> i32 {
    let Some(combat) = entity.combat else {
        return 0;
    };
    let mut attack = combat.base_attack
        + slot_power(entity, EquipSlot::MainHand)
        + ring_bonus(entity, ItemEffect::AttackBonus);
    if entity.has_status(StatusKind::Strengthened) {
        attack += STRENGTHENED_ATTACK;
    }
    if entity.has_status(StatusKind::Weakened) {
        attack -= WEAKENED_ATTACK;
    }
    attack.max(0)
}

pub fn effective_defense(entity: &Entity) -> i32 {
    let Some(combat) = entity.combat else {
        return 0;
    };
    let armor: i32 = [EquipSlot::Head, EquipSlot::Body, EquipSlot::OffHand]
        .into_iter()
        .map(|slot| slot_power(entity, slot))
        .sum();
    let mut defense = combat.base_defense + armor + ring_bonus(entity, ItemEffect::DefenseBonus);
    if entity.has_status(StatusKind::Weakened) {
        defense -= WEAKENED_DEFENSE;
    }
    defense.max(0)
}

pub fn effective_speed(entity: &Entity) -> i32 {
    let Some(combat) = entity.combat else {
        return 0;
    };
    let gear: i32 = EquipSlot::ALL
        .into_iter()
        .filter_map(|slot| entity.equipped(slot).and_then(|item| item.item))
        .map(|props| props.speed_mod)
        .sum();
    let mut speed = combat.base_speed + gear;
    if entity.has_status(StatusKind::Hasted) {
        speed += HASTED_SPEED;
    }
    if entity.has_status(StatusKind::Slowed) {
        speed -= SLOWED_SPEED;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Sight radius after blindness and worn sight bonuses.
pub fn fov_radius(entity: &Entity, config: &SimConfig) -> i32 {
    if entity.has_status(StatusKind::Blinded) {
        return config.blinded_fov_radius;
    }
    let base = entity.fov.as_ref().map_or(config.enemy_fov_radius, |fov| fov.radius);
    let bonus = entity
        .equipped(EquipSlot::Amulet)
        .and_then(|item| item.item)
        .filter(|props| props.effect == Some(ItemEffect::SightBonus))
        .map_or(0, |props| props.power);
    base + bonus
}

/// Outcome of one damage roll, before shields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRoll {
    pub damage: i32,
    pub critical: bool,
}

/// `max(0, attack - defense)` perturbed by a symmetric variance of at least 1,
/// floored at 1 for any positive attack, then scaled on a critical hit.
pub fn roll_damage(
    rng: &mut SimRng,
    attack: i32,
    defense: i32,
    crit_chance: f64,
    config: &SimConfig,
) -> DamageRoll {
    let raw = (attack - defense).max(0);
    let variance = (raw * config.damage_variance_percent / 100).max(1);
    let mut damage = (raw + rng.range_i32(-variance, variance)).max(0);
    if attack > 0 {
        damage = damage.max(1);
    }
    let critical = rng.chance(crit_chance);
    if critical {
        damage = (f64::from(damage) * config.crit_multiplier) as i32;
    }
    DamageRoll { damage, critical }
}

impl Tick<'_> {
    /// Resolves one attack. Ranged attacks need a clear Bresenham line first;
    /// `scale` multiplies the rolled damage (area attacks hit harder).
    pub(crate) fn attack(&mut self, attacker: EntityId, target: EntityId, ranged: bool, scale: f64) {
        let (Some(source), Some(victim)) = (self.world.get(attacker), self.world.get(target)) else {
            return;
        };
        if !source.is_alive() || !victim.is_alive() {
            return;
        }
        if ranged && !line_of_sight(&self.world.map, source.pos, victim.pos) {
            self.events.push(GameEvent::NoLineOfSight { attacker, target });
            return;
        }
        let attack = effective_attack(source);
        let defense = effective_defense(victim);
        let crit_chance = source.combat.map_or(0.0, |combat| combat.crit_chance);
        let cause = source.name.clone();
        let roll = roll_damage(&mut self.world.rng, attack, defense, crit_chance, self.config);
        let damage = (f64::from(roll.damage) * scale) as i32;
        self.events.push(GameEvent::Attacked {
            attacker,
            target,
            damage,
            critical: roll.critical,
            ranged,
        });
        let dealt = self.damage(target, damage, Some(attacker), &cause);
        if dealt > 0 {
            self.apply_on_hit(attacker, target, dealt);
        }
    }

    fn apply_on_hit(&mut self, attacker: EntityId, target: EntityId, dealt: i32) {
        let Some(source) = self.world.get(attacker) else {
            return;
        };
        let weapon = source
            .equipped(EquipSlot::MainHand)
            .and_then(|item| Some((item.name.clone(), item.item?.effect?)));
        let special = source.special.clone();
        let source_name = source.name.clone();
        let target_alive = self.world.get(target).is_some_and(Entity::is_alive);

        if let Some((name, ItemEffect::OnHit { kind, duration, magnitude, chance_percent })) =
            weapon
            && target_alive
            && self.world.rng.below(100) < u64::from(chance_percent)
        {
            self.apply_status(target, kind, duration, magnitude, &name);
        }

        let Some(special) = special else {
            return;
        };
        match special {
            EnemySpecial::PoisonOnHit { damage, duration } if target_alive => {
                self.apply_status(target, StatusKind::Poison, duration, damage, &source_name);
            }
            EnemySpecial::BurningOnHit { damage, duration } if target_alive => {
                self.apply_status(target, StatusKind::Burning, duration, damage, &source_name);
            }
            EnemySpecial::SlowOnHit { magnitude, duration } if target_alive => {
                self.apply_status(target, StatusKind::Slowed, duration, magnitude, &source_name);
            }
            EnemySpecial::ConfuseOnHit { duration } if target_alive => {
                self.apply_status(target, StatusKind::Confused, duration, 0, &source_name);
            }
            EnemySpecial::LifeSteal => self.heal(attacker, dealt / 2),
            EnemySpecial::DrainMaxHp if target_alive => {
                if let Some(health) =
                    self.world.get_mut(target).and_then(|entity| entity.health.as_mut())
                {
                    health.max = (health.max - 1).max(1);
                    health.current = health.current.min(health.max);
                    let max = health.max;
                    self.events.push(GameEvent::MaxHealthDrained { entity: target, max });
                }
            }
            _ => {}
        }
    }

    /// Applies `amount` after shield absorption and returns the health actually lost.
    /// `cause` names the source for the death record when the player is hurt.
    pub(crate) fn damage(
        &mut self,
        target: EntityId,
        amount: i32,
        attacker: Option<EntityId>,
        cause: &str,
    ) -> i32 {
        let player_id = self.world.player_id;
        let Some(entity) = self.world.get_mut(target) else {
            return 0;
        };
        if !entity.is_alive() || amount <= 0 {
            return 0;
        }

        let mut remaining = amount;
        let mut shield_broken = false;
        if let Some(shield) =
            entity.status_effects.iter_mut().find(|effect| effect.kind == StatusKind::Shielded)
        {
            let absorbed = remaining.min(shield.magnitude.max(0));
            shield.magnitude -= absorbed;
            remaining -= absorbed;
            shield_broken = shield.magnitude <= 0;
            if absorbed > 0 {
                self.events.push(GameEvent::ShieldAbsorbed { entity: target, amount: absorbed });
            }
        }

        let mut switched = false;
        let mut dead = false;
        if remaining > 0 {
            if let Some(health) = entity.health.as_mut() {
                health.current = (health.current - remaining).max(0);
                dead = health.current == 0;
                let left = health.current;
                self.events.push(GameEvent::DamageTaken {
                    entity: target,
                    amount: remaining,
                    remaining: left,
                });
            }
            if entity.ai == Some(AiBehavior::Passive) {
                entity.ai = Some(AiBehavior::Melee);
                switched = true;
            }
            if target == player_id {
                self.world.last_damage_source = Some(cause.to_owned());
            }
        }

        if shield_broken {
            self.remove_status(target, StatusKind::Shielded);
        }
        if switched {
            self.events
                .push(GameEvent::BehaviorChanged { entity: target, behavior: AiBehavior::Melee });
        }
        if dead {
            self.handle_death(target, attacker);
        }
        remaining
    }

    /// Removes a dead non-player entity and credits the killer. The player's corpse stays
    /// in the world so the final view can still show it.
    pub(crate) fn handle_death(&mut self, id: EntityId, killer: Option<EntityId>) {
        let player_id = self.world.player_id;
        if id == player_id {
            let name = self.world.player().map(|player| player.name.clone()).unwrap_or_default();
            self.events.push(GameEvent::Died { entity: id, name, killer });
            return;
        }
        let Some(dead) = self.world.despawn(id) else {
            return;
        };
        self.events.push(GameEvent::Died { entity: id, name: dead.name.clone(), killer });

        if dead.is_boss() {
            self.world.progress.bosses_killed += 1;
            info!(boss = %dead.name, floor = self.world.floor, "boss defeated");
            if self.world.floor >= self.config.final_floor {
                self.world.final_boss_slain = true;
            }
        }
        if killer == Some(player_id) && dead.is_hostile() {
            self.world.progress.enemies_killed += 1;
            let xp = dead.health.map_or(0, |health| health.max.max(0) as u32);
            self.gain_xp(xp);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::entity::StatusEffect;
    use crate::game::test_support::{arena_world, give_item, spawn_enemy};
    use crate::types::{Pos, TileKind};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]
        #[test]
        fn damage_is_never_negative_and_positive_attacks_always_land(
            seed in any::<u64>(),
            attack in 0_i32..60,
            defense in 0_i32..60,
        ) {
            let config = SimConfig::default();
            let mut rng = SimRng::seed_from_u64(seed);
            let roll = roll_damage(&mut rng, attack, defense, 0.5, &config);
            prop_assert!(roll.damage >= 0);
            if attack > 0 {
                prop_assert!(roll.damage >= 1);
            }
            let raw = (attack - defense).max(0);
            let ceiling = raw + (raw * config.damage_variance_percent / 100).max(1);
            prop_assert!(roll.damage <= (f64::from(ceiling.max(1)) * config.crit_multiplier) as i32);
        }
    }

    #[test]
    fn equipment_and_statuses_shape_effective_stats() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let sword = give_item(&mut world, "Short Sword");
        let mail = give_item(&mut world, "Chain Mail");
        let player = world.player_mut().expect("player");
        let ids: Vec<EntityId> = player
            .inventory
            .as_ref()
            .map(|inv| inv.items.iter().map(|item| item.id).collect())
            .unwrap_or_default();
        if let Some(equipment) = player.equipment.as_mut() {
            equipment.set(EquipSlot::MainHand, ids.get(sword).copied());
            equipment.set(EquipSlot::Body, ids.get(mail).copied());
        }
        assert_eq!(effective_attack(player), 5 + 4);
        assert_eq!(effective_defense(player), 2 + 4);
        assert_eq!(effective_speed(player), 100 - 10);

        player.status_effects.push(StatusEffect {
            kind: StatusKind::Weakened,
            duration: 3,
            magnitude: 0,
            source: "test".to_owned(),
        });
        assert_eq!(effective_attack(player), 6);
        assert_eq!(effective_defense(player), 4);
    }

    #[test]
    fn speed_is_clamped() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let golem = spawn_enemy(&mut world, &config, "Ice Golem", Pos { y: 5, x: 8 });
        let entity = world.get_mut(golem).expect("golem");
        if let Some(combat) = entity.combat.as_mut() {
            combat.base_speed = 15;
        }
        entity.status_effects.push(StatusEffect {
            kind: StatusKind::Slowed,
            duration: 3,
            magnitude: 30,
            source: "test".to_owned(),
        });
        assert_eq!(effective_speed(entity), MIN_SPEED);
    }

    #[test]
    fn shields_absorb_before_health_and_never_go_negative() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_status(player, StatusKind::Shielded, 20, 6, "Potion of Shielding");
        assert_eq!(tick.damage(player, 4, None, "test"), 0);
        let shield = tick.world.player().and_then(|p| p.status(StatusKind::Shielded).cloned());
        assert_eq!(shield.map(|s| s.magnitude), Some(2));
        assert_eq!(tick.damage(player, 5, None, "test"), 3);
        assert!(!tick.world.player().is_some_and(|p| p.has_status(StatusKind::Shielded)));
        let hp = tick.world.player().and_then(|p| p.health).map(|h| h.current);
        assert_eq!(hp, Some(config.player_max_hp - 3));
        assert!(
            tick.events
                .contains(&GameEvent::StatusExpired { entity: player, kind: StatusKind::Shielded })
        );
    }

    #[test]
    fn passive_enemies_turn_hostile_when_hurt() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let mimic = spawn_enemy(&mut world, &config, "Mimic", Pos { y: 5, x: 6 });
        let mut tick = Tick::new(&mut world, &config);
        tick.damage(mimic, 1, None, "test");
        assert_eq!(tick.world.get(mimic).and_then(|m| m.ai), Some(AiBehavior::Melee));
    }

    #[test]
    fn killing_an_enemy_grants_xp_equal_to_its_max_health() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let rat = spawn_enemy(&mut world, &config, "Rat", Pos { y: 5, x: 6 });
        let mut tick = Tick::new(&mut world, &config);
        tick.damage(rat, 100, Some(player), "Player");
        assert!(tick.world.get(rat).is_none());
        assert!(!tick.world.energy.contains_key(&rat));
        assert_eq!(tick.world.progress.xp, 8);
        assert_eq!(tick.world.progress.enemies_killed, 1);
        assert!(tick.events.contains(&GameEvent::XpGained { amount: 8 }));
    }

    #[test]
    fn ranged_attacks_need_a_clear_line() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 2 });
        let player = world.player_id;
        let archer = spawn_enemy(&mut world, &config, "Goblin Archer", Pos { y: 5, x: 7 });
        world.map.set_tile(Pos { y: 5, x: 4 }, TileKind::Wall);
        let mut tick = Tick::new(&mut world, &config);
        tick.attack(archer, player, true, 1.0);
        assert_eq!(tick.events, vec![GameEvent::NoLineOfSight { attacker: archer, target: player }]);
        let hp = tick.world.player().and_then(|p| p.health).map(|h| h.current);
        assert_eq!(hp, Some(config.player_max_hp));
    }

    #[test]
    fn draining_hits_lower_maximum_health() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let player = world.player_id;
        let wraith = spawn_enemy(&mut world, &config, "Wraith", Pos { y: 5, x: 6 });
        let mut tick = Tick::new(&mut world, &config);
        tick.attack(wraith, player, false, 1.0);
        let max = tick.world.player().and_then(|p| p.health).map(|h| h.max);
        assert_eq!(max, Some(config.player_max_hp - 1));
    }
}
