//! Inventory handling and item effects: pickup, drop, equipment and consumables.

use super::Tick;
use super::visibility::line_of_sight;
use crate::entity::{Entity, ItemEffect, PERMANENT};
use crate::events::GameEvent;
use crate::types::{EntityId, EquipSlot, Pos, StatusKind};

impl Tick<'_> {
    pub(crate) fn pick_up(&mut self, item: EntityId) {
        let Some(mut entity) = self.world.despawn(item) else {
            return;
        };
        let name = entity.name.clone();
        entity.pos = Pos { y: 0, x: 0 };
        let Some(inventory) = self.world.player_mut().and_then(|p| p.inventory.as_mut()) else {
            return;
        };
        inventory.items.push(entity);
        self.events.push(GameEvent::ItemPickedUp { item, name });
    }

    pub(crate) fn drop_item(&mut self, index: usize) {
        let Some(player) = self.world.player_mut() else {
            return;
        };
        let pos = player.pos;
        let Some(inventory) = player.inventory.as_mut().filter(|inv| index < inv.items.len())
        else {
            return;
        };
        let mut item = inventory.items.remove(index);
        item.pos = pos;
        let (id, name) = (item.id, item.name.clone());
        self.world.spawn(item);
        self.events.push(GameEvent::ItemDropped { item: id, name });
    }

    /// Puts an inventory item into its slot, swapping out whatever was there.
    /// Equipping an item that is already worn changes nothing.
    pub(crate) fn equip(&mut self, index: usize) {
        let Some((id, slot)) = self.world.player().and_then(|player| {
            let item = player.inventory.as_ref()?.items.get(index)?;
            Some((item.id, item.item?.slot?))
        }) else {
            return;
        };
        let current = self.world.player().and_then(|p| p.equipment.as_ref()?.get(slot));
        if current == Some(id) {
            return;
        }
        if current.is_some() {
            self.unequip(slot);
        }
        if let Some(equipment) = self.world.player_mut().and_then(|p| p.equipment.as_mut()) {
            equipment.set(slot, Some(id));
        }
        self.apply_worn_bonus(id, true);
        self.events.push(GameEvent::ItemEquipped { item: id, slot });
    }

    pub(crate) fn unequip(&mut self, slot: EquipSlot) {
        let Some(id) = self
            .world
            .player_mut()
            .and_then(|p| p.equipment.as_mut())
            .and_then(|equipment| equipment.set(slot, None))
        else {
            return;
        };
        self.apply_worn_bonus(id, false);
        self.events.push(GameEvent::ItemUnequipped { item: id, slot });
    }

    /// Maximum-health and while-worn effects that follow an item on and off the body.
    fn apply_worn_bonus(&mut self, item: EntityId, worn: bool) {
        let player_id = self.world.player_id;
        let Some((name, props)) = self
            .world
            .player()
            .and_then(|p| p.carried(item))
            .and_then(|item| Some((item.name.clone(), item.item?)))
        else {
            return;
        };
        match props.effect {
            Some(ItemEffect::MaxHpBonus) => {
                if let Some(health) = self.world.player_mut().and_then(|p| p.health.as_mut()) {
                    if worn {
                        health.max += props.power;
                        health.current += props.power;
                    } else {
                        health.max = (health.max - props.power).max(1);
                        health.current = health.current.min(health.max);
                    }
                }
            }
            Some(ItemEffect::WhileWorn { kind, magnitude }) => {
                if worn {
                    self.apply_status(player_id, kind, PERMANENT, magnitude, &name);
                } else if self
                    .world
                    .player()
                    .and_then(|p| p.status(kind))
                    .is_some_and(|effect| effect.source == name)
                {
                    self.remove_status(player_id, kind);
                }
            }
            Some(ItemEffect::SightBonus) => {
                if let Some(fov) = self.world.player_mut().and_then(|p| p.fov.as_mut()) {
                    fov.dirty = true;
                }
            }
            _ => {}
        }
    }

    pub(crate) fn use_item(&mut self, index: usize, target: Option<EntityId>) {
        let player_id = self.world.player_id;
        let Some(item) = self
            .world
            .player()
            .and_then(|p| p.inventory.as_ref())
            .and_then(|inventory| inventory.items.get(index))
            .cloned()
        else {
            return;
        };
        let Some(props) = item.item else {
            return;
        };
        let Some(effect) = props.effect else {
            return;
        };

        match effect {
            ItemEffect::Heal(amount) => self.heal(player_id, amount),
            ItemEffect::ApplyStatus { kind, duration, magnitude } => {
                self.apply_status(player_id, kind, duration, magnitude, &item.name);
            }
            ItemEffect::CureStatus => self.cure_negative(player_id),
            ItemEffect::RevealMap => {
                self.world.map.reveal_all();
                self.events.push(GameEvent::MapRevealed);
            }
            ItemEffect::Teleport => self.teleport(player_id),
            ItemEffect::DamageArea { damage, radius } => {
                for id in self.visible_hostiles_within(radius) {
                    self.damage(id, damage, Some(player_id), &item.name);
                }
            }
            ItemEffect::StatusArea { kind, duration, radius } => {
                for id in self.visible_hostiles_within(radius) {
                    self.apply_status(id, kind, duration, 0, &item.name);
                }
            }
            ItemEffect::RangedBolt { damage, status } => {
                let Some(target) = target else {
                    return;
                };
                if !self.fire_bolt(target, damage, status, &item.name) {
                    return;
                }
                self.spend_charge(index, &item);
                return;
            }
            _ => return,
        }

        self.events.push(GameEvent::ItemUsed { item: item.id, name: item.name.clone() });
        if props.kind.is_consumable() {
            self.remove_carried(index);
        }
    }

    /// Returns false when the line is blocked; no charge is spent then.
    fn fire_bolt(
        &mut self,
        target: EntityId,
        damage: i32,
        status: Option<(StatusKind, u32)>,
        source: &str,
    ) -> bool {
        let player_id = self.world.player_id;
        let from = self.world.player_pos();
        let Some(to) = self.world.get(target).map(|entity| entity.pos) else {
            return false;
        };
        if !line_of_sight(&self.world.map, from, to) {
            self.events.push(GameEvent::NoLineOfSight { attacker: player_id, target });
            return false;
        }
        self.events.push(GameEvent::Attacked {
            attacker: player_id,
            target,
            damage,
            critical: false,
            ranged: true,
        });
        self.damage(target, damage, Some(player_id), source);
        if let Some((kind, duration)) = status {
            self.apply_status(target, kind, duration, 0, source);
        }
        true
    }

    fn spend_charge(&mut self, index: usize, item: &Entity) {
        self.events.push(GameEvent::ItemUsed { item: item.id, name: item.name.clone() });
        let remaining = self
            .world
            .player_mut()
            .and_then(|p| p.inventory.as_mut())
            .and_then(|inventory| inventory.items.get_mut(index))
            .and_then(|carried| carried.item.as_mut())
            .and_then(|props| {
                let charges = props.charges.as_mut()?;
                *charges = charges.saturating_sub(1);
                Some(*charges)
            });
        if remaining == Some(0) {
            self.remove_carried(index);
            self.events.push(GameEvent::ItemDepleted { item: item.id, name: item.name.clone() });
        }
    }

    fn remove_carried(&mut self, index: usize) {
        if let Some(inventory) = self.world.player_mut().and_then(|p| p.inventory.as_mut())
            && index < inventory.items.len()
        {
            inventory.items.remove(index);
        }
    }

    /// Living hostiles in the player's current view within Euclidean `radius`, ascending id.
    fn visible_hostiles_within(&self, radius: u32) -> Vec<EntityId> {
        let Some(player) = self.world.player() else {
            return Vec::new();
        };
        let Some(fov) = player.fov.as_ref() else {
            return Vec::new();
        };
        let reach = i64::from(radius) * i64::from(radius);
        self.world
            .hostiles()
            .filter(|entity| fov.visible.contains(&entity.pos))
            .filter(|entity| entity.pos.distance_squared(player.pos) <= reach)
            .map(|entity| entity.id)
            .collect()
    }

    /// A uniformly chosen free floor tile, or `None` on a packed floor.
    pub(crate) fn random_free_floor(&mut self) -> Option<Pos> {
        let free: Vec<Pos> = self
            .world
            .map
            .floor_positions()
            .into_iter()
            .filter(|&pos| self.world.is_free(pos) && self.world.trap_at(pos).is_none())
            .collect();
        self.world.rng.pick(&free).copied()
    }

    /// Moves `id` to a random free floor tile. The player's view is refreshed on arrival.
    pub(crate) fn teleport(&mut self, id: EntityId) {
        let Some(to) = self.random_free_floor() else {
            return;
        };
        let Some(entity) = self.world.get_mut(id) else {
            return;
        };
        let from = entity.pos;
        entity.pos = to;
        if let Some(fov) = entity.fov.as_mut() {
            fov.dirty = true;
        }
        self.events.push(GameEvent::Teleported { entity: id, from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::game::test_support::{arena_world, give_item, place_item, spawn_enemy};
    use crate::game::visibility::compute_fov;
    use crate::types::TileKind;

    fn pack_names(tick: &Tick<'_>) -> Vec<String> {
        tick.world
            .player()
            .and_then(|p| p.inventory.as_ref())
            .map(|inv| inv.items.iter().map(|item| item.name.clone()).collect())
            .unwrap_or_default()
    }

    fn see_everything(tick: &mut Tick<'_>) {
        let pos = tick.world.player_pos();
        let visible = compute_fov(&tick.world.map, pos, 8);
        if let Some(fov) = tick.world.player_mut().and_then(|p| p.fov.as_mut()) {
            fov.visible = visible;
        }
    }

    #[test]
    fn picking_up_and_dropping_moves_items_between_floor_and_pack() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let potion = place_item(&mut world, "Health Potion", Pos { y: 5, x: 5 });
        let mut tick = Tick::new(&mut world, &config);
        tick.pick_up(potion);
        assert!(tick.world.get(potion).is_none());
        assert_eq!(pack_names(&tick), vec!["Health Potion".to_owned()]);

        tick.drop_item(0);
        assert!(pack_names(&tick).is_empty());
        assert_eq!(tick.world.get(potion).map(|e| e.pos), Some(Pos { y: 5, x: 5 }));
    }

    #[test]
    fn potions_are_consumed_and_heal() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let index = give_item(&mut world, "Health Potion");
        if let Some(health) = world.player_mut().and_then(|p| p.health.as_mut()) {
            health.current = 10;
        }
        let mut tick = Tick::new(&mut world, &config);
        tick.use_item(index, None);
        assert_eq!(tick.world.player().and_then(|p| p.health).map(|h| h.current), Some(35));
        assert!(pack_names(&tick).is_empty());
    }

    #[test]
    fn amulets_and_rings_apply_and_withdraw_their_bonuses() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let amulet = give_item(&mut world, "Amulet of Health");
        let ring = give_item(&mut world, "Ring of Regeneration");
        let mut tick = Tick::new(&mut world, &config);
        tick.equip(amulet);
        tick.equip(ring);
        let player = tick.world.player().expect("player");
        assert_eq!(player.health.map(|h| (h.current, h.max)), Some((70, 70)));
        assert_eq!(player.status(StatusKind::Regenerating).map(|e| e.duration), Some(PERMANENT));

        tick.unequip(EquipSlot::Amulet);
        tick.unequip(EquipSlot::Ring);
        let player = tick.world.player().expect("player");
        assert_eq!(player.health.map(|h| (h.current, h.max)), Some((50, 50)));
        assert!(!player.has_status(StatusKind::Regenerating));
    }

    #[test]
    fn equipping_swaps_the_previous_item_out() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let dagger = give_item(&mut world, "Dagger");
        let sword = give_item(&mut world, "Long Sword");
        let mut tick = Tick::new(&mut world, &config);
        tick.equip(dagger);
        tick.equip(sword);
        tick.equip(sword);
        let equipped = tick
            .world
            .player()
            .and_then(|p| p.equipped(EquipSlot::MainHand))
            .map(|item| item.name.clone());
        assert_eq!(equipped.as_deref(), Some("Long Sword"));
        let swaps = tick
            .events
            .iter()
            .filter(|event| matches!(event, GameEvent::ItemUnequipped { .. }))
            .count();
        assert_eq!(swaps, 1);
        assert_eq!(pack_names(&tick).len(), 2, "equipped items stay in the pack");
    }

    #[test]
    fn a_wand_bolt_spends_charges_only_with_a_clear_line() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 2 });
        let orc = spawn_enemy(&mut world, &config, "Orc", Pos { y: 5, x: 6 });
        let wand = give_item(&mut world, "Wand of Lightning");
        let charges = |tick: &Tick<'_>| {
            tick.world
                .player()
                .and_then(|p| p.inventory.as_ref())
                .and_then(|inv| inv.items.get(wand))
                .and_then(|item| item.item)
                .and_then(|props| props.charges)
        };
        let mut tick = Tick::new(&mut world, &config);
        tick.world.map.set_tile(Pos { y: 5, x: 4 }, TileKind::Wall);
        tick.use_item(wand, Some(orc));
        assert_eq!(charges(&tick), Some(5));
        assert!(tick.events.contains(&GameEvent::NoLineOfSight { attacker: tick.world.player_id, target: orc }));

        tick.world.map.set_tile(Pos { y: 5, x: 4 }, TileKind::Floor);
        tick.use_item(wand, Some(orc));
        assert_eq!(charges(&tick), Some(4));
        let hp = tick.world.get(orc).and_then(|e| e.health).map(|h| h.current);
        assert_eq!(hp, Some(30 - 12));
    }

    #[test]
    fn fireball_hits_only_visible_hostiles_in_radius() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 7, x: 5 });
        let near = spawn_enemy(&mut world, &config, "Orc", Pos { y: 7, x: 7 });
        let far = spawn_enemy(&mut world, &config, "Orc", Pos { y: 7, x: 12 });
        let scroll = give_item(&mut world, "Scroll of Fireball");
        let mut tick = Tick::new(&mut world, &config);
        see_everything(&mut tick);
        tick.use_item(scroll, None);
        assert_eq!(tick.world.get(near).and_then(|e| e.health).map(|h| h.current), Some(10));
        assert_eq!(tick.world.get(far).and_then(|e| e.health).map(|h| h.current), Some(30));
        assert!(pack_names(&tick).is_empty());
    }
}
