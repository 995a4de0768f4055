//! Player intents: validation against an unmodified world, then resolution.
//! Everything that can reject an action happens in `validate`, so a rejected
//! action leaves no trace.

use super::Tick;
use super::combat::fov_radius;
use crate::config::SimConfig;
use crate::content::keys;
use crate::entity::{ItemEffect, ItemKind, StairDirection};
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::mapgen::{GeneratedFloor, generate_floor};
use crate::types::{Direction, EntityId, EquipSlot, LevelUpChoice, PlayerAction, Pos, StatusKind};
use crate::world::World;

/// A player action that has passed validation, carrying everything resolution needs.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Intent {
    Attack(EntityId),
    Move(Pos),
    OpenDoor { door: EntityId, key: Option<usize> },
    Wait,
    PickUp(EntityId),
    Descend(Box<GeneratedFloor>),
    UseItem { index: usize, target: Option<EntityId> },
    Drop(usize),
    Equip(usize),
    Unequip(EquipSlot),
    LevelUp(LevelUpChoice),
}

impl Intent {
    /// Level-ups are bookkeeping and never advance the clock.
    pub(crate) fn is_free(&self) -> bool {
        matches!(self, Intent::LevelUp(_))
    }
}

/// The nearest hostile the player can currently see, ties broken by id.
pub(crate) fn nearest_visible_hostile(world: &World) -> Option<EntityId> {
    let player = world.player()?;
    let visible = &player.fov.as_ref()?.visible;
    world
        .hostiles()
        .filter(|entity| visible.contains(&entity.pos))
        .min_by_key(|entity| (entity.pos.chebyshev(player.pos), entity.id))
        .map(|entity| entity.id)
}

pub(crate) fn validate(
    world: &World,
    config: &SimConfig,
    action: &PlayerAction,
) -> Result<Intent, ActionError> {
    let player = world.player().ok_or(ActionError::RunOver)?;
    let inventory = player.inventory.as_ref();
    let carried = |index: usize| {
        inventory
            .and_then(|inventory| inventory.items.get(index))
            .ok_or(ActionError::NoSuchInventorySlot(index))
    };

    match action {
        PlayerAction::Move(direction) => validate_move(world, player.pos, *direction),
        PlayerAction::Wait => Ok(Intent::Wait),
        PlayerAction::PickUp => {
            let item = world.items_at(player.pos).next().ok_or(ActionError::NothingToPickUp)?;
            if inventory.is_none_or(|inventory| inventory.is_full()) {
                return Err(ActionError::InventoryFull);
            }
            Ok(Intent::PickUp(item.id))
        }
        PlayerAction::UseStairs => {
            let on_stairs = world.entities.values().any(|entity| {
                entity.pos == player.pos && entity.stair == Some(StairDirection::Down)
            });
            if !on_stairs {
                return Err(ActionError::NotOnStairs);
            }
            let next = generate_floor(world.run_seed, world.floor + 1, config)?;
            Ok(Intent::Descend(Box::new(next)))
        }
        PlayerAction::UseItem(index) => {
            let item = carried(*index)?;
            let props = item.item.ok_or(ActionError::NotUsable)?;
            if props.slot.is_some() || props.kind == ItemKind::Key {
                return Err(ActionError::NotUsable);
            }
            let target = match props.effect {
                Some(ItemEffect::RangedBolt { .. }) => {
                    Some(nearest_visible_hostile(world).ok_or(ActionError::NoTarget)?)
                }
                Some(_) => None,
                None => return Err(ActionError::NotUsable),
            };
            Ok(Intent::UseItem { index: *index, target })
        }
        PlayerAction::DropItem(index) => {
            let item = carried(*index)?;
            if player.is_equipped(item.id) {
                return Err(ActionError::ItemEquipped);
            }
            Ok(Intent::Drop(*index))
        }
        PlayerAction::EquipItem(index) => {
            let item = carried(*index)?;
            if item.item.and_then(|props| props.slot).is_none() {
                return Err(ActionError::NotEquippable);
            }
            Ok(Intent::Equip(*index))
        }
        PlayerAction::UnequipSlot(slot) => {
            if player.equipment.as_ref().and_then(|equipment| equipment.get(*slot)).is_none() {
                return Err(ActionError::SlotEmpty(*slot));
            }
            Ok(Intent::Unequip(*slot))
        }
        PlayerAction::LevelUp(choice) => {
            if world.progress.pending_level_ups == 0 {
                return Err(ActionError::NoPendingLevelUp);
            }
            Ok(Intent::LevelUp(*choice))
        }
    }
}

fn validate_move(world: &World, from: Pos, direction: Direction) -> Result<Intent, ActionError> {
    let to = from.step(direction);
    if !world.map.in_bounds(to) || !world.map.is_walkable(to) {
        return Err(ActionError::Blocked);
    }
    if let Some(target) = world.hostiles().find(|entity| entity.pos == to) {
        return Ok(Intent::Attack(target.id));
    }
    if let Some(door_id) = world.door_at(to)
        && let Some(door) = world.get(door_id).and_then(|entity| entity.door)
        && !door.open
    {
        if !door.locked {
            return Ok(Intent::OpenDoor { door: door_id, key: None });
        }
        let key = world
            .player()
            .and_then(|player| player.inventory.as_ref())
            .and_then(|inventory| inventory.items.iter().position(|i| i.name == keys::BOSS_KEY))
            .ok_or(ActionError::Blocked)?;
        return Ok(Intent::OpenDoor { door: door_id, key: Some(key) });
    }
    if world.map.blocks_movement(to) || world.blocker_at(to).is_some() {
        return Err(ActionError::Blocked);
    }
    Ok(Intent::Move(to))
}

impl Tick<'_> {
    /// Resolves a validated intent for the player. Stun and confusion are applied here,
    /// on the turn after they landed. A stun only swallows intents that spend a turn.
    pub(crate) fn perform(&mut self, intent: Intent) {
        let player_id = self.world.player_id;
        let Some(player) = self.world.player() else {
            return;
        };
        if !intent.is_free() && player.has_status(StatusKind::Stunned) {
            self.events
                .push(GameEvent::TurnSkipped { entity: player_id, reason: StatusKind::Stunned });
            self.consume_status_turn(player_id, StatusKind::Stunned);
            return;
        }
        let confused = player.has_status(StatusKind::Confused);
        let from = player.pos;

        match intent {
            Intent::Attack(_) | Intent::Move(_) | Intent::OpenDoor { .. } if confused => {
                self.stumble(from);
                self.consume_status_turn(player_id, StatusKind::Confused);
            }
            Intent::Attack(target) => self.attack(player_id, target, false, 1.0),
            Intent::Move(to) => self.move_player(to),
            Intent::OpenDoor { door, key } => self.open_door(door, key),
            Intent::Wait => {}
            Intent::PickUp(item) => self.pick_up(item),
            Intent::Descend(next) => self.descend(*next),
            Intent::UseItem { index, target } => self.use_item(index, target),
            Intent::Drop(index) => self.drop_item(index),
            Intent::Equip(index) => self.equip(index),
            Intent::Unequip(slot) => self.unequip(slot),
            Intent::LevelUp(choice) => self.apply_level_up(choice),
        }
    }

    /// A confused step in a random direction: attacks whatever hostile is there,
    /// otherwise moves if the tile is free.
    fn stumble(&mut self, from: Pos) {
        let Some(&direction) = self.world.rng.pick(&Direction::ALL) else {
            return;
        };
        let to = from.step(direction);
        let player_id = self.world.player_id;
        let target = self.world.hostiles().find(|entity| entity.pos == to).map(|e| e.id);
        if let Some(target) = target {
            self.attack(player_id, target, false, 1.0);
        } else if self.world.is_free(to) {
            self.move_player(to);
        }
    }

    pub(crate) fn move_player(&mut self, to: Pos) {
        let player_id = self.world.player_id;
        let Some(player) = self.world.player_mut() else {
            return;
        };
        let from = player.pos;
        player.pos = to;
        if let Some(fov) = player.fov.as_mut() {
            fov.dirty = true;
        }
        self.events.push(GameEvent::Moved { entity: player_id, from, to });
        if let Some(trap) = self.world.trap_at(to) {
            self.trigger_trap(trap, player_id);
        }
    }

    /// Opens a door the player bumped. A key unlocks every locked door on the floor
    /// and is used up.
    fn open_door(&mut self, door: EntityId, key: Option<usize>) {
        if let Some(index) = key {
            if let Some(inventory) = self.world.player_mut().and_then(|p| p.inventory.as_mut())
                && index < inventory.items.len()
            {
                inventory.items.remove(index);
            }
            let locked: Vec<(EntityId, Pos)> = self
                .world
                .entities
                .values()
                .filter(|entity| entity.door.is_some_and(|state| state.locked))
                .map(|entity| (entity.id, entity.pos))
                .collect();
            for (id, pos) in locked {
                if let Some(state) = self.world.get_mut(id).and_then(|entity| entity.door.as_mut()) {
                    state.locked = false;
                }
                self.events.push(GameEvent::DoorUnlocked { pos });
            }
        }
        let Some(pos) = self.world.get(door).map(|entity| entity.pos) else {
            return;
        };
        self.world.set_door_open(door, true);
        self.events.push(GameEvent::DoorOpened { pos });
    }

    fn descend(&mut self, next: GeneratedFloor) {
        let floor = next.floor;
        self.world.install_floor(next, self.config);
        self.events.push(GameEvent::FloorChanged { floor });
    }

    /// Radius the player currently sees at.
    pub(crate) fn player_fov_radius(&self) -> i32 {
        self.world.player().map_or(self.config.player_fov_radius, |p| fov_radius(p, self.config))
    }
}
