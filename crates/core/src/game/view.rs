//! What the caller may see: the fog-of-war view and per-entity inspection.

use std::collections::BTreeSet;

use super::combat::{effective_attack, effective_defense, effective_speed};
use super::progression::xp_to_next;
use crate::config::SimConfig;
use crate::entity::Entity;
use crate::events::{EntityDetail, EntityView, InventoryEntry, PlayerStats, TileView, WorldView};
use crate::flavor::{FlavorCache, FlavorKey, FlavorSubject, fallback_for};
use crate::types::{EntityId, EquipSlot, Pos, RoomType, TileVisibility};
use crate::world::World;

fn player_visible(world: &World) -> BTreeSet<Pos> {
    world
        .player()
        .and_then(|player| player.fov.as_ref())
        .map(|fov| fov.visible.clone())
        .unwrap_or_default()
}

/// Hidden traps stay hidden even in plain sight.
fn is_shown(entity: &Entity, visible: &BTreeSet<Pos>) -> bool {
    visible.contains(&entity.pos) && entity.trap.is_none_or(|trap| trap.revealed)
}

pub fn build_view(world: &World, config: &SimConfig) -> WorldView {
    let visible = player_visible(world);
    let tiles = world
        .map
        .positions()
        .filter_map(|pos| {
            let visibility = if visible.contains(&pos) {
                TileVisibility::Visible
            } else if world.map.is_explored(pos) {
                TileVisibility::Explored
            } else {
                return None;
            };
            Some(TileView { pos, kind: world.map.tile(pos), visibility })
        })
        .collect();

    let mut entities: Vec<EntityView> = world
        .entities
        .values()
        .filter(|entity| is_shown(entity, &visible))
        .map(|entity| EntityView {
            id: entity.id,
            name: entity.name.clone(),
            glyph: entity.glyph,
            pos: entity.pos,
            render_order: entity.render_order,
            health: entity.health,
        })
        .collect();
    entities.sort_by_key(|entity| (entity.render_order, entity.id));

    WorldView {
        floor: world.floor,
        turn: world.turn,
        width: world.map.width,
        height: world.map.height,
        tiles,
        entities,
        player: player_stats(world, config),
    }
}

fn player_stats(world: &World, config: &SimConfig) -> Option<PlayerStats> {
    let player = world.player()?;
    let inventory = player
        .inventory
        .as_ref()
        .map(|inventory| {
            inventory
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| InventoryEntry {
                    index,
                    id: item.id,
                    name: item.name.clone(),
                    equipped: player.equipment.as_ref().and_then(|e| e.slot_of(item.id)),
                    charges: item.item.and_then(|props| props.charges),
                })
                .collect()
        })
        .unwrap_or_default();
    let equipment = EquipSlot::ALL
        .into_iter()
        .filter_map(|slot| player.equipped(slot).map(|item| (slot, item.name.clone())))
        .collect();
    Some(PlayerStats {
        id: player.id,
        pos: player.pos,
        health: player.health?,
        attack: effective_attack(player),
        defense: effective_defense(player),
        speed: effective_speed(player),
        level: world.progress.level,
        xp: world.progress.xp,
        xp_to_next: xp_to_next(world, config),
        pending_level_ups: world.progress.pending_level_ups,
        inventory,
        equipment,
        statuses: player.status_effects.clone(),
    })
}

/// Flavor identity of an entity: items and hostiles by name, anything else by the room it sits in.
pub fn flavor_key(world: &World, entity: &Entity) -> FlavorKey {
    let (subject, index) = if entity.item.is_some() {
        (FlavorSubject::Item(entity.name.clone()), entity.id.0)
    } else if entity.is_hostile() {
        (FlavorSubject::Enemy(entity.name.clone()), entity.id.0)
    } else {
        let room = world.map.rooms.iter().position(|room| room.contains(entity.pos));
        let room_type = room
            .and_then(|index| world.map.rooms.get(index))
            .map_or(RoomType::Normal, |room| room.room_type);
        (FlavorSubject::Room(room_type), room.map_or(u32::MAX, |index| index as u32))
    };
    FlavorKey { seed: world.run_seed, floor: world.floor, subject, index }
}

/// Details for an entity the player can currently see, or one they carry.
pub fn inspect(world: &World, flavor: &FlavorCache, id: EntityId) -> Option<EntityDetail> {
    let visible = player_visible(world);
    let carried = world.player().and_then(|player| player.carried(id));
    let entity = match carried {
        Some(item) => item,
        None => world.get(id).filter(|entity| is_shown(entity, &visible))?,
    };
    let key = flavor_key(world, entity);
    let (text, cached) = match flavor.get(&key) {
        Some(text) => (text.to_owned(), true),
        None => (fallback_for(&key).to_owned(), false),
    };
    Some(EntityDetail {
        id: entity.id,
        name: entity.name.clone(),
        glyph: entity.glyph,
        pos: entity.pos,
        health: entity.health,
        attack: entity.combat.map(|_| effective_attack(entity)),
        defense: entity.combat.map(|_| effective_defense(entity)),
        speed: entity.combat.map(|_| effective_speed(entity)),
        behavior: entity.ai,
        statuses: entity.status_effects.clone(),
        item: entity.item,
        flavor: text,
        flavor_cached: cached,
        flavor_key: key,
    })
}
