//! The root aggregate: map, entities keyed by id, energy counters, the run's
//! random stream and progression counters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SimConfig;
use crate::content::{content, make_door, make_enemy, make_item, make_player, make_stairs, make_trap};
use crate::entity::Entity;
use crate::map::Map;
use crate::mapgen::{GeneratedFloor, SpawnKind};
use crate::rng::SimRng;
use crate::types::{EntityId, Pos, TileKind};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub level: u32,
    pub xp: u32,
    pub pending_level_ups: u32,
    pub enemies_killed: u32,
    pub bosses_killed: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    pub run_seed: u64,
    pub floor: u32,
    pub turn: u64,
    pub map: Map,
    /// Ascending-id iteration order is the scheduler's tie-break.
    pub entities: BTreeMap<EntityId, Entity>,
    pub energy: BTreeMap<EntityId, i32>,
    pub rng: SimRng,
    pub player_id: EntityId,
    pub progress: Progress,
    /// Set when the final guardian dies.
    pub final_boss_slain: bool,
    /// Name of whatever last hurt the player.
    pub last_damage_source: Option<String>,
    next_id: u32,
}

impl World {
    /// A world holding only the player, standing on an empty map. Floors are installed separately.
    pub fn new(run_seed: u64, config: &SimConfig) -> Self {
        let player_id = EntityId(0);
        let mut entities = BTreeMap::new();
        entities.insert(player_id, make_player(player_id, Pos { y: 0, x: 0 }, config));
        Self {
            run_seed,
            floor: 0,
            turn: 0,
            map: Map::new(config.map_width, config.map_height),
            entities,
            energy: BTreeMap::new(),
            rng: SimRng::seed_from_u64(run_seed),
            player_id,
            progress: Progress { level: 1, ..Progress::default() },
            final_boss_slain: false,
            last_damage_source: None,
            next_id: 1,
        }
    }

    /// Ids come from a counter that never rewinds, so no id is reused within a run.
    pub fn alloc_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    /// Inserts an entity; actors start with an empty energy counter.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if entity.combat.is_some() && id != self.player_id {
            self.energy.insert(id, 0);
        }
        self.entities.insert(id, entity);
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.energy.remove(&id);
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities.get(&self.player_id)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entities.get_mut(&self.player_id)
    }

    pub fn player_pos(&self) -> Pos {
        self.player().map_or(Pos { y: 0, x: 0 }, |player| player.pos)
    }

    pub fn player_alive(&self) -> bool {
        self.player().is_some_and(Entity::is_alive)
    }

    /// The first movement-blocking entity at `pos`, lowest id first.
    pub fn blocker_at(&self, pos: Pos) -> Option<EntityId> {
        self.entities.values().find(|entity| entity.pos == pos && entity.blocks_movement).map(|e| e.id)
    }

    /// A living actor (anything with health) at `pos`.
    pub fn actor_at(&self, pos: Pos) -> Option<EntityId> {
        self.entities
            .values()
            .find(|entity| entity.pos == pos && entity.is_alive())
            .map(|entity| entity.id)
    }

    /// Floor items lying at `pos`, ascending id.
    pub fn items_at(&self, pos: Pos) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |entity| entity.pos == pos && entity.item.is_some())
    }

    pub fn door_at(&self, pos: Pos) -> Option<EntityId> {
        self.entities
            .values()
            .find(|entity| entity.pos == pos && entity.door.is_some())
            .map(|entity| entity.id)
    }

    pub fn trap_at(&self, pos: Pos) -> Option<EntityId> {
        self.entities
            .values()
            .find(|entity| entity.pos == pos && entity.trap.is_some())
            .map(|entity| entity.id)
    }

    /// Open terrain with nothing standing on it.
    pub fn is_free(&self, pos: Pos) -> bool {
        self.map.in_bounds(pos) && !self.map.blocks_movement(pos) && self.blocker_at(pos).is_none()
    }

    /// Hostile actors other than the player, ascending id.
    pub fn hostiles(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(|entity| entity.is_hostile() && entity.is_alive())
    }

    /// Replaces the map, drops every non-player entity and instantiates the floor's spawns.
    pub fn install_floor(&mut self, generated: GeneratedFloor, config: &SimConfig) {
        let player_id = self.player_id;
        self.entities.retain(|&id, _| id == player_id);
        self.energy.clear();
        self.floor = generated.floor;
        self.map = generated.map;
        if let Some(player) = self.player_mut() {
            player.pos = generated.start;
            if let Some(fov) = player.fov.as_mut() {
                fov.visible.clear();
                fov.spotted.clear();
                fov.dirty = true;
            }
        }

        let floor = generated.floor;
        for spawn in generated.spawns {
            let id = self.alloc_id();
            let entity = match &spawn.kind {
                SpawnKind::Enemy(name) | SpawnKind::Boss(name) => content()
                    .enemy(name)
                    .map(|template| make_enemy(template, id, spawn.pos, floor, config)),
                SpawnKind::Item(name) => {
                    content().item(name).map(|template| make_item(template, id, spawn.pos))
                }
                SpawnKind::Trap(kind) => Some(make_trap(id, spawn.pos, *kind)),
                SpawnKind::LockedDoor => Some(make_door(id, spawn.pos, true)),
                SpawnKind::Stairs => Some(make_stairs(id, spawn.pos)),
            };
            match entity {
                Some(entity) => {
                    self.spawn(entity);
                }
                None => debug!(?spawn, "spawn names no known template"),
            }
        }
    }

    /// Keeps a door entity and the tile beneath it in agreement.
    pub fn set_door_open(&mut self, id: EntityId, open: bool) {
        let Some(door) = self.get_mut(id) else {
            return;
        };
        let pos = door.pos;
        if let Some(state) = door.door.as_mut() {
            state.open = open;
        }
        door.blocks_movement = !open;
        door.blocks_sight = !open;
        door.glyph = if open { '\'' } else { '+' };
        self.map.set_tile(pos, if open { TileKind::DoorOpen } else { TileKind::DoorClosed });
    }
}
