//! The typed protocol handed back to the caller: per-tick events, the visible
//! world view, inspection details and the end-of-run summary.

use serde::{Deserialize, Serialize};

use crate::entity::{AiBehavior, Health, ItemProps, RenderOrder, StatusEffect, TrapKind};
use crate::flavor::FlavorKey;
use crate::types::{
    EntityId, EquipSlot, LevelUpChoice, Pos, RunOutcome, StatusKind, TileKind, TileVisibility,
};

/// One discrete thing that happened during a tick, in resolution order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Moved { entity: EntityId, from: Pos, to: Pos },
    Attacked { attacker: EntityId, target: EntityId, damage: i32, critical: bool, ranged: bool },
    NoLineOfSight { attacker: EntityId, target: EntityId },
    DamageTaken { entity: EntityId, amount: i32, remaining: i32 },
    ShieldAbsorbed { entity: EntityId, amount: i32 },
    Healed { entity: EntityId, amount: i32 },
    MaxHealthDrained { entity: EntityId, max: i32 },
    StatusApplied { entity: EntityId, kind: StatusKind, duration: u32 },
    StatusResisted { entity: EntityId, kind: StatusKind },
    StatusExpired { entity: EntityId, kind: StatusKind },
    TurnSkipped { entity: EntityId, reason: StatusKind },
    Died { entity: EntityId, name: String, killer: Option<EntityId> },
    XpGained { amount: u32 },
    LevelUp { level: u32 },
    LevelUpApplied { choice: LevelUpChoice },
    BehaviorChanged { entity: EntityId, behavior: AiBehavior },
    PhaseChanged { entity: EntityId },
    Summoned { summoner: EntityId, minion: EntityId },
    AreaAttack { attacker: EntityId, radius: u32 },
    Teleported { entity: EntityId, from: Pos, to: Pos },
    ItemPickedUp { item: EntityId, name: String },
    ItemDropped { item: EntityId, name: String },
    ItemUsed { item: EntityId, name: String },
    ItemDepleted { item: EntityId, name: String },
    ItemEquipped { item: EntityId, slot: EquipSlot },
    ItemUnequipped { item: EntityId, slot: EquipSlot },
    DoorUnlocked { pos: Pos },
    DoorOpened { pos: Pos },
    TrapTriggered { trap: EntityId, kind: TrapKind, victim: EntityId },
    AlarmRaised { woken: usize },
    MapRevealed,
    FloorChanged { floor: u32 },
    EnemySpotted { entity: EntityId, name: String },
}

/// Immutable record produced once, when the run ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub seed: u64,
    pub floor: u32,
    pub floors_cleared: u32,
    pub level: u32,
    pub kills: u32,
    pub bosses_killed: u32,
    pub turns: u64,
    pub cause_of_death: Option<String>,
    pub score: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub turn: u64,
    pub events: Vec<GameEvent>,
    pub view: WorldView,
    pub outcome: Option<RunSummary>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub pos: Pos,
    pub kind: TileKind,
    pub visibility: TileVisibility,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub name: String,
    pub glyph: char,
    pub pos: Pos,
    pub render_order: RenderOrder,
    pub health: Option<Health>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub index: usize,
    pub id: EntityId,
    pub name: String,
    pub equipped: Option<EquipSlot>,
    pub charges: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub id: EntityId,
    pub pos: Pos,
    pub health: Health,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub pending_level_ups: u32,
    pub inventory: Vec<InventoryEntry>,
    pub equipment: Vec<(EquipSlot, String)>,
    pub statuses: Vec<StatusEffect>,
}

/// What the renderer may know: visible and explored tiles, entities in sight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldView {
    pub floor: u32,
    pub turn: u64,
    pub width: usize,
    pub height: usize,
    /// Row-major; never-explored tiles are omitted.
    pub tiles: Vec<TileView>,
    /// Sorted by render order, then id.
    pub entities: Vec<EntityView>,
    pub player: Option<PlayerStats>,
}

impl WorldView {
    pub fn visibility(&self, pos: Pos) -> TileVisibility {
        self.tiles
            .iter()
            .find(|tile| tile.pos == pos)
            .map_or(TileVisibility::Unexplored, |tile| tile.visibility)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDetail {
    pub id: EntityId,
    pub name: String,
    pub glyph: char,
    pub pos: Pos,
    pub health: Option<Health>,
    pub attack: Option<i32>,
    pub defense: Option<i32>,
    pub speed: Option<i32>,
    pub behavior: Option<AiBehavior>,
    pub statuses: Vec<StatusEffect>,
    pub item: Option<ItemProps>,
    pub flavor: String,
    /// False when `flavor` is authored fallback text and a request may be queued.
    pub flavor_cached: bool,
    pub flavor_key: FlavorKey,
}
