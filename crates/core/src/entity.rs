//! Entity model: a fixed header plus optional capabilities.
//! Behaviour dispatches on which capabilities are present, never on a type hierarchy.

use std::collections::BTreeSet;
use std::mem;

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, EquipSlot, Pos, StatusKind};

/// Duration marker for effects that only end when removed explicitly.
pub const PERMANENT: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub pos: Pos,
    pub glyph: char,
    pub blocks_movement: bool,
    pub blocks_sight: bool,
    pub render_order: RenderOrder,
    pub health: Option<Health>,
    pub combat: Option<CombatStats>,
    pub ai: Option<AiBehavior>,
    pub inventory: Option<Inventory>,
    pub equipment: Option<Equipment>,
    pub item: Option<ItemProps>,
    pub status_effects: Vec<StatusEffect>,
    pub fov: Option<FovCache>,
    pub door: Option<DoorState>,
    pub trap: Option<TrapState>,
    pub stair: Option<StairDirection>,
    pub special: Option<EnemySpecial>,
    /// Own actions taken so far; drives periodic specials.
    pub action_count: u32,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>, pos: Pos, glyph: char) -> Self {
        Self {
            id,
            name: name.into(),
            pos,
            glyph,
            blocks_movement: false,
            blocks_sight: false,
            render_order: RenderOrder::Item,
            health: None,
            combat: None,
            ai: None,
            inventory: None,
            equipment: None,
            item: None,
            status_effects: Vec::new(),
            fov: None,
            door: None,
            trap: None,
            stair: None,
            special: None,
            action_count: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health.as_ref().is_some_and(|health| health.current > 0)
    }

    pub fn is_boss(&self) -> bool {
        matches!(self.ai, Some(AiBehavior::Boss(_)))
    }

    /// Anything with an AI tag is hostile to the player.
    pub fn is_hostile(&self) -> bool {
        self.ai.is_some()
    }

    pub fn status(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.status_effects.iter().find(|effect| effect.kind == kind)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.status(kind).is_some()
    }

    pub fn health_fraction(&self) -> f64 {
        self.health.as_ref().map_or(1.0, Health::fraction)
    }

    /// Looks up an item held in this entity's inventory.
    pub fn carried(&self, id: EntityId) -> Option<&Entity> {
        self.inventory.as_ref()?.items.iter().find(|item| item.id == id)
    }

    pub fn equipped(&self, slot: EquipSlot) -> Option<&Entity> {
        let id = self.equipment.as_ref()?.get(slot)?;
        self.carried(id)
    }

    pub fn is_equipped(&self, id: EntityId) -> bool {
        self.equipment.as_ref().is_some_and(|equipment| equipment.slot_of(id).is_some())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderOrder {
    Trap,
    Door,
    Item,
    Actor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f64 {
        if self.max <= 0 {
            return 0.0;
        }
        f64::from(self.current) / f64::from(self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub base_attack: i32,
    pub base_defense: i32,
    pub base_speed: i32,
    pub crit_chance: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossPhase {
    Phase1,
    Phase2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiBehavior {
    Melee,
    Ranged { range: u32, preferred_distance: u32 },
    Passive,
    Fleeing,
    Boss(BossPhase),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<Entity>,
    pub capacity: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self { items: Vec::new(), capacity }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.items.iter().filter(|item| item.name == name).count()
    }
}

/// Slots reference entries of the owner's inventory by id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub main_hand: Option<EntityId>,
    pub off_hand: Option<EntityId>,
    pub head: Option<EntityId>,
    pub body: Option<EntityId>,
    pub ring: Option<EntityId>,
    pub amulet: Option<EntityId>,
}

impl Equipment {
    pub fn get(&self, slot: EquipSlot) -> Option<EntityId> {
        match slot {
            EquipSlot::MainHand => self.main_hand,
            EquipSlot::OffHand => self.off_hand,
            EquipSlot::Head => self.head,
            EquipSlot::Body => self.body,
            EquipSlot::Ring => self.ring,
            EquipSlot::Amulet => self.amulet,
        }
    }

    pub fn set(&mut self, slot: EquipSlot, item: Option<EntityId>) -> Option<EntityId> {
        let target = match slot {
            EquipSlot::MainHand => &mut self.main_hand,
            EquipSlot::OffHand => &mut self.off_hand,
            EquipSlot::Head => &mut self.head,
            EquipSlot::Body => &mut self.body,
            EquipSlot::Ring => &mut self.ring,
            EquipSlot::Amulet => &mut self.amulet,
        };
        mem::replace(target, item)
    }

    pub fn slot_of(&self, item: EntityId) -> Option<EquipSlot> {
        EquipSlot::ALL.into_iter().find(|&slot| self.get(slot) == Some(item))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon,
    Armor,
    Shield,
    Ring,
    Amulet,
    Potion,
    Scroll,
    Food,
    Wand,
    Key,
}

impl ItemKind {
    /// Used up on use.
    pub fn is_consumable(self) -> bool {
        matches!(self, ItemKind::Potion | ItemKind::Scroll | ItemKind::Food)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    VeryRare,
}

impl Rarity {
    pub fn weight(self) -> u32 {
        match self {
            Rarity::Common => 10,
            Rarity::Uncommon => 5,
            Rarity::Rare => 2,
            Rarity::VeryRare => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    Heal(i32),
    ApplyStatus { kind: StatusKind, duration: u32, magnitude: i32 },
    CureStatus,
    RevealMap,
    Teleport,
    DamageArea { damage: i32, radius: u32 },
    /// Applies a status to every visible hostile within `radius`.
    StatusArea { kind: StatusKind, duration: u32, radius: u32 },
    RangedBolt { damage: i32, status: Option<(StatusKind, u32)> },
    /// Weapon proc applied to the struck target.
    OnHit { kind: StatusKind, duration: u32, magnitude: i32, chance_percent: u32 },
    /// Equipment bonuses scaled by the item's `power`.
    AttackBonus,
    DefenseBonus,
    MaxHpBonus,
    SightBonus,
    WhileWorn { kind: StatusKind, magnitude: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemProps {
    pub kind: ItemKind,
    pub slot: Option<EquipSlot>,
    pub power: i32,
    pub speed_mod: i32,
    pub effect: Option<ItemEffect>,
    pub charges: Option<u32>,
    pub rarity: Rarity,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Remaining turns; `PERMANENT` never counts down.
    pub duration: u32,
    pub magnitude: i32,
    pub source: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FovCache {
    pub radius: i32,
    pub visible: BTreeSet<Pos>,
    /// Hostiles in view at the last refresh, for first-sighting events.
    #[serde(default)]
    pub spotted: BTreeSet<EntityId>,
    pub dirty: bool,
}

impl FovCache {
    pub fn new(radius: i32) -> Self {
        Self { radius, visible: BTreeSet::new(), spotted: BTreeSet::new(), dirty: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorState {
    pub open: bool,
    pub locked: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapKind {
    Spike { damage: i32 },
    Poison { damage: i32, duration: u32 },
    Teleport,
    Alarm,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapState {
    pub kind: TrapKind,
    pub revealed: bool,
    pub triggered: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StairDirection {
    Up,
    Down,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemySpecial {
    PoisonOnHit { damage: i32, duration: u32 },
    BurningOnHit { damage: i32, duration: u32 },
    SlowOnHit { magnitude: i32, duration: u32 },
    ConfuseOnHit { duration: u32 },
    LifeSteal,
    DrainMaxHp,
    Summon { interval: u32, minion: String },
    AreaAttack { interval: u32, radius: u32 },
    TeleportWhenAdjacent,
}
