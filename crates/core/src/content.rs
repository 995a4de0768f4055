//! Authored enemy, boss and item tables plus the constructors that turn them into entities.

use std::sync::LazyLock;

use crate::config::SimConfig;
use crate::entity::{
    AiBehavior, BossPhase, CombatStats, DoorState, EnemySpecial, Entity, Equipment, FovCache,
    Health, Inventory, ItemEffect, ItemKind, ItemProps, Rarity, RenderOrder, StairDirection,
    TrapKind, TrapState,
};
use crate::rng::SimRng;
use crate::types::{EntityId, EquipSlot, Pos, StatusKind};

pub mod keys {
    pub const BOSS_KEY: &str = "Boss Key";
    pub const HEALTH_POTION: &str = "Health Potion";
    pub const DAGGER: &str = "Dagger";
    pub const GOBLIN_KING: &str = "Goblin King";
    pub const TROLL_WARLORD: &str = "Troll Warlord";
    pub const THE_LICH: &str = "The Lich";
}

pub struct EnemyTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub crit_chance: f64,
    pub ai: AiBehavior,
    pub special: Option<EnemySpecial>,
    pub min_floor: u32,
}

pub struct ItemTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub kind: ItemKind,
    pub slot: Option<EquipSlot>,
    pub power: i32,
    pub speed_mod: i32,
    pub effect: Option<ItemEffect>,
    pub charges: Option<u32>,
    pub min_floor: u32,
    pub rarity: Rarity,
}

pub struct ContentPack {
    pub enemies: Vec<EnemyTemplate>,
    pub bosses: Vec<EnemyTemplate>,
    pub items: Vec<ItemTemplate>,
}

static CONTENT: LazyLock<ContentPack> = LazyLock::new(ContentPack::build_default);

pub fn content() -> &'static ContentPack {
    &CONTENT
}

const fn melee(
    name: &'static str,
    glyph: char,
    (hp, attack, defense, speed): (i32, i32, i32, i32),
    min_floor: u32,
) -> EnemyTemplate {
    EnemyTemplate {
        name,
        glyph,
        hp,
        attack,
        defense,
        speed,
        crit_chance: 0.05,
        ai: AiBehavior::Melee,
        special: None,
        min_floor,
    }
}

const fn gear(
    name: &'static str,
    kind: ItemKind,
    slot: EquipSlot,
    (power, speed_mod): (i32, i32),
    min_floor: u32,
    rarity: Rarity,
) -> ItemTemplate {
    let glyph = match kind {
        ItemKind::Weapon => '/',
        ItemKind::Armor => '[',
        ItemKind::Shield => ')',
        ItemKind::Ring => '=',
        _ => '"',
    };
    ItemTemplate {
        name,
        glyph,
        kind,
        slot: Some(slot),
        power,
        speed_mod,
        effect: None,
        charges: None,
        min_floor,
        rarity,
    }
}

const fn usable(
    name: &'static str,
    kind: ItemKind,
    effect: ItemEffect,
    min_floor: u32,
    rarity: Rarity,
) -> ItemTemplate {
    let glyph = match kind {
        ItemKind::Potion => '!',
        ItemKind::Scroll => '?',
        ItemKind::Food => '%',
        ItemKind::Wand => '|',
        _ => '~',
    };
    ItemTemplate {
        name,
        glyph,
        kind,
        slot: None,
        power: 0,
        speed_mod: 0,
        effect: Some(effect),
        charges: None,
        min_floor,
        rarity,
    }
}

impl ContentPack {
    pub fn build_default() -> Self {
        Self { enemies: default_enemies(), bosses: default_bosses(), items: default_items() }
    }

    pub fn enemy(&self, name: &str) -> Option<&EnemyTemplate> {
        self.enemies.iter().chain(&self.bosses).find(|template| template.name == name)
    }

    pub fn item(&self, name: &str) -> Option<&ItemTemplate> {
        self.items.iter().find(|template| template.name == name)
    }

    /// Rarity-weighted pick among droppable items available on `floor` that satisfy `filter`.
    pub fn pick_item(
        &self,
        rng: &mut SimRng,
        floor: u32,
        filter: impl Fn(&ItemTemplate) -> bool,
    ) -> Option<&ItemTemplate> {
        let pool: Vec<&ItemTemplate> = self
            .items
            .iter()
            .filter(|template| template.min_floor <= floor && template.kind != ItemKind::Key)
            .filter(|template| filter(template))
            .collect();
        let weights: Vec<u32> = pool.iter().map(|template| template.rarity.weight()).collect();
        let index = rng.pick_weighted(&weights)?;
        pool.get(index).copied()
    }

    pub fn pick_enemy(&self, rng: &mut SimRng, floor: u32) -> Option<&EnemyTemplate> {
        let pool = enemy_pool(floor);
        let name = rng.pick(pool)?;
        self.enemy(name)
    }
}

fn default_enemies() -> Vec<EnemyTemplate> {
    vec![
        melee("Rat", 'r', (8, 2, 0, 120), 1),
        melee("Goblin", 'g', (15, 4, 1, 100), 1),
        EnemyTemplate {
            ai: AiBehavior::Ranged { range: 5, preferred_distance: 3 },
            ..melee("Goblin Archer", 'G', (10, 3, 0, 100), 2)
        },
        melee("Skeleton", 's', (18, 5, 3, 90), 3),
        EnemyTemplate {
            special: Some(EnemySpecial::PoisonOnHit { damage: 2, duration: 3 }),
            ..melee("Giant Spider", 'S', (12, 3, 1, 110), 3)
        },
        melee("Orc", 'o', (30, 7, 3, 90), 4),
        EnemyTemplate {
            ai: AiBehavior::Ranged { range: 6, preferred_distance: 4 },
            special: Some(EnemySpecial::ConfuseOnHit { duration: 3 }),
            ..melee("Dark Mage", 'M', (15, 2, 1, 100), 4)
        },
        melee("Cave Troll", 'T', (50, 10, 5, 70), 5),
        EnemyTemplate {
            special: Some(EnemySpecial::LifeSteal),
            ..melee("Vampire Bat", 'b', (12, 4, 0, 130), 4)
        },
        EnemyTemplate { ai: AiBehavior::Passive, ..melee("Mimic", 'm', (25, 8, 3, 100), 5) },
        EnemyTemplate {
            special: Some(EnemySpecial::DrainMaxHp),
            ..melee("Wraith", 'W', (20, 8, 2, 110), 7)
        },
        EnemyTemplate {
            special: Some(EnemySpecial::BurningOnHit { damage: 3, duration: 3 }),
            ..melee("Fire Elemental", 'F', (35, 9, 4, 100), 7)
        },
        EnemyTemplate {
            special: Some(EnemySpecial::SlowOnHit { magnitude: 30, duration: 2 }),
            ..melee("Ice Golem", 'I', (60, 7, 8, 60), 7)
        },
        EnemyTemplate { crit_chance: 0.30, ..melee("Shadow", 'Z', (15, 12, 1, 120), 8) },
        EnemyTemplate {
            ai: AiBehavior::Ranged { range: 6, preferred_distance: 5 },
            special: Some(EnemySpecial::Summon { interval: 5, minion: "Skeleton".to_owned() }),
            ..melee("Necromancer", 'N', (25, 3, 2, 90), 8)
        },
    ]
}

fn default_bosses() -> Vec<EnemyTemplate> {
    let boss = AiBehavior::Boss(BossPhase::Phase1);
    vec![
        EnemyTemplate {
            crit_chance: 0.10,
            ai: boss,
            special: Some(EnemySpecial::Summon { interval: 4, minion: "Goblin".to_owned() }),
            ..melee(keys::GOBLIN_KING, 'K', (80, 8, 4, 100), 3)
        },
        EnemyTemplate {
            crit_chance: 0.10,
            ai: boss,
            special: Some(EnemySpecial::AreaAttack { interval: 3, radius: 2 }),
            ..melee(keys::TROLL_WARLORD, 'W', (150, 14, 7, 80), 6)
        },
        EnemyTemplate {
            crit_chance: 0.15,
            ai: boss,
            special: Some(EnemySpecial::TeleportWhenAdjacent),
            ..melee(keys::THE_LICH, 'L', (120, 10, 5, 100), 10)
        },
    ]
}

fn default_items() -> Vec<ItemTemplate> {
    use EquipSlot::{Amulet, Body, Head, MainHand, OffHand, Ring};
    use ItemKind::{Armor, Food, Potion, Scroll, Shield, Wand, Weapon};
    use Rarity::{Common, Rare, Uncommon, VeryRare};

    let on_hit = |kind, duration, magnitude, chance_percent| {
        Some(ItemEffect::OnHit { kind, duration, magnitude, chance_percent })
    };
    let status = |kind, duration, magnitude| ItemEffect::ApplyStatus { kind, duration, magnitude };
    let wand = |name, damage, bolt_status, charges, min_floor, rarity| ItemTemplate {
        charges: Some(charges),
        ..usable(
            name,
            Wand,
            ItemEffect::RangedBolt { damage, status: bolt_status },
            min_floor,
            rarity,
        )
    };

    vec![
        gear(keys::DAGGER, Weapon, MainHand, (2, 20), 1, Common),
        gear("Short Sword", Weapon, MainHand, (4, 0), 1, Common),
        ItemTemplate {
            effect: on_hit(StatusKind::Stunned, 1, 0, 25),
            ..gear("Mace", Weapon, MainHand, (5, 0), 2, Uncommon)
        },
        gear("Long Sword", Weapon, MainHand, (7, 0), 3, Uncommon),
        gear("War Axe", Weapon, MainHand, (9, -10), 5, Rare),
        gear("Great Sword", Weapon, MainHand, (11, -20), 7, Rare),
        ItemTemplate {
            effect: on_hit(StatusKind::Poison, 4, 2, 100),
            ..gear("Poison Dagger", Weapon, MainHand, (3, 20), 4, Rare)
        },
        ItemTemplate {
            effect: on_hit(StatusKind::Burning, 3, 3, 100),
            ..gear("Flame Blade", Weapon, MainHand, (8, 0), 6, VeryRare)
        },
        ItemTemplate {
            effect: on_hit(StatusKind::Slowed, 3, 30, 100),
            ..gear("Frost Brand", Weapon, MainHand, (8, 0), 6, VeryRare)
        },
        gear("Leather Cap", Armor, Head, (1, 0), 1, Common),
        gear("Iron Helm", Armor, Head, (3, 0), 4, Uncommon),
        gear("Leather Armor", Armor, Body, (2, 0), 1, Common),
        gear("Chain Mail", Armor, Body, (4, -10), 3, Uncommon),
        gear("Plate Armor", Armor, Body, (7, -20), 6, Rare),
        gear("Wooden Shield", Shield, OffHand, (1, 0), 1, Common),
        gear("Iron Shield", Shield, OffHand, (3, 0), 3, Uncommon),
        gear("Tower Shield", Shield, OffHand, (5, -10), 6, Rare),
        ItemTemplate {
            effect: Some(ItemEffect::AttackBonus),
            ..gear("Ring of Strength", ItemKind::Ring, Ring, (2, 0), 3, Rare)
        },
        ItemTemplate {
            effect: Some(ItemEffect::DefenseBonus),
            ..gear("Ring of Protection", ItemKind::Ring, Ring, (2, 0), 3, Rare)
        },
        gear("Ring of Haste", ItemKind::Ring, Ring, (0, 20), 5, VeryRare),
        ItemTemplate {
            effect: Some(ItemEffect::WhileWorn { kind: StatusKind::Regenerating, magnitude: 1 }),
            ..gear("Ring of Regeneration", ItemKind::Ring, Ring, (0, 0), 6, VeryRare)
        },
        ItemTemplate {
            effect: Some(ItemEffect::MaxHpBonus),
            ..gear("Amulet of Health", ItemKind::Amulet, Amulet, (20, 0), 3, Rare)
        },
        ItemTemplate {
            effect: Some(ItemEffect::SightBonus),
            ..gear("Amulet of Vision", ItemKind::Amulet, Amulet, (3, 0), 4, Rare)
        },
        usable(keys::HEALTH_POTION, Potion, ItemEffect::Heal(25), 1, Common),
        usable("Greater Health Potion", Potion, ItemEffect::Heal(50), 4, Uncommon),
        usable("Potion of Strength", Potion, status(StatusKind::Strengthened, 20, 3), 3, Uncommon),
        usable("Potion of Speed", Potion, status(StatusKind::Hasted, 15, 30), 3, Uncommon),
        usable("Potion of Shielding", Potion, status(StatusKind::Shielded, 20, 15), 4, Uncommon),
        usable("Potion of Invisibility", Potion, status(StatusKind::Invisible, 10, 0), 5, Rare),
        usable("Antidote", Potion, ItemEffect::CureStatus, 2, Common),
        usable("Scroll of Reveal", Scroll, ItemEffect::RevealMap, 2, Uncommon),
        usable("Scroll of Teleport", Scroll, ItemEffect::Teleport, 3, Uncommon),
        usable(
            "Scroll of Fireball",
            Scroll,
            ItemEffect::DamageArea { damage: 20, radius: 3 },
            5,
            Rare,
        ),
        usable(
            "Scroll of Confusion",
            Scroll,
            ItemEffect::StatusArea { kind: StatusKind::Confused, duration: 5, radius: 6 },
            4,
            Uncommon,
        ),
        usable("Food Ration", Food, ItemEffect::Heal(15), 1, Common),
        wand("Wand of Fire", 8, Some((StatusKind::Burning, 3)), 8, 4, Rare),
        wand("Wand of Ice", 8, Some((StatusKind::Slowed, 3)), 8, 4, Rare),
        wand("Wand of Lightning", 12, None, 5, 6, VeryRare),
        ItemTemplate {
            glyph: '~',
            kind: ItemKind::Key,
            slot: None,
            power: 0,
            speed_mod: 0,
            effect: None,
            charges: None,
            min_floor: 1,
            rarity: Common,
            name: keys::BOSS_KEY,
        },
    ]
}

pub fn enemy_pool(floor: u32) -> &'static [&'static str] {
    const DEEP: &[&str] = &["Wraith", "Fire Elemental", "Ice Golem", "Shadow", "Necromancer"];
    const CAVES: &[&str] = &["Orc", "Dark Mage", "Cave Troll", "Vampire Bat", "Mimic"];
    match floor {
        0 | 1 => &["Rat", "Goblin"],
        2 => &["Rat", "Goblin", "Goblin Archer"],
        3 => &["Goblin", "Goblin Archer", "Skeleton", "Giant Spider"],
        4 => &["Orc", "Dark Mage", "Vampire Bat"],
        5 | 6 => CAVES,
        7 => &["Wraith", "Fire Elemental", "Ice Golem"],
        8..=10 => DEEP,
        _ => &["Wraith", "Fire Elemental", "Ice Golem", "Shadow", "Necromancer", "Orc", "Cave Troll"],
    }
}

pub fn is_boss_floor(floor: u32, config: &SimConfig) -> bool {
    boss_for_floor(floor, config).is_some()
}

/// Fixed guardians on floors 3 and 6 and the final floor; past the final floor the trio cycles every fifth floor.
pub fn boss_for_floor(floor: u32, config: &SimConfig) -> Option<&'static str> {
    const CYCLE: [&str; 3] = [keys::GOBLIN_KING, keys::TROLL_WARLORD, keys::THE_LICH];
    match floor {
        3 => Some(keys::GOBLIN_KING),
        6 => Some(keys::TROLL_WARLORD),
        f if f == config.final_floor => Some(keys::THE_LICH),
        f if f > config.final_floor && f % 5 == 0 => {
            let index = (f.saturating_sub(config.final_floor + 5) / 5) % 3;
            CYCLE.get(index as usize).copied()
        }
        _ => None,
    }
}

/// Endless-depth multiplier applied to hp, attack and defense.
pub fn endless_multiplier(floor: u32, config: &SimConfig) -> f64 {
    if floor <= config.final_floor {
        return 1.0;
    }
    1.0 + f64::from(floor - config.final_floor) * 0.15
}

pub fn make_player(id: EntityId, pos: Pos, config: &SimConfig) -> Entity {
    let mut player = Entity::new(id, "Player", pos, '@');
    player.blocks_movement = true;
    player.render_order = RenderOrder::Actor;
    player.health = Some(Health::new(config.player_max_hp));
    player.combat = Some(CombatStats {
        base_attack: config.player_attack,
        base_defense: config.player_defense,
        base_speed: config.player_speed,
        crit_chance: config.player_crit_chance,
    });
    player.inventory = Some(Inventory::new(config.inventory_capacity));
    player.equipment = Some(Equipment::default());
    player.fov = Some(FovCache::new(config.player_fov_radius));
    player
}

pub fn make_enemy(
    template: &EnemyTemplate,
    id: EntityId,
    pos: Pos,
    floor: u32,
    config: &SimConfig,
) -> Entity {
    let scale = endless_multiplier(floor, config);
    let scaled = |value: i32| (f64::from(value) * scale) as i32;
    let mut enemy = Entity::new(id, template.name, pos, template.glyph);
    enemy.blocks_movement = true;
    enemy.render_order = RenderOrder::Actor;
    enemy.health = Some(Health::new(scaled(template.hp)));
    enemy.combat = Some(CombatStats {
        base_attack: scaled(template.attack),
        base_defense: scaled(template.defense),
        base_speed: template.speed,
        crit_chance: template.crit_chance,
    });
    enemy.ai = Some(template.ai);
    enemy.special = template.special.clone();
    enemy
}

pub fn make_item(template: &ItemTemplate, id: EntityId, pos: Pos) -> Entity {
    let mut item = Entity::new(id, template.name, pos, template.glyph);
    item.render_order = RenderOrder::Item;
    item.item = Some(ItemProps {
        kind: template.kind,
        slot: template.slot,
        power: template.power,
        speed_mod: template.speed_mod,
        effect: template.effect,
        charges: template.charges,
        rarity: template.rarity,
    });
    item
}

pub fn make_door(id: EntityId, pos: Pos, locked: bool) -> Entity {
    let mut door = Entity::new(id, if locked { "Locked Door" } else { "Door" }, pos, '+');
    door.blocks_movement = true;
    door.blocks_sight = true;
    door.render_order = RenderOrder::Door;
    door.door = Some(DoorState { open: false, locked });
    door
}

pub fn make_trap(id: EntityId, pos: Pos, kind: TrapKind) -> Entity {
    let name = match kind {
        TrapKind::Spike { .. } => "Spike Trap",
        TrapKind::Poison { .. } => "Poison Trap",
        TrapKind::Teleport => "Teleport Trap",
        TrapKind::Alarm => "Alarm Trap",
    };
    let mut trap = Entity::new(id, name, pos, '^');
    trap.render_order = RenderOrder::Trap;
    trap.trap = Some(TrapState { kind, revealed: false, triggered: false });
    trap
}

pub fn make_stairs(id: EntityId, pos: Pos) -> Entity {
    let mut stairs = Entity::new(id, "Stairs Down", pos, '>');
    stairs.render_order = RenderOrder::Door;
    stairs.stair = Some(StairDirection::Down);
    stairs
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn template_names_are_unique() {
        let pack = content();
        let enemies: BTreeSet<&str> =
            pack.enemies.iter().chain(&pack.bosses).map(|template| template.name).collect();
        assert_eq!(enemies.len(), pack.enemies.len() + pack.bosses.len());
        let items: BTreeSet<&str> = pack.items.iter().map(|template| template.name).collect();
        assert_eq!(items.len(), pack.items.len());
    }

    #[test]
    fn every_pool_entry_resolves_to_a_template() {
        for floor in 1..=20 {
            for name in enemy_pool(floor) {
                assert!(content().enemy(name).is_some(), "missing enemy template {name}");
            }
        }
        for template in &content().enemies {
            if let Some(EnemySpecial::Summon { minion, .. }) = &template.special {
                assert!(content().enemy(minion).is_some());
            }
        }
    }

    #[test]
    fn equipment_has_slots_and_usables_have_effects() {
        for template in &content().items {
            match template.kind {
                ItemKind::Weapon
                | ItemKind::Armor
                | ItemKind::Shield
                | ItemKind::Ring
                | ItemKind::Amulet => assert!(template.slot.is_some(), "{}", template.name),
                ItemKind::Potion | ItemKind::Scroll | ItemKind::Food | ItemKind::Wand => {
                    assert!(template.slot.is_none(), "{}", template.name);
                    assert!(template.effect.is_some(), "{}", template.name);
                }
                ItemKind::Key => assert!(template.slot.is_none()),
            }
        }
    }

    #[test]
    fn boss_schedule_matches_fixed_and_endless_floors() {
        let config = SimConfig::default();
        assert_eq!(boss_for_floor(3, &config), Some(keys::GOBLIN_KING));
        assert_eq!(boss_for_floor(6, &config), Some(keys::TROLL_WARLORD));
        assert_eq!(boss_for_floor(10, &config), Some(keys::THE_LICH));
        assert_eq!(boss_for_floor(15, &config), Some(keys::GOBLIN_KING));
        assert_eq!(boss_for_floor(20, &config), Some(keys::TROLL_WARLORD));
        assert_eq!(boss_for_floor(25, &config), Some(keys::THE_LICH));
        for floor in [1, 2, 4, 5, 7, 8, 9, 11, 12, 16] {
            assert_eq!(boss_for_floor(floor, &config), None, "floor {floor}");
        }
    }

    #[test]
    fn item_picks_respect_floor_and_never_yield_keys() {
        let mut rng = SimRng::seed_from_u64(5);
        for _ in 0..200 {
            let template = content().pick_item(&mut rng, 1, |_| true).expect("floor 1 has loot");
            assert!(template.min_floor <= 1);
            assert_ne!(template.kind, ItemKind::Key);
        }
        let potion = content()
            .pick_item(&mut rng, 1, |template| template.kind == ItemKind::Potion)
            .expect("floor 1 has potions");
        assert_eq!(potion.name, keys::HEALTH_POTION);
    }

    #[test]
    fn endless_scaling_only_applies_past_the_final_floor() {
        let config = SimConfig::default();
        let orc = content().enemy("Orc").expect("orc template");
        let shallow = make_enemy(orc, EntityId(1), Pos { y: 0, x: 0 }, 10, &config);
        let deep = make_enemy(orc, EntityId(2), Pos { y: 0, x: 0 }, 12, &config);
        assert_eq!(shallow.health.map(|h| h.max), Some(30));
        assert_eq!(deep.health.map(|h| h.max), Some(39));
        assert_eq!(deep.combat.map(|c| c.base_speed), Some(90));
    }

    #[test]
    fn player_starts_with_configured_stats() {
        let config = SimConfig::default();
        let player = make_player(EntityId(0), Pos { y: 3, x: 3 }, &config);
        assert_eq!(player.health, Some(Health { current: 50, max: 50 }));
        let combat = player.combat.expect("player has combat stats");
        assert_eq!((combat.base_attack, combat.base_defense, combat.base_speed), (5, 2, 100));
        assert_eq!(player.inventory.as_ref().map(|inv| inv.capacity), Some(20));
        assert!(player.ai.is_none());
    }
}
