use delve_core::events::WorldView;
use delve_core::game::roll_damage;
use delve_core::mapgen::{SpawnKind, generate_floor};
use delve_core::rng::SimRng;
use delve_core::{
    ActionError, Direction, Game, GameEvent, LevelUpChoice, PlayerAction, Pos, RoomType,
    SimConfig,
};

const HUNT_STEPS: usize = 400;

fn tile_is_walkable(view: &WorldView, pos: Pos) -> bool {
    view.tiles.iter().any(|tile| tile.pos == pos && tile.kind.is_walkable())
}

/// Walks at the nearest visible creature and attacks it; otherwise drifts around.
fn hunt(view: &WorldView) -> PlayerAction {
    let Some(player) = &view.player else {
        return PlayerAction::Wait;
    };
    if player.pending_level_ups > 0 {
        return PlayerAction::LevelUp(LevelUpChoice::Attack);
    }
    let prey = view
        .entities
        .iter()
        .filter(|entity| entity.id != player.id)
        .filter(|entity| entity.health.is_some_and(|health| health.current > 0))
        .min_by_key(|entity| (entity.pos.chebyshev(player.pos), entity.id));
    let goal = match prey {
        Some(prey) => prey.pos,
        None => player.pos.step(Direction::ALL[(view.turn / 7) as usize % Direction::ALL.len()]),
    };
    Direction::ALL
        .into_iter()
        .filter(|&direction| tile_is_walkable(view, player.pos.step(direction)))
        .min_by_key(|&direction| player.pos.step(direction).chebyshev(goal))
        .map_or(PlayerAction::Wait, PlayerAction::Move)
}

#[test]
fn seed_42_melee_stays_inside_the_damage_envelope() {
    let mut game = Game::start_run(Some(42), SimConfig::default()).expect("floor 1 generates");
    let player = game.world().player_id;
    let mut view = game.view();

    for _ in 0..HUNT_STEPS {
        let attack = view.player.as_ref().map_or(0, |stats| stats.attack);
        let ceiling = (f64::from(attack + (attack / 5).max(1)) * 1.5) as i32;
        let result = match game.submit_action(hunt(&view)) {
            Ok(result) => result,
            Err(ActionError::RunOver) => break,
            Err(_) => game.submit_action(PlayerAction::Wait).expect("waiting is always legal"),
        };

        for event in &result.events {
            match event {
                GameEvent::Attacked { attacker, damage, ranged: false, .. } if *attacker == player => {
                    assert!((1..=ceiling).contains(damage), "damage {damage} outside 1..={ceiling}");
                }
                GameEvent::Died { name, killer: Some(killer), .. }
                    if name == "Rat" && *killer == player =>
                {
                    assert!(result.events.contains(&GameEvent::XpGained { amount: 8 }));
                }
                _ => {}
            }
        }
        view = result.view;
        if game.is_over() {
            break;
        }
    }
}

#[test]
fn a_five_attack_against_an_unarmoured_rat_rolls_four_to_six() {
    let config = SimConfig::default();
    let mut rng = SimRng::seed_from_u64(42);
    for _ in 0..1_000 {
        let roll = roll_damage(&mut rng, 5, 0, config.player_crit_chance, &config);
        if roll.critical {
            assert!((6..=9).contains(&roll.damage), "critical {}", roll.damage);
        } else {
            assert!((4..=6).contains(&roll.damage), "normal {}", roll.damage);
        }
    }
}

#[test]
fn floor_three_gates_its_boss_behind_a_key_found_elsewhere() {
    let config = SimConfig::default();
    for seed in [42_u64, 7, 1_234_567] {
        let generated = generate_floor(seed, 3, &config).expect("floor 3 generates");
        let boss_rooms: Vec<_> = generated
            .map
            .rooms
            .iter()
            .filter(|room| room.room_type == RoomType::Boss)
            .collect();
        assert_eq!(boss_rooms.len(), 1, "seed {seed}");
        let boss_room = boss_rooms[0];

        assert!(generated.spawns_of(|kind| *kind == SpawnKind::LockedDoor).next().is_some());
        let keys: Vec<_> = generated
            .spawns_of(|kind| matches!(kind, SpawnKind::Item(name) if name == "Boss Key"))
            .collect();
        assert_eq!(keys.len(), 1, "seed {seed}");
        assert!(!boss_room.contains(keys[0].pos));
    }
}

#[test]
fn invalid_input_is_rejected_before_the_clock_moves() {
    let mut game = Game::start_run(Some(42), SimConfig::default()).expect("floor 1 generates");
    let before = game.snapshot_hash();
    assert_eq!(game.submit_action(PlayerAction::UseStairs), Err(ActionError::NotOnStairs));
    assert_eq!(
        game.submit_action(PlayerAction::LevelUp(LevelUpChoice::Speed)),
        Err(ActionError::NoPendingLevelUp)
    );
    assert_eq!(game.world().turn, 0);
    assert_eq!(game.snapshot_hash(), before);
}
