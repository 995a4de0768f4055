use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Parser;
use delve_core::rng::SimRng;
use delve_core::{
    Direction, EquipSlot, Game, LevelUpChoice, PlayerAction, RunOutcome, TileKind, World,
};
use delve_tools::{init_tracing, load_config};
use tracing::{debug, info};

/// Drives random actions through one run and checks world invariants after every turn.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    turns: u32,
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const LEVEL_UP_CHOICES: [LevelUpChoice; 4] =
    [LevelUpChoice::MaxHp, LevelUpChoice::Attack, LevelUpChoice::Defense, LevelUpChoice::Speed];

fn random_action(rng: &mut SimRng, world: &World) -> PlayerAction {
    let carried = world
        .player()
        .and_then(|player| player.inventory.as_ref())
        .map_or(0, |inventory| inventory.items.len());
    let slot = rng.range_usize(0, carried.saturating_sub(1));
    let direction = rng.pick(&Direction::ALL).copied().unwrap_or(Direction::North);
    match rng.below(24) {
        0..=13 => PlayerAction::Move(direction),
        14 | 15 => PlayerAction::Wait,
        16 => PlayerAction::PickUp,
        17 => PlayerAction::UseStairs,
        18 | 19 => PlayerAction::UseItem(slot),
        20 => PlayerAction::EquipItem(slot),
        21 => PlayerAction::DropItem(slot),
        22 => PlayerAction::UnequipSlot(rng.pick(&EquipSlot::ALL).copied().unwrap_or(EquipSlot::MainHand)),
        _ => PlayerAction::LevelUp(
            rng.pick(&LEVEL_UP_CHOICES).copied().unwrap_or(LevelUpChoice::MaxHp),
        ),
    }
}

fn check_invariants(world: &World, explored_before: Option<usize>) -> Result<usize> {
    let mut ids = BTreeSet::new();
    for (&id, entity) in &world.entities {
        ensure!(entity.id == id, "entity {id:?} is stored under the wrong key");
        ids.insert(id);
        if let Some(health) = entity.health {
            ensure!(health.current <= health.max, "{} has {}/{} hp", entity.name, health.current, health.max);
            ensure!(
                world.map.tile(entity.pos) != TileKind::Wall,
                "{} stands inside a wall at {:?}",
                entity.name,
                entity.pos
            );
        }
    }
    let carried = world.player().and_then(|player| player.inventory.as_ref());
    for item in carried.into_iter().flat_map(|inventory| &inventory.items) {
        ensure!(ids.insert(item.id), "id {:?} is both carried and on the floor", item.id);
    }
    ensure!(ids.iter().all(|id| id.0 < world.next_id()), "an id outran the allocator");

    let explored = world.map.explored.iter().filter(|&&explored| explored).count();
    if let Some(before) = explored_before {
        ensure!(explored >= before, "explored tiles shrank from {before} to {explored}");
    }
    Ok(explored)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    info!(seed = args.seed, turns = args.turns, "fuzzing");

    let mut game = Game::start_run(Some(args.seed), config)?;
    let mut rng = SimRng::seed_from_u64(args.seed ^ 0xF022);
    let mut floor = game.world().floor;
    let mut explored = check_invariants(game.world(), None)?;
    let (mut accepted, mut rejected) = (0_u32, 0_u32);

    while game.world().turn < u64::from(args.turns) && !game.is_over() {
        let action = random_action(&mut rng, game.world());
        if let Err(error) = game.submit_action(action.clone()) {
            debug!(?action, %error, "rejected");
            rejected += 1;
            ensure!(rejected < args.turns.saturating_mul(50), "the fuzzer stopped making progress");
            continue;
        }
        accepted += 1;
        let world = game.world();
        let same_floor = world.floor == floor;
        explored = check_invariants(world, same_floor.then_some(explored))?;
        floor = world.floor;
    }

    match game.outcome() {
        Some(summary) => println!(
            "Finished with {:?} on floor {} after {} turns (score {})",
            summary.outcome, summary.floor, summary.turns, summary.score
        ),
        None => println!("Stopped on floor {} at turn {}", game.world().floor, game.world().turn),
    }
    if game.outcome().is_some_and(|summary| summary.outcome == RunOutcome::Defeat)
        && let Some(epitaph) = game.epitaph()
    {
        println!("{epitaph}");
    }
    println!("Accepted {accepted} actions, rejected {rejected}. Invariants held.");
    Ok(())
}
