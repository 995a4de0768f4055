use std::fs;

use delve_core::{Direction, Game, PlayerAction, RestoreError, SimConfig};
use tempfile::tempdir;

fn scripted(step: usize) -> PlayerAction {
    match step % 3 {
        2 => PlayerAction::Wait,
        n => PlayerAction::Move(Direction::ALL[(n * 5 + step / 3) % Direction::ALL.len()]),
    }
}

fn advance(game: &mut Game, steps: usize, offset: usize) -> Vec<u64> {
    let mut hashes = Vec::new();
    for step in offset..offset + steps {
        if game.is_over() {
            break;
        }
        if game.submit_action(scripted(step)).is_ok() {
            hashes.push(game.snapshot_hash());
        }
    }
    hashes
}

#[test]
fn a_restored_run_continues_exactly_like_the_original() {
    let mut original = Game::start_run(Some(2_718), SimConfig::default()).unwrap();
    advance(&mut original, 50, 0);

    let dir = tempdir().unwrap();
    let path = dir.path().join("save.json");
    fs::write(&path, original.snapshot().unwrap()).unwrap();
    let mut restored = Game::restore(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(restored.snapshot_hash(), original.snapshot_hash());
    assert_eq!(restored.view(), original.view());

    // The random stream position survives, so the futures match draw for draw.
    assert_eq!(advance(&mut original, 80, 50), advance(&mut restored, 80, 50));
}

#[test]
fn a_restored_run_keeps_its_own_config() {
    let config = SimConfig { player_fov_radius: 4, xp_per_level: 90, ..SimConfig::default() };
    let game = Game::start_run(Some(8), config.clone()).unwrap();
    let restored = Game::restore(&game.snapshot().unwrap()).unwrap();
    assert_eq!(restored.config(), &config);
}

#[test]
fn truncated_saves_are_not_resumable() {
    let game = Game::start_run(Some(8), SimConfig::default()).unwrap();
    let bytes = game.snapshot().unwrap();
    let truncated = &bytes[..bytes.len() / 2];
    assert!(matches!(Game::restore(truncated), Err(RestoreError::NoResumableSave(_))));
}
