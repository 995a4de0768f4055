//! Experience, level-ups and the end-of-run summary.

use tracing::info;

use super::Tick;
use crate::config::SimConfig;
use crate::events::{GameEvent, RunSummary};
use crate::types::{LevelUpChoice, RunOutcome};
use crate::world::World;

const MAX_HP_STEP: i32 = 10;
const ATTACK_STEP: i32 = 2;
const DEFENSE_STEP: i32 = 2;
const SPEED_STEP: i32 = 15;
const VICTORY_BONUS: u64 = 5_000;

pub fn xp_to_next(world: &World, config: &SimConfig) -> u32 {
    world.progress.level.saturating_mul(config.xp_per_level)
}

impl Tick<'_> {
    pub(crate) fn gain_xp(&mut self, amount: u32) {
        self.world.progress.xp = self.world.progress.xp.saturating_add(amount);
        self.events.push(GameEvent::XpGained { amount });
        loop {
            let threshold = xp_to_next(self.world, self.config);
            if threshold == 0 || self.world.progress.xp < threshold {
                break;
            }
            self.world.progress.xp -= threshold;
            self.world.progress.level += 1;
            self.world.progress.pending_level_ups += 1;
            let level = self.world.progress.level;
            info!(level, "player levelled up");
            self.events.push(GameEvent::LevelUp { level });
        }
    }

    /// Spends one pending level-up. Validation has already checked one is pending.
    pub(crate) fn apply_level_up(&mut self, choice: LevelUpChoice) {
        let progress = &mut self.world.progress;
        if progress.pending_level_ups == 0 {
            return;
        }
        progress.pending_level_ups -= 1;
        let Some(player) = self.world.player_mut() else {
            return;
        };
        match choice {
            LevelUpChoice::MaxHp => {
                if let Some(health) = player.health.as_mut() {
                    health.max += MAX_HP_STEP;
                    health.current += MAX_HP_STEP;
                }
            }
            LevelUpChoice::Attack => {
                if let Some(combat) = player.combat.as_mut() {
                    combat.base_attack += ATTACK_STEP;
                }
            }
            LevelUpChoice::Defense => {
                if let Some(combat) = player.combat.as_mut() {
                    combat.base_defense += DEFENSE_STEP;
                }
            }
            LevelUpChoice::Speed => {
                if let Some(combat) = player.combat.as_mut() {
                    combat.base_speed += SPEED_STEP;
                }
            }
        }
        self.events.push(GameEvent::LevelUpApplied { choice });
    }
}

pub fn score(world: &World, outcome: RunOutcome) -> u64 {
    let progress = &world.progress;
    let mut score = u64::from(world.floor) * 100
        + u64::from(progress.enemies_killed) * 10
        + u64::from(progress.bosses_killed) * 500
        + u64::from(progress.level) * 50;
    if outcome == RunOutcome::Victory {
        score += VICTORY_BONUS;
    }
    score
}

pub fn summarize(world: &World, outcome: RunOutcome) -> RunSummary {
    let floors_cleared = match outcome {
        RunOutcome::Victory => world.floor,
        RunOutcome::Defeat => world.floor.saturating_sub(1),
    };
    RunSummary {
        outcome,
        seed: world.run_seed,
        floor: world.floor,
        floors_cleared,
        level: world.progress.level,
        kills: world.progress.enemies_killed,
        bosses_killed: world.progress.bosses_killed,
        turns: world.turn,
        cause_of_death: match outcome {
            RunOutcome::Defeat => world.last_damage_source.clone(),
            RunOutcome::Victory => None,
        },
        score: score(world, outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::arena_world;
    use crate::types::Pos;

    #[test]
    fn enough_xp_grants_pending_level_ups_and_carries_the_remainder() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        let mut tick = Tick::new(&mut world, &config);
        // 150 for level 2, then 300 for level 3.
        tick.gain_xp(470);
        assert_eq!(tick.world.progress.level, 3);
        assert_eq!(tick.world.progress.xp, 20);
        assert_eq!(tick.world.progress.pending_level_ups, 2);
        let level_events =
            tick.events.iter().filter(|event| matches!(event, GameEvent::LevelUp { .. })).count();
        assert_eq!(level_events, 2);
    }

    #[test]
    fn level_up_choices_raise_the_named_stat() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        world.progress.pending_level_ups = 2;
        let mut tick = Tick::new(&mut world, &config);
        tick.apply_level_up(LevelUpChoice::MaxHp);
        tick.apply_level_up(LevelUpChoice::Speed);
        tick.apply_level_up(LevelUpChoice::Attack);
        let player = tick.world.player().expect("player");
        assert_eq!(player.health.map(|h| (h.current, h.max)), Some((60, 60)));
        assert_eq!(player.combat.map(|c| (c.base_speed, c.base_attack)), Some((115, 5)));
        assert_eq!(tick.world.progress.pending_level_ups, 0);
    }

    #[test]
    fn score_weights_depth_kills_bosses_and_victory() {
        let config = SimConfig::default();
        let mut world = arena_world(&config, Pos { y: 5, x: 5 });
        world.floor = 10;
        world.progress.enemies_killed = 12;
        world.progress.bosses_killed = 3;
        world.progress.level = 6;
        assert_eq!(score(&world, RunOutcome::Defeat), 1_000 + 120 + 1_500 + 300);
        let summary = summarize(&world, RunOutcome::Victory);
        assert_eq!(summary.score, 1_000 + 120 + 1_500 + 300 + 5_000);
        assert_eq!(summary.floors_cleared, 10);
        assert_eq!(summary.cause_of_death, None);
    }
}
