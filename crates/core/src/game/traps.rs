//! Hidden traps. Each one fires once, on the first step onto it, and is revealed by firing.

use tracing::debug;

use super::Tick;
use crate::entity::{AiBehavior, TrapKind};
use crate::events::GameEvent;
use crate::types::{EntityId, StatusKind};

impl Tick<'_> {
    pub(crate) fn trigger_trap(&mut self, trap: EntityId, victim: EntityId) {
        let Some(state) = self.world.get_mut(trap).and_then(|entity| entity.trap.as_mut()) else {
            return;
        };
        if state.triggered {
            return;
        }
        state.triggered = true;
        state.revealed = true;
        let kind = state.kind;
        debug!(?trap, ?kind, "trap sprung");
        self.events.push(GameEvent::TrapTriggered { trap, kind, victim });

        match kind {
            TrapKind::Spike { damage } => {
                self.damage(victim, damage, None, "Spike Trap");
            }
            TrapKind::Poison { damage, duration } => {
                self.apply_status(victim, StatusKind::Poison, duration, damage, "Poison Trap");
            }
            TrapKind::Teleport => self.teleport(victim),
            TrapKind::Alarm => self.raise_alarm(),
        }
    }

    /// Every enemy on the floor is primed to act next and stops ignoring the player.
    fn raise_alarm(&mut self) {
        let threshold = self.config.energy_threshold;
        let woken: Vec<EntityId> = self.world.hostiles().map(|entity| entity.id).collect();
        for &id in &woken {
            self.world.energy.insert(id, threshold);
            let Some(entity) = self.world.get_mut(id) else {
                continue;
            };
            if entity.ai == Some(AiBehavior::Passive) {
                entity.ai = Some(AiBehavior::Melee);
                self.events
                    .push(GameEvent::BehaviorChanged { entity: id, behavior: AiBehavior::Melee });
            }
        }
        self.events.push(GameEvent::AlarmRaised { woken: woken.len() });
    }
}
