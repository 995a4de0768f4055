//! Re-runs a recorded journal from its seed and reports where the run ended up.

use thiserror::Error;
use tracing::{debug, info, info_span};

use crate::config::SimConfig;
use crate::error::{ActionError, GenerationError};
use crate::game::Game;
use crate::journal::{InputJournal, JOURNAL_FORMAT_VERSION};
use crate::types::RunOutcome;

#[derive(Debug, PartialEq, Error)]
pub enum ReplayError {
    #[error("unsupported journal version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
    #[error("the first floor could not be rebuilt: {0}")]
    Generation(#[from] GenerationError),
    #[error("input {found} is out of order (expected {expected})")]
    OutOfOrder { expected: u64, found: u64 },
    /// The recorded action is illegal in the replayed world, so the run has diverged.
    #[error("input {seq} was rejected: {source}")]
    Rejected {
        seq: u64,
        #[source]
        source: ActionError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    /// `None` when the journal stops before the run ends.
    pub final_outcome: Option<RunOutcome>,
    pub final_turn: u64,
    pub final_floor: u32,
    pub inputs_applied: u64,
    pub event_count: usize,
    pub final_snapshot_hash: u64,
}

/// Starts a fresh run from the journal's seed and submits every recorded action in order.
pub fn replay_to_end(
    config: &SimConfig,
    journal: &InputJournal,
) -> Result<ReplayResult, ReplayError> {
    let span = info_span!("replay", seed = journal.seed, inputs = journal.inputs.len());
    let _entered = span.enter();
    if journal.format_version != JOURNAL_FORMAT_VERSION {
        return Err(ReplayError::UnsupportedVersion {
            found: journal.format_version,
            expected: JOURNAL_FORMAT_VERSION,
        });
    }

    let mut game = Game::start_run(Some(journal.seed), config.clone())?;
    let mut event_count = 0;
    for (expected, record) in (0_u64..).zip(&journal.inputs) {
        if record.seq != expected {
            return Err(ReplayError::OutOfOrder { expected, found: record.seq });
        }
        let result = game
            .submit_action(record.action.clone())
            .map_err(|source| ReplayError::Rejected { seq: record.seq, source })?;
        debug!(seq = record.seq, events = result.events.len(), "input replayed");
        event_count += result.events.len();
    }

    let replayed = ReplayResult {
        final_outcome: game.outcome().map(|summary| summary.outcome),
        final_turn: game.world().turn,
        final_floor: game.world().floor,
        inputs_applied: journal.inputs.len() as u64,
        event_count,
        final_snapshot_hash: game.snapshot_hash(),
    };
    info!(
        outcome = ?replayed.final_outcome,
        turn = replayed.final_turn,
        hash = replayed.final_snapshot_hash,
        "replay finished"
    );
    Ok(replayed)
}
