use serde::{Deserialize, Serialize};

use crate::types::PlayerAction;

pub const JOURNAL_FORMAT_VERSION: u16 = 1;

/// Identifies the simulation build that recorded a journal.
pub const BUILD_ID: &str = concat!("delve-core ", env!("CARGO_PKG_VERSION"));

/// Every accepted player action of one run, in order. Together with the seed and the
/// config this is enough to rebuild the run exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputJournal {
    pub format_version: u16,
    pub build_id: String,
    pub seed: u64,
    pub inputs: Vec<InputRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    pub action: PlayerAction,
}

impl InputJournal {
    pub fn new(seed: u64) -> Self {
        Self {
            format_version: JOURNAL_FORMAT_VERSION,
            build_id: BUILD_ID.to_string(),
            seed,
            inputs: Vec::new(),
        }
    }

    /// Appends an accepted action under the next sequence number.
    pub fn record(&mut self, action: PlayerAction) -> u64 {
        let seq = self.inputs.len() as u64;
        self.inputs.push(InputRecord { seq, action });
        seq
    }
}
