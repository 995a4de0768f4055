//! Optional flavor text: authored fallbacks, a serializable cache and an async
//! dispatcher. Nothing in here feeds back into the simulation.

mod cache;
mod dispatcher;
mod templates;

use serde::{Deserialize, Serialize};

pub use cache::{FlavorCache, FlavorEntry};
pub use dispatcher::{FlavorDispatcher, FlavorSource};
pub use templates::{fallback_for, prompt_for};

use crate::types::RoomType;

/// What a piece of flavor text describes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlavorSubject {
    Item(String),
    Enemy(String),
    Room(RoomType),
    Epitaph { cause: String, level: u32 },
}

/// Identifies one flavor line within a run. `index` separates repeats of the same subject.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlavorKey {
    pub seed: u64,
    pub floor: u32,
    pub subject: FlavorSubject,
    pub index: u32,
}

/// A pending generation job handed to [`FlavorDispatcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlavorRequest {
    pub key: FlavorKey,
    pub prompt: String,
}

impl FlavorRequest {
    pub fn for_key(key: FlavorKey) -> Self {
        let prompt = prompt_for(&key);
        Self { key, prompt }
    }
}
