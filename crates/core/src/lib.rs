//! Deterministic simulation core of a seeded dungeon crawler: floor generation,
//! symmetric field of view, energy scheduling, pathfinding and combat resolution.

pub mod config;
pub mod content;
pub mod entity;
pub mod error;
pub mod events;
pub mod flavor;
pub mod game;
pub mod journal;
pub mod journal_file;
pub mod map;
pub mod mapgen;
pub mod replay;
pub mod rng;
pub mod types;
pub mod world;

pub use config::SimConfig;
pub use error::{ActionError, ConfigError, FlavorError, GenerationError, RestoreError};
pub use events::{EntityDetail, GameEvent, RunSummary, TurnResult, WorldView};
pub use flavor::{FlavorCache, FlavorDispatcher, FlavorKey, FlavorRequest, FlavorSource};
pub use game::{Game, SNAPSHOT_FORMAT_VERSION};
pub use journal::{InputJournal, InputRecord};
pub use journal_file::{JournalLoadError, JournalWriter, LoadedJournal, load_journal_from_file};
pub use replay::{ReplayError, ReplayResult, replay_to_end};
pub use types::*;
pub use world::World;
