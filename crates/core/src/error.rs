//! Typed failures surfaced by the simulation core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toml::de::Error as TomlError;

use crate::types::EquipSlot;

/// An illegal player intent. Raised before any world mutation, so the world is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("the run is already over")]
    RunOver,
    #[error("no inventory item at index {0}")]
    NoSuchInventorySlot(usize),
    #[error("there are no stairs here")]
    NotOnStairs,
    #[error("there is nothing here to pick up")]
    NothingToPickUp,
    #[error("the inventory is full")]
    InventoryFull,
    #[error("that item cannot be equipped")]
    NotEquippable,
    #[error("that item cannot be used directly")]
    NotUsable,
    #[error("nothing is equipped in {0:?}")]
    SlotEmpty(EquipSlot),
    #[error("unequip the item before dropping it")]
    ItemEquipped,
    #[error("no level-up is pending")]
    NoPendingLevelUp,
    #[error("the way is blocked")]
    Blocked,
    #[error("no target in sight")]
    NoTarget,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("floor {floor} failed validation after {attempts} attempts")]
    RetriesExhausted { floor: u32, attempts: u32 },
}

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("no resumable save: {0}")]
    NoResumableSave(String),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

impl From<serde_json::Error> for RestoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::NoResumableSave(error.to_string())
    }
}

/// Flavor requests fail quietly; callers substitute authored fallback text.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FlavorError {
    #[error("flavor request timed out")]
    Timeout,
    #[error("flavor source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] TomlError),
}
