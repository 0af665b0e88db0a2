//! Error types
//!
//! Command failures are ordinary outcomes reported to the caller; none of them
//! leave the simulation partially mutated.

use thiserror::Error;

use crate::catalog::{HeroClass, Specialization};
use crate::components::{BuildingId, FlagId, HeroId, Position, ResourceCost};

/// Why a player command was refused. `Display` is suitable for a UI message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("{0} is outside the map")]
    OutOfBounds(Position),
    #[error("cell {0} is already occupied")]
    CellOccupied(Position),
    #[error("not enough resources: need {0}")]
    InsufficientResources(ResourceCost),
    #[error("no free housing for another hero")]
    PopulationCap,
    #[error("guild {0} does not exist")]
    UnknownGuild(BuildingId),
    #[error("{0} is not a guild")]
    NotAGuild(BuildingId),
    #[error("building {0} does not exist")]
    UnknownBuilding(BuildingId),
    #[error("hero {0} does not exist")]
    UnknownHero(HeroId),
    #[error("flag {0} does not exist")]
    UnknownFlag(FlagId),
    #[error("no equipment called `{0}`")]
    UnknownItem(String),
    #[error("building {0} is already at its maximum level")]
    MaxLevel(BuildingId),
    #[error("{spec:?} unlocks at level {required}")]
    SpecializationLocked { spec: Specialization, required: u32 },
    #[error("{spec:?} is not available to a {class}")]
    WrongClass { spec: Specialization, class: HeroClass },
    #[error("hero {0} already has a specialization")]
    AlreadySpecialized(HeroId),
    #[error("the game is over")]
    GameOver,
}

/// A grid/registry desync. Unreachable through the public command surface;
/// tests assert it never shows up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryFault {
    #[error("{entity} is stored at {stored} but referenced from cell {cell}")]
    PositionMismatch {
        entity: String,
        stored: Position,
        cell: Position,
    },
    #[error("{entity} is referenced from {count} cells")]
    WrongCellCount { entity: String, count: usize },
    #[error("cell {cell} references missing {entity}")]
    GhostReference { entity: String, cell: Position },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("unsupported save version: {0}")]
    UnsupportedVersion(u8),
    #[error("corrupt save: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
