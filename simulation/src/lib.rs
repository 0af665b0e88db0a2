//! Kingdom Simulation Engine
//!
//! Tick-driven kingdom simulation: buildings on a grid, heroes recruited from
//! guilds, enemies marching on the castle, and the scoring AI and combat that
//! decide each tick.

pub mod catalog;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod names;
pub mod persistence;
pub mod registry;
pub mod spatial;
pub mod systems;
pub mod tick_runner;
pub mod world;

pub use components::*;
pub use config::SimConfig;
pub use error::{CommandError, ConfigError, PersistenceError, RegistryFault};
pub use events::{EventBus, GameEvent, GameOverReason, TimestampedEvent};
pub use persistence::{ImportResult, SaveFormat, WorldSnapshot};
pub use registry::Placed;
pub use tick_runner::TickRunner;
pub use world::{Simulation, TickReport};
