//! Persistence module for export/import of simulation state
//!
//! Serializes the whole game into a [`WorldSnapshot`] and restores it. JSON is
//! the interchange format for hosts; save files default to bincode.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::components::*;
use crate::config::SimConfig;
use crate::error::PersistenceError;
use crate::events::GameOverReason;
use crate::registry::{IdCounters, Placed, Registry};
use crate::world::Simulation;

/// Bumped whenever the snapshot layout changes.
pub const SNAPSHOT_VERSION: u8 = 1;

// ============================================================================
// Export Data Structures
// ============================================================================

/// Complete game state for persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u8,
    pub saved_at: DateTime<Utc>,
    pub config: SimConfig,
    pub tick: u64,
    pub resources: Resources,
    pub statistics: Statistics,
    pub paused: bool,
    pub game_over: Option<GameOverReason>,
    pub counters: IdCounters,
    pub buildings: Vec<Placed<BuildingId, Building>>,
    pub heroes: Vec<Placed<HeroId, Hero>>,
    pub enemies: Vec<Placed<EnemyId, Enemy>>,
    pub flags: Vec<Placed<FlagId, Flag>>,
}

/// Summary of a completed import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub tick: u64,
    pub buildings: usize,
    pub heroes: usize,
    pub enemies: usize,
    pub flags: usize,
}

/// Which encoding a save file uses, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    Bincode,
}

impl SaveFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SaveFormat::Json,
            _ => SaveFormat::Bincode,
        }
    }
}

fn corrupt(err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Corrupt(err.to_string())
}

/// Rebuild a registry from saved entities. Fails on any overlap, out of
/// bounds position or duplicate id.
fn rebuild_registry(snapshot: &WorldSnapshot) -> Result<Registry, PersistenceError> {
    let config = &snapshot.config;
    let mut registry = Registry::new(config.grid_width, config.grid_height);

    for placed in &snapshot.buildings {
        if registry.building(placed.id).is_some() {
            return Err(corrupt(format!("duplicate {}", placed.id)));
        }
        registry
            .spawn_building(Some(placed.id), placed.entity.clone(), placed.position)
            .map_err(|e| corrupt(format!("{}: {e}", placed.id)))?;
    }
    for placed in &snapshot.heroes {
        if registry.contains_hero(placed.id) {
            return Err(corrupt(format!("duplicate {}", placed.id)));
        }
        registry
            .spawn_hero(Some(placed.id), placed.entity.clone(), placed.position)
            .map_err(|e| corrupt(format!("{}: {e}", placed.id)))?;
    }
    for placed in &snapshot.enemies {
        if registry.contains_enemy(placed.id) {
            return Err(corrupt(format!("duplicate {}", placed.id)));
        }
        registry
            .spawn_enemy(Some(placed.id), placed.entity.clone(), placed.position)
            .map_err(|e| corrupt(format!("{}: {e}", placed.id)))?;
    }
    for placed in &snapshot.flags {
        if registry.flag(placed.id).is_some() {
            return Err(corrupt(format!("duplicate {}", placed.id)));
        }
        registry
            .spawn_flag(Some(placed.id), placed.entity.clone(), placed.position)
            .map_err(|e| corrupt(format!("{}: {e}", placed.id)))?;
    }

    registry.restore_counters(snapshot.counters);
    registry.verify().map_err(corrupt)?;
    Ok(registry)
}

// ============================================================================
// Export / Import
// ============================================================================

impl Simulation {
    /// Owned copy of the complete game state.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            config: self.config.clone(),
            tick: self.clock.tick,
            resources: self.resources,
            statistics: self.statistics.clone(),
            paused: self.paused,
            game_over: self.game_over,
            counters: self.registry.counters(),
            buildings: self.registry.buildings(),
            heroes: self.registry.heroes(),
            enemies: self.registry.enemies(),
            flags: self.registry.flags(),
        }
    }

    /// Replace the current game with `snapshot`. Nothing changes unless the
    /// snapshot is valid in full. Subscribers and the rng carry over.
    pub fn restore(&mut self, snapshot: WorldSnapshot) -> Result<ImportResult, PersistenceError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::UnsupportedVersion(snapshot.version));
        }
        snapshot.config.validate().map_err(corrupt)?;
        if snapshot.resources.population > snapshot.resources.max_population {
            return Err(corrupt("population exceeds housing"));
        }
        let registry = rebuild_registry(&snapshot)?;

        let result = ImportResult {
            tick: snapshot.tick,
            buildings: snapshot.buildings.len(),
            heroes: snapshot.heroes.len(),
            enemies: snapshot.enemies.len(),
            flags: snapshot.flags.len(),
        };

        self.config = snapshot.config;
        self.registry = registry;
        self.resources = snapshot.resources;
        self.statistics = snapshot.statistics;
        self.clock = GameClock { tick: snapshot.tick };
        self.paused = snapshot.paused;
        self.game_over = snapshot.game_over;
        self.events.clear();

        info!(tick = result.tick, heroes = result.heroes, enemies = result.enemies, "game restored");
        Ok(result)
    }

    /// Export entire game state to a JSON string
    pub fn export_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Import game state from a JSON string, replacing current state
    pub fn import_json(&mut self, json: &str) -> Result<ImportResult, PersistenceError> {
        let snapshot: WorldSnapshot = serde_json::from_str(json)?;
        self.restore(snapshot)
    }

    /// Write a save file. `.json` paths get JSON, anything else bincode.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<usize, PersistenceError> {
        let path = path.as_ref();
        let snapshot = self.snapshot();
        let bytes = match SaveFormat::for_path(path) {
            SaveFormat::Json => serde_json::to_vec_pretty(&snapshot)?,
            SaveFormat::Bincode => bincode::serialize(&snapshot)?,
        };
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), tick = snapshot.tick, "game saved");
        Ok(bytes.len())
    }

    pub fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<ImportResult, PersistenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let snapshot: WorldSnapshot = match SaveFormat::for_path(path) {
            SaveFormat::Json => serde_json::from_slice(&bytes)?,
            SaveFormat::Bincode => bincode::deserialize(&bytes)?,
        };
        self.restore(snapshot)
    }
}
