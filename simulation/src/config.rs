//! Simulation tuning
//!
//! Every constant the scheduler, AI and combat read lives here so a host can
//! load a variant from JSON without recompiling.

use std::path::Path;

use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

use crate::components::{ResourceCost, Resources};
use crate::error::ConfigError;

/// At least a tenth of every enemy strike always lands.
pub const MAX_DAMAGE_REDUCTION: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub starting_resources: Resources,

    // Scheduler
    pub income_interval: u64,
    pub spawn_interval: u64,
    pub spawn_chance: f64,
    pub hero_act_chance: f64,
    pub enemy_act_chance: f64,

    // Heroes
    pub recruit_cost: ResourceCost,
    pub base_experience: u32,
    pub level_multiplier: f64,
    pub hero_base_cooldown: i32,
    pub low_morale_threshold: f32,
    pub morale_decay: f32,
    pub morale_rest_regen: f32,
    pub inn_morale_regen: f32,

    // Hero AI
    pub flag_sight_range: u32,
    pub support_range: u32,
    pub retreat_threshold: f64,
    pub aggression_threshold: f64,
    pub engage_threshold: f64,
    pub collect_threshold: f64,
    pub patrol_move_chance: f64,

    // Enemies
    pub enemy_cooldown: u32,
    pub enemy_seek_chance: f64,

    // Combat
    pub base_crit_chance: f64,
    pub building_support_bonus: f64,
    pub flanking_bonus: f64,
    pub formation_bonus_per_ally: f64,
    pub formation_bonus_cap: f64,
    pub formation_diversity_bonus: f64,
    pub max_damage_reduction: f64,
    pub victory_experience_multiplier: f64,
    /// Share of an enemy's reward paid into the kingdom treasury.
    pub kingdom_reward_share: f64,
    /// Gold the kingdom pays to bring a fallen hero back at its guild.
    /// `None` makes every defeat permanent.
    pub respawn_fee: Option<u32>,
    pub flag_refund_ratio: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 15,
            starting_resources: Resources {
                gold: 500,
                mana: 50,
                supplies: 100,
                population: 0,
                max_population: 0,
            },
            income_interval: 5,
            spawn_interval: 8,
            spawn_chance: 0.5,
            hero_act_chance: 0.8,
            enemy_act_chance: 0.7,
            recruit_cost: ResourceCost { gold: 30, population: 1, ..ResourceCost::default() },
            base_experience: 100,
            level_multiplier: 1.2,
            hero_base_cooldown: 4,
            low_morale_threshold: 20.0,
            morale_decay: 0.1,
            morale_rest_regen: 2.0,
            inn_morale_regen: 1.0,
            flag_sight_range: 7,
            support_range: 3,
            retreat_threshold: 0.3,
            aggression_threshold: 0.7,
            engage_threshold: 40.0,
            collect_threshold: 20.0,
            patrol_move_chance: 0.8,
            enemy_cooldown: 2,
            enemy_seek_chance: 0.7,
            base_crit_chance: 0.05,
            building_support_bonus: 0.10,
            flanking_bonus: 0.25,
            formation_bonus_per_ally: 0.05,
            formation_bonus_cap: 0.20,
            formation_diversity_bonus: 0.10,
            max_damage_reduction: 0.90,
            victory_experience_multiplier: 1.5,
            kingdom_reward_share: 0.5,
            respawn_fee: Some(50),
            flag_refund_ratio: 0.5,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the simulation can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_width < 3 || self.grid_height < 3 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 3x3, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if i32::try_from(self.grid_width).is_err() || i32::try_from(self.grid_height).is_err() {
            return Err(ConfigError::Invalid("grid dimensions overflow i32".into()));
        }
        let probabilities = [
            ("spawn_chance", self.spawn_chance),
            ("hero_act_chance", self.hero_act_chance),
            ("enemy_act_chance", self.enemy_act_chance),
            ("patrol_move_chance", self.patrol_move_chance),
            ("enemy_seek_chance", self.enemy_seek_chance),
            ("base_crit_chance", self.base_crit_chance),
            ("kingdom_reward_share", self.kingdom_reward_share),
            ("flag_refund_ratio", self.flag_refund_ratio),
        ];
        for (name, p) in probabilities {
            Bernoulli::new(p)
                .map_err(|_| ConfigError::Invalid(format!("{name} must be within [0, 1], got {p}")))?;
        }
        if !(0.0..=MAX_DAMAGE_REDUCTION).contains(&self.max_damage_reduction) {
            return Err(ConfigError::Invalid(format!(
                "max_damage_reduction must be within [0, {MAX_DAMAGE_REDUCTION}], got {}",
                self.max_damage_reduction
            )));
        }
        if self.level_multiplier <= 1.0 {
            return Err(ConfigError::Invalid("level_multiplier must exceed 1.0".into()));
        }
        if self.base_experience == 0 {
            return Err(ConfigError::Invalid("base_experience must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SimConfig::from_json_str(r#"{ "grid_width": 30, "respawn_fee": null }"#)
            .expect("valid config");
        assert_eq!(config.grid_width, 30);
        assert_eq!(config.grid_height, 15);
        assert_eq!(config.respawn_fee, None);
    }

    #[test]
    fn test_damage_reduction_cap() {
        let err = SimConfig::from_json_str(r#"{ "max_damage_reduction": 0.95 }"#).unwrap_err();
        assert!(err.to_string().contains("max_damage_reduction"));
        assert!(SimConfig::from_json_str(r#"{ "max_damage_reduction": 0.9 }"#).is_ok());
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = SimConfig::from_json_str(r#"{ "spawn_chance": 1.5 }"#).unwrap_err();
        assert!(err.to_string().contains("spawn_chance"));
    }
}
