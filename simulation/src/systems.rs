//! ECS Systems - process entities each tick
//!
//! Systems are free functions over a [`TickContext`], which borrows the
//! pieces of the simulation a tick is allowed to touch.

use rand::RngCore;
use rand_distr::{Bernoulli, Distribution};

use crate::components::{Resources, Statistics};
use crate::config::SimConfig;
use crate::events::{EventBus, GameEvent, GameOverReason};
use crate::registry::Registry;

pub mod combat;
pub mod economy;
pub mod enemy_ai;
pub mod hero_ai;
pub mod movement;
pub mod progression;
pub mod spawning;

pub use combat::{encounter_sweep, resolve_combat, CombatOutcome, CombatReport};
pub use economy::{collect_income, upgrade_building};
pub use enemy_ai::enemy_system;
pub use hero_ai::{engaged_heroes, hero_system, HeroDecision};
pub use progression::{assign_specialization, equip_item, inn_rest_system, level_up};
pub use spawning::spawn_enemy;

/// Mutable view of the simulation for the duration of one system call.
pub struct TickContext<'a> {
    pub config: &'a SimConfig,
    pub registry: &'a mut Registry,
    pub resources: &'a mut Resources,
    pub statistics: &'a mut Statistics,
    pub events: &'a mut EventBus,
    pub rng: &'a mut (dyn RngCore + Send),
    pub game_over: &'a mut Option<GameOverReason>,
    pub tick: u64,
}

impl TickContext<'_> {
    pub fn emit(&mut self, event: GameEvent) {
        self.events.emit(self.tick, event);
    }

    /// Record a terminal condition. The first reason sticks.
    pub fn end_game(&mut self, reason: GameOverReason) {
        if self.game_over.is_none() {
            tracing::info!(tick = self.tick, %reason, "game over");
            *self.game_over = Some(reason);
            self.emit(GameEvent::GameOver { reason });
        }
    }

    /// One Bernoulli trial on the tick's rng. Probabilities outside
    /// `[0, 1]` never pass.
    pub fn roll(&mut self, p: f64) -> bool {
        Bernoulli::new(p).is_ok_and(|trial| trial.sample(&mut *self.rng))
    }

    pub fn is_over(&self) -> bool {
        self.game_over.is_some()
    }

    /// Pay gold into the treasury and count it as earned.
    pub fn earn(&mut self, gold: u32) {
        self.resources.gold = self.resources.gold.saturating_add(gold);
        self.statistics.total_gold_earned += u64::from(gold);
    }
}
