//! Simulation - main orchestrator
//!
//! Owns every piece of game state and exposes the command, query and event
//! surfaces. Hosts never get live references into the registry; queries hand
//! out owned snapshots.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::info;

use crate::catalog::{BuildingKind, FlagKind, Specialization};
use crate::components::*;
use crate::config::SimConfig;
use crate::error::{CommandError, ConfigError, RegistryFault};
use crate::events::{EventBus, GameOverReason, TimestampedEvent};
use crate::grid::Grid;
use crate::names;
use crate::registry::{Placed, Registry};
use crate::systems::{self, CombatReport, HeroDecision, TickContext};

/// What happened during one call to [`Simulation::advance_tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// False when the tick was skipped because the game is paused or over.
    pub advanced: bool,
    pub decisions: Vec<(HeroId, HeroDecision)>,
    pub combats: Vec<CombatReport>,
    pub income: Option<Production>,
    pub spawned: Option<EnemyId>,
    pub game_over: Option<GameOverReason>,
    pub hero_count: usize,
    pub enemy_count: usize,
}

pub struct Simulation {
    pub(crate) config: SimConfig,
    pub(crate) registry: Registry,
    pub(crate) resources: Resources,
    pub(crate) statistics: Statistics,
    pub(crate) clock: GameClock,
    pub(crate) game_over: Option<GameOverReason>,
    pub(crate) paused: bool,
    pub(crate) events: EventBus,
    rng: Box<dyn RngCore + Send>,
}

impl Simulation {
    /// New game with an entropy-seeded rng.
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, Box::new(StdRng::from_entropy()))
    }

    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, Box::new(StdRng::seed_from_u64(seed)))
    }

    /// New game drawing every random roll from `rng`. Rejects a config that
    /// fails [`SimConfig::validate`].
    pub fn with_rng(config: SimConfig, rng: Box<dyn RngCore + Send>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: SimConfig, rng: Box<dyn RngCore + Send>) -> Self {
        let mut sim = Self {
            registry: Registry::new(config.grid_width, config.grid_height),
            resources: config.starting_resources,
            statistics: Statistics::default(),
            clock: GameClock::default(),
            game_over: None,
            paused: false,
            events: EventBus::default(),
            rng,
            config,
        };
        sim.found_castle();
        sim
    }

    fn found_castle(&mut self) {
        let at = self.registry.grid().center();
        let castle = Building::new(BuildingKind::Castle);
        let housing = castle.housing;
        if self.registry.insert_building(castle, at).is_ok() {
            self.resources.max_population += housing;
        }
    }

    /// Throw away the current game and start over with the same config and
    /// rng stream. Subscribers stay attached.
    pub fn restart(&mut self) {
        info!("restarting game");
        self.registry = Registry::new(self.config.grid_width, self.config.grid_height);
        self.resources = self.config.starting_resources;
        self.statistics = Statistics::default();
        self.clock = GameClock::default();
        self.game_over = None;
        self.paused = false;
        self.events.clear();
        self.found_castle();
    }

    pub(crate) fn context(&mut self) -> TickContext<'_> {
        TickContext {
            config: &self.config,
            registry: &mut self.registry,
            resources: &mut self.resources,
            statistics: &mut self.statistics,
            events: &mut self.events,
            rng: &mut *self.rng,
            game_over: &mut self.game_over,
            tick: self.clock.tick,
        }
    }

    fn ensure_running(&self) -> Result<(), CommandError> {
        if self.game_over.is_some() {
            Err(CommandError::GameOver)
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn place_building(&mut self, kind: BuildingKind, at: Position) -> Result<BuildingId, CommandError> {
        self.ensure_running()?;
        systems::economy::place_building(&mut self.context(), kind, at)
    }

    pub fn place_flag(&mut self, kind: FlagKind, at: Position) -> Result<FlagId, CommandError> {
        self.ensure_running()?;
        systems::economy::place_flag(&mut self.context(), kind, at)
    }

    /// Remove a flag, refunding part of its cost. Returns the refund.
    pub fn cancel_flag(&mut self, id: FlagId) -> Result<u32, CommandError> {
        self.ensure_running()?;
        systems::economy::cancel_flag(&mut self.context(), id)
    }

    pub fn spawn_hero_from_guild(&mut self, guild: BuildingId) -> Result<HeroId, CommandError> {
        self.ensure_running()?;
        let name = names::random_hero_name(&mut *self.rng);
        systems::economy::recruit_hero(&mut self.context(), guild, name)
    }

    /// Returns the building's new level.
    pub fn upgrade_building(&mut self, id: BuildingId) -> Result<u32, CommandError> {
        self.ensure_running()?;
        systems::upgrade_building(&mut self.context(), id)
    }

    /// Buy a catalog item for a hero. Returns the item it replaced.
    pub fn equip_item(&mut self, hero: HeroId, item_id: &str) -> Result<Option<crate::catalog::EquipmentItem>, CommandError> {
        self.ensure_running()?;
        systems::equip_item(&mut self.context(), hero, item_id)
    }

    pub fn assign_specialization(&mut self, hero: HeroId, spec: Specialization) -> Result<(), CommandError> {
        self.ensure_running()?;
        systems::assign_specialization(&mut self.context(), hero, spec)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Run one tick: heroes, enemies, encounters, income, spawning, then the
    /// game-over check. A paused or finished game is left untouched.
    pub fn advance_tick(&mut self) -> TickReport {
        if self.paused || self.game_over.is_some() {
            return TickReport {
                tick: self.clock.tick,
                game_over: self.game_over,
                hero_count: self.registry.hero_count(),
                enemy_count: self.registry.enemy_count(),
                ..TickReport::default()
            };
        }

        self.clock.advance();
        let income_due = self.clock.every(self.config.income_interval);
        let spawn_due = self.clock.every(self.config.spawn_interval);
        let mut report = TickReport {
            tick: self.clock.tick,
            advanced: true,
            ..TickReport::default()
        };

        {
            let mut ctx = self.context();
            report.decisions = systems::hero_system(&mut ctx);
            if !ctx.is_over() {
                systems::enemy_system(&mut ctx);
            }
            if !ctx.is_over() {
                let engaged = systems::engaged_heroes(&report.decisions);
                report.combats = systems::encounter_sweep(&mut ctx, &engaged);
                systems::inn_rest_system(&mut ctx);
            }
            if !ctx.is_over() && income_due {
                report.income = Some(systems::collect_income(&mut ctx));
            }
            if !ctx.is_over() && spawn_due {
                let chance = ctx.config.spawn_chance;
                if ctx.roll(chance) {
                    report.spawned = systems::spawn_enemy(&mut ctx);
                }
            }
            if !ctx.is_over() {
                check_game_over(&mut ctx);
            }
        }

        let heroes = self.registry.hero_count();
        self.statistics.largest_hero_count = self.statistics.largest_hero_count.max(heroes as u32);
        report.game_over = self.game_over;
        report.hero_count = heroes;
        report.enemy_count = self.registry.enemy_count();
        report
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        self.registry.grid()
    }

    pub fn buildings(&self) -> Vec<Placed<BuildingId, Building>> {
        self.registry.buildings()
    }

    pub fn heroes(&self) -> Vec<Placed<HeroId, Hero>> {
        self.registry.heroes()
    }

    pub fn enemies(&self) -> Vec<Placed<EnemyId, Enemy>> {
        self.registry.enemies()
    }

    pub fn flags(&self) -> Vec<Placed<FlagId, Flag>> {
        self.registry.flags()
    }

    pub fn hero(&self, id: HeroId) -> Option<Placed<HeroId, Hero>> {
        let position = self.registry.hero_position(id)?;
        let entity = Hero::clone(&*self.registry.hero(id)?);
        Some(Placed { id, position, entity })
    }

    pub fn resources(&self) -> Resources {
        self.resources
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn tick(&self) -> u64 {
        self.clock.tick
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over
    }

    /// Grid/registry consistency check.
    pub fn verify(&self) -> Result<(), RegistryFault> {
        self.registry.verify()
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&TimestampedEvent) + Send + 'static,
    {
        self.events.subscribe(subscriber);
    }

    pub fn drain_events(&mut self) -> Vec<TimestampedEvent> {
        self.events.drain()
    }

    /// Buffered events not yet drained, oldest first.
    pub fn recent_events(&self) -> Vec<TimestampedEvent> {
        self.events.recent().cloned().collect()
    }
}

/// Terminal if the castle is gone or an enemy stands on or next to it.
fn check_game_over(ctx: &mut TickContext<'_>) {
    let Some((_, castle)) = ctx.registry.castle() else {
        ctx.end_game(GameOverReason::CastleDestroyed);
        return;
    };
    let overrun = ctx
        .registry
        .enemy_ids()
        .into_iter()
        .filter_map(|id| ctx.registry.enemy_position(id))
        .any(|pos| pos.manhattan(castle) <= 1);
    if overrun {
        ctx.end_game(GameOverReason::CastleOverrun);
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::build(SimConfig::default(), Box::new(StdRng::from_entropy()))
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.clock.tick)
            .field("heroes", &self.registry.hero_count())
            .field("enemies", &self.registry.enemy_count())
            .field("resources", &self.resources)
            .field("paused", &self.paused)
            .field("game_over", &self.game_over)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnemyKind, HeroClass};
    use crate::events::GameEvent;
    use rand::rngs::mock::StepRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn new_game() -> Simulation {
        Simulation::with_seed(SimConfig::default(), 42).unwrap()
    }

    #[test]
    fn test_new_game_has_castle_at_center() {
        let sim = new_game();
        let buildings = sim.buildings();
        assert_eq!(buildings.len(), 1);
        assert_eq!(buildings[0].entity.kind, BuildingKind::Castle);
        assert_eq!(buildings[0].position, Position::new(10, 7));
        assert_eq!(sim.resources().gold, 500);
        assert_eq!(sim.resources().max_population, 10);
        sim.verify().unwrap();
    }

    #[test]
    fn test_guild_placement_and_recruit() {
        let mut sim = new_game();
        let guild = sim.place_building(BuildingKind::WarriorGuild, Position::new(3, 3)).unwrap();
        assert_eq!(sim.resources().gold, 400);
        assert_eq!(sim.resources().supplies, 80);

        let hero = sim.spawn_hero_from_guild(guild).unwrap();
        let placed = sim.hero(hero).unwrap();
        assert_eq!(placed.position, Position::new(3, 3));
        assert_eq!(placed.entity.class, crate::catalog::HeroClass::Warrior);
        assert_eq!(placed.entity.health, 100);
        assert_eq!(sim.resources().gold, 370);
        assert_eq!(sim.resources().population, 1);
        assert_eq!(sim.statistics().heroes_recruited, 1);

        let events = sim.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e.event, GameEvent::HeroRecruited { id, .. } if id == hero)));
        sim.verify().unwrap();
    }

    #[test]
    fn test_building_on_castle_cell_fails() {
        let mut sim = new_game();
        let before = sim.resources();
        let castle = sim.grid().center();
        assert_eq!(
            sim.place_building(BuildingKind::Inn, castle),
            Err(CommandError::CellOccupied(castle))
        );
        assert_eq!(sim.resources(), before);
        assert_eq!(sim.buildings().len(), 1);
    }

    #[test]
    fn test_income_arrives_every_fifth_tick() {
        let mut sim = new_game();
        for tick in 1..=5 {
            let report = sim.advance_tick();
            assert_eq!(report.tick, tick);
            assert_eq!(report.income.is_some(), tick == 5);
        }
        assert_eq!(sim.resources().gold, 510);
        assert_eq!(sim.statistics().total_gold_earned, 10);
    }

    #[test]
    fn test_overrun_is_terminal() {
        let mut sim = new_game();
        sim.registry
            .insert_enemy(Enemy::new(EnemyKind::Goblin), Position::new(10, 6))
            .unwrap();

        let report = sim.advance_tick();
        assert_eq!(report.game_over, Some(GameOverReason::CastleOverrun));
        assert!(sim.is_game_over());

        let tick = sim.tick();
        let after = sim.advance_tick();
        assert!(!after.advanced);
        assert_eq!(sim.tick(), tick);
        assert_eq!(
            sim.place_building(BuildingKind::Inn, Position::new(0, 0)),
            Err(CommandError::GameOver)
        );
        assert_eq!(sim.place_flag(FlagKind::Gold, Position::new(0, 0)), Err(CommandError::GameOver));
    }

    #[test]
    fn test_missing_castle_ends_game() {
        let mut sim = new_game();
        let (castle, _) = sim.registry.castle().unwrap();
        sim.registry.remove_building(castle);
        let report = sim.advance_tick();
        assert_eq!(report.game_over, Some(GameOverReason::CastleDestroyed));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut sim = new_game();
        sim.pause();
        assert!(sim.is_paused());
        assert!(!sim.advance_tick().advanced);
        assert_eq!(sim.tick(), 0);

        sim.resume();
        assert!(sim.advance_tick().advanced);
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_restart_clears_the_board() {
        let mut sim = new_game();
        sim.place_building(BuildingKind::Marketplace, Position::new(1, 1)).unwrap();
        for _ in 0..6 {
            sim.advance_tick();
        }
        sim.restart();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.buildings().len(), 1);
        let mut expected = SimConfig::default().starting_resources;
        expected.max_population = 10;
        assert_eq!(sim.resources(), expected);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_subscribers_see_every_event() {
        let mut sim = new_game();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        sim.subscribe(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        sim.place_building(BuildingKind::Inn, Position::new(1, 1)).unwrap();
        sim.place_flag(FlagKind::Explore, Position::new(2, 2)).unwrap();
        assert_eq!(seen.load(Ordering::Relaxed), 2);
        assert_eq!(sim.drain_events().len(), 2);
    }

    #[test]
    fn test_long_seeded_games_stay_consistent() {
        for seed in 0..4 {
            let mut sim = Simulation::with_seed(SimConfig::default(), seed).unwrap();
            let warriors = sim.place_building(BuildingKind::WarriorGuild, Position::new(8, 7)).unwrap();
            let rangers = sim.place_building(BuildingKind::RangerGuild, Position::new(12, 7)).unwrap();
            sim.place_building(BuildingKind::Inn, Position::new(10, 9)).unwrap();
            sim.spawn_hero_from_guild(warriors).unwrap();
            sim.spawn_hero_from_guild(rangers).unwrap();
            sim.place_flag(FlagKind::Attack, Position::new(15, 3)).unwrap();

            for _ in 0..300 {
                let report = sim.advance_tick();
                sim.verify().unwrap();
                let res = sim.resources();
                assert!(res.population <= res.max_population);
                assert_eq!(report.hero_count, sim.heroes().len());
                for hero in sim.heroes() {
                    assert!(hero.entity.health >= 1 && hero.entity.health <= hero.entity.max_health);
                }
                if report.tick % 25 == 0 {
                    let _ = sim.spawn_hero_from_guild(warriors);
                }
                if sim.is_game_over() {
                    break;
                }
            }
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SimConfig::default();
        config.grid_width = 0;
        assert!(matches!(Simulation::with_seed(config, 1), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_hero_beside_enemy_fights_once_per_tick() {
        let mut config = SimConfig::default();
        config.base_crit_chance = 0.0;
        let mut sim = Simulation::with_rng(config, Box::new(StepRng::new(0, 0))).unwrap();
        let at = Position::new(3, 3);
        let hero = Hero::new("Aldric".into(), HeroClass::Warrior, BuildingId(99), at, 100);
        let hero = sim.registry.insert_hero(hero, at).unwrap();
        let mut troll = Enemy::new(EnemyKind::Troll);
        troll.move_cooldown = 5;
        let troll = sim.registry.insert_enemy(troll, at).unwrap();

        let report = sim.advance_tick();
        assert!(report.decisions.contains(&(hero, HeroDecision::Attacking(troll))));
        assert!(report.combats.is_empty());
        assert_eq!(sim.hero(hero).unwrap().entity.combat_history.len(), 1);
        assert_eq!(sim.enemies()[0].entity.health, 100);
    }

    #[test]
    fn test_recent_events_do_not_drain() {
        let mut sim = new_game();
        sim.place_flag(FlagKind::Gold, Position::new(2, 2)).unwrap();
        assert_eq!(sim.recent_events().len(), 1);
        assert_eq!(sim.recent_events().len(), 1);
        assert_eq!(sim.drain_events().len(), 1);
        assert!(sim.recent_events().is_empty());
    }

    #[test]
    fn test_same_seed_same_game() {
        let run = |seed| {
            let mut sim = Simulation::with_seed(SimConfig::default(), seed).unwrap();
            let guild = sim.place_building(BuildingKind::RogueGuild, Position::new(6, 6)).unwrap();
            sim.spawn_hero_from_guild(guild).unwrap();
            for _ in 0..120 {
                sim.advance_tick();
            }
            (sim.tick(), sim.heroes(), sim.enemies(), sim.resources())
        };
        assert_eq!(run(9), run(9));
    }
}
