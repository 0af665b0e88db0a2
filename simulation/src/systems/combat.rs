//! Combat System
//!
//! One exchange between a hero and an enemy: the hero strikes with position,
//! formation and critical modifiers; a surviving enemy strikes back through
//! the hero's damage reduction. Defeats, respawns and rewards are settled
//! here too.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info};

use crate::catalog::{EnemyKind, EquipmentSlot, FlagKind, HeroClass, Specialization};
use crate::components::{
    BuildingId, CombatRecord, CombatResult, EnemyId, Equipment, Hero, HeroId, Position,
};
use crate::config::SimConfig;
use crate::events::GameEvent;
use crate::registry::Registry;
use crate::spatial::{allies_near, hero_sightings, HeroSighting};
use crate::systems::progression::award_experience;
use crate::systems::TickContext;

const HERO_NOISE_MAX: i32 = 4;
const ENEMY_NOISE_MAX: i32 = 2;
const FORMATION_RANGE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatOutcome {
    EnemyDefeated { gold: u32, experience: u32 },
    Exchange { experience: u32 },
    HeroRespawned { fee: u32, at: Position },
    HeroFallen,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatReport {
    pub hero: HeroId,
    pub enemy: EnemyId,
    pub critical: bool,
    /// Hero damage before the noise roll, critical doubling included.
    pub pre_noise: f64,
    pub dealt: i32,
    pub taken: i32,
    pub outcome: CombatOutcome,
}

// ============================================================================
// Modifiers
// ============================================================================

/// +building support when a building stands within one cell of the attacker,
/// +flanking when an ally holds the cell mirrored through the defender.
pub fn position_bonus(
    registry: &Registry,
    config: &SimConfig,
    attacker: HeroId,
    from: Position,
    defender: Position,
) -> f64 {
    let mut bonus = 0.0;
    if registry.buildings_within(from, 1) > 0 {
        bonus += config.building_support_bonus;
    }
    let mirror = Position::new(2 * defender.x - from.x, 2 * defender.y - from.y);
    if mirror != from {
        let flanked = registry
            .grid()
            .cell(mirror)
            .and_then(|c| c.hero)
            .is_some_and(|h| h != attacker);
        if flanked {
            bonus += config.flanking_bonus;
        }
    }
    bonus
}

/// Per-ally bonus up to a cap, plus a diversity bonus for mixed classes.
pub fn formation_bonus(
    heroes: &[HeroSighting],
    config: &SimConfig,
    attacker: HeroId,
    from: Position,
) -> f64 {
    let allies = allies_near(heroes, attacker, from, FORMATION_RANGE);
    if allies.is_empty() {
        return 0.0;
    }
    let mut bonus = (config.formation_bonus_per_ally * allies.len() as f64).min(config.formation_bonus_cap);
    let first: HeroClass = allies[0].class;
    if allies.iter().any(|a| a.class != first) {
        bonus += config.formation_diversity_bonus;
    }
    bonus
}

pub fn crit_chance(
    config: &SimConfig,
    class: HeroClass,
    equipment: &Equipment,
    specialization: Option<Specialization>,
) -> f64 {
    let weapon = equipment.slot(EquipmentSlot::Weapon).map_or(0.0, |w| w.rarity.crit_bonus());
    let spec = specialization.map_or(0.0, Specialization::crit_bonus);
    (config.base_crit_chance + class.crit_bonus() + weapon + spec).clamp(0.0, 1.0)
}

pub fn damage_reduction(
    config: &SimConfig,
    class: HeroClass,
    equipment: &Equipment,
    specialization: Option<Specialization>,
) -> f64 {
    let armor = equipment.slot(EquipmentSlot::Armor).map_or(0.0, |a| a.rarity.damage_reduction());
    let spec = specialization.map_or(0.0, Specialization::defense_bonus);
    (armor + class.defense_bonus() + spec).min(config.max_damage_reduction)
}

pub fn pre_noise_damage(damage: i32, bonus: f64, critical: bool) -> f64 {
    let crit = if critical { 2.0 } else { 1.0 };
    f64::from(damage.max(0)) * (1.0 + bonus) * crit
}

pub fn counter_damage(enemy_damage: i32, reduction: f64, noise: i32) -> i32 {
    ((f64::from(enemy_damage.max(0)) * (1.0 - reduction)).floor() as i32 + noise).max(0)
}

// ============================================================================
// Resolution
// ============================================================================

/// What the resolver needs to know about the hero, read once up front.
struct Attacker {
    id: HeroId,
    name: String,
    class: HeroClass,
    guild: BuildingId,
    damage: i32,
    crit_chance: f64,
    reduction: f64,
}

impl Attacker {
    fn read(id: HeroId, hero: &Hero, config: &SimConfig) -> Self {
        Self {
            id,
            name: hero.name.clone(),
            class: hero.class,
            guild: hero.guild,
            damage: hero.damage,
            crit_chance: crit_chance(config, hero.class, &hero.equipment, hero.specialization),
            reduction: damage_reduction(config, hero.class, &hero.equipment, hero.specialization),
        }
    }
}

/// Damage both ways in one exchange.
#[derive(Debug, Clone, Copy)]
struct Strike {
    dealt: i32,
    taken: i32,
    critical: bool,
}

/// Settle one exchange. `None` if either side is already gone.
pub fn resolve_combat(ctx: &mut TickContext<'_>, hero_id: HeroId, enemy_id: EnemyId) -> Option<CombatReport> {
    let hero_pos = ctx.registry.hero_position(hero_id)?;
    let enemy_pos = ctx.registry.enemy_position(enemy_id)?;
    let attacker = Attacker::read(hero_id, &*ctx.registry.hero(hero_id)?, ctx.config);
    let (enemy_kind, enemy_damage, reward) = {
        let enemy = ctx.registry.enemy(enemy_id)?;
        (enemy.kind, enemy.damage, enemy.reward)
    };

    let heroes = hero_sightings(ctx.registry);
    let bonus = position_bonus(ctx.registry, ctx.config, hero_id, hero_pos, enemy_pos)
        + formation_bonus(&heroes, ctx.config, hero_id, hero_pos);
    let critical = ctx.roll(attacker.crit_chance);
    let pre_noise = pre_noise_damage(attacker.damage, bonus, critical);
    let noise = ctx.rng.gen_range(0..=HERO_NOISE_MAX);
    let dealt = ((pre_noise + f64::from(noise)).floor() as i32).max(0);

    let enemy_health = {
        let enemy = ctx.registry.enemy_mut(enemy_id)?;
        enemy.health -= dealt;
        enemy.health
    };
    debug!(hero = %hero_id, enemy = %enemy_id, dealt, critical, bonus, "hero strikes");

    let mut report = CombatReport {
        hero: hero_id,
        enemy: enemy_id,
        critical,
        pre_noise,
        dealt,
        taken: 0,
        outcome: CombatOutcome::HeroFallen,
    };

    if enemy_health <= 0 {
        let strike = Strike { dealt, taken: 0, critical };
        report.outcome = defeat_enemy(ctx, &attacker, enemy_id, enemy_kind, enemy_pos, reward, strike);
        return Some(report);
    }

    let noise = ctx.rng.gen_range(0..=ENEMY_NOISE_MAX);
    let taken = counter_damage(enemy_damage, attacker.reduction, noise);
    report.taken = taken;
    let hero_health = {
        let hero = ctx.registry.hero_mut(hero_id)?;
        hero.health -= taken;
        hero.adjust_morale(-2.0);
        hero.health
    };
    debug!(hero = %hero_id, enemy = %enemy_id, taken, "enemy strikes back");

    ctx.emit(GameEvent::CombatExchange {
        hero: hero_id,
        enemy: enemy_id,
        dealt,
        taken,
        critical,
    });

    let strike = Strike { dealt, taken, critical };
    if hero_health <= 0 {
        report.outcome = defeat_hero(ctx, &attacker, enemy_kind, strike);
        return Some(report);
    }

    let experience = (dealt / 4).max(1) as u32;
    push_record(ctx, hero_id, enemy_kind, CombatResult::Exchange, strike, experience);
    award_experience(ctx, hero_id, experience);
    report.outcome = CombatOutcome::Exchange { experience };
    Some(report)
}

fn combat_record(
    tick: u64,
    enemy: EnemyKind,
    result: CombatResult,
    strike: Strike,
    experience_gained: u32,
) -> CombatRecord {
    CombatRecord {
        tick,
        enemy,
        result,
        damage_dealt: strike.dealt,
        damage_taken: strike.taken,
        critical: strike.critical,
        experience_gained,
    }
}

fn push_record(
    ctx: &mut TickContext<'_>,
    hero_id: HeroId,
    enemy: EnemyKind,
    result: CombatResult,
    strike: Strike,
    experience_gained: u32,
) {
    let record = combat_record(ctx.tick, enemy, result, strike, experience_gained);
    if let Some(hero) = ctx.registry.hero_mut(hero_id) {
        hero.combat_history.push(record);
    }
}

fn defeat_enemy(
    ctx: &mut TickContext<'_>,
    attacker: &Attacker,
    enemy_id: EnemyId,
    kind: EnemyKind,
    at: Position,
    reward: u32,
    strike: Strike,
) -> CombatOutcome {
    let hero_id = attacker.id;
    let experience = (f64::from(reward) * ctx.config.victory_experience_multiplier).floor() as u32;
    let share = (f64::from(reward) * ctx.config.kingdom_reward_share).floor() as u32;

    if let Some(hero) = ctx.registry.hero_mut(hero_id) {
        hero.gold = hero.gold.saturating_add(reward);
        hero.adjust_morale(10.0);
    }
    ctx.earn(share);
    push_record(ctx, hero_id, kind, CombatResult::Victory, strike, experience);

    ctx.registry.remove_enemy(enemy_id);
    ctx.statistics.enemies_defeated += 1;
    info!(hero = %hero_id, enemy = %enemy_id, %kind, reward, "enemy defeated");
    ctx.emit(GameEvent::EnemyDefeated {
        enemy: enemy_id,
        kind,
        hero: hero_id,
        hero_name: attacker.name.clone(),
        gold: reward,
        experience,
    });

    complete_attack_flag(ctx, attacker, at);
    award_experience(ctx, hero_id, experience);
    CombatOutcome::EnemyDefeated { gold: reward, experience }
}

/// An attack flag on the battlefield pays out to both hero and kingdom.
fn complete_attack_flag(ctx: &mut TickContext<'_>, attacker: &Attacker, at: Position) {
    let hero_id = attacker.id;
    let Some(flag_id) = ctx.registry.grid().cell(at).and_then(|c| c.flag) else {
        return;
    };
    let is_attack = ctx
        .registry
        .flag(flag_id)
        .is_some_and(|f| f.kind == FlagKind::Attack);
    if !is_attack {
        return;
    }
    let Some(flag) = ctx.registry.remove_flag(flag_id) else {
        return;
    };
    if let Some(hero) = ctx.registry.hero_mut(hero_id) {
        hero.gold = hero.gold.saturating_add(flag.reward);
    }
    ctx.earn(flag.reward);
    ctx.statistics.flags_collected += 1;
    ctx.emit(GameEvent::FlagCollected {
        id: flag_id,
        kind: flag.kind,
        hero: hero_id,
        hero_name: attacker.name.clone(),
        reward: flag.reward,
    });
}

/// Respawn at the guild for a fee when possible, otherwise the hero is lost.
fn defeat_hero(ctx: &mut TickContext<'_>, attacker: &Attacker, by: EnemyKind, strike: Strike) -> CombatOutcome {
    let hero_id = attacker.id;
    if let Some((fee, at)) = try_respawn(ctx, attacker) {
        push_record(ctx, hero_id, by, CombatResult::Respawned, strike, 0);
        info!(hero = %hero_id, fee, %at, "hero respawned at guild");
        ctx.emit(GameEvent::HeroRespawned {
            id: hero_id,
            name: attacker.name.clone(),
            fee,
            position: at,
        });
        return CombatOutcome::HeroRespawned { fee, at };
    }

    // The hero leaves with its history, so the final record rides on the event.
    let record = combat_record(ctx.tick, by, CombatResult::Fallen, strike, 0);
    ctx.registry.remove_hero(hero_id);
    ctx.resources.release_population(ctx.config.recruit_cost.population);
    ctx.statistics.heroes_lost += 1;
    info!(hero = %hero_id, enemy = %by, "hero has fallen");
    ctx.emit(GameEvent::HeroDefeated {
        id: hero_id,
        name: attacker.name.clone(),
        by,
        record,
    });
    CombatOutcome::HeroFallen
}

fn try_respawn(ctx: &mut TickContext<'_>, attacker: &Attacker) -> Option<(u32, Position)> {
    let hero_id = attacker.id;
    let fee = ctx.config.respawn_fee?;
    if ctx.resources.gold < fee {
        return None;
    }
    let guild_pos = ctx
        .registry
        .building_position(attacker.guild)
        .or_else(|| ctx.registry.find_building(attacker.class.guild()).map(|(_, p)| p))?;

    // The guild cell itself, else the first walkable neighbour.
    let grid = ctx.registry.grid();
    let vacant = |hero: Option<HeroId>| hero.map_or(true, |h| h == hero_id);
    let landing = if grid.cell(guild_pos).is_some_and(|c| vacant(c.hero)) {
        guild_pos
    } else {
        grid.neighbors(guild_pos).find(|p| {
            grid.cell(*p)
                .is_some_and(|c| c.building.is_none() && vacant(c.hero))
        })?
    };

    if !ctx.registry.relocate_hero(hero_id, landing) {
        return None;
    }
    ctx.resources.gold -= fee;
    let hero = ctx.registry.hero_mut(hero_id)?;
    hero.health = hero.max_health;
    hero.target = landing;
    Some((fee, landing))
}

/// Fight every hero/enemy pair that ended the movement phase on one cell.
/// Heroes in `engaged` already fought or rested this tick and sit it out.
pub fn encounter_sweep(ctx: &mut TickContext<'_>, engaged: &BTreeSet<HeroId>) -> Vec<CombatReport> {
    let mut reports = Vec::new();
    for hero_id in ctx.registry.hero_ids() {
        if engaged.contains(&hero_id) {
            continue;
        }
        let Some(pos) = ctx.registry.hero_position(hero_id) else { continue };
        let Some(enemy_id) = ctx.registry.grid().cell(pos).and_then(|c| c.enemy) else {
            continue;
        };
        if let Some(report) = resolve_combat(ctx, hero_id, enemy_id) {
            reports.push(report);
        }
    }
    reports
}
