//! Hero AI - per-tick decision engine
//!
//! Each turn a hero perceives what is near, scores every visible enemy and
//! flag, and commits to the first applicable of: retreat, engage, collect,
//! patrol. Only the last-action label and the current target survive
//! between turns.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::catalog::{FlagKind, HeroClass};
use crate::components::{EnemyId, FlagId, HeroId, Position};
use crate::config::SimConfig;
use crate::events::GameEvent;
use crate::registry::Registry;
use crate::spatial::{
    allies_near, enemy_sightings, flag_sightings, hero_sightings, nearby, EnemySighting,
    FlagSighting, HeroSighting,
};
use crate::systems::combat::{formation_bonus, position_bonus, resolve_combat};
use crate::systems::movement::{centroid, free_hero_steps, move_hero_toward, step_away};
use crate::systems::TickContext;

/// What a hero did with its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroDecision {
    Resting,
    Retreating,
    Attacking(EnemyId),
    Pursuing(EnemyId),
    Collected(FlagId),
    MovingToFlag(FlagId),
    Supporting(HeroId),
    Patrolling,
    StandingGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Retreat,
    Neutral,
    Aggressive,
}

pub fn stance(health_percent: f64, config: &SimConfig) -> Stance {
    if health_percent < config.retreat_threshold {
        Stance::Retreat
    } else if health_percent > config.aggression_threshold {
        Stance::Aggressive
    } else {
        Stance::Neutral
    }
}

/// The hero fields scoring looks at.
#[derive(Debug, Clone)]
pub struct HeroView {
    pub id: HeroId,
    pub position: Position,
    pub class: HeroClass,
    pub damage: i32,
    pub health_percent: f64,
    pub gold: u32,
    pub preferences: Vec<FlagKind>,
}

#[derive(Debug, Default)]
struct Perception {
    enemies: Vec<EnemySighting>,
    flags: Vec<FlagSighting>,
    allies: Vec<HeroSighting>,
    heroes: Vec<HeroSighting>,
}

fn perceive(registry: &Registry, config: &SimConfig, me: &HeroView) -> Perception {
    let enemies = enemy_sightings(registry);
    let flags = flag_sightings(registry);
    let heroes = hero_sightings(registry);
    Perception {
        enemies: nearby(me.position, &enemies, me.class.sight_range())
            .into_iter()
            .copied()
            .collect(),
        flags: nearby(me.position, &flags, config.flag_sight_range)
            .into_iter()
            .copied()
            .collect(),
        allies: allies_near(&heroes, me.id, me.position, config.support_range),
        heroes,
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Additive desirability of attacking `enemy`. `tactical` is the combined
/// position and formation bonus the hero would fight with.
pub fn score_enemy(me: &HeroView, enemy: &EnemySighting, visible: usize, tactical: f64) -> f64 {
    let distance = me.position.manhattan(enemy.position);
    let mut score = (f64::from(me.class.sight_range()) + 1.0 - f64::from(distance)) * 10.0;

    if me.damage >= enemy.health {
        score += 50.0;
    } else if 2 * me.damage >= enemy.health {
        score += 25.0;
    }

    score += match me.class {
        HeroClass::Warrior => f64::from(enemy.damage),
        HeroClass::Rogue => {
            let finisher = if enemy.health <= 40 { 15.0 } else { 0.0 };
            30.0 * (1.0 - enemy.health_percent()) + finisher
        }
        HeroClass::Ranger if distance >= 2 => 15.0,
        HeroClass::Ranger => 0.0,
        HeroClass::Wizard => 10.0 * visible.saturating_sub(1) as f64,
    };

    score + 100.0 * tactical
}

pub fn score_flag(me: &HeroView, flag: &FlagSighting, enemies_visible: bool, config: &SimConfig) -> f64 {
    let distance = me.position.manhattan(flag.position);
    let mut score = (f64::from(config.flag_sight_range) + 1.0 - f64::from(distance)) * 5.0;
    if me.preferences.contains(&flag.kind) {
        score += 50.0;
    }
    score += match flag.kind {
        FlagKind::Attack if enemies_visible => 30.0,
        FlagKind::Explore if !enemies_visible => 20.0,
        FlagKind::Gold if me.gold < 100 => 15.0,
        FlagKind::Defend if me.health_percent < 0.7 => 10.0,
        _ => 0.0,
    };
    score
}

/// Highest-scoring item; ties keep the earliest.
fn best<T: Copy>(items: &[T], mut score: impl FnMut(&T) -> f64) -> Option<(T, f64)> {
    let mut best: Option<(T, f64)> = None;
    for item in items {
        let s = score(item);
        if best.map_or(true, |(_, top)| s > top) {
            best = Some((*item, s));
        }
    }
    best
}

// ============================================================================
// Turn
// ============================================================================

fn view(registry: &Registry, id: HeroId) -> Option<(HeroView, f32, u32)> {
    let position = registry.hero_position(id)?;
    let hero = registry.hero(id)?;
    Some((
        HeroView {
            id,
            position,
            class: hero.class,
            damage: hero.damage,
            health_percent: hero.health_percent(),
            gold: hero.gold,
            preferences: hero.preferences.clone(),
        },
        hero.morale,
        hero.move_cooldown,
    ))
}

/// Play one hero's turn. `None` if the hero is gone or still cooling down.
pub fn hero_turn(ctx: &mut TickContext<'_>, id: HeroId) -> Option<HeroDecision> {
    let (me, morale, cooldown) = view(ctx.registry, id)?;
    if cooldown > 0 {
        if let Some(hero) = ctx.registry.hero_mut(id) {
            hero.move_cooldown -= 1;
        }
        return None;
    }

    if morale < ctx.config.low_morale_threshold {
        let regen = ctx.config.morale_rest_regen;
        let hero = ctx.registry.hero_mut(id)?;
        hero.adjust_morale(regen);
        hero.last_action = "resting".to_string();
        hero.target = me.position;
        return Some(HeroDecision::Resting);
    }

    let seen = perceive(ctx.registry, ctx.config, &me);
    let (decision, label) = decide(ctx, &me, &seen);
    debug!(hero = %id, ?decision, "hero acted");

    // A lost fight may have removed the hero.
    let target = destination(ctx.registry, id, decision);
    let base = ctx.config.hero_base_cooldown;
    let decay = ctx.config.morale_decay;
    if let Some(hero) = ctx.registry.hero_mut(id) {
        hero.last_action = label;
        if let Some(target) = target {
            hero.target = target;
        }
        hero.move_cooldown = (base - hero.speed).clamp(0, base.max(0)) as u32;
        hero.adjust_morale(-decay);
    }
    Some(decision)
}

/// Where the decision is taking the hero: whatever it is chasing, else
/// the cell it ended the turn on.
fn destination(registry: &Registry, id: HeroId, decision: HeroDecision) -> Option<Position> {
    let chased = match decision {
        HeroDecision::Attacking(enemy) | HeroDecision::Pursuing(enemy) => registry.enemy_position(enemy),
        HeroDecision::MovingToFlag(flag) => registry.flag_position(flag),
        HeroDecision::Supporting(ally) => registry.hero_position(ally),
        _ => None,
    };
    chased.or_else(|| registry.hero_position(id))
}

fn decide(ctx: &mut TickContext<'_>, me: &HeroView, seen: &Perception) -> (HeroDecision, String) {
    let stance = stance(me.health_percent, ctx.config);

    if stance == Stance::Retreat && !seen.enemies.is_empty() {
        retreat(ctx, me, &seen.enemies);
        return (HeroDecision::Retreating, "retreating".to_string());
    }

    let formation = formation_bonus(&seen.heroes, ctx.config, me.id, me.position);
    let visible = seen.enemies.len();
    let registry: &Registry = ctx.registry;
    let config = ctx.config;
    let target = best(&seen.enemies, |enemy| {
        let tactical = position_bonus(registry, config, me.id, me.position, enemy.position) + formation;
        score_enemy(me, enemy, visible, tactical)
    });
    if let Some((enemy, score)) = target {
        if stance == Stance::Aggressive || score > ctx.config.engage_threshold {
            return engage(ctx, me, &enemy);
        }
    }

    let enemies_visible = !seen.enemies.is_empty();
    let flag = best(&seen.flags, |flag| score_flag(me, flag, enemies_visible, config));
    if let Some((flag, score)) = flag {
        if score > ctx.config.collect_threshold {
            return seek_flag(ctx, me, &flag);
        }
    }

    patrol(ctx, me, seen)
}

fn enemy_name(registry: &Registry, id: EnemyId) -> String {
    registry
        .enemy(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn engage(ctx: &mut TickContext<'_>, me: &HeroView, enemy: &EnemySighting) -> (HeroDecision, String) {
    let name = enemy_name(ctx.registry, enemy.id);
    if me.position.manhattan(enemy.position) <= 1 {
        resolve_combat(ctx, me.id, enemy.id);
        return (HeroDecision::Attacking(enemy.id), format!("attacking {name}"));
    }

    let moved = match approach_cell(ctx.registry, me.id, me.position, enemy.position) {
        Some(cell) => move_hero_toward(ctx.registry, me.id, me.position, cell),
        None => false,
    };
    if !moved {
        move_hero_toward(ctx.registry, me.id, me.position, enemy.position);
    }
    (HeroDecision::Pursuing(enemy.id), format!("pursuing {name}"))
}

/// Free cell next to `target` with the best footing: +2 per building within
/// one cell, +1 per other hero within two. Ties go to the cell nearer the
/// hero, then neighbour order.
fn approach_cell(registry: &Registry, me: HeroId, from: Position, target: Position) -> Option<Position> {
    let heroes = hero_sightings(registry);
    let grid = registry.grid();
    let mut best: Option<(Position, i64, u32)> = None;
    for cell in grid.neighbors(target) {
        let free = grid
            .cell(cell)
            .is_some_and(|c| c.building.is_none() && c.hero.map_or(true, |h| h == me));
        if !free {
            continue;
        }
        let support = 2 * registry.buildings_within(cell, 1) as i64
            + allies_near(&heroes, me, cell, 2).len() as i64;
        let distance = from.manhattan(cell);
        let better = match best {
            None => true,
            Some((_, s, d)) => support > s || (support == s && distance < d),
        };
        if better {
            best = Some((cell, support, distance));
        }
    }
    best.map(|(cell, _, _)| cell)
}

fn retreat(ctx: &mut TickContext<'_>, me: &HeroView, threats: &[EnemySighting]) {
    let points: Vec<Position> = threats.iter().map(|e| e.position).collect();
    let Some(threat) = centroid(&points) else {
        return;
    };
    if let Some(next) = step_away(me.position, threat) {
        let next = ctx.registry.grid().clamp(next);
        if next != me.position && ctx.registry.move_hero(me.id, next) {
            return;
        }
    }
    // Straight back is blocked; take whichever open cell gains the most room.
    let gap = |p: Position| {
        let dx = f64::from(p.x) - threat.0;
        let dy = f64::from(p.y) - threat.1;
        dx * dx + dy * dy
    };
    let here = gap(me.position);
    let fallback = free_hero_steps(ctx.registry, me.position)
        .into_iter()
        .filter(|p| gap(*p) > here)
        .max_by(|a, b| gap(*a).total_cmp(&gap(*b)));
    if let Some(next) = fallback {
        ctx.registry.move_hero(me.id, next);
    }
}

fn seek_flag(ctx: &mut TickContext<'_>, me: &HeroView, flag: &FlagSighting) -> (HeroDecision, String) {
    let name = flag.kind.name();
    if me.position.manhattan(flag.position) > 1 {
        move_hero_toward(ctx.registry, me.id, me.position, flag.position);
        return (HeroDecision::MovingToFlag(flag.id), format!("moving to {name}"));
    }

    let Some(removed) = ctx.registry.remove_flag(flag.id) else {
        return (HeroDecision::StandingGuard, "standing guard".to_string());
    };
    let hero_name = match ctx.registry.hero_mut(me.id) {
        Some(hero) => {
            hero.gold = hero.gold.saturating_add(removed.reward);
            hero.adjust_morale(5.0);
            hero.name.clone()
        }
        None => String::new(),
    };
    ctx.statistics.flags_collected += 1;
    ctx.emit(GameEvent::FlagCollected {
        id: flag.id,
        kind: removed.kind,
        hero: me.id,
        hero_name,
        reward: removed.reward,
    });
    (HeroDecision::Collected(flag.id), format!("collected {name}"))
}

fn patrol(ctx: &mut TickContext<'_>, me: &HeroView, seen: &Perception) -> (HeroDecision, String) {
    if seen.allies.is_empty() {
        let nearest = seen
            .heroes
            .iter()
            .filter(|h| h.id != me.id)
            .min_by_key(|h| (h.position.manhattan(me.position), h.id));
        if let Some(ally) = nearest {
            let name = ctx
                .registry
                .hero(ally.id)
                .map(|h| h.name.clone())
                .unwrap_or_else(|| ally.id.to_string());
            move_hero_toward(ctx.registry, me.id, me.position, ally.position);
            return (HeroDecision::Supporting(ally.id), format!("moving to support {name}"));
        }
    }

    if ctx.roll(ctx.config.patrol_move_chance) {
        let steps = free_hero_steps(ctx.registry, me.position);
        if let Some(&next) = steps.choose(&mut *ctx.rng) {
            ctx.registry.move_hero(me.id, next);
            return (HeroDecision::Patrolling, "patrolling".to_string());
        }
    }
    (HeroDecision::StandingGuard, "standing guard".to_string())
}

/// Give every hero its chance to act, lowest id first. Heroes removed
/// earlier in the tick are skipped.
pub fn hero_system(ctx: &mut TickContext<'_>) -> Vec<(HeroId, HeroDecision)> {
    let mut decisions = Vec::new();
    for id in ctx.registry.hero_ids() {
        if ctx.is_over() {
            break;
        }
        if !ctx.registry.contains_hero(id) {
            continue;
        }
        if !ctx.roll(ctx.config.hero_act_chance) {
            continue;
        }
        if let Some(decision) = hero_turn(ctx, id) {
            decisions.push((id, decision));
        }
    }
    decisions
}

/// Heroes that already traded blows during their own turn.
pub fn engaged_heroes(decisions: &[(HeroId, HeroDecision)]) -> BTreeSet<HeroId> {
    decisions
        .iter()
        .filter(|(_, decision)| matches!(decision, HeroDecision::Attacking(_)))
        .map(|(id, _)| *id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildingKind, EnemyKind};
    use crate::components::{BuildingId, Enemy, Flag, Hero};
    use crate::systems::testing::Fixture;

    fn spawn(fx: &mut Fixture, class: HeroClass, at: Position) -> HeroId {
        let hero = Hero::new(format!("{class}"), class, BuildingId(99), at, 100);
        fx.registry.insert_hero(hero, at).unwrap()
    }

    fn me(class: HeroClass, at: Position) -> HeroView {
        let stats = class.stats();
        HeroView {
            id: HeroId(1),
            position: at,
            class,
            damage: stats.damage,
            health_percent: 1.0,
            gold: 0,
            preferences: class.preferences(),
        }
    }

    fn sighting(id: u64, at: Position, health: i32, max_health: i32, damage: i32) -> EnemySighting {
        EnemySighting { id: EnemyId(id), position: at, health, max_health, damage }
    }

    #[test]
    fn test_enemy_score_terms() {
        let origin = Position::new(5, 5);
        let goblin = sighting(1, Position::new(5, 6), 40, 40, 8);
        // proximity (4 + 1 - 1) * 10 = 40, two hits +25, warrior +8
        assert_eq!(score_enemy(&me(HeroClass::Warrior, origin), &goblin, 1, 0.0), 73.0);

        let wounded = sighting(2, Position::new(5, 7), 20, 40, 8);
        // ranger: proximity (6 + 1 - 2) * 10 = 50, two hits +25, distance +15
        assert_eq!(score_enemy(&me(HeroClass::Ranger, origin), &wounded, 1, 0.0), 90.0);
        // rogue: proximity 30, two hits +25, 30 * 0.5 + 15
        assert_eq!(score_enemy(&me(HeroClass::Rogue, origin), &wounded, 1, 0.0), 85.0);
        // wizard: proximity 40, one hit +50, three visible +20, tactical 0.25
        assert_eq!(score_enemy(&me(HeroClass::Wizard, origin), &wounded, 3, 0.25), 135.0);
    }

    #[test]
    fn test_flag_score_terms() {
        let config = SimConfig::default();
        let rogue = me(HeroClass::Rogue, Position::new(0, 0));
        let gold = FlagSighting { id: FlagId(1), position: Position::new(0, 3), kind: FlagKind::Gold, reward: 60 };
        // (7 + 1 - 3) * 5 = 25, preference +50, poor hero +15
        assert_eq!(score_flag(&rogue, &gold, false, &config), 90.0);
        let attack = FlagSighting { kind: FlagKind::Attack, ..gold };
        assert_eq!(score_flag(&rogue, &attack, true, &config), 55.0);
        assert_eq!(score_flag(&rogue, &attack, false, &config), 25.0);
    }

    #[test]
    fn test_ties_keep_earliest() {
        let items = [(1, 5.0), (2, 7.0), (3, 7.0)];
        assert_eq!(best(&items, |i| i.1).map(|(i, _)| i.0), Some(2));
        assert!(best::<(i32, f64)>(&[], |i| i.1).is_none());
    }

    #[test]
    fn test_low_morale_rests() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(3, 3));
        fx.registry.hero_mut(id).unwrap().morale = 10.0;
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Resting));
        let hero = fx.registry.hero(id).unwrap();
        assert_eq!(hero.morale, 12.0);
        assert_eq!(hero.last_action, "resting");
    }

    #[test]
    fn test_cooldown_only_counts_down() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(3, 3));
        fx.registry.hero_mut(id).unwrap().move_cooldown = 2;
        assert_eq!(hero_turn(&mut fx.ctx(), id), None);
        assert_eq!(fx.registry.hero(id).unwrap().move_cooldown, 1);
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(3, 3)));
    }

    #[test]
    fn test_adjacent_enemy_is_attacked() {
        let mut fx = Fixture::new();
        fx.config.base_crit_chance = 0.0;
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(3, 3));
        let goblin = fx.registry.insert_enemy(Enemy::new(EnemyKind::Goblin), Position::new(3, 4)).unwrap();

        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Attacking(goblin)));
        assert_eq!(fx.registry.enemy(goblin).unwrap().health, 20);
        let hero = fx.registry.hero(id).unwrap();
        assert_eq!(hero.last_action, "attacking Goblin");
        assert_eq!(hero.move_cooldown, 3, "warrior speed 1");
    }

    #[test]
    fn test_distant_enemy_is_pursued() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(3, 3));
        let orc = fx.registry.insert_enemy(Enemy::new(EnemyKind::Orc), Position::new(3, 6)).unwrap();

        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Pursuing(orc)));
        let pos = fx.registry.hero_position(id).unwrap();
        assert_eq!(pos.manhattan(Position::new(3, 6)), 2);
        assert_eq!(fx.registry.hero(id).unwrap().target, Position::new(3, 6));
    }

    #[test]
    fn test_pursuit_prefers_cell_by_building() {
        let mut fx = Fixture::new();
        fx.place(BuildingKind::GuardTower, Position::new(7, 4));
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(3, 5));
        let orc = fx.registry.insert_enemy(Enemy::new(EnemyKind::Orc), Position::new(6, 5)).unwrap();
        assert_eq!(
            approach_cell(&fx.registry, id, Position::new(3, 5), Position::new(6, 5)),
            Some(Position::new(7, 5))
        );
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Pursuing(orc)));
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(4, 5)));
    }

    #[test]
    fn test_wounded_hero_retreats() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(5, 5));
        fx.registry.hero_mut(id).unwrap().health = 20;
        fx.registry.insert_enemy(Enemy::new(EnemyKind::Troll), Position::new(7, 5)).unwrap();

        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Retreating));
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(4, 5)));
        assert_eq!(fx.registry.hero(id).unwrap().target, Position::new(4, 5));
    }

    #[test]
    fn test_neutral_hero_ignores_weak_target() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Warrior, Position::new(5, 5));
        fx.registry.hero_mut(id).unwrap().health = 50;
        fx.registry.insert_enemy(Enemy::new(EnemyKind::Troll), Position::new(5, 9)).unwrap();
        // 10 proximity + 25 troll damage = 35, under the engage threshold.
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Patrolling));
    }

    #[test]
    fn test_adjacent_flag_is_collected() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Ranger, Position::new(3, 3));
        let flag = fx.registry.insert_flag(Flag::new(FlagKind::Explore), Position::new(4, 3)).unwrap();

        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Collected(flag)));
        assert_eq!(fx.registry.hero(id).unwrap().gold, 30);
        assert!(fx.registry.flag_ids().is_empty());
        assert_eq!(fx.statistics.flags_collected, 1);
    }

    #[test]
    fn test_distant_flag_is_approached() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Rogue, Position::new(3, 3));
        let flag = fx.registry.insert_flag(Flag::new(FlagKind::Gold), Position::new(3, 7)).unwrap();
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::MovingToFlag(flag)));
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(3, 4)));
        let hero = fx.registry.hero(id).unwrap();
        assert_eq!(hero.last_action, "moving to Bounty Flag");
        assert_eq!(hero.target, Position::new(3, 7));
    }

    #[test]
    fn test_isolated_hero_moves_to_support() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Wizard, Position::new(2, 2));
        let friend = spawn(&mut fx, HeroClass::Warrior, Position::new(2, 10));
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Supporting(friend)));
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(2, 3)));
        assert_eq!(fx.registry.hero(id).unwrap().target, Position::new(2, 10));
    }

    #[test]
    fn test_lone_hero_patrols_or_stands_guard() {
        let mut fx = Fixture::new();
        let id = spawn(&mut fx, HeroClass::Wizard, Position::new(2, 2));
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::Patrolling));
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(3, 2)));

        let mut fx = Fixture::new();
        fx.config.patrol_move_chance = 0.0;
        let id = spawn(&mut fx, HeroClass::Wizard, Position::new(2, 2));
        assert_eq!(hero_turn(&mut fx.ctx(), id), Some(HeroDecision::StandingGuard));
        assert_eq!(fx.registry.hero(id).unwrap().last_action, "standing guard");
    }
}
