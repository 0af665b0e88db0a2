//! Progression System
//!
//! Experience and leveling, specializations, equipment and morale upkeep.

use tracing::{debug, info};

use crate::catalog::{self, BuildingKind, EquipmentItem, Specialization};
use crate::components::{Hero, HeroId, ResourceCost};
use crate::config::SimConfig;
use crate::error::CommandError;
use crate::events::GameEvent;
use crate::systems::TickContext;

/// Apply at most one level-up if `hero` has banked enough experience.
/// Callers that grant a large sum see further levels on later checks.
pub fn level_up(hero: &mut Hero, config: &SimConfig) -> bool {
    if hero.experience < hero.experience_to_next {
        return false;
    }
    hero.level += 1;
    hero.experience -= hero.experience_to_next;

    let scaled = (f64::from(hero.level) * config.level_multiplier).floor() as i32;
    hero.max_health += scaled;
    hero.health += scaled;
    hero.damage += (0.8 * f64::from(scaled)).floor() as i32;
    hero.speed += (0.3 * f64::from(scaled)).floor() as i32;

    let old = hero.experience_to_next;
    let grown = (f64::from(old) * config.level_multiplier).floor() as u32;
    hero.experience_to_next = grown.max(old + 1);
    hero.adjust_morale(15.0);
    true
}

/// Credit experience to a live hero and run one level check.
pub(crate) fn award_experience(ctx: &mut TickContext<'_>, id: HeroId, experience: u32) {
    let config = ctx.config;
    let Some(hero) = ctx.registry.hero_mut(id) else {
        return;
    };
    hero.experience = hero.experience.saturating_add(experience);
    if !level_up(hero, config) {
        return;
    }
    let (name, level) = (hero.name.clone(), hero.level);
    debug!(%id, level, "hero leveled up");
    ctx.statistics.highest_hero_level = ctx.statistics.highest_hero_level.max(level);
    ctx.emit(GameEvent::HeroLeveledUp { id, name, level });
}

pub fn assign_specialization(
    ctx: &mut TickContext<'_>,
    id: HeroId,
    spec: Specialization,
) -> Result<(), CommandError> {
    let hero = ctx.registry.hero_mut(id).ok_or(CommandError::UnknownHero(id))?;
    if hero.specialization.is_some() {
        return Err(CommandError::AlreadySpecialized(id));
    }
    if spec.class() != hero.class {
        return Err(CommandError::WrongClass { spec, class: hero.class });
    }
    if hero.level < spec.unlock_level() {
        return Err(CommandError::SpecializationLocked {
            spec,
            required: spec.unlock_level(),
        });
    }

    let bonus = spec.bonus();
    hero.specialization = Some(spec);
    hero.max_health += bonus.health;
    hero.health += bonus.health;
    hero.damage += bonus.damage;
    hero.speed += bonus.speed;
    let name = hero.name.clone();

    info!(%id, specialization = spec.name(), "specialization assigned");
    ctx.emit(GameEvent::SpecializationAssigned { id, name, specialization: spec });
    Ok(())
}

/// Buy `item_id` from the catalog for `id` out of the treasury. Returns the
/// item it displaced, whose bonuses are taken off again.
pub fn equip_item(
    ctx: &mut TickContext<'_>,
    id: HeroId,
    item_id: &str,
) -> Result<Option<EquipmentItem>, CommandError> {
    let item = catalog::equipment(item_id)
        .cloned()
        .ok_or_else(|| CommandError::UnknownItem(item_id.to_string()))?;
    if !ctx.registry.contains_hero(id) {
        return Err(CommandError::UnknownHero(id));
    }
    let price = ResourceCost::gold(item.cost);
    if !ctx.resources.spend(&price) {
        return Err(CommandError::InsufficientResources(price));
    }
    let hero = ctx.registry.hero_mut(id).ok_or(CommandError::UnknownHero(id))?;

    let (health, damage, speed) = (item.health_bonus, item.damage_bonus, item.speed_bonus);
    let item_name = item.name.clone();
    let previous = hero.equipment.replace(item);
    let (old_health, old_damage, old_speed) = previous
        .as_ref()
        .map_or((0, 0, 0), |old| (old.health_bonus, old.damage_bonus, old.speed_bonus));

    hero.max_health = (hero.max_health + health - old_health).max(1);
    hero.health = (hero.health + (health - old_health).max(0)).clamp(1, hero.max_health);
    hero.damage += damage - old_damage;
    hero.speed += speed - old_speed;
    let name = hero.name.clone();

    info!(%id, item = item_id, "item equipped");
    ctx.emit(GameEvent::ItemEquipped { id, name, item: item_name });
    Ok(previous)
}

/// Heroes standing next to an inn recover morale every tick.
pub fn inn_rest_system(ctx: &mut TickContext<'_>) {
    let inns: Vec<_> = ctx
        .registry
        .buildings()
        .into_iter()
        .filter(|b| b.entity.kind == BuildingKind::Inn)
        .map(|b| b.position)
        .collect();
    if inns.is_empty() {
        return;
    }
    let regen = ctx.config.inn_morale_regen;
    for id in ctx.registry.hero_ids() {
        let Some(pos) = ctx.registry.hero_position(id) else { continue };
        if !inns.iter().any(|inn| inn.chebyshev(pos) <= 1) {
            continue;
        }
        if let Some(hero) = ctx.registry.hero_mut(id) {
            hero.adjust_morale(regen);
        }
    }
}
