//! Economy System
//!
//! Everything that moves gold: placement, recruitment, upgrades, flag
//! refunds and the periodic income collection. Each command validates fully
//! before the first mutation.

use tracing::info;

use crate::catalog::{BuildingKind, FlagKind};
use crate::components::{Building, BuildingId, Flag, FlagId, Hero, HeroId, Position, Production, ResourceCost};
use crate::error::CommandError;
use crate::events::GameEvent;
use crate::systems::TickContext;

/// Sum every building's production into the treasury.
pub fn collect_income(ctx: &mut TickContext<'_>) -> Production {
    let (income, _) = ctx.registry.total_output();
    ctx.resources.add(income);
    ctx.statistics.total_gold_earned += u64::from(income.gold);
    ctx.emit(GameEvent::IncomeCollected { income });
    income
}

pub fn place_building(
    ctx: &mut TickContext<'_>,
    kind: BuildingKind,
    at: Position,
) -> Result<BuildingId, CommandError> {
    let grid = ctx.registry.grid();
    let cell = grid.cell(at).ok_or(CommandError::OutOfBounds(at))?;
    if cell.building.is_some() {
        return Err(CommandError::CellOccupied(at));
    }
    let cost = kind.cost();
    if !ctx.resources.can_afford(&cost) {
        return Err(CommandError::InsufficientResources(cost));
    }

    let building = Building::new(kind);
    let housing = building.housing;
    let id = ctx.registry.insert_building(building, at)?;
    ctx.resources.spend(&cost);
    ctx.resources.max_population += housing;
    ctx.statistics.buildings_constructed += 1;

    info!(%id, %kind, %at, "building placed");
    ctx.emit(GameEvent::BuildingPlaced { id, kind, position: at });
    Ok(id)
}

pub fn upgrade_building(ctx: &mut TickContext<'_>, id: BuildingId) -> Result<u32, CommandError> {
    let (kind, level) = {
        let building = ctx.registry.building(id).ok_or(CommandError::UnknownBuilding(id))?;
        (building.kind, building.level)
    };
    if level >= kind.max_level() {
        return Err(CommandError::MaxLevel(id));
    }
    let cost = kind.upgrade_cost(level);
    if !ctx.resources.spend(&cost) {
        return Err(CommandError::InsufficientResources(cost));
    }

    let (production, housing) = kind.upgrade_benefit();
    let building = ctx.registry.building_mut(id).ok_or(CommandError::UnknownBuilding(id))?;
    building.level += 1;
    building.production += production;
    building.housing += housing;
    let level = building.level;
    ctx.resources.max_population += housing;

    info!(%id, %kind, level, "building upgraded");
    ctx.emit(GameEvent::BuildingUpgraded { id, kind, level });
    Ok(level)
}

pub fn place_flag(ctx: &mut TickContext<'_>, kind: FlagKind, at: Position) -> Result<FlagId, CommandError> {
    let cell = ctx.registry.grid().cell(at).ok_or(CommandError::OutOfBounds(at))?;
    if cell.building.is_some() || cell.flag.is_some() {
        return Err(CommandError::CellOccupied(at));
    }
    let cost = ResourceCost::gold(kind.base_cost());
    if !ctx.resources.can_afford(&cost) {
        return Err(CommandError::InsufficientResources(cost));
    }

    let id = ctx.registry.insert_flag(Flag::new(kind), at)?;
    ctx.resources.spend(&cost);
    info!(%id, %kind, %at, "flag placed");
    ctx.emit(GameEvent::FlagPlaced { id, kind, position: at });
    Ok(id)
}

/// Take a flag down and refund part of what it cost.
pub fn cancel_flag(ctx: &mut TickContext<'_>, id: FlagId) -> Result<u32, CommandError> {
    let flag = ctx.registry.remove_flag(id).ok_or(CommandError::UnknownFlag(id))?;
    let refund = (f64::from(flag.cost) * ctx.config.flag_refund_ratio).floor() as u32;
    ctx.resources.gold = ctx.resources.gold.saturating_add(refund);
    info!(%id, refund, "flag cancelled");
    ctx.emit(GameEvent::FlagCancelled { id, kind: flag.kind, refund });
    Ok(refund)
}

/// Hire a hero of the guild's class onto the guild's own cell.
pub fn recruit_hero(ctx: &mut TickContext<'_>, guild: BuildingId, name: String) -> Result<HeroId, CommandError> {
    let kind = ctx
        .registry
        .building(guild)
        .map(|b| b.kind)
        .ok_or(CommandError::UnknownGuild(guild))?;
    let class = kind.guild_class().ok_or(CommandError::NotAGuild(guild))?;
    let at = ctx
        .registry
        .building_position(guild)
        .ok_or(CommandError::UnknownGuild(guild))?;
    if ctx.registry.grid().cell(at).is_some_and(|c| c.hero.is_some()) {
        return Err(CommandError::CellOccupied(at));
    }
    let cost = ctx.config.recruit_cost;
    if ctx.resources.population + cost.population > ctx.resources.max_population {
        return Err(CommandError::PopulationCap);
    }
    if !ctx.resources.can_afford(&cost) {
        return Err(CommandError::InsufficientResources(cost));
    }

    let hero = Hero::new(name.clone(), class, guild, at, ctx.config.base_experience);
    let id = ctx.registry.insert_hero(hero, at)?;
    ctx.resources.spend(&cost);
    ctx.statistics.heroes_recruited += 1;
    let count = ctx.registry.hero_count() as u32;
    ctx.statistics.largest_hero_count = ctx.statistics.largest_hero_count.max(count);
    ctx.statistics.highest_hero_level = ctx.statistics.highest_hero_level.max(1);

    info!(%id, %class, %at, "hero recruited");
    ctx.emit(GameEvent::HeroRecruited { id, name, class, position: at });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::HeroClass;
    use crate::systems::testing::Fixture;

    #[test]
    fn test_income_sums_all_buildings() {
        let mut fx = Fixture::new().with_castle();
        fx.place(BuildingKind::Marketplace, Position::new(1, 1));
        fx.place(BuildingKind::Blacksmith, Position::new(2, 1));
        let income = collect_income(&mut fx.ctx());
        assert_eq!(income, Production { gold: 33, mana: 0, supplies: 2 });
        assert_eq!(fx.resources.gold, 533);
        assert_eq!(fx.resources.supplies, 102);
        assert_eq!(fx.statistics.total_gold_earned, 33);
    }

    #[test]
    fn test_failed_placement_changes_nothing() {
        let mut fx = Fixture::new().with_castle();
        let castle = fx.registry.grid().center();
        let before = fx.resources;
        assert_eq!(
            place_building(&mut fx.ctx(), BuildingKind::Inn, castle),
            Err(CommandError::CellOccupied(castle))
        );
        assert_eq!(
            place_building(&mut fx.ctx(), BuildingKind::Inn, Position::new(20, 0)),
            Err(CommandError::OutOfBounds(Position::new(20, 0)))
        );
        fx.resources.gold = 10;
        assert!(matches!(
            place_building(&mut fx.ctx(), BuildingKind::Inn, Position::new(0, 0)),
            Err(CommandError::InsufficientResources(_))
        ));
        assert_eq!(fx.resources.supplies, before.supplies);
        assert_eq!(fx.registry.building_ids().len(), 1);
    }

    #[test]
    fn test_upgrade_adds_benefit_and_stops_at_max() {
        let mut fx = Fixture::new();
        fx.resources.gold = 10_000;
        fx.resources.supplies = 10_000;
        let inn = place_building(&mut fx.ctx(), BuildingKind::Inn, Position::new(3, 3)).unwrap();
        assert_eq!(fx.resources.max_population, 2);

        assert_eq!(upgrade_building(&mut fx.ctx(), inn), Ok(2));
        let building = fx.registry.building(inn).unwrap();
        assert_eq!(building.production.gold, 18);
        assert_eq!(building.housing, 3);
        drop(building);
        assert_eq!(fx.resources.max_population, 3);

        for _ in 2..BuildingKind::Inn.max_level() {
            upgrade_building(&mut fx.ctx(), inn).unwrap();
        }
        assert_eq!(upgrade_building(&mut fx.ctx(), inn), Err(CommandError::MaxLevel(inn)));
    }

    #[test]
    fn test_flag_cancel_refunds_half() {
        let mut fx = Fixture::new();
        let id = place_flag(&mut fx.ctx(), FlagKind::Attack, Position::new(2, 2)).unwrap();
        assert_eq!(fx.resources.gold, 450);
        assert_eq!(cancel_flag(&mut fx.ctx(), id), Ok(25));
        assert_eq!(fx.resources.gold, 475);
        assert_eq!(cancel_flag(&mut fx.ctx(), id), Err(CommandError::UnknownFlag(id)));
    }

    #[test]
    fn test_recruit_needs_housing() {
        let mut fx = Fixture::new();
        let guild = place_building(&mut fx.ctx(), BuildingKind::RangerGuild, Position::new(4, 4)).unwrap();
        assert_eq!(
            recruit_hero(&mut fx.ctx(), guild, "Wren".into()),
            Err(CommandError::PopulationCap)
        );
        fx.resources.max_population = 1;
        let id = recruit_hero(&mut fx.ctx(), guild, "Wren".into()).unwrap();
        let hero = fx.registry.hero(id).unwrap();
        assert_eq!(hero.class, HeroClass::Ranger);
        assert_eq!(hero.health, 80);
        drop(hero);
        assert_eq!(fx.registry.hero_position(id), Some(Position::new(4, 4)));
        assert_eq!(fx.resources.population, 1);
    }

    #[test]
    fn test_recruit_rejects_non_guild() {
        let mut fx = Fixture::new().with_castle();
        let castle = fx.registry.castle().unwrap().0;
        assert_eq!(
            recruit_hero(&mut fx.ctx(), castle, "Wren".into()),
            Err(CommandError::NotAGuild(castle))
        );
        assert_eq!(
            recruit_hero(&mut fx.ctx(), BuildingId(77), "Wren".into()),
            Err(CommandError::UnknownGuild(BuildingId(77)))
        );
    }
}
