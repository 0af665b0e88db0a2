//! Spatial Query
//!
//! Manhattan-distance proximity lookups over lightweight "sightings" of the
//! registry's entities. Linear scans; entity counts are in the tens.

use crate::catalog::{FlagKind, HeroClass};
use crate::components::{EnemyId, FlagId, HeroId, Position};
use crate::registry::Registry;

pub trait Located {
    fn position(&self) -> Position;
}

impl Located for Position {
    fn position(&self) -> Position {
        *self
    }
}

/// Every member of `items` within `range` of `origin`, in input order.
pub fn nearby<T: Located>(origin: Position, items: &[T], range: u32) -> Vec<&T> {
    items
        .iter()
        .filter(|item| item.position().manhattan(origin) <= range)
        .collect()
}

/// What a hero needs to know about an enemy to score it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySighting {
    pub id: EnemyId,
    pub position: Position,
    pub health: i32,
    pub max_health: i32,
    pub damage: i32,
}

impl EnemySighting {
    pub fn health_percent(&self) -> f64 {
        if self.max_health <= 0 {
            return 0.0;
        }
        f64::from(self.health.max(0)) / f64::from(self.max_health)
    }
}

impl Located for EnemySighting {
    fn position(&self) -> Position {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSighting {
    pub id: FlagId,
    pub position: Position,
    pub kind: FlagKind,
    pub reward: u32,
}

impl Located for FlagSighting {
    fn position(&self) -> Position {
        self.position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeroSighting {
    pub id: HeroId,
    pub position: Position,
    pub class: HeroClass,
}

impl Located for HeroSighting {
    fn position(&self) -> Position {
        self.position
    }
}

pub fn enemy_sightings(registry: &Registry) -> Vec<EnemySighting> {
    registry
        .enemies()
        .into_iter()
        .map(|placed| EnemySighting {
            id: placed.id,
            position: placed.position,
            health: placed.entity.health,
            max_health: placed.entity.max_health,
            damage: placed.entity.damage,
        })
        .collect()
}

pub fn flag_sightings(registry: &Registry) -> Vec<FlagSighting> {
    registry
        .flags()
        .into_iter()
        .map(|placed| FlagSighting {
            id: placed.id,
            position: placed.position,
            kind: placed.entity.kind,
            reward: placed.entity.reward,
        })
        .collect()
}

pub fn hero_sightings(registry: &Registry) -> Vec<HeroSighting> {
    registry
        .hero_ids()
        .into_iter()
        .filter_map(|id| {
            let position = registry.hero_position(id)?;
            let class = registry.hero(id)?.class;
            Some(HeroSighting { id, position, class })
        })
        .collect()
}

/// Allied heroes within `range` of `origin`, excluding `me`.
pub fn allies_near(heroes: &[HeroSighting], me: HeroId, origin: Position, range: u32) -> Vec<HeroSighting> {
    nearby(origin, heroes, range)
        .into_iter()
        .filter(|h| h.id != me)
        .copied()
        .collect()
}
