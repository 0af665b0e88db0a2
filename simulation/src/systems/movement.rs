//! Single-step movement shared by the hero and enemy AIs.

use crate::components::{EnemyId, HeroId, Position};
use crate::registry::Registry;

/// Next cell on a greedy walk from `from` to `to`: the larger axis delta
/// shrinks by one, ties move vertically. `None` once there.
pub fn step_toward(from: Position, to: Position) -> Option<Position> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx == 0 && dy == 0 {
        return None;
    }
    if dx.abs() > dy.abs() {
        Some(from.offset(dx.signum(), 0))
    } else {
        Some(from.offset(0, dy.signum()))
    }
}

/// Mean position of `points`.
pub fn centroid(points: &[Position]) -> Option<(f64, f64)> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + f64::from(p.x), sy + f64::from(p.y)));
    Some((sx / n, sy / n))
}

/// Next cell directly away from `threat`, same axis rule as [`step_toward`].
pub fn step_away(from: Position, threat: (f64, f64)) -> Option<Position> {
    let dx = f64::from(from.x) - threat.0;
    let dy = f64::from(from.y) - threat.1;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    if dx.abs() > dy.abs() {
        Some(from.offset(dx.signum() as i32, 0))
    } else {
        Some(from.offset(0, dy.signum() as i32))
    }
}

/// Take one clamped step toward `to`. False when already there, pinned
/// against the edge, or blocked by a building or another hero.
pub fn move_hero_toward(registry: &mut Registry, id: HeroId, from: Position, to: Position) -> bool {
    let Some(next) = step_toward(from, to) else {
        return false;
    };
    let next = registry.grid().clamp(next);
    next != from && registry.move_hero(id, next)
}

pub fn move_enemy_toward(registry: &mut Registry, id: EnemyId, from: Position, to: Position) -> bool {
    let Some(next) = step_toward(from, to) else {
        return false;
    };
    let next = registry.grid().clamp(next);
    next != from && registry.move_enemy(id, next)
}

/// Orthogonal neighbours a hero could walk onto.
pub fn free_hero_steps(registry: &Registry, from: Position) -> Vec<Position> {
    registry
        .grid()
        .neighbors(from)
        .filter(|p| {
            registry
                .grid()
                .cell(*p)
                .is_some_and(|c| c.building.is_none() && c.hero.is_none())
        })
        .collect()
}

/// Orthogonal neighbours an enemy could walk onto.
pub fn free_enemy_steps(registry: &Registry, from: Position) -> Vec<Position> {
    registry
        .grid()
        .neighbors(from)
        .filter(|p| {
            registry
                .grid()
                .cell(*p)
                .is_some_and(|c| c.building.is_none() && c.enemy.is_none())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuildingKind, HeroClass};
    use crate::components::{Building, BuildingId, Hero};

    #[test]
    fn test_larger_axis_first_ties_vertical() {
        let from = Position::new(5, 5);
        assert_eq!(step_toward(from, Position::new(9, 6)), Some(Position::new(6, 5)));
        assert_eq!(step_toward(from, Position::new(6, 1)), Some(Position::new(5, 4)));
        assert_eq!(step_toward(from, Position::new(3, 3)), Some(Position::new(5, 4)));
        assert_eq!(step_toward(from, from), None);
    }

    #[test]
    fn test_step_away_from_centroid() {
        let from = Position::new(5, 5);
        let threat = centroid(&[Position::new(7, 5), Position::new(7, 6)]).unwrap();
        assert_eq!(step_away(from, threat), Some(Position::new(4, 5)));
        assert_eq!(step_away(from, (5.0, 5.0)), None);
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_edge_clamp_is_a_no_op() {
        let mut reg = Registry::new(5, 5);
        let hero = Hero::new("Edge".into(), HeroClass::Rogue, BuildingId(0), Position::new(0, 2), 100);
        let id = reg.insert_hero(hero, Position::new(0, 2)).unwrap();
        assert!(!move_hero_toward(&mut reg, id, Position::new(0, 2), Position::new(-3, 2)));
        assert_eq!(reg.hero_position(id), Some(Position::new(0, 2)));
    }

    #[test]
    fn test_free_steps_skip_buildings() {
        let mut reg = Registry::new(5, 5);
        reg.insert_building(Building::new(BuildingKind::Inn), Position::new(2, 1)).unwrap();
        let steps = free_hero_steps(&reg, Position::new(2, 2));
        assert_eq!(steps.len(), 3);
        assert!(!steps.contains(&Position::new(2, 1)));
    }
}
