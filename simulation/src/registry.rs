//! Entity Registry
//!
//! Owns every building, hero, enemy and flag (as components in a
//! `hecs::World`) and keeps the [`Grid`] in step with their positions. All
//! placement, movement and removal goes through here.

use std::collections::BTreeMap;

use hecs::{Component, Entity, World};
use serde::{Deserialize, Serialize};

use crate::catalog::BuildingKind;
use crate::components::*;
use crate::error::{CommandError, RegistryFault};
use crate::grid::Grid;

/// Next identifier per category. Starts at 1, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCounters {
    pub next_building: u64,
    pub next_hero: u64,
    pub next_enemy: u64,
    pub next_flag: u64,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_building: 1,
            next_hero: 1,
            next_enemy: 1,
            next_flag: 1,
        }
    }
}

/// An entity together with its identity and location, detached from the
/// registry. Used for read-only snapshots and save files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placed<I, T> {
    pub id: I,
    pub position: Position,
    pub entity: T,
}

/// Take the next id from `counter`, or honour `requested` and push the
/// counter past it.
fn allocate(counter: &mut u64, requested: Option<u64>) -> u64 {
    match requested {
        Some(id) => {
            *counter = (*counter).max(id + 1);
            id
        }
        None => {
            let id = *counter;
            *counter += 1;
            id
        }
    }
}

pub struct Registry {
    world: World,
    grid: Grid,
    buildings: BTreeMap<BuildingId, Entity>,
    heroes: BTreeMap<HeroId, Entity>,
    enemies: BTreeMap<EnemyId, Entity>,
    flags: BTreeMap<FlagId, Entity>,
    counters: IdCounters,
}

impl Registry {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            world: World::new(),
            grid: Grid::new(width, height),
            buildings: BTreeMap::new(),
            heroes: BTreeMap::new(),
            enemies: BTreeMap::new(),
            flags: BTreeMap::new(),
            counters: IdCounters::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn counters(&self) -> IdCounters {
        self.counters
    }

    /// Raise counters to at least `saved`; never lowers them.
    pub fn restore_counters(&mut self, saved: IdCounters) {
        self.counters.next_building = self.counters.next_building.max(saved.next_building);
        self.counters.next_hero = self.counters.next_hero.max(saved.next_hero);
        self.counters.next_enemy = self.counters.next_enemy.max(saved.next_enemy);
        self.counters.next_flag = self.counters.next_flag.max(saved.next_flag);
    }

    fn check_bounds(&self, pos: Position) -> Result<(), CommandError> {
        if self.grid.contains(pos) {
            Ok(())
        } else {
            Err(CommandError::OutOfBounds(pos))
        }
    }

    // ========================================================================
    // Placement
    // ========================================================================

    pub fn insert_building(&mut self, building: Building, pos: Position) -> Result<BuildingId, CommandError> {
        self.spawn_building(None, building, pos)
    }

    pub(crate) fn spawn_building(
        &mut self,
        requested: Option<BuildingId>,
        building: Building,
        pos: Position,
    ) -> Result<BuildingId, CommandError> {
        self.check_bounds(pos)?;
        if self.grid.cell(pos).is_some_and(|c| c.building.is_some()) {
            return Err(CommandError::CellOccupied(pos));
        }
        let id = BuildingId(allocate(&mut self.counters.next_building, requested.map(|id| id.0)));
        let entity = self.world.spawn((id, pos, building));
        self.buildings.insert(id, entity);
        if let Some(cell) = self.grid.cell_mut(pos) {
            cell.building = Some(id);
        }
        Ok(id)
    }

    /// Heroes may stand on a building cell only when placed there directly
    /// (recruitment, respawn); walking onto one is never allowed.
    pub fn insert_hero(&mut self, hero: Hero, pos: Position) -> Result<HeroId, CommandError> {
        self.spawn_hero(None, hero, pos)
    }

    pub(crate) fn spawn_hero(
        &mut self,
        requested: Option<HeroId>,
        hero: Hero,
        pos: Position,
    ) -> Result<HeroId, CommandError> {
        self.check_bounds(pos)?;
        if self.grid.cell(pos).is_some_and(|c| c.hero.is_some()) {
            return Err(CommandError::CellOccupied(pos));
        }
        let id = HeroId(allocate(&mut self.counters.next_hero, requested.map(|id| id.0)));
        let entity = self.world.spawn((id, pos, hero));
        self.heroes.insert(id, entity);
        if let Some(cell) = self.grid.cell_mut(pos) {
            cell.hero = Some(id);
        }
        Ok(id)
    }

    pub fn insert_enemy(&mut self, enemy: Enemy, pos: Position) -> Result<EnemyId, CommandError> {
        self.spawn_enemy(None, enemy, pos)
    }

    pub(crate) fn spawn_enemy(
        &mut self,
        requested: Option<EnemyId>,
        enemy: Enemy,
        pos: Position,
    ) -> Result<EnemyId, CommandError> {
        self.check_bounds(pos)?;
        if self
            .grid
            .cell(pos)
            .is_some_and(|c| c.building.is_some() || c.enemy.is_some())
        {
            return Err(CommandError::CellOccupied(pos));
        }
        let id = EnemyId(allocate(&mut self.counters.next_enemy, requested.map(|id| id.0)));
        let entity = self.world.spawn((id, pos, enemy));
        self.enemies.insert(id, entity);
        if let Some(cell) = self.grid.cell_mut(pos) {
            cell.enemy = Some(id);
        }
        Ok(id)
    }

    pub fn insert_flag(&mut self, flag: Flag, pos: Position) -> Result<FlagId, CommandError> {
        self.spawn_flag(None, flag, pos)
    }

    pub(crate) fn spawn_flag(
        &mut self,
        requested: Option<FlagId>,
        flag: Flag,
        pos: Position,
    ) -> Result<FlagId, CommandError> {
        self.check_bounds(pos)?;
        if self
            .grid
            .cell(pos)
            .is_some_and(|c| c.building.is_some() || c.flag.is_some())
        {
            return Err(CommandError::CellOccupied(pos));
        }
        let id = FlagId(allocate(&mut self.counters.next_flag, requested.map(|id| id.0)));
        let entity = self.world.spawn((id, pos, flag));
        self.flags.insert(id, entity);
        if let Some(cell) = self.grid.cell_mut(pos) {
            cell.flag = Some(id);
        }
        Ok(id)
    }

    // ========================================================================
    // Movement
    // ========================================================================

    fn position_of(&self, entity: Entity) -> Option<Position> {
        self.world.get::<&Position>(entity).ok().map(|p| *p)
    }

    fn set_position(&mut self, entity: Entity, to: Position) {
        if let Ok(pos) = self.world.query_one_mut::<&mut Position>(entity) {
            *pos = to;
        }
    }

    /// Walk a hero to `to`. Buildings and other heroes block; enemies don't.
    pub fn move_hero(&mut self, id: HeroId, to: Position) -> bool {
        self.shift_hero(id, to, true)
    }

    /// Put a hero on `to` even if a building stands there.
    pub fn relocate_hero(&mut self, id: HeroId, to: Position) -> bool {
        self.shift_hero(id, to, false)
    }

    fn shift_hero(&mut self, id: HeroId, to: Position, buildings_block: bool) -> bool {
        let Some(&entity) = self.heroes.get(&id) else {
            return false;
        };
        let Some(cell) = self.grid.cell(to) else {
            return false;
        };
        if (buildings_block && cell.building.is_some()) || cell.hero.is_some_and(|h| h != id) {
            return false;
        }
        let Some(from) = self.position_of(entity) else {
            return false;
        };
        if let Some(old) = self.grid.cell_mut(from) {
            if old.hero == Some(id) {
                old.hero = None;
            }
        }
        if let Some(new) = self.grid.cell_mut(to) {
            new.hero = Some(id);
        }
        self.set_position(entity, to);
        true
    }

    /// Walk an enemy to `to`. Buildings and other enemies block; heroes don't.
    pub fn move_enemy(&mut self, id: EnemyId, to: Position) -> bool {
        let Some(&entity) = self.enemies.get(&id) else {
            return false;
        };
        let Some(cell) = self.grid.cell(to) else {
            return false;
        };
        if cell.building.is_some() || cell.enemy.is_some_and(|e| e != id) {
            return false;
        }
        let Some(from) = self.position_of(entity) else {
            return false;
        };
        if let Some(old) = self.grid.cell_mut(from) {
            if old.enemy == Some(id) {
                old.enemy = None;
            }
        }
        if let Some(new) = self.grid.cell_mut(to) {
            new.enemy = Some(id);
        }
        self.set_position(entity, to);
        true
    }

    // ========================================================================
    // Removal
    // ========================================================================

    fn detach<T: Component>(&mut self, entity: Entity) -> Option<(Position, T)> {
        let pos = self.position_of(entity)?;
        let component = self.world.remove_one::<T>(entity).ok();
        let _ = self.world.despawn(entity);
        component.map(|c| (pos, c))
    }

    pub fn remove_building(&mut self, id: BuildingId) -> Option<Building> {
        let entity = self.buildings.remove(&id)?;
        let (pos, building) = self.detach::<Building>(entity)?;
        if let Some(cell) = self.grid.cell_mut(pos) {
            if cell.building == Some(id) {
                cell.building = None;
            }
        }
        Some(building)
    }

    pub fn remove_hero(&mut self, id: HeroId) -> Option<Hero> {
        let entity = self.heroes.remove(&id)?;
        let (pos, hero) = self.detach::<Hero>(entity)?;
        if let Some(cell) = self.grid.cell_mut(pos) {
            if cell.hero == Some(id) {
                cell.hero = None;
            }
        }
        Some(hero)
    }

    pub fn remove_enemy(&mut self, id: EnemyId) -> Option<Enemy> {
        let entity = self.enemies.remove(&id)?;
        let (pos, enemy) = self.detach::<Enemy>(entity)?;
        if let Some(cell) = self.grid.cell_mut(pos) {
            if cell.enemy == Some(id) {
                cell.enemy = None;
            }
        }
        Some(enemy)
    }

    pub fn remove_flag(&mut self, id: FlagId) -> Option<Flag> {
        let entity = self.flags.remove(&id)?;
        let (pos, flag) = self.detach::<Flag>(entity)?;
        if let Some(cell) = self.grid.cell_mut(pos) {
            if cell.flag == Some(id) {
                cell.flag = None;
            }
        }
        Some(flag)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn building(&self, id: BuildingId) -> Option<hecs::Ref<'_, Building>> {
        let entity = *self.buildings.get(&id)?;
        self.world.get::<&Building>(entity).ok()
    }

    pub fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        let entity = *self.buildings.get(&id)?;
        self.world.query_one_mut::<&mut Building>(entity).ok()
    }

    pub fn hero(&self, id: HeroId) -> Option<hecs::Ref<'_, Hero>> {
        let entity = *self.heroes.get(&id)?;
        self.world.get::<&Hero>(entity).ok()
    }

    pub fn hero_mut(&mut self, id: HeroId) -> Option<&mut Hero> {
        let entity = *self.heroes.get(&id)?;
        self.world.query_one_mut::<&mut Hero>(entity).ok()
    }

    pub fn enemy(&self, id: EnemyId) -> Option<hecs::Ref<'_, Enemy>> {
        let entity = *self.enemies.get(&id)?;
        self.world.get::<&Enemy>(entity).ok()
    }

    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        let entity = *self.enemies.get(&id)?;
        self.world.query_one_mut::<&mut Enemy>(entity).ok()
    }

    pub fn flag(&self, id: FlagId) -> Option<hecs::Ref<'_, Flag>> {
        let entity = *self.flags.get(&id)?;
        self.world.get::<&Flag>(entity).ok()
    }

    pub fn building_position(&self, id: BuildingId) -> Option<Position> {
        self.position_of(*self.buildings.get(&id)?)
    }

    pub fn hero_position(&self, id: HeroId) -> Option<Position> {
        self.position_of(*self.heroes.get(&id)?)
    }

    pub fn enemy_position(&self, id: EnemyId) -> Option<Position> {
        self.position_of(*self.enemies.get(&id)?)
    }

    pub fn flag_position(&self, id: FlagId) -> Option<Position> {
        self.position_of(*self.flags.get(&id)?)
    }

    pub fn building_ids(&self) -> Vec<BuildingId> {
        self.buildings.keys().copied().collect()
    }

    pub fn hero_ids(&self) -> Vec<HeroId> {
        self.heroes.keys().copied().collect()
    }

    pub fn enemy_ids(&self) -> Vec<EnemyId> {
        self.enemies.keys().copied().collect()
    }

    pub fn flag_ids(&self) -> Vec<FlagId> {
        self.flags.keys().copied().collect()
    }

    pub fn hero_count(&self) -> usize {
        self.heroes.len()
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    pub fn contains_hero(&self, id: HeroId) -> bool {
        self.heroes.contains_key(&id)
    }

    pub fn contains_enemy(&self, id: EnemyId) -> bool {
        self.enemies.contains_key(&id)
    }

    /// Lowest-id building of `kind`.
    pub fn find_building(&self, kind: BuildingKind) -> Option<(BuildingId, Position)> {
        self.buildings.iter().find_map(|(id, &entity)| {
            let building = self.world.get::<&Building>(entity).ok()?;
            if building.kind != kind {
                return None;
            }
            Some((*id, self.position_of(entity)?))
        })
    }

    pub fn castle(&self) -> Option<(BuildingId, Position)> {
        self.find_building(BuildingKind::Castle)
    }

    /// Buildings within `range` (Chebyshev) of `pos`.
    pub fn buildings_within(&self, pos: Position, range: u32) -> usize {
        self.world
            .query::<(&BuildingId, &Position)>()
            .iter()
            .filter(|(_, (_, p))| p.chebyshev(pos) <= range)
            .count()
    }

    /// Total production and housing of everything standing.
    pub fn total_output(&self) -> (Production, u32) {
        let mut production = Production::default();
        let mut housing = 0;
        for (_, building) in self.world.query::<&Building>().iter() {
            production += building.production;
            housing += building.housing;
        }
        (production, housing)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    fn collect<I, T>(&self) -> Vec<Placed<I, T>>
    where
        I: Component + Copy + Ord,
        T: Component + Clone,
    {
        let mut out: Vec<Placed<I, T>> = self
            .world
            .query::<(&I, &Position, &T)>()
            .iter()
            .map(|(_, (id, pos, entity))| Placed {
                id: *id,
                position: *pos,
                entity: entity.clone(),
            })
            .collect();
        out.sort_by_key(|p| p.id);
        out
    }

    pub fn buildings(&self) -> Vec<Placed<BuildingId, Building>> {
        self.collect()
    }

    pub fn heroes(&self) -> Vec<Placed<HeroId, Hero>> {
        self.collect()
    }

    pub fn enemies(&self) -> Vec<Placed<EnemyId, Enemy>> {
        self.collect()
    }

    pub fn flags(&self) -> Vec<Placed<FlagId, Flag>> {
        self.collect()
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Check that every entity sits in exactly the cell matching its stored
    /// position and that no cell points at a missing entity.
    pub fn verify(&self) -> Result<(), RegistryFault> {
        self.verify_category(&self.buildings, |c| c.building)?;
        self.verify_category(&self.heroes, |c| c.hero)?;
        self.verify_category(&self.enemies, |c| c.enemy)?;
        self.verify_category(&self.flags, |c| c.flag)?;
        Ok(())
    }

    fn verify_category<I>(
        &self,
        index: &BTreeMap<I, Entity>,
        occupant: impl Fn(&crate::grid::Cell) -> Option<I>,
    ) -> Result<(), RegistryFault>
    where
        I: Copy + Ord + std::fmt::Display,
    {
        for (pos, cell) in self.grid.iter() {
            let Some(id) = occupant(cell) else { continue };
            let Some(&entity) = index.get(&id) else {
                return Err(RegistryFault::GhostReference {
                    entity: id.to_string(),
                    cell: pos,
                });
            };
            let stored = self.position_of(entity).ok_or_else(|| RegistryFault::GhostReference {
                entity: id.to_string(),
                cell: pos,
            })?;
            if stored != pos {
                return Err(RegistryFault::PositionMismatch {
                    entity: id.to_string(),
                    stored,
                    cell: pos,
                });
            }
        }
        for (&id, &entity) in index {
            let count = self
                .grid
                .iter()
                .filter(|(_, cell)| occupant(*cell) == Some(id))
                .count();
            if count != 1 || self.position_of(entity).is_none() {
                return Err(RegistryFault::WrongCellCount {
                    entity: id.to_string(),
                    count,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EnemyKind, FlagKind, HeroClass};
    use proptest::prelude::*;

    fn hero(class: HeroClass) -> Hero {
        Hero::new("Test".into(), class, BuildingId(0), Position::default(), 100)
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut reg = Registry::new(10, 10);
        let a = reg.insert_enemy(Enemy::new(EnemyKind::Goblin), Position::new(0, 0)).unwrap();
        let b = reg.insert_enemy(Enemy::new(EnemyKind::Orc), Position::new(1, 0)).unwrap();
        reg.remove_enemy(b);
        let c = reg.insert_enemy(Enemy::new(EnemyKind::Troll), Position::new(2, 0)).unwrap();
        assert_eq!((a.0, b.0, c.0), (1, 2, 3));
        reg.verify().unwrap();
    }

    #[test]
    fn test_hero_blocked_by_building_and_hero() {
        let mut reg = Registry::new(10, 10);
        reg.insert_building(Building::new(BuildingKind::Inn), Position::new(3, 3)).unwrap();
        let h1 = reg.insert_hero(hero(HeroClass::Warrior), Position::new(2, 3)).unwrap();
        let h2 = reg.insert_hero(hero(HeroClass::Rogue), Position::new(2, 4)).unwrap();

        assert!(!reg.move_hero(h1, Position::new(3, 3)), "building blocks heroes");
        assert!(!reg.move_hero(h1, Position::new(2, 4)), "heroes block heroes");
        assert!(!reg.move_hero(h2, Position::new(2, 10)), "off the map");
        assert_eq!(reg.hero_position(h1), Some(Position::new(2, 3)));
        reg.verify().unwrap();
    }

    #[test]
    fn test_hero_and_enemy_share_a_cell() {
        let mut reg = Registry::new(10, 10);
        let h = reg.insert_hero(hero(HeroClass::Warrior), Position::new(2, 2)).unwrap();
        let e = reg.insert_enemy(Enemy::new(EnemyKind::Goblin), Position::new(2, 3)).unwrap();
        assert!(reg.move_enemy(e, Position::new(2, 2)));
        assert!(reg.move_hero(h, Position::new(2, 3)));
        assert!(reg.move_hero(h, Position::new(2, 2)));
        let cell = reg.grid().cell(Position::new(2, 2)).copied().unwrap();
        assert_eq!(cell.hero, Some(h));
        assert_eq!(cell.enemy, Some(e));
        reg.verify().unwrap();
    }

    #[test]
    fn test_enemy_blocked_by_enemy_and_building() {
        let mut reg = Registry::new(10, 10);
        reg.insert_building(Building::new(BuildingKind::GuardTower), Position::new(5, 5)).unwrap();
        let e1 = reg.insert_enemy(Enemy::new(EnemyKind::Goblin), Position::new(4, 5)).unwrap();
        reg.insert_enemy(Enemy::new(EnemyKind::Orc), Position::new(4, 4)).unwrap();
        assert!(!reg.move_enemy(e1, Position::new(5, 5)));
        assert!(!reg.move_enemy(e1, Position::new(4, 4)));
        assert!(reg.move_enemy(e1, Position::new(3, 5)));
        reg.verify().unwrap();
    }

    #[test]
    fn test_flag_rules() {
        let mut reg = Registry::new(10, 10);
        reg.insert_building(Building::new(BuildingKind::Inn), Position::new(1, 1)).unwrap();
        assert_eq!(
            reg.insert_flag(Flag::new(FlagKind::Attack), Position::new(1, 1)),
            Err(CommandError::CellOccupied(Position::new(1, 1)))
        );
        let f = reg.insert_flag(Flag::new(FlagKind::Attack), Position::new(2, 1)).unwrap();
        assert!(reg.insert_flag(Flag::new(FlagKind::Gold), Position::new(2, 1)).is_err());
        assert_eq!(reg.remove_flag(f).map(|f| f.kind), Some(FlagKind::Attack));
        assert!(reg.remove_flag(f).is_none(), "second removal is a no-op");
        reg.verify().unwrap();
    }

    #[test]
    fn test_relocate_onto_building() {
        let mut reg = Registry::new(10, 10);
        reg.insert_building(Building::new(BuildingKind::WarriorGuild), Position::new(4, 4)).unwrap();
        let h = reg.insert_hero(hero(HeroClass::Warrior), Position::new(0, 0)).unwrap();
        assert!(!reg.move_hero(h, Position::new(4, 4)));
        assert!(reg.relocate_hero(h, Position::new(4, 4)));
        assert_eq!(reg.hero_position(h), Some(Position::new(4, 4)));
        reg.verify().unwrap();
    }

    #[derive(Debug, Clone)]
    enum Op {
        PlaceBuilding(i32, i32),
        SpawnHero(i32, i32),
        SpawnEnemy(i32, i32),
        PlaceFlag(i32, i32),
        MoveHero(usize, i32, i32),
        MoveEnemy(usize, i32, i32),
        RemoveHero(usize),
        RemoveEnemy(usize),
        RemoveFlag(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        let coord = (-1i32..9, -1i32..9);
        prop_oneof![
            coord.clone().prop_map(|(x, y)| Op::PlaceBuilding(x, y)),
            coord.clone().prop_map(|(x, y)| Op::SpawnHero(x, y)),
            coord.clone().prop_map(|(x, y)| Op::SpawnEnemy(x, y)),
            coord.clone().prop_map(|(x, y)| Op::PlaceFlag(x, y)),
            (0usize..8, coord.clone()).prop_map(|(i, (x, y))| Op::MoveHero(i, x, y)),
            (0usize..8, coord).prop_map(|(i, (x, y))| Op::MoveEnemy(i, x, y)),
            (0usize..8).prop_map(Op::RemoveHero),
            (0usize..8).prop_map(Op::RemoveEnemy),
            (0usize..8).prop_map(Op::RemoveFlag),
        ]
    }

    proptest! {
        #[test]
        fn prop_grid_and_registry_stay_consistent(ops in proptest::collection::vec(op(), 1..80)) {
            let mut reg = Registry::new(8, 8);
            for op in ops {
                match op {
                    Op::PlaceBuilding(x, y) => {
                        let _ = reg.insert_building(Building::new(BuildingKind::Inn), Position::new(x, y));
                    }
                    Op::SpawnHero(x, y) => {
                        let _ = reg.insert_hero(hero(HeroClass::Ranger), Position::new(x, y));
                    }
                    Op::SpawnEnemy(x, y) => {
                        let _ = reg.insert_enemy(Enemy::new(EnemyKind::Goblin), Position::new(x, y));
                    }
                    Op::PlaceFlag(x, y) => {
                        let _ = reg.insert_flag(Flag::new(FlagKind::Explore), Position::new(x, y));
                    }
                    Op::MoveHero(i, x, y) => {
                        if let Some(&id) = reg.hero_ids().get(i) {
                            let target = Position::new(x, y);
                            let moved = reg.move_hero(id, target);
                            if moved {
                                prop_assert_eq!(reg.hero_position(id), Some(target));
                            }
                        }
                    }
                    Op::MoveEnemy(i, x, y) => {
                        if let Some(&id) = reg.enemy_ids().get(i) {
                            let before = reg.enemy_position(id);
                            if !reg.move_enemy(id, Position::new(x, y)) {
                                prop_assert_eq!(reg.enemy_position(id), before);
                            }
                        }
                    }
                    Op::RemoveHero(i) => {
                        if let Some(&id) = reg.hero_ids().get(i) {
                            reg.remove_hero(id);
                        }
                    }
                    Op::RemoveEnemy(i) => {
                        if let Some(&id) = reg.enemy_ids().get(i) {
                            reg.remove_enemy(id);
                        }
                    }
                    Op::RemoveFlag(i) => {
                        if let Some(&id) = reg.flag_ids().get(i) {
                            reg.remove_flag(id);
                        }
                    }
                }
                prop_assert_eq!(reg.verify(), Ok(()));
            }
        }
    }
}
