//! ECS Components for kingdom entities
//!
//! Each entity category is its own component type; the registry spawns them
//! alongside an id and a [`Position`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    BuildingKind, EnemyKind, EquipmentItem, EquipmentSlot, FlagKind, HeroClass, Specialization,
};

// ============================================================================
// Identity Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeroId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlagId(pub u64);

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "building_{}", self.0)
    }
}

impl fmt::Display for HeroId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hero_{}", self.0)
    }
}

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "enemy_{}", self.0)
    }
}

impl fmt::Display for FlagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flag_{}", self.0)
    }
}

// ============================================================================
// Spatial Components
// ============================================================================

/// Grid coordinates. Signed so that off-grid candidates can be represented
/// and rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Position) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    pub fn chebyshev(self, other: Position) -> u32 {
        (self.x - other.x)
            .unsigned_abs()
            .max((self.y - other.y).unsigned_abs())
    }

    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    /// Orthogonal neighbours: right, left, down, up.
    pub fn neighbors(self) -> [Position; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Economy
// ============================================================================

/// A bundle of resources demanded by a placement, recruit, or upgrade.
/// `population` is a number of population slots to occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceCost {
    pub gold: u32,
    pub mana: u32,
    pub supplies: u32,
    pub population: u32,
}

impl ResourceCost {
    pub fn gold(gold: u32) -> Self {
        Self { gold, ..Self::default() }
    }
}

impl fmt::Display for ResourceCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.gold > 0 {
            parts.push(format!("{} gold", self.gold));
        }
        if self.mana > 0 {
            parts.push(format!("{} mana", self.mana));
        }
        if self.supplies > 0 {
            parts.push(format!("{} supplies", self.supplies));
        }
        if self.population > 0 {
            parts.push(format!("{} population", self.population));
        }
        if parts.is_empty() {
            f.write_str("nothing")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Income produced by a building each income period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Production {
    pub gold: u32,
    pub mana: u32,
    pub supplies: u32,
}

impl std::ops::AddAssign for Production {
    fn add_assign(&mut self, rhs: Self) {
        self.gold += rhs.gold;
        self.mana += rhs.mana;
        self.supplies += rhs.supplies;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub gold: u32,
    pub mana: u32,
    pub supplies: u32,
    pub population: u32,
    pub max_population: u32,
}

impl Resources {
    pub fn can_afford(&self, cost: &ResourceCost) -> bool {
        self.gold >= cost.gold
            && self.mana >= cost.mana
            && self.supplies >= cost.supplies
            && self.population + cost.population <= self.max_population
    }

    /// All-or-nothing spend. Returns false and leaves `self` untouched when
    /// any field would go negative or population would exceed its cap.
    pub fn spend(&mut self, cost: &ResourceCost) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.gold -= cost.gold;
        self.mana -= cost.mana;
        self.supplies -= cost.supplies;
        self.population += cost.population;
        true
    }

    pub fn add(&mut self, income: Production) {
        self.gold = self.gold.saturating_add(income.gold);
        self.mana = self.mana.saturating_add(income.mana);
        self.supplies = self.supplies.saturating_add(income.supplies);
    }

    pub fn release_population(&mut self, slots: u32) {
        self.population = self.population.saturating_sub(slots);
    }
}

// ============================================================================
// Entity Components
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub level: u32,
    pub cost: ResourceCost,
    pub production: Production,
    pub housing: u32,
    pub health: i32,
    pub max_health: i32,
}

impl Building {
    pub fn new(kind: BuildingKind) -> Self {
        Self {
            kind,
            level: 1,
            cost: kind.cost(),
            production: kind.production(),
            housing: kind.housing(),
            health: 100,
            max_health: 100,
        }
    }
}

/// Items currently worn, one per slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<EquipmentItem>,
    pub armor: Option<EquipmentItem>,
    pub accessory: Option<EquipmentItem>,
}

impl Equipment {
    pub fn slot(&self, slot: EquipmentSlot) -> Option<&EquipmentItem> {
        match slot {
            EquipmentSlot::Weapon => self.weapon.as_ref(),
            EquipmentSlot::Armor => self.armor.as_ref(),
            EquipmentSlot::Accessory => self.accessory.as_ref(),
        }
    }

    /// Put `item` in its slot, handing back whatever was there.
    pub fn replace(&mut self, item: EquipmentItem) -> Option<EquipmentItem> {
        let slot = match item.slot {
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Armor => &mut self.armor,
            EquipmentSlot::Accessory => &mut self.accessory,
        };
        slot.replace(item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatResult {
    Victory,
    Exchange,
    Respawned,
    Fallen,
}

/// One line of a hero's combat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRecord {
    pub tick: u64,
    pub enemy: EnemyKind,
    pub result: CombatResult,
    pub damage_dealt: i32,
    pub damage_taken: i32,
    pub critical: bool,
    pub experience_gained: u32,
}

pub const MAX_MORALE: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub name: String,
    pub class: HeroClass,
    /// Guild the hero was recruited from; respawns go back here.
    pub guild: BuildingId,
    pub target: Position,
    pub health: i32,
    pub max_health: i32,
    /// Effective damage, equipment and specialization included.
    pub damage: i32,
    pub speed: i32,
    pub gold: u32,
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub morale: f32,
    pub equipment: Equipment,
    pub specialization: Option<Specialization>,
    pub preferences: Vec<FlagKind>,
    pub move_cooldown: u32,
    pub last_action: String,
    pub combat_history: Vec<CombatRecord>,
}

impl Hero {
    pub fn new(name: String, class: HeroClass, guild: BuildingId, at: Position, base_experience: u32) -> Self {
        let stats = class.stats();
        Self {
            name,
            class,
            guild,
            target: at,
            health: stats.health,
            max_health: stats.health,
            damage: stats.damage,
            speed: stats.speed,
            gold: 0,
            level: 1,
            experience: 0,
            experience_to_next: base_experience,
            morale: MAX_MORALE,
            equipment: Equipment::default(),
            specialization: None,
            preferences: class.preferences(),
            move_cooldown: 0,
            last_action: "spawned".to_string(),
            combat_history: Vec::new(),
        }
    }

    pub fn health_percent(&self) -> f64 {
        if self.max_health <= 0 {
            return 0.0;
        }
        f64::from(self.health.max(0)) / f64::from(self.max_health)
    }

    pub fn adjust_morale(&mut self, delta: f32) {
        self.morale = (self.morale + delta).clamp(0.0, MAX_MORALE);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub damage: i32,
    pub reward: u32,
    pub move_cooldown: u32,
}

impl Enemy {
    pub fn new(kind: EnemyKind) -> Self {
        let stats = kind.stats();
        Self {
            kind,
            name: kind.name().to_string(),
            health: stats.health,
            max_health: stats.health,
            damage: stats.damage,
            reward: stats.reward,
            move_cooldown: 0,
        }
    }

    pub fn health_percent(&self) -> f64 {
        if self.max_health <= 0 {
            return 0.0;
        }
        f64::from(self.health.max(0)) / f64::from(self.max_health)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub kind: FlagKind,
    pub reward: u32,
    pub cost: u32,
}

impl Flag {
    pub fn new(kind: FlagKind) -> Self {
        Self {
            kind,
            reward: kind.base_cost(),
            cost: kind.base_cost(),
        }
    }
}

// ============================================================================
// Clock & Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    pub tick: u64,
}

impl GameClock {
    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// True on every `period`-th tick. A zero period never fires.
    pub fn every(&self, period: u64) -> bool {
        period > 0 && self.tick % period == 0
    }
}

/// Running counters for achievement trackers and end-of-game summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_gold_earned: u64,
    pub heroes_recruited: u32,
    pub heroes_lost: u32,
    pub enemies_defeated: u32,
    pub enemies_spawned: u32,
    pub buildings_constructed: u32,
    pub flags_collected: u32,
    pub highest_hero_level: u32,
    pub largest_hero_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_is_all_or_nothing() {
        let mut res = Resources { gold: 100, mana: 0, supplies: 10, population: 0, max_population: 1 };
        let cost = ResourceCost { gold: 50, supplies: 20, ..ResourceCost::default() };
        assert!(!res.spend(&cost));
        assert_eq!(res.gold, 100);
        assert_eq!(res.supplies, 10);

        assert!(res.spend(&ResourceCost { gold: 30, population: 1, ..ResourceCost::default() }));
        assert_eq!(res.gold, 70);
        assert_eq!(res.population, 1);

        // Cap reached
        assert!(!res.spend(&ResourceCost { population: 1, ..ResourceCost::default() }));
    }

    #[test]
    fn test_distances() {
        let a = Position::new(1, 1);
        let b = Position::new(4, -1);
        assert_eq!(a.manhattan(b), 5);
        assert_eq!(a.chebyshev(b), 3);
    }

    #[test]
    fn test_equipment_replace_returns_previous() {
        let mut eq = Equipment::default();
        let iron = crate::catalog::equipment("iron_sword").cloned().expect("catalog item");
        let steel = crate::catalog::equipment("steel_sword").cloned().expect("catalog item");
        assert!(eq.replace(iron.clone()).is_none());
        assert_eq!(eq.replace(steel), Some(iron));
    }

    #[test]
    fn test_clock_periods() {
        let mut clock = GameClock::default();
        clock.advance();
        assert!(!clock.every(5));
        for _ in 0..4 {
            clock.advance();
        }
        assert!(clock.every(5));
        assert!(!clock.every(0));
    }
}
