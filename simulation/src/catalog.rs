//! Static game data: building kinds, hero classes, specializations,
//! enemies, flags and the equipment catalog.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::components::{Production, ResourceCost};

// ============================================================================
// Buildings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingKind {
    Castle,
    WarriorGuild,
    RangerGuild,
    WizardGuild,
    RogueGuild,
    Marketplace,
    Blacksmith,
    Inn,
    GuardTower,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 9] = [
        BuildingKind::Castle,
        BuildingKind::WarriorGuild,
        BuildingKind::RangerGuild,
        BuildingKind::WizardGuild,
        BuildingKind::RogueGuild,
        BuildingKind::Marketplace,
        BuildingKind::Blacksmith,
        BuildingKind::Inn,
        BuildingKind::GuardTower,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BuildingKind::Castle => "castle",
            BuildingKind::WarriorGuild => "warriorGuild",
            BuildingKind::RangerGuild => "rangerGuild",
            BuildingKind::WizardGuild => "wizardGuild",
            BuildingKind::RogueGuild => "rogueGuild",
            BuildingKind::Marketplace => "marketplace",
            BuildingKind::Blacksmith => "blacksmith",
            BuildingKind::Inn => "inn",
            BuildingKind::GuardTower => "guardTower",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuildingKind::Castle => "Castle",
            BuildingKind::WarriorGuild => "Warrior Guild",
            BuildingKind::RangerGuild => "Ranger Guild",
            BuildingKind::WizardGuild => "Wizard Guild",
            BuildingKind::RogueGuild => "Rogue Guild",
            BuildingKind::Marketplace => "Marketplace",
            BuildingKind::Blacksmith => "Blacksmith",
            BuildingKind::Inn => "Inn",
            BuildingKind::GuardTower => "Guard Tower",
        }
    }

    pub fn cost(self) -> ResourceCost {
        let (gold, supplies) = match self {
            BuildingKind::Castle => (0, 0),
            BuildingKind::WarriorGuild => (100, 20),
            BuildingKind::RangerGuild => (120, 25),
            BuildingKind::WizardGuild => (150, 30),
            BuildingKind::RogueGuild => (80, 15),
            BuildingKind::Marketplace => (60, 10),
            BuildingKind::Blacksmith => (80, 25),
            BuildingKind::Inn => (50, 8),
            BuildingKind::GuardTower => (40, 20),
        };
        ResourceCost { gold, supplies, ..ResourceCost::default() }
    }

    /// Resources produced every income period at level 1.
    pub fn production(self) -> Production {
        match self {
            BuildingKind::Castle => Production { gold: 10, ..Production::default() },
            BuildingKind::WizardGuild => Production { mana: 5, ..Production::default() },
            BuildingKind::RogueGuild => Production { gold: 3, ..Production::default() },
            BuildingKind::Marketplace => Production { gold: 15, ..Production::default() },
            BuildingKind::Blacksmith => Production { gold: 8, mana: 0, supplies: 2 },
            BuildingKind::Inn => Production { gold: 12, ..Production::default() },
            BuildingKind::GuardTower => Production { gold: 2, ..Production::default() },
            BuildingKind::WarriorGuild | BuildingKind::RangerGuild => Production::default(),
        }
    }

    /// Population capacity added while the building stands.
    pub fn housing(self) -> u32 {
        match self {
            BuildingKind::Castle => 10,
            BuildingKind::Inn => 2,
            _ => 0,
        }
    }

    pub fn max_level(self) -> u32 {
        match self {
            BuildingKind::Castle => 10,
            BuildingKind::Marketplace => 8,
            BuildingKind::Blacksmith | BuildingKind::Inn => 6,
            BuildingKind::GuardTower => 4,
            _ => 5,
        }
    }

    /// Cost of going from `level` to `level + 1`.
    pub fn upgrade_cost(self, level: u32) -> ResourceCost {
        let (gold, supplies) = match self {
            BuildingKind::Castle => (500, 0),
            BuildingKind::WarriorGuild => (200, 30),
            BuildingKind::RangerGuild => (250, 35),
            BuildingKind::WizardGuild => (300, 40),
            BuildingKind::RogueGuild => (150, 25),
            BuildingKind::Marketplace => (150, 20),
            BuildingKind::Blacksmith => (200, 40),
            BuildingKind::Inn => (120, 15),
            BuildingKind::GuardTower => (100, 30),
        };
        let level = level.max(1);
        ResourceCost {
            gold: gold * level,
            supplies: supplies * level,
            ..ResourceCost::default()
        }
    }

    /// Production and housing added by each upgrade.
    pub fn upgrade_benefit(self) -> (Production, u32) {
        match self {
            BuildingKind::Castle => (Production { gold: 5, ..Production::default() }, 2),
            BuildingKind::WizardGuild => (Production { mana: 3, ..Production::default() }, 0),
            BuildingKind::RogueGuild => (Production { gold: 2, ..Production::default() }, 0),
            BuildingKind::Marketplace => (Production { gold: 8, ..Production::default() }, 0),
            BuildingKind::Blacksmith => (Production { supplies: 3, ..Production::default() }, 0),
            BuildingKind::Inn => (Production { gold: 6, ..Production::default() }, 1),
            _ => (Production::default(), 0),
        }
    }

    /// Hero class trained here, if this is a guild.
    pub fn guild_class(self) -> Option<HeroClass> {
        match self {
            BuildingKind::WarriorGuild => Some(HeroClass::Warrior),
            BuildingKind::RangerGuild => Some(HeroClass::Ranger),
            BuildingKind::WizardGuild => Some(HeroClass::Wizard),
            BuildingKind::RogueGuild => Some(HeroClass::Rogue),
            _ => None,
        }
    }
}

impl fmt::Display for BuildingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildingKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildingKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Returned when parsing a kind key that the catalog doesn't know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type `{0}`")]
pub struct UnknownKind(pub String);

// ============================================================================
// Heroes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeroClass {
    Warrior,
    Ranger,
    Wizard,
    Rogue,
}

/// Base stats a freshly recruited hero starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassStats {
    pub health: i32,
    pub damage: i32,
    pub speed: i32,
}

impl HeroClass {
    pub const ALL: [HeroClass; 4] = [
        HeroClass::Warrior,
        HeroClass::Ranger,
        HeroClass::Wizard,
        HeroClass::Rogue,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeroClass::Warrior => "Warrior",
            HeroClass::Ranger => "Ranger",
            HeroClass::Wizard => "Wizard",
            HeroClass::Rogue => "Rogue",
        }
    }

    pub fn stats(self) -> ClassStats {
        match self {
            HeroClass::Warrior => ClassStats { health: 100, damage: 20, speed: 1 },
            HeroClass::Ranger => ClassStats { health: 80, damage: 15, speed: 2 },
            HeroClass::Wizard => ClassStats { health: 60, damage: 25, speed: 1 },
            HeroClass::Rogue => ClassStats { health: 70, damage: 18, speed: 2 },
        }
    }

    pub fn preferences(self) -> Vec<FlagKind> {
        match self {
            HeroClass::Warrior => vec![FlagKind::Attack, FlagKind::Defend],
            HeroClass::Ranger => vec![FlagKind::Explore, FlagKind::Attack],
            HeroClass::Wizard => vec![FlagKind::Attack, FlagKind::Explore],
            HeroClass::Rogue => vec![FlagKind::Gold, FlagKind::Explore],
        }
    }

    /// How far this class can spot enemies. Ranged classes see farther.
    pub fn sight_range(self) -> u32 {
        match self {
            HeroClass::Ranger => 6,
            HeroClass::Wizard => 5,
            HeroClass::Warrior | HeroClass::Rogue => 4,
        }
    }

    pub fn crit_bonus(self) -> f64 {
        match self {
            HeroClass::Rogue => 0.15,
            HeroClass::Ranger => 0.05,
            HeroClass::Warrior | HeroClass::Wizard => 0.0,
        }
    }

    pub fn defense_bonus(self) -> f64 {
        match self {
            HeroClass::Warrior => 0.15,
            HeroClass::Rogue => 0.05,
            HeroClass::Ranger | HeroClass::Wizard => 0.0,
        }
    }

    pub fn guild(self) -> BuildingKind {
        match self {
            HeroClass::Warrior => BuildingKind::WarriorGuild,
            HeroClass::Ranger => BuildingKind::RangerGuild,
            HeroClass::Wizard => BuildingKind::WizardGuild,
            HeroClass::Rogue => BuildingKind::RogueGuild,
        }
    }
}

impl fmt::Display for HeroClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Specialization {
    Guardian,
    Berserker,
    Paladin,
    Scout,
    Hunter,
    Beastmaster,
    Elementalist,
    Necromancer,
    Enchanter,
    Assassin,
    Thief,
    Shadowdancer,
}

/// Permanent stat deltas granted by a specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationBonus {
    pub health: i32,
    pub damage: i32,
    pub speed: i32,
}

impl Specialization {
    pub const ALL: [Specialization; 12] = [
        Specialization::Guardian,
        Specialization::Berserker,
        Specialization::Paladin,
        Specialization::Scout,
        Specialization::Hunter,
        Specialization::Beastmaster,
        Specialization::Elementalist,
        Specialization::Necromancer,
        Specialization::Enchanter,
        Specialization::Assassin,
        Specialization::Thief,
        Specialization::Shadowdancer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Specialization::Guardian => "Guardian",
            Specialization::Berserker => "Berserker",
            Specialization::Paladin => "Paladin",
            Specialization::Scout => "Scout",
            Specialization::Hunter => "Hunter",
            Specialization::Beastmaster => "Beastmaster",
            Specialization::Elementalist => "Elementalist",
            Specialization::Necromancer => "Necromancer",
            Specialization::Enchanter => "Enchanter",
            Specialization::Assassin => "Assassin",
            Specialization::Thief => "Thief",
            Specialization::Shadowdancer => "Shadowdancer",
        }
    }

    pub fn class(self) -> HeroClass {
        match self {
            Specialization::Guardian | Specialization::Berserker | Specialization::Paladin => {
                HeroClass::Warrior
            }
            Specialization::Scout | Specialization::Hunter | Specialization::Beastmaster => {
                HeroClass::Ranger
            }
            Specialization::Elementalist
            | Specialization::Necromancer
            | Specialization::Enchanter => HeroClass::Wizard,
            Specialization::Assassin | Specialization::Thief | Specialization::Shadowdancer => {
                HeroClass::Rogue
            }
        }
    }

    pub fn unlock_level(self) -> u32 {
        match self {
            Specialization::Paladin
            | Specialization::Beastmaster
            | Specialization::Necromancer
            | Specialization::Shadowdancer => 5,
            _ => 3,
        }
    }

    pub fn bonus(self) -> SpecializationBonus {
        let (health, damage, speed) = match self {
            Specialization::Guardian => (30, 5, 0),
            Specialization::Berserker => (10, 15, 1),
            Specialization::Paladin => (25, 10, 0),
            Specialization::Scout => (5, 8, 3),
            Specialization::Hunter => (10, 12, 1),
            Specialization::Beastmaster => (15, 5, 2),
            Specialization::Elementalist => (5, 20, 0),
            Specialization::Necromancer => (10, 15, 0),
            Specialization::Enchanter => (15, 8, 1),
            Specialization::Assassin => (5, 18, 2),
            Specialization::Thief => (10, 8, 3),
            Specialization::Shadowdancer => (8, 12, 4),
        };
        SpecializationBonus { health, damage, speed }
    }

    pub fn abilities(self) -> &'static [&'static str] {
        match self {
            Specialization::Guardian => &["taunt", "shield_wall", "protect_ally"],
            Specialization::Berserker => &["rage", "bloodlust", "cleave"],
            Specialization::Paladin => &["heal", "divine_smite", "blessing"],
            Specialization::Scout => &["stealth", "track", "ambush"],
            Specialization::Hunter => &["piercing_shot", "trap", "mark_target"],
            Specialization::Beastmaster => &["summon_wolf", "animal_bond", "pack_leader"],
            Specialization::Elementalist => &["fireball", "ice_shard", "lightning_bolt"],
            Specialization::Necromancer => &["raise_skeleton", "drain_life", "curse"],
            Specialization::Enchanter => &["enhance_weapon", "magic_shield", "haste"],
            Specialization::Assassin => &["backstab", "poison", "vanish"],
            Specialization::Thief => &["steal", "lockpick", "sleight_of_hand"],
            Specialization::Shadowdancer => &["shadow_step", "darkness", "shadow_clone"],
        }
    }

    pub fn crit_bonus(self) -> f64 {
        match self {
            Specialization::Assassin => 0.10,
            Specialization::Hunter | Specialization::Berserker => 0.05,
            _ => 0.0,
        }
    }

    pub fn defense_bonus(self) -> f64 {
        match self {
            Specialization::Guardian => 0.20,
            Specialization::Paladin => 0.10,
            _ => 0.0,
        }
    }
}

impl FromStr for Specialization {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specialization::ALL
            .into_iter()
            .find(|spec| spec.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

// ============================================================================
// Enemies & Flags
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnemyKind {
    Goblin,
    Orc,
    Troll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyStats {
    pub health: i32,
    pub damage: i32,
    pub reward: u32,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Goblin, EnemyKind::Orc, EnemyKind::Troll];

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Goblin => "Goblin",
            EnemyKind::Orc => "Orc",
            EnemyKind::Troll => "Troll",
        }
    }

    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Goblin => EnemyStats { health: 40, damage: 8, reward: 20 },
            EnemyKind::Orc => EnemyStats { health: 60, damage: 12, reward: 35 },
            EnemyKind::Troll => EnemyStats { health: 120, damage: 25, reward: 80 },
        }
    }

    /// Relative likelihood of this kind when an enemy spawns.
    pub fn spawn_weight(self) -> u32 {
        match self {
            EnemyKind::Goblin => 6,
            EnemyKind::Orc => 3,
            EnemyKind::Troll => 1,
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flag tags share their vocabulary with hero preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlagKind {
    Attack,
    Explore,
    Defend,
    Gold,
}

impl FlagKind {
    pub const ALL: [FlagKind; 4] = [
        FlagKind::Attack,
        FlagKind::Explore,
        FlagKind::Defend,
        FlagKind::Gold,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FlagKind::Attack => "attack",
            FlagKind::Explore => "explore",
            FlagKind::Defend => "defend",
            FlagKind::Gold => "gold",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FlagKind::Attack => "Attack Flag",
            FlagKind::Explore => "Explore Flag",
            FlagKind::Defend => "Defend Flag",
            FlagKind::Gold => "Bounty Flag",
        }
    }

    pub fn base_cost(self) -> u32 {
        match self {
            FlagKind::Attack => 50,
            FlagKind::Explore => 30,
            FlagKind::Defend => 40,
            FlagKind::Gold => 60,
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FlagKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlagKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EquipmentSlot {
    Weapon,
    Armor,
    Accessory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
}

impl Rarity {
    pub fn crit_bonus(self) -> f64 {
        match self {
            Rarity::Common => 0.0,
            Rarity::Rare => 0.05,
            Rarity::Epic => 0.10,
        }
    }

    pub fn damage_reduction(self) -> f64 {
        match self {
            Rarity::Common => 0.10,
            Rarity::Rare => 0.20,
            Rarity::Epic => 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: String,
    pub name: String,
    pub slot: EquipmentSlot,
    pub rarity: Rarity,
    pub health_bonus: i32,
    pub damage_bonus: i32,
    pub speed_bonus: i32,
    pub cost: u32,
}

static EQUIPMENT_CATALOG: Lazy<HashMap<&'static str, EquipmentItem>> = Lazy::new(|| {
    use EquipmentSlot::*;
    use Rarity::*;

    let rows: [(&'static str, &str, EquipmentSlot, Rarity, i32, i32, i32, u32); 9] = [
        ("iron_sword", "Iron Sword", Weapon, Common, 0, 8, 0, 50),
        ("steel_sword", "Steel Sword", Weapon, Rare, 0, 15, 1, 150),
        ("enchanted_blade", "Enchanted Blade", Weapon, Epic, 5, 25, 2, 500),
        ("leather_armor", "Leather Armor", Armor, Common, 15, 0, 0, 40),
        ("chainmail", "Chainmail", Armor, Rare, 30, 0, -1, 120),
        ("plate_armor", "Plate Armor", Armor, Epic, 50, 5, -2, 400),
        ("health_ring", "Ring of Vitality", Accessory, Rare, 25, 0, 0, 200),
        ("speed_boots", "Boots of Swiftness", Accessory, Rare, 0, 0, 3, 180),
        ("power_amulet", "Amulet of Power", Accessory, Epic, 10, 10, 1, 350),
    ];

    rows.into_iter()
        .map(|(id, name, slot, rarity, health_bonus, damage_bonus, speed_bonus, cost)| {
            (
                id,
                EquipmentItem {
                    id: id.to_string(),
                    name: name.to_string(),
                    slot,
                    rarity,
                    health_bonus,
                    damage_bonus,
                    speed_bonus,
                    cost,
                },
            )
        })
        .collect()
});

/// Look up an item by its catalog id (e.g. `iron_sword`).
pub fn equipment(id: &str) -> Option<&'static EquipmentItem> {
    EQUIPMENT_CATALOG.get(id)
}

/// Every catalog item, sorted by id.
pub fn equipment_catalog() -> Vec<&'static EquipmentItem> {
    let mut items: Vec<_> = EQUIPMENT_CATALOG.values().collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_keys_round_trip() {
        for kind in BuildingKind::ALL {
            assert_eq!(kind.key().parse::<BuildingKind>(), Ok(kind));
        }
        assert!("barracks".parse::<BuildingKind>().is_err());
    }

    #[test]
    fn test_guilds_map_to_classes() {
        for class in HeroClass::ALL {
            assert_eq!(class.guild().guild_class(), Some(class));
        }
        assert_eq!(BuildingKind::Marketplace.guild_class(), None);
    }

    #[test]
    fn test_specializations_cover_each_class_three_times() {
        for class in HeroClass::ALL {
            let count = Specialization::ALL.iter().filter(|s| s.class() == class).count();
            assert_eq!(count, 3, "{class} should have three specializations");
        }
    }

    #[test]
    fn test_equipment_catalog_lookup() {
        let sword = equipment("iron_sword").expect("iron sword in catalog");
        assert_eq!(sword.slot, EquipmentSlot::Weapon);
        assert_eq!(sword.damage_bonus, 8);
        assert!(equipment("excalibur").is_none());
        assert_eq!(equipment_catalog().len(), 9);
    }

    #[test]
    fn test_upgrade_cost_scales_with_level() {
        let first = BuildingKind::Marketplace.upgrade_cost(1);
        let second = BuildingKind::Marketplace.upgrade_cost(2);
        assert_eq!(second.gold, first.gold * 2);
    }
}
