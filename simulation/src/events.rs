//! Game events
//!
//! Discrete notifications the core emits for messaging/achievement
//! collaborators. The core never depends on anyone listening: events fan out
//! to subscribers and are kept in a bounded buffer the host may drain.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingKind, EnemyKind, FlagKind, HeroClass, Specialization};
use crate::components::{BuildingId, CombatRecord, EnemyId, FlagId, HeroId, Position, Production};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    CastleDestroyed,
    CastleOverrun,
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOverReason::CastleDestroyed => f.write_str("Your castle has been destroyed!"),
            GameOverReason::CastleOverrun => f.write_str("Enemies have overrun your castle!"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BuildingPlaced {
        id: BuildingId,
        kind: BuildingKind,
        position: Position,
    },
    BuildingUpgraded {
        id: BuildingId,
        kind: BuildingKind,
        level: u32,
    },
    HeroRecruited {
        id: HeroId,
        name: String,
        class: HeroClass,
        position: Position,
    },
    EnemySpawned {
        id: EnemyId,
        kind: EnemyKind,
        position: Position,
    },
    EnemyDefeated {
        enemy: EnemyId,
        kind: EnemyKind,
        hero: HeroId,
        hero_name: String,
        gold: u32,
        experience: u32,
    },
    /// Permanent loss.
    HeroDefeated {
        id: HeroId,
        name: String,
        by: EnemyKind,
        record: CombatRecord,
    },
    HeroRespawned {
        id: HeroId,
        name: String,
        fee: u32,
        position: Position,
    },
    HeroLeveledUp {
        id: HeroId,
        name: String,
        level: u32,
    },
    SpecializationAssigned {
        id: HeroId,
        name: String,
        specialization: Specialization,
    },
    ItemEquipped {
        id: HeroId,
        name: String,
        item: String,
    },
    FlagPlaced {
        id: FlagId,
        kind: FlagKind,
        position: Position,
    },
    FlagCollected {
        id: FlagId,
        kind: FlagKind,
        hero: HeroId,
        hero_name: String,
        reward: u32,
    },
    FlagCancelled {
        id: FlagId,
        kind: FlagKind,
        refund: u32,
    },
    CombatExchange {
        hero: HeroId,
        enemy: EnemyId,
        dealt: i32,
        taken: i32,
        critical: bool,
    },
    IncomeCollected {
        income: Production,
    },
    GameOver {
        reason: GameOverReason,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::BuildingPlaced { kind, position, .. } => {
                write!(f, "{kind} built at {position}")
            }
            GameEvent::BuildingUpgraded { kind, level, .. } => {
                write!(f, "{kind} upgraded to level {level}")
            }
            GameEvent::HeroRecruited { name, class, .. } => {
                write!(f, "{name} the {class} has joined your kingdom")
            }
            GameEvent::EnemySpawned { kind, .. } => write!(f, "{kind} approaches your kingdom!"),
            GameEvent::EnemyDefeated { kind, hero_name, gold, .. } => {
                write!(f, "{kind} defeated by {hero_name} (+{gold} gold)")
            }
            GameEvent::HeroDefeated { name, by, .. } => {
                write!(f, "{name} has fallen to a {by} and could not be revived")
            }
            GameEvent::HeroRespawned { name, fee, .. } => {
                write!(f, "{name} respawned at the guild (-{fee} gold)")
            }
            GameEvent::HeroLeveledUp { name, level, .. } => {
                write!(f, "{name} reached level {level}!")
            }
            GameEvent::SpecializationAssigned { name, specialization, .. } => {
                write!(
                    f,
                    "{name} is now a {} ({})",
                    specialization.name(),
                    specialization.abilities().join(", ")
                )
            }
            GameEvent::ItemEquipped { name, item, .. } => write!(f, "{name} equipped {item}"),
            GameEvent::FlagPlaced { kind, position, .. } => write!(f, "{kind} placed at {position}"),
            GameEvent::FlagCollected { kind, hero_name, reward, .. } => {
                write!(f, "{hero_name} collected {reward} gold from the {kind}")
            }
            GameEvent::FlagCancelled { kind, refund, .. } => {
                write!(f, "{kind} removed, {refund} gold refunded")
            }
            GameEvent::CombatExchange { dealt, taken, critical, .. } => {
                let crit = if *critical { " (critical)" } else { "" };
                write!(f, "combat: dealt {dealt}{crit}, took {taken}")
            }
            GameEvent::IncomeCollected { income } => write!(
                f,
                "income: +{} gold, +{} mana, +{} supplies",
                income.gold, income.mana, income.supplies
            ),
            GameEvent::GameOver { reason } => write!(f, "Game over. {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedEvent {
    pub tick: u64,
    pub at: DateTime<Utc>,
    pub event: GameEvent,
}

pub type Subscriber = Box<dyn FnMut(&TimestampedEvent) + Send>;

pub struct EventBus {
    subscribers: Vec<Subscriber>,
    recent: VecDeque<TimestampedEvent>,
    capacity: usize,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&TimestampedEvent) + Send + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn emit(&mut self, tick: u64, event: GameEvent) {
        let stamped = TimestampedEvent {
            tick,
            at: Utc::now(),
            event,
        };
        for subscriber in &mut self.subscribers {
            subscriber(&stamped);
        }
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(stamped);
    }

    /// Take everything buffered since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<TimestampedEvent> {
        self.recent.drain(..).collect()
    }

    pub fn recent(&self) -> impl Iterator<Item = &TimestampedEvent> {
        self.recent.iter()
    }

    pub fn clear(&mut self) {
        self.recent.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("buffered", &self.recent.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_buffer_is_bounded() {
        let mut bus = EventBus::new(2);
        for tick in 0..5 {
            bus.emit(tick, GameEvent::IncomeCollected { income: Production::default() });
        }
        let drained = bus.drain();
        assert_eq!(drained.iter().map(|e| e.tick).collect::<Vec<_>>(), vec![3, 4]);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_subscribers_see_every_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut bus = EventBus::new(0);
        bus.subscribe(move |e| sink.lock().unwrap().push(e.tick));
        bus.emit(7, GameEvent::GameOver { reason: GameOverReason::CastleOverrun });
        assert_eq!(*seen.lock().unwrap(), vec![7]);
        assert_eq!(bus.recent().count(), 0);
    }

    #[test]
    fn test_messages_read_naturally() {
        let event = GameEvent::FlagCollected {
            id: FlagId(1),
            kind: FlagKind::Explore,
            hero: HeroId(2),
            hero_name: "Aldric".into(),
            reward: 30,
        };
        assert_eq!(event.to_string(), "Aldric collected 30 gold from the Explore Flag");
    }
}
