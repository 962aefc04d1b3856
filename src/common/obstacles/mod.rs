//! Obstacle registry: classifies physics bodies by semantic obstacle type.
//!
//! Level construction registers bodies once; gameplay only reads.

use std::fmt;

use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use thiserror::Error;

/// Enemy archetype. Each shares the patrol/stomp behaviour but has its own stomp channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Archetype {
    Bee,
    Frog,
    Saw,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Bee, Archetype::Frog, Archetype::Saw];

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Bee => "bee",
            Archetype::Frog => "frog",
            Archetype::Saw => "saw",
        }
    }

    /// Saws hurt from every side; stomping one is a hit, not a kill.
    pub fn is_stompable(self) -> bool {
        !matches!(self, Archetype::Saw)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Spikes,
    Enemy(Archetype),
}

impl ObstacleKind {
    /// Classification priority: hazards before enemies, enemies in archetype order.
    pub const PRIORITY: [ObstacleKind; 4] = [
        ObstacleKind::Spikes,
        ObstacleKind::Enemy(Archetype::Bee),
        ObstacleKind::Enemy(Archetype::Frog),
        ObstacleKind::Enemy(Archetype::Saw),
    ];
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObstacleKind::Spikes => f.write_str("spikes"),
            ObstacleKind::Enemy(archetype) => f.write_str(archetype.as_str()),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("obstacle `{kind}` already registered for body {body}")]
    Duplicate { kind: ObstacleKind, body: Entity },
}

#[derive(Resource, Debug, Default)]
pub struct ObstacleRegistry {
    entries: HashSet<(ObstacleKind, Entity)>,
}

impl ObstacleRegistry {
    pub fn register(&mut self, kind: ObstacleKind, body: Entity) -> Result<(), RegistryError> {
        if !self.entries.insert((kind, body)) {
            return Err(RegistryError::Duplicate { kind, body });
        }
        Ok(())
    }

    #[inline]
    pub fn is_type(&self, kind: ObstacleKind, body: Entity) -> bool {
        self.entries.contains(&(kind, body))
    }

    /// First registered kind for `body`, in [`ObstacleKind::PRIORITY`] order.
    pub fn classify(&self, body: Entity) -> Option<ObstacleKind> {
        ObstacleKind::PRIORITY
            .into_iter()
            .find(|kind| self.is_type(*kind, body))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Level teardown.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
