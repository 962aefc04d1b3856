//! Gameplay events carried on the level's [`GameBus`].

use std::fmt;

use bevy::prelude::*;

use super::event_bus::{BusEvent, EventBus, Listener};
use super::obstacles::Archetype;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameChannel {
    CoinCollected,
    HealthChanged,
    Stomped(Archetype),
    ResetGame,
}

impl fmt::Display for GameChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameChannel::CoinCollected => f.write_str("coin-collected"),
            GameChannel::HealthChanged => f.write_str("health-changed"),
            GameChannel::Stomped(archetype) => write!(f, "{}-stomped", archetype.as_str()),
            GameChannel::ResetGame => f.write_str("reset-game"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    CoinCollected,
    HealthChanged(i32),
    /// Broadcast to every listener of the archetype; `body` names the defeated enemy.
    Stomped { archetype: Archetype, body: Entity },
    ResetGame,
}

impl BusEvent for GameEvent {
    type Channel = GameChannel;

    fn channel(&self) -> GameChannel {
        match *self {
            GameEvent::CoinCollected => GameChannel::CoinCollected,
            GameEvent::HealthChanged(_) => GameChannel::HealthChanged,
            GameEvent::Stomped { archetype, .. } => GameChannel::Stomped(archetype),
            GameEvent::ResetGame => GameChannel::ResetGame,
        }
    }
}

pub type GameListener = Listener<GameEvent>;

/// Session bus handle. Cloned into every controller; all clones share subscriptions.
#[derive(Resource, Clone, Default, Deref)]
pub struct GameBus(pub EventBus<GameEvent>);
