//! Global state machine.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
    /// One-frame hop between levels so `InGame` is exited and re-entered.
    LevelComplete,
    GameOver,
    /// Every level cleared.
    Win,
}
