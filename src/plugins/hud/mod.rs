//! HUD model: health, coins and resets as seen by the player.
//!
//! The HUD is a plain bus subscriber. It listens on `health-changed`, `coin-collected` and
//! `reset-game` for the lifetime of one `InGame` session and unsubscribes on exit.
//!
//! It also owns level progression: once the coin target is reached a short timer runs, then the
//! game moves to the next level through `LevelComplete`, or to `Win` after the last one.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicUsize, Ordering};

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::events::{GameBus, GameChannel, GameEvent, GameListener};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::world::LEVELS;

const CHANNELS: [GameChannel; 3] = [
    GameChannel::HealthChanged,
    GameChannel::CoinCollected,
    GameChannel::ResetGame,
];

#[derive(Debug, Default)]
struct Counters {
    health: AtomicI32,
    coins: AtomicU32,
    resets: AtomicU32,
    level: AtomicUsize,
}

/// Shared with the HUD's bus listener; reads are always the latest emitted values.
#[derive(Resource, Clone, Debug, Default)]
pub struct HudModel(Arc<Counters>);

impl HudModel {
    pub fn health(&self) -> i32 {
        self.0.health.load(Ordering::Relaxed)
    }

    pub fn coins(&self) -> u32 {
        self.0.coins.load(Ordering::Relaxed)
    }

    /// Game-over resets seen since startup.
    pub fn resets(&self) -> u32 {
        self.0.resets.load(Ordering::Relaxed)
    }

    /// Index into [`LEVELS`] of the level being played.
    pub fn level(&self) -> usize {
        self.0.level.load(Ordering::Relaxed)
    }

    pub fn set_level(&self, level: usize) {
        self.0.level.store(level, Ordering::Relaxed);
    }

    fn start_level(&self, max_health: i32) {
        self.0.health.store(max_health, Ordering::Relaxed);
        self.0.coins.store(0, Ordering::Relaxed);
    }

    fn apply(&self, event: &GameEvent, max_health: i32) {
        match *event {
            GameEvent::HealthChanged(value) => {
                self.0.health.store(value.clamp(0, max_health), Ordering::Relaxed);
            }
            GameEvent::CoinCollected => {
                self.0.coins.fetch_add(1, Ordering::Relaxed);
            }
            GameEvent::ResetGame => {
                self.start_level(max_health);
                self.set_level(0);
                self.0.resets.fetch_add(1, Ordering::Relaxed);
            }
            GameEvent::Stomped { .. } => {}
        }
    }
}

#[derive(Component)]
pub struct Hud;

#[derive(Resource)]
struct HudSubscription {
    subscriber: Entity,
    listener: GameListener,
}

/// Delay between reaching the coin target and leaving the level.
#[derive(Resource, Default)]
struct LevelAdvance(Option<Timer>);

pub fn plugin(app: &mut App) {
    app.init_resource::<HudModel>()
        .init_resource::<LevelAdvance>()
        .add_systems(OnEnter(GameState::InGame), subscribe_hud)
        .add_systems(OnExit(GameState::InGame), unsubscribe_hud)
        .add_systems(Update, advance_on_coins.run_if(in_state(GameState::InGame)));
}

fn subscribe_hud(
    mut commands: Commands,
    bus: Res<GameBus>,
    tunables: Res<Tunables>,
    model: Res<HudModel>,
    mut advance: ResMut<LevelAdvance>,
) {
    let max_health = tunables.max_health;
    model.start_level(max_health);
    advance.0 = None;

    let subscriber = commands
        .spawn((Name::new("Hud"), Hud, DespawnOnExit(GameState::InGame)))
        .id();

    let sink = model.clone();
    let listener = GameListener::new(move |_, ev| sink.apply(ev, max_health));
    for channel in CHANNELS {
        bus.subscribe(channel, subscriber, listener.clone());
    }

    commands.insert_resource(HudSubscription { subscriber, listener });
}

fn unsubscribe_hud(mut commands: Commands, bus: Res<GameBus>, sub: Option<Res<HudSubscription>>) {
    let Some(sub) = sub else {
        return;
    };
    for channel in CHANNELS {
        bus.unsubscribe(channel, sub.subscriber, &sub.listener);
    }
    commands.remove_resource::<HudSubscription>();
}

fn advance_on_coins(
    time: Res<Time>,
    tunables: Res<Tunables>,
    model: Res<HudModel>,
    mut advance: ResMut<LevelAdvance>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if advance.0.is_none() {
        if model.coins() >= tunables.coins_to_advance {
            info!("level {} complete", model.level() + 1);
            advance.0 = Some(Timer::from_seconds(tunables.level_advance_delay_secs, TimerMode::Once));
        }
        return;
    }

    let Some(timer) = advance.0.as_mut() else {
        return;
    };
    if !timer.tick(time.delta()).is_finished() {
        return;
    }
    advance.0 = None;

    let next = model.level() + 1;
    if next < LEVELS.len() {
        model.set_level(next);
        next_state.set(GameState::LevelComplete);
    } else {
        model.set_level(0);
        next_state.set(GameState::Win);
    }
}

#[cfg(test)]
mod tests;
