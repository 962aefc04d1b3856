//! World plugin: builds the current level on entering `InGame` and tears it down on exit.
//!
//! The level index lives in [`HudModel`]; `LevelComplete` bounces straight back into `InGame` so
//! the next level is built by the same enter system.
//!
//! Every obstacle body (spikes, enemies) is registered in [`ObstacleRegistry`] while the level
//! is built. A duplicate registration aborts construction through the system's `Result`.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use thiserror::Error;

use crate::common::body_data::BodyData;
use crate::common::events::GameBus;
use crate::common::layers::Layer;
use crate::common::obstacles::{Archetype, ObstacleKind, ObstacleRegistry, RegistryError};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::enemies::{self, PatrolController};
use crate::plugins::hud::HudModel;
use crate::plugins::player;

const TILE: f32 = 64.0;
const SPIKE_SIZE: Vec2 = Vec2::new(TILE, 20.0);
const PICKUP_SIZE: f32 = 24.0;

const TILE_COLOR: Color = Color::srgb(0.25, 0.27, 0.33);
const SPIKE_COLOR: Color = Color::srgb(0.85, 0.2, 0.3);
const COIN_COLOR: Color = Color::srgb(1.0, 0.85, 0.1);
const HEALTH_COLOR: Color = Color::srgb(0.3, 0.95, 0.5);

/// Static level geometry; collisions with it end a jump.
#[derive(Component, Debug, Clone, Copy)]
pub struct LevelTile;

/// One entry of a level description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Spawn {
    Tile { center: Vec2, size: Vec2 },
    Spikes(Vec2),
    Coin(Vec2),
    /// `points: None` falls back to the default pickup value.
    Health { at: Vec2, points: Option<i32> },
    Enemy(Archetype, Vec2),
    Player(Vec2),
}

const GROUND: Spawn = Spawn::Tile { center: Vec2::new(0.0, -320.0), size: Vec2::new(TILE * 30.0, TILE) };
const LEFT_WALL: Spawn = Spawn::Tile { center: Vec2::new(-TILE * 15.5, 0.0), size: Vec2::new(TILE, TILE * 11.0) };
const RIGHT_WALL: Spawn = Spawn::Tile { center: Vec2::new(TILE * 15.5, 0.0), size: Vec2::new(TILE, TILE * 11.0) };
const START: Spawn = Spawn::Player(Vec2::new(-800.0, -256.0));

/// Bees only.
pub const LEVEL_1: &[Spawn] = &[
    GROUND,
    LEFT_WALL,
    RIGHT_WALL,
    // Platforms.
    Spawn::Tile { center: Vec2::new(-384.0, -128.0), size: Vec2::new(TILE * 4.0, TILE * 0.5) },
    Spawn::Tile { center: Vec2::new(64.0, -32.0), size: Vec2::new(TILE * 3.0, TILE * 0.5) },
    Spawn::Tile { center: Vec2::new(512.0, 64.0), size: Vec2::new(TILE * 4.0, TILE * 0.5) },
    // Hazards.
    Spawn::Spikes(Vec2::new(-128.0, -278.0)),
    Spawn::Spikes(Vec2::new(-64.0, -278.0)),
    Spawn::Spikes(Vec2::new(704.0, -278.0)),
    // Pickups.
    Spawn::Coin(Vec2::new(-704.0, -240.0)),
    Spawn::Coin(Vec2::new(-448.0, -80.0)),
    Spawn::Coin(Vec2::new(-320.0, -80.0)),
    Spawn::Coin(Vec2::new(-192.0, -180.0)),
    Spawn::Coin(Vec2::new(64.0, 16.0)),
    Spawn::Coin(Vec2::new(192.0, -240.0)),
    Spawn::Coin(Vec2::new(320.0, -240.0)),
    Spawn::Coin(Vec2::new(448.0, 112.0)),
    Spawn::Coin(Vec2::new(576.0, 112.0)),
    Spawn::Coin(Vec2::new(832.0, -240.0)),
    Spawn::Health { at: Vec2::new(-640.0, -256.0), points: Some(50) },
    Spawn::Health { at: Vec2::new(512.0, 112.0), points: None },
    // Enemies.
    Spawn::Enemy(Archetype::Bee, Vec2::new(-512.0, -270.0)),
    Spawn::Enemy(Archetype::Bee, Vec2::new(256.0, -270.0)),
    Spawn::Enemy(Archetype::Bee, Vec2::new(512.0, 98.0)),
    START,
];

/// Frogs only.
pub const LEVEL_2: &[Spawn] = &[
    GROUND,
    LEFT_WALL,
    RIGHT_WALL,
    Spawn::Tile { center: Vec2::new(-256.0, -96.0), size: Vec2::new(TILE * 4.0, TILE * 0.5) },
    Spawn::Tile { center: Vec2::new(256.0, 0.0), size: Vec2::new(TILE * 3.0, TILE * 0.5) },
    Spawn::Tile { center: Vec2::new(640.0, -160.0), size: Vec2::new(TILE * 3.0, TILE * 0.5) },
    Spawn::Spikes(Vec2::new(-576.0, -278.0)),
    Spawn::Spikes(Vec2::new(448.0, -278.0)),
    Spawn::Coin(Vec2::new(-704.0, -240.0)),
    Spawn::Coin(Vec2::new(-352.0, -48.0)),
    Spawn::Coin(Vec2::new(-256.0, -48.0)),
    Spawn::Coin(Vec2::new(-160.0, -48.0)),
    Spawn::Coin(Vec2::new(0.0, -240.0)),
    Spawn::Coin(Vec2::new(192.0, 48.0)),
    Spawn::Coin(Vec2::new(320.0, 48.0)),
    Spawn::Coin(Vec2::new(576.0, -112.0)),
    Spawn::Coin(Vec2::new(704.0, -112.0)),
    Spawn::Coin(Vec2::new(832.0, -240.0)),
    Spawn::Health { at: Vec2::new(0.0, -180.0), points: Some(25) },
    Spawn::Enemy(Archetype::Frog, Vec2::new(-384.0, -270.0)),
    Spawn::Enemy(Archetype::Frog, Vec2::new(128.0, -270.0)),
    Spawn::Enemy(Archetype::Frog, Vec2::new(256.0, 34.0)),
    Spawn::Enemy(Archetype::Frog, Vec2::new(640.0, -126.0)),
    START,
];

/// Saws only.
pub const LEVEL_3: &[Spawn] = &[
    GROUND,
    LEFT_WALL,
    RIGHT_WALL,
    Spawn::Tile { center: Vec2::new(-448.0, -112.0), size: Vec2::new(TILE * 4.0, TILE * 0.5) },
    Spawn::Tile { center: Vec2::new(0.0, -16.0), size: Vec2::new(TILE * 3.0, TILE * 0.5) },
    Spawn::Tile { center: Vec2::new(448.0, -112.0), size: Vec2::new(TILE * 4.0, TILE * 0.5) },
    Spawn::Spikes(Vec2::new(-640.0, -278.0)),
    Spawn::Spikes(Vec2::new(640.0, -278.0)),
    Spawn::Coin(Vec2::new(-704.0, -240.0)),
    Spawn::Coin(Vec2::new(-544.0, -64.0)),
    Spawn::Coin(Vec2::new(-448.0, -64.0)),
    Spawn::Coin(Vec2::new(-352.0, -64.0)),
    Spawn::Coin(Vec2::new(-64.0, 32.0)),
    Spawn::Coin(Vec2::new(64.0, 32.0)),
    Spawn::Coin(Vec2::new(352.0, -64.0)),
    Spawn::Coin(Vec2::new(448.0, -64.0)),
    Spawn::Coin(Vec2::new(544.0, -64.0)),
    Spawn::Coin(Vec2::new(832.0, -240.0)),
    Spawn::Health { at: Vec2::new(0.0, -240.0), points: Some(50) },
    Spawn::Enemy(Archetype::Saw, Vec2::new(-192.0, -270.0)),
    Spawn::Enemy(Archetype::Saw, Vec2::new(224.0, -270.0)),
    Spawn::Enemy(Archetype::Saw, Vec2::new(0.0, 18.0)),
    START,
];

/// Levels in play order. A game starts at index 0 and a reset returns there.
pub const LEVELS: &[&[Spawn]] = &[LEVEL_1, LEVEL_2, LEVEL_3];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("no level at index {0}")]
    Unknown(usize),
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_level)
        .add_systems(OnExit(GameState::InGame), teardown_level)
        .add_systems(OnEnter(GameState::LevelComplete), start_next_level);
}

fn spawn_level(
    mut commands: Commands,
    bus: Res<GameBus>,
    tunables: Res<Tunables>,
    hud: Res<HudModel>,
    mut registry: ResMut<ObstacleRegistry>,
) -> Result {
    let index = hud.level();
    let level = LEVELS.get(index).ok_or(LevelError::Unknown(index))?;
    build_level(&mut commands, &mut registry, &bus, &tunables, level)?;
    info!("level {} built: {} obstacles registered", index + 1, registry.len());
    Ok(())
}

fn start_next_level(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::InGame);
}

/// Spawn every entry of `level`, registering obstacle bodies as they are created.
pub fn build_level(
    commands: &mut Commands,
    registry: &mut ObstacleRegistry,
    bus: &GameBus,
    tunables: &Tunables,
    level: &[Spawn],
) -> Result<(), RegistryError> {
    let mut players = 0;

    for spawn in level {
        match *spawn {
            Spawn::Tile { center, size } => {
                spawn_tile(commands, center, size);
            }
            Spawn::Spikes(at) => {
                let body = spawn_spikes(commands, at);
                registry.register(ObstacleKind::Spikes, body)?;
            }
            Spawn::Coin(at) => {
                spawn_pickup(commands, at, COIN_COLOR, BodyData::default().with("type", "coin"));
            }
            Spawn::Health { at, points } => {
                let mut data = BodyData::default().with("type", "health");
                if let Some(points) = points {
                    data = data.with("healthPoints", points);
                }
                spawn_pickup(commands, at, HEALTH_COLOR, data);
            }
            Spawn::Enemy(archetype, at) => {
                enemies::spawn_enemy(commands, registry, bus, tunables, archetype, at)?;
            }
            Spawn::Player(at) => {
                player::spawn_player(commands, bus, tunables, at);
                players += 1;
            }
        }
    }

    if players != 1 {
        warn!("level has {players} player spawns");
    }
    Ok(())
}

fn spawn_tile(commands: &mut Commands, center: Vec2, size: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Tile"),
            LevelTile,
            Sprite {
                color: TILE_COLOR,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(center.extend(0.0)),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            CollisionLayers::new(Layer::World, [Layer::Player, Layer::Enemy]),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

fn spawn_spikes(commands: &mut Commands, at: Vec2) -> Entity {
    commands
        .spawn((
            Name::new("Spikes"),
            Sprite {
                color: SPIKE_COLOR,
                custom_size: Some(SPIKE_SIZE),
                ..default()
            },
            Transform::from_translation(at.extend(0.5)),
            RigidBody::Static,
            Collider::rectangle(SPIKE_SIZE.x, SPIKE_SIZE.y),
            CollisionLayers::new(Layer::Hazard, [Layer::Player]),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

fn spawn_pickup(commands: &mut Commands, at: Vec2, color: Color, data: BodyData) -> Entity {
    commands
        .spawn((
            Name::new("Pickup"),
            data,
            Sprite {
                color,
                custom_size: Some(Vec2::splat(PICKUP_SIZE)),
                ..default()
            },
            Transform::from_translation(at.extend(0.5)),
            RigidBody::Static,
            Collider::circle(PICKUP_SIZE * 0.5),
            Sensor,
            CollisionLayers::new(Layer::Pickup, [Layer::Player]),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

/// Release every enemy's bus subscription and forget the level's obstacles.
fn teardown_level(mut registry: ResMut<ObstacleRegistry>, mut q: Query<&mut PatrolController>) {
    for mut ctrl in &mut q {
        ctrl.destroy();
    }
    registry.clear();
    info!("level torn down");
}
