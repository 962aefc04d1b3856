//! Player plugin.
//!
//! Pipeline:
//! - Update: sample input → tick `PlayerController` → drain its velocity command → tint sprite
//! - FixedPostUpdate: classify `CollisionStart` partners and feed them to the controller
//!
//! The controller is plain data on the player entity; these systems are the only place that
//! touch the physics body or despawn consumed pickups.

use avian2d::collision::narrow_phase::CollisionEventSystems;
use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::body_data::BodyData;
use crate::common::events::GameBus;
use crate::common::obstacles::ObstacleRegistry;
use crate::common::{layers::Layer, state::GameState, tunables::Tunables};
use crate::plugins::world::LevelTile;

pub mod contact;
pub mod controller;

pub use contact::{Contact, PartnerView, PickupKind};
pub use controller::{PlayerController, PlayerInput, PlayerState, Pose, VelocityCommand};

const PLAYER_COLOR: Color = Color::srgb(0.2, 0.75, 0.9);
const HIT_COLOR: Color = Color::srgb(1.0, 0.25, 0.25);
const DEAD_COLOR: Color = Color::srgb(0.45, 0.45, 0.5);

#[derive(Component)]
pub struct Player;

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerInput>()
        .add_systems(
            Update,
            (gather_input, tick_player, apply_player_visuals)
                .chain()
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            handle_player_collisions
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        );
}

/// Spawn the player body with its controller. Called by level construction.
pub fn spawn_player(commands: &mut Commands, bus: &GameBus, tunables: &Tunables, at: Vec2) -> Entity {
    let size = tunables.player_size;
    let layers = CollisionLayers::new(
        Layer::Player,
        [Layer::World, Layer::Enemy, Layer::Hazard, Layer::Pickup],
    );

    commands
        .spawn((
            Name::new("Player"),
            Player,
            PlayerController::new(bus.clone(), tunables),
            Sprite {
                color: PLAYER_COLOR,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(at.extend(1.0)),
            RigidBody::Dynamic,
            Collider::rectangle(size.x, size.y),
            LockedAxes::ROTATION_LOCKED,
            CollisionEventsEnabled,
            layers,
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

// `Option<Res<..>>` keeps this a no-op in headless apps without an input plugin.
fn gather_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<PlayerInput>) {
    let Some(keys) = keys else {
        return;
    };

    *input = PlayerInput {
        left: keys.any_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]),
        right: keys.any_pressed([KeyCode::ArrowRight, KeyCode::KeyD]),
        jump_pressed: keys.any_just_pressed([KeyCode::Space, KeyCode::ArrowUp]),
    };
}

fn tick_player(
    time: Res<Time>,
    input: Res<PlayerInput>,
    mut next_state: ResMut<NextState<GameState>>,
    mut q_player: Query<(&mut PlayerController, &Transform, &mut LinearVelocity), With<Player>>,
) {
    let Ok((mut ctrl, tf, mut vel)) = q_player.single_mut() else {
        return;
    };

    ctrl.update(*input, tf.translation.truncate(), time.delta_secs());
    ctrl.take_velocity().apply(&mut vel.0);

    if let Some(next) = ctrl.take_scene_request() {
        info!("player requested {next:?}");
        next_state.set(next);
    }
}

pub fn handle_player_collisions(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    registry: Res<ObstacleRegistry>,
    mut q_player: Query<(Entity, &mut PlayerController, &Transform, &mut LinearVelocity), With<Player>>,
    q_partner: Query<(&Transform, Has<LevelTile>, Option<&BodyData>), Without<Player>>,
    // Per-pass dedupe: one reaction per partner body.
    mut seen: Local<HashSet<Entity>>,
) {
    seen.clear();

    let Ok((player, mut ctrl, tf, mut vel)) = q_player.single_mut() else {
        return;
    };

    for ev in started.read() {
        let partner = if ev.collider1 == player {
            ev.collider2
        } else if ev.collider2 == player {
            ev.collider1
        } else {
            continue;
        };

        if !seen.insert(partner) {
            continue;
        }

        let view = q_partner
            .get(partner)
            .ok()
            .map(|(partner_tf, tile, data)| PartnerView {
                position: partner_tf.translation.truncate(),
                tile,
                data,
            });
        let contact = contact::classify(&registry, partner, view);
        debug!("player contact {partner}: {contact:?}");

        ctrl.on_collide(tf.translation.truncate(), contact);
    }

    ctrl.take_velocity().apply(&mut vel.0);

    for pickup in ctrl.take_removed() {
        if let Ok(mut entity) = commands.get_entity(pickup) {
            entity.despawn();
        }
    }
}

fn apply_player_visuals(mut q_player: Query<(&PlayerController, &mut Sprite), With<Player>>) {
    for (ctrl, mut sprite) in &mut q_player {
        sprite.flip_x = ctrl.facing_left();
        sprite.color = if ctrl.pose() == Pose::Dead {
            DEAD_COLOR
        } else if ctrl.is_flashing() {
            HIT_COLOR
        } else {
            PLAYER_COLOR
        };
    }
}
