//! Enemies plugin: patrolling bees, frogs and saws.
//!
//! Each enemy body carries a [`PatrolController`]. The controller owns the patrol cycle and
//! its stomp subscription; systems here only translate its output onto the physics body.
//!
//! Lifecycle after a stomp:
//! 1) controller enters `dead` (unsubscribes, starts the squash timer)
//! 2) `squash_stomped` clears collision filters and flattens the sprite toward its feet
//! 3) once squashed, the body is marked `PendingDespawn`
//! 4) `despawn_marked_enemies` removes it in PostUpdate
//!
//! Despawning is kept out of Update so physics never sees a body vanish mid-step.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::events::GameBus;
use crate::common::layers::Layer;
use crate::common::obstacles::{Archetype, ObstacleKind, ObstacleRegistry, RegistryError};
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

pub mod patrol;

pub use patrol::{PatrolController, PatrolState};

const SQUASHED_COLOR: Color = Color::srgb(0.55, 0.55, 0.55);

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy(pub Archetype);

/// Marker: enemy should be removed from the world at the end of the frame.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        (tick_patrols, squash_stomped)
            .chain()
            .run_if(in_state(GameState::InGame)),
    )
    .add_systems(
        PostUpdate,
        despawn_marked_enemies.run_if(in_state(GameState::InGame)),
    );
}

fn archetype_color(archetype: Archetype) -> Color {
    match archetype {
        Archetype::Bee => Color::srgb(0.95, 0.8, 0.2),
        Archetype::Frog => Color::srgb(0.3, 0.8, 0.35),
        Archetype::Saw => Color::srgb(0.75, 0.75, 0.8),
    }
}

/// Collision layers for an enemy that should no longer interact with anything.
#[inline]
fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [] as [Layer; 0])
}

/// Spawn one enemy body, register it as an obstacle and attach its patrol controller.
///
/// Registration happens before the controller subscribes, so a duplicate leaves no
/// listener behind.
pub fn spawn_enemy(
    commands: &mut Commands,
    registry: &mut ObstacleRegistry,
    bus: &GameBus,
    tunables: &Tunables,
    archetype: Archetype,
    at: Vec2,
) -> Result<Entity, RegistryError> {
    let size = tunables.enemy_size;
    let enemy_layers = CollisionLayers::new(Layer::Enemy, [Layer::World, Layer::Player]);

    let body = commands
        .spawn((
            Name::new(format!("{archetype:?}")),
            Enemy(archetype),
            Sprite {
                color: archetype_color(archetype),
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(at.extend(1.0)),
            RigidBody::Dynamic,
            Collider::rectangle(size.x, size.y),
            LockedAxes::ROTATION_LOCKED,
            enemy_layers,
            LinearVelocity::ZERO,
            DespawnOnExit(GameState::InGame),
        ))
        .id();

    if let Err(err) = registry.register(ObstacleKind::Enemy(archetype), body) {
        commands.entity(body).despawn();
        return Err(err);
    }

    commands
        .entity(body)
        .insert(PatrolController::new(archetype, body, bus.clone(), tunables));

    Ok(body)
}

fn tick_patrols(time: Res<Time>, mut q: Query<(&mut PatrolController, &mut LinearVelocity), With<Enemy>>) {
    let dt = time.delta_secs();
    for (mut ctrl, mut vel) in &mut q {
        ctrl.update(dt);
        if let Some(x) = ctrl.take_velocity_x() {
            vel.x = x;
        }
    }
}

/// Presentation and physics side of the `dead` state.
fn squash_stomped(
    mut commands: Commands,
    tunables: Res<Tunables>,
    mut q: Query<
        (
            Entity,
            &PatrolController,
            &RigidBody,
            &mut CollisionLayers,
            &mut LinearVelocity,
            &mut Sprite,
            &mut Transform,
        ),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    let height = tunables.enemy_size.y;
    for (e, ctrl, body, mut layers, mut vel, mut sprite, mut tf) in &mut q {
        let Some(progress) = ctrl.squash_progress() else {
            continue;
        };

        // A squashed enemy must not fall through the floor once its filters are gone.
        if !matches!(*body, RigidBody::Kinematic) {
            // `RigidBody` is an immutable component; replace it via re-insertion.
            commands.entity(e).insert(RigidBody::Kinematic);
            *layers = non_interacting_enemy_layers();
            sprite.color = SQUASHED_COLOR;
        }
        vel.0 = Vec2::ZERO;

        // Shrink toward the feet.
        let scale = (1.0 - progress).max(0.0);
        tf.translation.y -= height * 0.5 * (tf.scale.y - scale);
        tf.scale.y = scale;

        if ctrl.is_squashed() {
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

/// Despawn enemies marked for removal.
fn despawn_marked_enemies(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}

#[cfg(test)]
mod tests;
