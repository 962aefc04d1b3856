//! Unit tests for the enemies module.
//!
//! Controller tests drive `PatrolController` directly with explicit deltas; system tests run
//! one system against a bare `World` the same way the player tests do.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::events::{GameBus, GameChannel, GameEvent};
use crate::common::obstacles::{Archetype, ObstacleKind, ObstacleRegistry};
use crate::common::test_utils::run_system_once;
use crate::common::tunables::Tunables;

use super::*;

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn entities<const N: usize>() -> [Entity; N] {
    let mut world = World::new();
    std::array::from_fn(|_| world.spawn_empty().id())
}

fn patrol(archetype: Archetype, body: Entity, bus: &GameBus) -> PatrolController {
    PatrolController::new(archetype, body, bus.clone(), &Tunables::default())
}

fn stomp(bus: &GameBus, archetype: Archetype, body: Entity) {
    bus.emit(&GameEvent::Stomped { archetype, body });
}

fn time_with_delta(dt: f32) -> Time {
    let mut t = Time::<()>::default();
    t.advance_by(Duration::from_secs_f32(dt));
    t
}

// -----------------------------------------------------------------------------
// Patrol cycle
// -----------------------------------------------------------------------------

#[test]
fn idle_passes_through_to_move_left_on_first_update() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut ctrl = patrol(Archetype::Bee, body, &bus);

    assert!(ctrl.is_state(PatrolState::Idle));

    ctrl.update(0.016);
    assert!(ctrl.is_state(PatrolState::MoveLeft));
    assert!(ctrl.facing_left());
}

#[test]
fn patrol_alternates_legs_at_two_seconds() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut ctrl = patrol(Archetype::Frog, body, &bus);
    ctrl.update(0.0);
    assert!(ctrl.is_state(PatrolState::MoveLeft));

    ctrl.update(1.0);
    assert!(ctrl.is_state(PatrolState::MoveLeft));
    assert_eq!(ctrl.take_velocity_x(), Some(-90.0));

    // Reaching the leg time exactly flips direction.
    ctrl.update(1.0);
    assert!(ctrl.is_state(PatrolState::MoveRight));

    ctrl.update(1.5);
    assert!(ctrl.is_state(PatrolState::MoveRight));
    assert_eq!(ctrl.take_velocity_x(), Some(90.0));
    assert!(!ctrl.facing_left());

    ctrl.update(0.5);
    assert!(ctrl.is_state(PatrolState::MoveLeft));
}

#[test]
fn each_leg_restarts_its_clock() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut ctrl = patrol(Archetype::Saw, body, &bus);
    ctrl.update(0.0);

    // Overshoot the first leg; the surplus is not carried into the next.
    ctrl.update(3.0);
    assert!(ctrl.is_state(PatrolState::MoveRight));
    ctrl.update(1.9);
    assert!(ctrl.is_state(PatrolState::MoveRight));
}

// -----------------------------------------------------------------------------
// Stomp targeting
// -----------------------------------------------------------------------------

#[test]
fn stomp_only_kills_the_named_body() {
    let bus = GameBus::default();
    let [a, b] = entities();
    let mut first = patrol(Archetype::Bee, a, &bus);
    let mut second = patrol(Archetype::Bee, b, &bus);
    first.update(0.0);
    second.update(0.0);

    stomp(&bus, Archetype::Bee, a);
    // Applied on the next tick, not inside the emit.
    assert!(first.is_state(PatrolState::MoveLeft));
    assert!(first.is_subscribed());

    first.update(0.016);
    second.update(0.016);

    assert!(first.is_state(PatrolState::Dead));
    assert!(second.is_state(PatrolState::MoveLeft));
}

#[test]
fn stomp_on_another_archetype_channel_is_not_heard() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut frog = patrol(Archetype::Frog, body, &bus);
    frog.update(0.0);

    stomp(&bus, Archetype::Bee, body);
    frog.update(0.016);

    assert!(frog.is_state(PatrolState::MoveLeft));
}

#[test]
fn stomp_before_first_update_skips_the_patrol() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut ctrl = patrol(Archetype::Bee, body, &bus);

    stomp(&bus, Archetype::Bee, body);
    ctrl.update(0.016);
    ctrl.update(0.016);

    assert!(ctrl.is_state(PatrolState::Dead));
}

#[test]
fn dead_unsubscribes_exactly_once() {
    let bus = GameBus::default();
    let [a, b] = entities();
    let mut first = patrol(Archetype::Bee, a, &bus);
    let _second = patrol(Archetype::Bee, b, &bus);
    let channel = GameChannel::Stomped(Archetype::Bee);
    assert_eq!(bus.listener_count(channel), 2);

    stomp(&bus, Archetype::Bee, a);
    first.update(0.016);
    assert!(!first.is_subscribed());
    assert_eq!(bus.listener_count(channel), 1);

    // Repeat stomps and explicit teardown do not remove the neighbour's listener.
    stomp(&bus, Archetype::Bee, a);
    first.update(0.016);
    first.destroy();
    assert_eq!(bus.listener_count(channel), 1);
}

#[test]
fn dead_is_terminal() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut ctrl = patrol(Archetype::Frog, body, &bus);
    ctrl.update(0.0);

    stomp(&bus, Archetype::Frog, body);
    for _ in 0..10 {
        ctrl.update(1.0);
    }

    assert!(ctrl.is_state(PatrolState::Dead));
}

#[test]
fn squash_finishes_after_squash_time() {
    let bus = GameBus::default();
    let [body] = entities();
    let mut ctrl = patrol(Archetype::Bee, body, &bus);
    assert_eq!(ctrl.squash_progress(), None);

    stomp(&bus, Archetype::Bee, body);
    ctrl.update(0.016);
    assert_eq!(ctrl.take_velocity_x(), Some(0.0));
    assert_eq!(ctrl.squash_progress(), Some(0.0));

    ctrl.update(0.15);
    assert!(!ctrl.is_squashed());
    ctrl.update(0.15);
    assert!(ctrl.is_squashed());
}

#[test]
fn destroy_and_drop_release_the_subscription() {
    let bus = GameBus::default();
    let [a, b] = entities();
    let channel = GameChannel::Stomped(Archetype::Saw);

    let mut first = patrol(Archetype::Saw, a, &bus);
    let second = patrol(Archetype::Saw, b, &bus);
    assert_eq!(bus.listener_count(channel), 2);

    first.destroy();
    assert_eq!(bus.listener_count(channel), 1);

    drop(second);
    assert_eq!(bus.listener_count(channel), 0);
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

fn spawn_test_enemy(world: &mut World, archetype: Archetype) -> Entity {
    let bus = world.resource::<GameBus>().clone();
    run_system_once(world, move |mut commands: Commands, mut registry: ResMut<ObstacleRegistry>| {
        spawn_enemy(
            &mut commands,
            &mut registry,
            &bus,
            &Tunables::default(),
            archetype,
            Vec2::new(0.0, 100.0),
        )
        .expect("fresh body")
    })
}

fn test_world() -> World {
    let mut world = World::new();
    world.insert_resource(GameBus::default());
    world.insert_resource(ObstacleRegistry::default());
    world.insert_resource(Tunables::default());
    world
}

#[test]
fn spawn_enemy_registers_and_subscribes() {
    let mut world = test_world();
    let body = spawn_test_enemy(&mut world, Archetype::Frog);

    assert!(world.resource::<ObstacleRegistry>().is_type(ObstacleKind::Enemy(Archetype::Frog), body));
    assert_eq!(
        world
            .resource::<GameBus>()
            .listener_count(GameChannel::Stomped(Archetype::Frog)),
        1
    );
    assert!(world.get::<PatrolController>(body).is_some());
}

#[test]
fn tick_patrols_drives_body_velocity() {
    let mut world = test_world();
    let body = spawn_test_enemy(&mut world, Archetype::Bee);
    world.insert_resource(time_with_delta(0.016));

    // idle -> move-left, then the first move-left tick.
    run_system_once(&mut world, tick_patrols);
    run_system_once(&mut world, tick_patrols);

    let vel = world.get::<LinearVelocity>(body).expect("velocity");
    assert_eq!(vel.x, -90.0);
}

#[test]
fn stomped_enemy_is_squashed_then_despawned() {
    let mut world = test_world();
    let body = spawn_test_enemy(&mut world, Archetype::Bee);
    let other = spawn_test_enemy(&mut world, Archetype::Bee);
    world.insert_resource(time_with_delta(0.016));

    stomp(world.resource::<GameBus>(), Archetype::Bee, body);
    run_system_once(&mut world, tick_patrols);
    run_system_once(&mut world, squash_stomped);

    let layers = world.get::<CollisionLayers>(body).expect("layers");
    assert_eq!(layers.filters, LayerMask::NONE);
    assert!(matches!(world.get::<RigidBody>(body), Some(RigidBody::Kinematic)));
    assert!(world.get::<PendingDespawn>(body).is_none());

    world.insert_resource(time_with_delta(0.25));
    run_system_once(&mut world, tick_patrols);
    run_system_once(&mut world, squash_stomped);
    assert!(world.get::<PendingDespawn>(body).is_some());

    run_system_once(&mut world, despawn_marked_enemies);
    assert!(world.get_entity(body).is_err());
    assert!(world.get_entity(other).is_ok());
    assert!(matches!(world.get::<RigidBody>(other), Some(RigidBody::Dynamic)));
}

#[test]
fn squash_keeps_feet_planted() {
    let mut world = test_world();
    let body = spawn_test_enemy(&mut world, Archetype::Frog);
    world.insert_resource(time_with_delta(0.1));

    stomp(world.resource::<GameBus>(), Archetype::Frog, body);
    run_system_once(&mut world, tick_patrols);
    run_system_once(&mut world, tick_patrols);
    run_system_once(&mut world, squash_stomped);

    let tf = world.get::<Transform>(body).expect("transform");
    let half = Tunables::default().enemy_size.y * 0.5;
    let bottom = tf.translation.y - half * tf.scale.y;
    assert!(tf.scale.y < 1.0);
    assert!((bottom - (100.0 - half)).abs() < 1e-3);
}
