use std::time::Duration;

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use crate::common::events::{GameBus, GameChannel, GameEvent};
use crate::common::state::GameState;
use crate::common::test_utils::run_system_once;
use crate::common::tunables::Tunables;

use super::*;

fn hud_world() -> World {
    let mut world = World::new();
    world.insert_resource(GameBus::default());
    world.insert_resource(Tunables::default());
    world.insert_resource(HudModel::default());
    world.init_resource::<LevelAdvance>();
    world
}

fn emit(world: &World, event: GameEvent) {
    world.resource::<GameBus>().emit(&event);
}

#[test]
fn subscribes_on_enter_with_full_health() {
    let mut world = hud_world();
    run_system_once(&mut world, subscribe_hud);

    let bus = world.resource::<GameBus>();
    for channel in CHANNELS {
        assert_eq!(bus.listener_count(channel), 1);
    }
    let model = world.resource::<HudModel>();
    assert_eq!(model.health(), 100);
    assert_eq!(model.coins(), 0);
}

#[test]
fn tracks_health_and_coins() {
    let mut world = hud_world();
    run_system_once(&mut world, subscribe_hud);

    emit(&world, GameEvent::CoinCollected);
    emit(&world, GameEvent::CoinCollected);
    emit(&world, GameEvent::HealthChanged(75));

    let model = world.resource::<HudModel>();
    assert_eq!(model.coins(), 2);
    assert_eq!(model.health(), 75);
}

#[test]
fn reset_zeroes_coins_and_restores_health() {
    let mut world = hud_world();
    run_system_once(&mut world, subscribe_hud);

    emit(&world, GameEvent::CoinCollected);
    emit(&world, GameEvent::HealthChanged(0));
    emit(&world, GameEvent::ResetGame);

    let model = world.resource::<HudModel>();
    assert_eq!(model.coins(), 0);
    assert_eq!(model.health(), 100);
    assert_eq!(model.resets(), 1);
}

#[test]
fn unsubscribes_on_exit() {
    let mut world = hud_world();
    run_system_once(&mut world, subscribe_hud);
    run_system_once(&mut world, unsubscribe_hud);

    let bus = world.resource::<GameBus>().clone();
    assert_eq!(bus.listener_count(GameChannel::CoinCollected), 0);
    assert!(world.get_resource::<HudSubscription>().is_none());

    bus.emit(&GameEvent::CoinCollected);
    assert_eq!(world.resource::<HudModel>().coins(), 0);

    // A second exit is harmless.
    run_system_once(&mut world, unsubscribe_hud);
}

#[test]
fn reset_returns_to_the_first_level() {
    let mut world = hud_world();
    run_system_once(&mut world, subscribe_hud);
    world.resource::<HudModel>().set_level(2);

    emit(&world, GameEvent::ResetGame);

    assert_eq!(world.resource::<HudModel>().level(), 0);
}

// -----------------------------------------------------------------------------
// Level progression
// -----------------------------------------------------------------------------

/// HUD plugin alone in `InGame`, with a quarter second per update.
fn progression_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(250)));
    app.insert_state(GameState::InGame);
    app.insert_resource(GameBus::default());
    app.insert_resource(Tunables::default());
    plugin(&mut app);
    app.update();
    app
}

fn collect_coins(app: &App, n: u32) {
    let bus = app.world().resource::<GameBus>();
    for _ in 0..n {
        bus.emit(&GameEvent::CoinCollected);
    }
}

fn state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

#[test]
fn coin_target_advances_after_the_delay() {
    let mut app = progression_app();
    collect_coins(&app, Tunables::default().coins_to_advance);

    // Timer starts, then two of the three quarter seconds elapse.
    for _ in 0..3 {
        app.update();
    }
    assert_eq!(state(&app), GameState::InGame);
    assert_eq!(app.world().resource::<HudModel>().level(), 0);

    for _ in 0..4 {
        app.update();
    }
    assert_eq!(state(&app), GameState::LevelComplete);
    assert_eq!(app.world().resource::<HudModel>().level(), 1);
}

#[test]
fn fewer_coins_than_the_target_stay_in_the_level() {
    let mut app = progression_app();
    collect_coins(&app, Tunables::default().coins_to_advance - 1);

    for _ in 0..10 {
        app.update();
    }
    assert_eq!(state(&app), GameState::InGame);
    assert_eq!(app.world().resource::<HudModel>().level(), 0);
}

#[test]
fn clearing_the_last_level_wins_and_rewinds() {
    let mut app = progression_app();
    app.world().resource::<HudModel>().set_level(LEVELS.len() - 1);
    collect_coins(&app, Tunables::default().coins_to_advance);

    for _ in 0..8 {
        app.update();
    }
    assert_eq!(state(&app), GameState::Win);
    assert_eq!(app.world().resource::<HudModel>().level(), 0);
}
