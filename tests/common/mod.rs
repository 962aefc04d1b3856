//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides the core ECS runtime.
//! - `AssetPlugin` + `ScenePlugin` give physics the asset and scene resources it expects.
//! - `configure_headless` installs the gameplay plugins.
//! - time advances by a fixed 1/60 s per `app.update()`.

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

pub const FRAME: Duration = Duration::from_micros(16_667);

pub fn app_headless() -> App {
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));

    bevy_platformer::game::configure_headless(&mut app);
    // `App::run` is never called here, so run the plugin finish/cleanup phases manually.
    app.finish();
    app.cleanup();
    app
}

/// Run `frames` updates.
pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}
