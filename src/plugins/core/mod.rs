//! Core plugin: shared resources, global settings and the game-over / win restart loop.

use bevy::prelude::*;

use crate::common::events::GameBus;
use crate::common::obstacles::ObstacleRegistry;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    app.insert_resource(Tunables::default());
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
    app.init_resource::<GameBus>();
    app.init_resource::<ObstacleRegistry>();

    app.add_systems(OnEnter(GameState::GameOver), announce_game_over);
    app.add_systems(OnEnter(GameState::Win), announce_win);
    app.add_systems(
        Update,
        restart_on_input.run_if(in_state(GameState::GameOver).or(in_state(GameState::Win))),
    );
}

fn announce_game_over() {
    info!("game over: press Enter or Space to play again");
}

fn announce_win() {
    info!("all levels cleared: press Enter or Space to play again");
}

fn restart_on_input(keys: Option<Res<ButtonInput<KeyCode>>>, mut next_state: ResMut<NextState<GameState>>) {
    let Some(keys) = keys else {
        return;
    };
    if keys.any_just_pressed([KeyCode::Enter, KeyCode::Space]) {
        info!("restarting level");
        next_state.set(GameState::InGame);
    }
}
