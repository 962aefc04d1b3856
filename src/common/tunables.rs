//! Tunable gameplay constants.
//!
//! Velocities are in pixels per second with +y up; durations in seconds.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub gravity: f32,

    pub walk_speed: f32,
    pub jump_speed: f32,
    pub spike_knockback: f32,
    pub enemy_knockback: f32,
    pub stomp_bounce: f32,

    /// Collider and sprite size of the player body.
    pub player_size: Vec2,
    /// Collider and sprite size shared by every enemy archetype.
    pub enemy_size: Vec2,

    pub max_health: i32,
    pub hit_damage: i32,
    pub default_health_pickup: i32,

    pub patrol_speed: f32,
    pub patrol_leg_secs: f32,
    pub squash_secs: f32,
    pub game_over_delay_secs: f32,
    pub hit_flash_secs: f32,

    pub coins_to_advance: u32,
    pub level_advance_delay_secs: f32,
}

impl Tunables {
    /// Player must be this far above an enemy for contact to count as a stomp:
    /// one enemy sprite height.
    pub fn stomp_height(&self) -> f32 {
        self.enemy_size.y
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 64.0,
            gravity: 1400.0,
            walk_speed: 300.0,
            jump_speed: 720.0,
            spike_knockback: 480.0,
            enemy_knockback: 600.0,
            stomp_bounce: 480.0,
            player_size: Vec2::new(40.0, 64.0),
            enemy_size: Vec2::new(40.0, 32.0),
            max_health: 100,
            hit_damage: 25,
            default_health_pickup: 25,
            patrol_speed: 90.0,
            patrol_leg_secs: 2.0,
            squash_secs: 0.2,
            game_over_delay_secs: 1.5,
            hit_flash_secs: 0.6,
            coins_to_advance: 10,
            level_advance_delay_secs: 0.75,
        }
    }
}
