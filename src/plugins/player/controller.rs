//! Player controller: state machine plus collision-response policy.
//!
//! ```text
//!            input                     collision
//!   idle ◄──────────► walk        any ──spikes──────► spike-hit ─┐
//!     │  \            │           any ──enemy below──► enemy-hit ─┤ damage → idle | dead
//!     │   jump edge   │ jump edge any ──enemy above──► enemy-stomp┴──────────► idle
//!     ▼               ▼
//!    jump ──tile contact──► idle
//! ```
//!
//! The controller never touches the physics body directly. Hooks write a
//! [`VelocityCommand`]; the owning system drains it into `LinearVelocity`.

use std::time::Duration;

use bevy::prelude::*;

use crate::common::events::{GameBus, GameEvent};
use crate::common::fsm::{StateHooks, StateMachine};
use crate::common::obstacles::Archetype;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;

use super::contact::{Contact, PickupKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerState {
    Idle,
    Walk,
    Jump,
    SpikeHit,
    EnemyHit,
    EnemyStomp,
    Dead,
}

/// Sampled once per frame. `jump_pressed` is edge-triggered.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub jump_pressed: bool,
}

/// Per-axis velocity override. `None` leaves the axis to the physics engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VelocityCommand {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl VelocityCommand {
    pub fn apply(self, velocity: &mut Vec2) {
        if let Some(x) = self.x {
            velocity.x = x;
        }
        if let Some(y) = self.y {
            velocity.y = y;
        }
    }
}

/// Presentation pose derived from the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pose {
    Idle,
    Walk,
    Jump,
    Dead,
}

#[derive(Clone, Copy, Debug)]
struct EnemyContact {
    body: Entity,
    position: Option<Vec2>,
}

/// Data the player's state hooks operate on.
pub struct PlayerCore {
    tunables: Tunables,
    bus: GameBus,
    health: i32,
    last_enemy: Option<EnemyContact>,
    input: PlayerInput,
    position: Vec2,
    facing_left: bool,
    pose: Pose,
    velocity: VelocityCommand,
    collisions_enabled: bool,
    flash: Option<Timer>,
    game_over: Option<Timer>,
    removed: Vec<Entity>,
    scene_request: Option<GameState>,
}

impl PlayerCore {
    fn set_health(&mut self, value: i32) {
        self.health = value.clamp(0, self.tunables.max_health);
        self.bus.emit(&GameEvent::HealthChanged(self.health));
    }

    /// Returns `false` when no horizontal input is held.
    fn steer(&mut self) -> bool {
        let speed = self.tunables.walk_speed;
        if self.input.left {
            self.facing_left = true;
            self.velocity.x = Some(-speed);
        } else if self.input.right {
            self.facing_left = false;
            self.velocity.x = Some(speed);
        } else {
            return false;
        }
        true
    }

    fn start_flash(&mut self) {
        self.flash = Some(Timer::from_seconds(self.tunables.hit_flash_secs, TimerMode::Once));
    }
}

type Fsm = StateMachine<PlayerState, PlayerCore>;

#[derive(Component)]
pub struct PlayerController {
    fsm: Fsm,
    core: PlayerCore,
}

impl PlayerController {
    pub fn new(bus: GameBus, tunables: &Tunables) -> Self {
        let mut fsm = Fsm::new("player");
        fsm.add_state(PlayerState::Idle, StateHooks::new().on_enter(idle_enter).on_update(idle_update))
            .add_state(PlayerState::Walk, StateHooks::new().on_enter(walk_enter).on_update(walk_update))
            .add_state(PlayerState::Jump, StateHooks::new().on_enter(jump_enter).on_update(jump_update))
            .add_state(PlayerState::SpikeHit, StateHooks::new().on_enter(spike_hit_enter))
            .add_state(PlayerState::EnemyHit, StateHooks::new().on_enter(enemy_hit_enter))
            .add_state(PlayerState::EnemyStomp, StateHooks::new().on_enter(enemy_stomp_enter))
            .add_state(PlayerState::Dead, StateHooks::new().on_enter(dead_enter));

        let mut core = PlayerCore {
            tunables: tunables.clone(),
            bus,
            health: tunables.max_health,
            last_enemy: None,
            input: PlayerInput::default(),
            position: Vec2::ZERO,
            facing_left: false,
            pose: Pose::Idle,
            velocity: VelocityCommand::default(),
            collisions_enabled: true,
            flash: None,
            game_over: None,
            removed: Vec::new(),
            scene_request: None,
        };
        fsm.set_state(&mut core, PlayerState::Idle);

        Self { fsm, core }
    }

    /// Start with a specific health value (no event is emitted).
    pub fn with_health(mut self, health: i32) -> Self {
        self.core.health = health.clamp(0, self.core.tunables.max_health);
        self
    }

    /// Per-frame tick: scheduled effects first, then the state machine.
    pub fn update(&mut self, input: PlayerInput, position: Vec2, dt: f32) {
        let Self { fsm, core } = self;
        core.input = input;
        core.position = position;

        let delta = Duration::from_secs_f32(dt.max(0.0));
        if core.flash.as_mut().is_some_and(|t| t.tick(delta).is_finished()) {
            core.flash = None;
        }
        if core.game_over.as_mut().is_some_and(|t| t.tick(delta).is_finished()) {
            core.game_over = None;
            info!("game over");
            core.bus.emit(&GameEvent::ResetGame);
            core.scene_request = Some(GameState::GameOver);
        }

        fsm.update(core, dt);
    }

    /// React to one collision reported by the physics engine.
    pub fn on_collide(&mut self, position: Vec2, contact: Contact) {
        let Self { fsm, core } = self;
        if !core.collisions_enabled {
            return;
        }
        core.position = position;

        match contact {
            Contact::Spikes => fsm.set_state(core, PlayerState::SpikeHit),
            Contact::Enemy {
                archetype,
                body,
                position: enemy_at,
            } => {
                core.last_enemy = Some(EnemyContact { body, position: enemy_at });
                let stomp_height = core.tunables.stomp_height();
                let above = enemy_at.is_some_and(|at| position.y > at.y + stomp_height);
                let next = if above && archetype.is_stompable() {
                    PlayerState::EnemyStomp
                } else {
                    PlayerState::EnemyHit
                };
                fsm.set_state(core, next);
            }
            Contact::Tile => {
                if fsm.is_current_state(PlayerState::Jump) {
                    fsm.set_state(core, PlayerState::Idle);
                }
            }
            Contact::Pickup {
                entity,
                kind: PickupKind::Coin,
                ..
            } => {
                core.bus.emit(&GameEvent::CoinCollected);
                core.removed.push(entity);
            }
            Contact::Pickup {
                entity,
                kind: PickupKind::Health,
                health_points,
            } => {
                let gain = health_points.unwrap_or(core.tunables.default_health_pickup);
                core.set_health(core.health + gain);
                core.removed.push(entity);
            }
            Contact::Ignore => {}
        }
    }

    pub fn state(&self) -> Option<PlayerState> {
        self.fsm.current()
    }

    pub fn is_state(&self, state: PlayerState) -> bool {
        self.fsm.is_current_state(state)
    }

    pub fn health(&self) -> i32 {
        self.core.health
    }

    pub fn pose(&self) -> Pose {
        self.core.pose
    }

    pub fn facing_left(&self) -> bool {
        self.core.facing_left
    }

    pub fn is_flashing(&self) -> bool {
        self.core.flash.is_some()
    }

    pub fn collisions_enabled(&self) -> bool {
        self.core.collisions_enabled
    }

    pub fn take_velocity(&mut self) -> VelocityCommand {
        std::mem::take(&mut self.core.velocity)
    }

    /// Pickups consumed since the last call.
    pub fn take_removed(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.core.removed)
    }

    pub fn take_scene_request(&mut self) -> Option<GameState> {
        self.core.scene_request.take()
    }
}

// -----------------------------------------------------------------------------
// State hooks
// -----------------------------------------------------------------------------

fn idle_enter(core: &mut PlayerCore, _: &mut Fsm) {
    core.pose = Pose::Idle;
}

fn idle_update(core: &mut PlayerCore, fsm: &mut Fsm, _dt: f32) {
    if core.input.left || core.input.right {
        fsm.set_state(core, PlayerState::Walk);
    }
    if core.input.jump_pressed {
        fsm.set_state(core, PlayerState::Jump);
    }
}

fn walk_enter(core: &mut PlayerCore, _: &mut Fsm) {
    core.pose = Pose::Walk;
}

fn walk_update(core: &mut PlayerCore, fsm: &mut Fsm, _dt: f32) {
    if !core.steer() {
        core.velocity.x = Some(0.0);
        fsm.set_state(core, PlayerState::Idle);
    }
    if core.input.jump_pressed {
        fsm.set_state(core, PlayerState::Jump);
    }
}

fn jump_enter(core: &mut PlayerCore, _: &mut Fsm) {
    core.pose = Pose::Jump;
    core.velocity.y = Some(core.tunables.jump_speed);
}

// Air control only; landing is detected by tile contact.
fn jump_update(core: &mut PlayerCore, _: &mut Fsm, _dt: f32) {
    if !core.steer() {
        core.velocity.x = Some(0.0);
    }
}

fn spike_hit_enter(core: &mut PlayerCore, fsm: &mut Fsm) {
    core.velocity.y = Some(core.tunables.spike_knockback);
    core.start_flash();
    take_hit(core, fsm);
}

fn enemy_hit_enter(core: &mut PlayerCore, fsm: &mut Fsm) {
    let knockback = core.tunables.enemy_knockback;
    match core.last_enemy.and_then(|enemy| enemy.position) {
        // Away from the enemy.
        Some(at) if core.position.x < at.x => core.velocity.x = Some(-knockback),
        Some(_) => core.velocity.x = Some(knockback),
        None => core.velocity.y = Some(knockback),
    }
    core.start_flash();
    take_hit(core, fsm);
}

fn take_hit(core: &mut PlayerCore, fsm: &mut Fsm) {
    core.set_health(core.health - core.tunables.hit_damage);
    let next = if core.health <= 0 { PlayerState::Dead } else { PlayerState::Idle };
    fsm.set_state(core, next);
}

fn enemy_stomp_enter(core: &mut PlayerCore, fsm: &mut Fsm) {
    core.velocity.y = Some(core.tunables.stomp_bounce);

    // Every archetype hears it; only the controller owning `body` reacts.
    if let Some(enemy) = core.last_enemy {
        for archetype in Archetype::ALL {
            core.bus.emit(&GameEvent::Stomped {
                archetype,
                body: enemy.body,
            });
        }
    }

    fsm.set_state(core, PlayerState::Idle);
}

fn dead_enter(core: &mut PlayerCore, fsm: &mut Fsm) {
    info!("player died");
    fsm.clear_pending();
    core.pose = Pose::Dead;
    core.collisions_enabled = false;
    core.game_over = Some(Timer::from_seconds(core.tunables.game_over_delay_secs, TimerMode::Once));
}
