//! Patrol controller shared by every enemy archetype.
//!
//! `idle` is a one-tick pass-through into `move-left`; the two move states alternate every
//! patrol leg. `dead` is terminal and reachable only through this archetype's stomp channel
//! with a payload naming this controller's own body.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bevy::prelude::*;

use crate::common::events::{GameBus, GameChannel, GameEvent, GameListener};
use crate::common::fsm::{StateHooks, StateMachine};
use crate::common::obstacles::Archetype;
use crate::common::tunables::Tunables;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PatrolState {
    Idle,
    MoveLeft,
    MoveRight,
    Dead,
}

pub struct PatrolCore {
    archetype: Archetype,
    body: Entity,
    bus: GameBus,
    speed: f32,
    leg_secs: f32,
    squash_secs: f32,
    move_time: f32,
    facing_left: bool,
    velocity_x: Option<f32>,
    /// Raised by the bus listener, consumed by the next `update`.
    stomped: Arc<AtomicBool>,
    listener: Option<GameListener>,
    squash: Option<Timer>,
}

impl PatrolCore {
    fn unsubscribe(&mut self) {
        if let Some(listener) = self.listener.take() {
            self.bus
                .unsubscribe(GameChannel::Stomped(self.archetype), self.body, &listener);
        }
    }

    fn walk(&mut self, dir: f32, dt: f32) -> bool {
        self.move_time += dt;
        self.facing_left = dir < 0.0;
        self.velocity_x = Some(dir * self.speed);
        self.move_time >= self.leg_secs
    }
}

type Fsm = StateMachine<PatrolState, PatrolCore>;

#[derive(Component)]
pub struct PatrolController {
    fsm: Fsm,
    core: PatrolCore,
}

impl PatrolController {
    /// Subscribes to `<archetype>-stomped` and starts in `idle`.
    ///
    /// A stomp naming `body` only raises a latch; the controller enters `dead` at the start of
    /// its next [`update`](Self::update), so `is_state(Dead)` turns true one tick after the emit.
    pub fn new(archetype: Archetype, body: Entity, bus: GameBus, tunables: &Tunables) -> Self {
        let stomped = Arc::new(AtomicBool::new(false));

        let latch = Arc::clone(&stomped);
        let listener = GameListener::new(move |_, ev| {
            if matches!(*ev, GameEvent::Stomped { body: target, .. } if target == body) {
                latch.store(true, Ordering::Release);
            }
        });
        bus.subscribe(GameChannel::Stomped(archetype), body, listener.clone());

        let mut fsm = Fsm::new(archetype.as_str());
        fsm.add_state(PatrolState::Idle, StateHooks::new().on_enter(idle_enter))
            .add_state(
                PatrolState::MoveLeft,
                StateHooks::new().on_enter(move_enter).on_update(move_left_update),
            )
            .add_state(
                PatrolState::MoveRight,
                StateHooks::new().on_enter(move_enter).on_update(move_right_update),
            )
            .add_state(PatrolState::Dead, StateHooks::new().on_enter(dead_enter));

        let mut core = PatrolCore {
            archetype,
            body,
            bus,
            speed: tunables.patrol_speed,
            leg_secs: tunables.patrol_leg_secs,
            squash_secs: tunables.squash_secs,
            move_time: 0.0,
            facing_left: true,
            velocity_x: None,
            stomped,
            listener: Some(listener),
            squash: None,
        };
        fsm.set_state(&mut core, PatrolState::Idle);

        Self { fsm, core }
    }

    pub fn update(&mut self, dt: f32) {
        let Self { fsm, core } = self;

        if let Some(squash) = core.squash.as_mut() {
            squash.tick(Duration::from_secs_f32(dt.max(0.0)));
        }

        if core.stomped.swap(false, Ordering::AcqRel) && !fsm.is_current_state(PatrolState::Dead) {
            fsm.set_state(core, PatrolState::Dead);
        }

        fsm.update(core, dt);
    }

    /// Stop listening for stomps. Idempotent.
    pub fn destroy(&mut self) {
        self.core.unsubscribe();
    }

    pub fn archetype(&self) -> Archetype {
        self.core.archetype
    }

    pub fn body(&self) -> Entity {
        self.core.body
    }

    pub fn state(&self) -> Option<PatrolState> {
        self.fsm.current()
    }

    pub fn is_state(&self, state: PatrolState) -> bool {
        self.fsm.is_current_state(state)
    }

    pub fn facing_left(&self) -> bool {
        self.core.facing_left
    }

    pub fn is_subscribed(&self) -> bool {
        self.core.listener.is_some()
    }

    pub fn take_velocity_x(&mut self) -> Option<f32> {
        self.core.velocity_x.take()
    }

    /// Squash progress in `[0, 1]` once stomped.
    pub fn squash_progress(&self) -> Option<f32> {
        self.core.squash.as_ref().map(Timer::fraction)
    }

    pub fn is_squashed(&self) -> bool {
        self.core.squash.as_ref().is_some_and(Timer::is_finished)
    }
}

impl Drop for PatrolController {
    fn drop(&mut self) {
        self.destroy();
    }
}

// -----------------------------------------------------------------------------
// State hooks
// -----------------------------------------------------------------------------

fn idle_enter(core: &mut PatrolCore, fsm: &mut Fsm) {
    fsm.set_state(core, PatrolState::MoveLeft);
}

fn move_enter(core: &mut PatrolCore, _: &mut Fsm) {
    core.move_time = 0.0;
}

fn move_left_update(core: &mut PatrolCore, fsm: &mut Fsm, dt: f32) {
    if core.walk(-1.0, dt) {
        fsm.set_state(core, PatrolState::MoveRight);
    }
}

fn move_right_update(core: &mut PatrolCore, fsm: &mut Fsm, dt: f32) {
    if core.walk(1.0, dt) {
        fsm.set_state(core, PatrolState::MoveLeft);
    }
}

fn dead_enter(core: &mut PatrolCore, fsm: &mut Fsm) {
    debug!("{} {} stomped", core.archetype.as_str(), core.body);
    fsm.clear_pending();
    core.unsubscribe();
    core.velocity_x = Some(0.0);
    core.squash = Some(Timer::from_seconds(core.squash_secs, TimerMode::Once));
}
