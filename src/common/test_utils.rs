//! Test helpers.
//!
//! Systems that use `Commands` enqueue structural changes; we call `world.flush()` after
//! running so queued commands are applied before assertions.

use std::sync::{Arc, Mutex};

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::common::events::{GameBus, GameChannel, GameEvent, GameListener};
use crate::common::obstacles::Archetype;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Every event emitted on a bus, in emission order.
#[derive(Clone, Default)]
pub struct BusLog(Arc<Mutex<Vec<GameEvent>>>);

impl BusLog {
    pub fn events(&self) -> Vec<GameEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&GameEvent) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

/// Subscribe a recorder to every channel of `bus`.
pub fn record_bus(bus: &GameBus) -> BusLog {
    let log = BusLog::default();
    let sink = Arc::clone(&log.0);
    let listener = GameListener::new(move |_, ev| sink.lock().unwrap().push(*ev));

    let channels = [GameChannel::CoinCollected, GameChannel::HealthChanged, GameChannel::ResetGame]
        .into_iter()
        .chain(Archetype::ALL.into_iter().map(GameChannel::Stomped));
    for channel in channels {
        bus.subscribe(channel, Entity::PLACEHOLDER, listener.clone());
    }
    log
}
