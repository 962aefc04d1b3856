//! Synchronous publish/subscribe bus.
//!
//! The bus is an explicit handle: clone it into every controller that emits or listens.
//! All clones share one subscription table.
//!
//! Delivery contract:
//! - `emit` calls every listener subscribed to the event's channel, in subscription order,
//!   before it returns.
//! - The listener list is snapshotted first, so listeners may subscribe, unsubscribe or emit
//!   from inside a callback without disturbing the current pass.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

/// An event routed by channel.
pub trait BusEvent: Debug + Send + Sync + 'static {
    type Channel: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn channel(&self) -> Self::Channel;
}

type Callback<E> = dyn Fn(&EventBus<E>, &E) + Send + Sync;

/// A subscribed callback. Identity is the allocation: clones compare equal, two listeners
/// built from the same closure body do not.
pub struct Listener<E: BusEvent>(Arc<Callback<E>>);

impl<E: BusEvent> Listener<E> {
    pub fn new(f: impl Fn(&EventBus<E>, &E) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl<E: BusEvent> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E: BusEvent> PartialEq for Listener<E> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<E: BusEvent> Eq for Listener<E> {}

struct Subscription<E: BusEvent> {
    subscriber: Entity,
    listener: Listener<E>,
}

type Table<E> = HashMap<<E as BusEvent>::Channel, Vec<Subscription<E>>>;

pub struct EventBus<E: BusEvent> {
    table: Arc<Mutex<Table<E>>>,
}

impl<E: BusEvent> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            table: Arc::new(Mutex::new(HashMap::default())),
        }
    }
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    // A listener that panicked mid-emit must not take the bus down with it.
    fn lock(&self) -> MutexGuard<'_, Table<E>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, channel: E::Channel, subscriber: Entity, listener: Listener<E>) {
        self.lock()
            .entry(channel)
            .or_default()
            .push(Subscription { subscriber, listener });
    }

    /// Remove exactly the `(listener, subscriber)` pair from `channel`. No-op if absent.
    pub fn unsubscribe(&self, channel: E::Channel, subscriber: Entity, listener: &Listener<E>) {
        let mut table = self.lock();
        let Some(subs) = table.get_mut(&channel) else {
            return;
        };

        if let Some(idx) = subs
            .iter()
            .position(|s| s.subscriber == subscriber && s.listener == *listener)
        {
            subs.remove(idx);
        }
        if subs.is_empty() {
            table.remove(&channel);
        }
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = {
            let table = self.lock();
            match table.get(&event.channel()) {
                Some(subs) => subs.iter().map(|s| s.listener.clone()).collect(),
                None => return,
            }
        };

        trace!("emit {:?} to {} listener(s)", event, snapshot.len());
        for listener in &snapshot {
            (listener.0)(self, event);
        }
    }

    pub fn listener_count(&self, channel: E::Channel) -> usize {
        self.lock().get(&channel).map_or(0, Vec::len)
    }
}
