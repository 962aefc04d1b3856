//! Generic finite-state machine with enter/update/exit hooks.
//!
//! The machine owns no domain data. Every hook receives the owning controller's context
//! (`C`) plus the machine itself, so a hook can request further transitions:
//!
//! ```text
//! set_state(ctx, Walk)
//!   ├─ guard set
//!   ├─ on_exit(Idle)     ── set_state(..) here is queued
//!   ├─ current = Walk
//!   ├─ on_enter(Walk)    ── set_state(..) here is queued
//!   └─ guard cleared
//!
//! update(ctx, dt)
//!   ├─ pending non-empty → pop oldest, set_state(it), done for this tick
//!   └─ otherwise         → on_update(current, dt)
//! ```
//!
//! At most one queued transition is applied per `update`, oldest first.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use bevy::platform::collections::HashMap;
use bevy::prelude::*;

/// Upper bound on transitions waiting for a later tick.
pub const PENDING_CAPACITY: usize = 16;

/// Anything usable as a state name.
pub trait StateId: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

pub type Hook<S, C> = fn(&mut C, &mut StateMachine<S, C>);
pub type UpdateHook<S, C> = fn(&mut C, &mut StateMachine<S, C>, f32);

/// Optional callbacks for one state.
pub struct StateHooks<S, C> {
    on_enter: Option<Hook<S, C>>,
    on_update: Option<UpdateHook<S, C>>,
    on_exit: Option<Hook<S, C>>,
}

// Manual impls: fn pointers are always Copy, regardless of `S`/`C`.
impl<S, C> Clone for StateHooks<S, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, C> Copy for StateHooks<S, C> {}

impl<S, C> Default for StateHooks<S, C> {
    fn default() -> Self {
        Self {
            on_enter: None,
            on_update: None,
            on_exit: None,
        }
    }
}

impl<S, C> StateHooks<S, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_enter(mut self, hook: Hook<S, C>) -> Self {
        self.on_enter = Some(hook);
        self
    }

    pub fn on_update(mut self, hook: UpdateHook<S, C>) -> Self {
        self.on_update = Some(hook);
        self
    }

    pub fn on_exit(mut self, hook: Hook<S, C>) -> Self {
        self.on_exit = Some(hook);
        self
    }
}

pub struct StateMachine<S, C> {
    name: &'static str,
    current: Option<S>,
    states: HashMap<S, StateHooks<S, C>>,
    pending: VecDeque<S>,
    switching: bool,
}

impl<S: StateId, C> StateMachine<S, C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: None,
            states: HashMap::default(),
            pending: VecDeque::with_capacity(PENDING_CAPACITY),
            switching: false,
        }
    }

    /// Register (or overwrite) a state. Chainable.
    pub fn add_state(&mut self, id: S, hooks: StateHooks<S, C>) -> &mut Self {
        self.states.insert(id, hooks);
        self
    }

    /// Request a transition to `id`.
    ///
    /// Unknown states are ignored. While another transition is running (i.e. from inside an
    /// `on_enter`/`on_exit` hook) the request is queued for a later [`update`](Self::update).
    pub fn set_state(&mut self, ctx: &mut C, id: S) {
        if !self.states.contains_key(&id) {
            trace!("[{}] ignoring unregistered state {:?}", self.name, id);
            return;
        }

        if self.switching {
            if self.pending.len() >= PENDING_CAPACITY {
                warn!("[{}] pending queue full, dropping {:?}", self.name, id);
                return;
            }
            self.pending.push_back(id);
            return;
        }

        self.switching = true;

        let on_exit = self.current.and_then(|cur| self.states.get(&cur)).and_then(|h| h.on_exit);
        if let Some(exit) = on_exit {
            exit(ctx, self);
        }

        debug!("[{}] {:?} -> {:?}", self.name, self.current, id);
        self.current = Some(id);

        if let Some(enter) = self.states.get(&id).and_then(|h| h.on_enter) {
            enter(ctx, self);
        }

        self.switching = false;
    }

    /// Tick the machine: apply one queued transition, or run the current `on_update`.
    pub fn update(&mut self, ctx: &mut C, dt: f32) {
        if let Some(next) = self.pending.pop_front() {
            self.set_state(ctx, next);
            return;
        }

        let on_update = self.current.and_then(|cur| self.states.get(&cur)).and_then(|h| h.on_update);
        if let Some(update) = on_update {
            update(ctx, self, dt);
        }
    }

    pub fn is_current_state(&self, id: S) -> bool {
        self.current == Some(id)
    }

    pub fn current(&self) -> Option<S> {
        self.current
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every queued request. Terminal states call this on entry.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}
