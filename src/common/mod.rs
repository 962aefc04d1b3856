//! Common, shared types.

pub mod body_data;
pub mod event_bus;
pub mod events;
pub mod fsm;
pub mod layers;
pub mod obstacles;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
