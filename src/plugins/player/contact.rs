//! Collision partner classification.
//!
//! Priority: spikes → bee → frog → saw → no game entity → level tile → pickup tag.
//! First match wins.

use bevy::prelude::*;

use crate::common::body_data::BodyData;
use crate::common::obstacles::{Archetype, ObstacleKind, ObstacleRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupKind {
    Coin,
    Health,
}

impl PickupKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "coin" => Some(PickupKind::Coin),
            "health" => Some(PickupKind::Health),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Contact {
    Spikes,
    /// `position` is `None` when the enemy body has no queryable transform.
    Enemy {
        archetype: Archetype,
        body: Entity,
        position: Option<Vec2>,
    },
    Tile,
    Pickup {
        entity: Entity,
        kind: PickupKind,
        health_points: Option<i32>,
    },
    Ignore,
}

/// What the world knows about a partner body beyond the registry.
/// `None` means the body has no game entity attached (or it is already gone).
#[derive(Clone, Copy, Debug)]
pub struct PartnerView<'a> {
    pub position: Vec2,
    pub tile: bool,
    pub data: Option<&'a BodyData>,
}

pub fn classify(registry: &ObstacleRegistry, partner: Entity, view: Option<PartnerView<'_>>) -> Contact {
    match registry.classify(partner) {
        Some(ObstacleKind::Spikes) => return Contact::Spikes,
        Some(ObstacleKind::Enemy(archetype)) => {
            return Contact::Enemy {
                archetype,
                body: partner,
                position: view.map(|v| v.position),
            };
        }
        None => {}
    }

    let Some(view) = view else {
        return Contact::Ignore;
    };

    if view.tile {
        return Contact::Tile;
    }

    let Some(data) = view.data else {
        return Contact::Ignore;
    };
    let Some(tag) = data.text("type") else {
        return Contact::Ignore;
    };
    let Some(kind) = PickupKind::from_tag(tag) else {
        trace!("ignoring pickup with unknown type `{tag}`");
        return Contact::Ignore;
    };

    Contact::Pickup {
        entity: partner,
        kind,
        health_points: data.int("healthPoints"),
    }
}
