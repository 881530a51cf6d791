//! Computed world-space transform for entities in a hierarchy.
//!
//! The host's transform propagation writes this component; the animation
//! systems only read it. For root entities it mirrors the local
//! [`MapPosition`](super::mapposition::MapPosition).

use bevy_ecs::prelude::*;
use glam::Vec2;

/// World-space transform for hierarchical entities.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalTransform2D {
    /// World-space position.
    pub position: Vec2,
}

impl GlobalTransform2D {
    pub fn at(position: Vec2) -> Self {
        Self { position }
    }
}
