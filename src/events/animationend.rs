//! Animation end events.
//!
//! When a [`SpriteAnimator`](crate::components::spriteanimator::SpriteAnimator)
//! driven by the scheduler passes the last frame of its clip, an
//! [`AnimationEndEvent`] is triggered. One event covers every pass made
//! during a tick and `passes` says how many there were, so a looping clip
//! advanced by a long step produces a single event. Non-looping clips end
//! once.
//!
//! # Example
//!
//! ```ignore
//! commands.add_observer(|trigger: On<AnimationEndEvent>, mut commands: Commands| {
//!     if trigger.clip_name.as_ref() == "die" {
//!         commands.entity(trigger.entity).despawn();
//!     }
//! });
//! ```
//!
//! # Related
//!
//! - [`crate::systems::spriteanimator::sprite_animator_update`] – the system that emits these events

use std::sync::Arc;

use bevy_ecs::prelude::*;

use crate::resources::animationstore::ClipId;

/// Event emitted when an animator finishes a pass through its clip.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct AnimationEndEvent {
    /// The entity whose animation ended.
    pub entity: Entity,
    /// Name of the clip that ended.
    pub clip_name: Arc<str>,
    /// Id of the clip that ended.
    pub clip_id: ClipId,
    /// Passes through the end of the clip during this tick. Always at least 1.
    pub passes: u32,
}
