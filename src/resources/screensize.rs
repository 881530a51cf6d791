//! Screen size resource.
//!
//! Stores the current render dimensions in pixels. The camera derives its
//! aspect ratio from it.

use bevy_ecs::prelude::Resource;

/// Current screen size in pixels.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct ScreenSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}
