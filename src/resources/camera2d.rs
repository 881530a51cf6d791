//! Shared 2D camera resource.
//!
//! Holds the viewport parameters that the animator update reads once per
//! tick to refresh [`VisibilityTracker`](super::visibility::VisibilityTracker).
//! Update this resource to pan/zoom the view.

use bevy_ecs::prelude::Resource;
use glam::Vec2;

use crate::resources::screensize::ScreenSize;

/// ECS resource that holds the active 2D camera parameters.
///
/// `vertical_half_extent` is the orthographic half height in world units.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Camera2DRes {
    pub position: Vec2,
    pub vertical_half_extent: f32,
    pub aspect_ratio: f32,
}

impl Default for Camera2DRes {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            vertical_half_extent: 5.0,
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl Camera2DRes {
    pub fn new(position: Vec2, vertical_half_extent: f32, aspect_ratio: f32) -> Self {
        Self {
            position,
            vertical_half_extent,
            aspect_ratio,
        }
    }

    /// Derive the half extent and aspect from a render size in pixels.
    ///
    /// At `zoom == 1.0` one world unit equals one pixel.
    pub fn from_screen(position: Vec2, zoom: f32, screen: ScreenSize) -> Self {
        let h = screen.h.max(1) as f32;
        let w = screen.w.max(1) as f32;
        Self {
            position,
            vertical_half_extent: h * 0.5 / zoom.max(f32::EPSILON),
            aspect_ratio: w / h,
        }
    }
}
