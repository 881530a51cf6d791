//! Viewport visibility tracking.
//!
//! [`VisibilityTracker`] caches the camera's world-space AABB. The animator
//! update system refreshes it once per tick, before any instance advances, so
//! every culling decision within a tick sees the same snapshot.
//!
//! All tests are inclusive on every edge: a rectangle touching the viewport
//! border counts as visible.

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::resources::camera2d::Camera2DRes;

/// Rectangle in entity-local coordinates.
///
/// `offset` is the rectangle's center relative to the entity position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalRect {
    pub offset: Vec2,
    pub size: Vec2,
}

impl LocalRect {
    pub fn new(offset: Vec2, size: Vec2) -> Self {
        Self { offset, size }
    }

    /// World-space (min, max) corners for an entity at `world_position`.
    pub fn world_aabb(&self, world_position: Vec2) -> (Vec2, Vec2) {
        let center = world_position + self.offset;
        let min = center - self.size * 0.5;
        (min, min + self.size)
    }
}

impl Default for LocalRect {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            size: Vec2::ONE,
        }
    }
}

/// World-space bounds of the visible viewport.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct VisibilityTracker {
    min: Vec2,
    max: Vec2,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the bounds around `position`.
    ///
    /// The horizontal half extent is `vertical_half_extent * aspect_ratio`.
    pub fn refresh(&mut self, position: Vec2, vertical_half_extent: f32, aspect_ratio: f32) {
        let half = Vec2::new(vertical_half_extent * aspect_ratio, vertical_half_extent);
        self.min = position - half;
        self.max = position + half;
    }

    pub fn refresh_from_camera(&mut self, camera: &Camera2DRes) {
        self.refresh(
            camera.position,
            camera.vertical_half_extent,
            camera.aspect_ratio,
        );
    }

    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.min, self.max)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Overlap test between the viewport and `rect` placed at `world_position`.
    pub fn intersects_rect(&self, world_position: Vec2, rect: &LocalRect) -> bool {
        let (rect_min, rect_max) = rect.world_aabb(world_position);
        self.min.x <= rect_max.x
            && self.max.x >= rect_min.x
            && self.min.y <= rect_max.y
            && self.max.y >= rect_min.y
    }
}
