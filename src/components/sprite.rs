use std::sync::Arc;

use bevy_ecs::prelude::Component;
use glam::Vec2;

use crate::resources::animationstore::SpriteFrame;

/// Anything that can display a frame image.
///
/// Animators push a frame only when the displayed image changes (or has to be
/// refreshed), never every tick.
pub trait FrameSink {
    fn set_frame(&mut self, frame: &SpriteFrame);
}

/// Sprite is identified by a texture key, its size in world units and a offset if the texture is a spritesheet.
/// The offset is used to select the correct frame from the spritesheet.
#[derive(Component, Clone, Debug, Default)]
pub struct Sprite {
    pub tex_key: Option<Arc<str>>,
    pub width: f32,
    pub height: f32,
    pub offset: Vec2,
    /// Incremented on every frame push. Renderers can compare it against
    /// their last seen value to skip unchanged sprites.
    pub revision: u64,
}

impl FrameSink for Sprite {
    fn set_frame(&mut self, frame: &SpriteFrame) {
        self.tex_key = Some(frame.tex_key.clone());
        self.offset = frame.offset;
        self.width = frame.size.x;
        self.height = frame.size.y;
        self.revision = self.revision.wrapping_add(1);
    }
}
