//! Animation resource registry.
//!
//! This module holds the immutable animation data shared by every animated
//! entity:
//! - [`AnimationClip`] – one named sprite animation (frames + timing rules)
//! - [`AnimationSet`] – the ordered clip collection an entity kind plays from
//! - [`AnimationStore`] – ECS resource mapping set keys to shared sets
//!
//! Clips are validated on construction and on deserialization: a clip always
//! has at least one frame and a strictly positive duration for every frame.
//! Playback code relies on that and never re-checks it.

use std::fmt;
use std::hash::Hasher;
use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use log::info;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::error::{AnimationError, Result};
use crate::resources::framecurve::FrameCurve;

/// Reference to a single frame image inside a sprite sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrame {
    /// Texture key of the sheet holding this frame.
    pub tex_key: Arc<str>,
    /// Top-left of the frame inside the sheet, in pixels.
    pub offset: Vec2,
    /// Frame size in pixels.
    pub size: Vec2,
}

impl SpriteFrame {
    pub fn new(tex_key: impl Into<Arc<str>>, offset: Vec2, size: Vec2) -> Self {
        Self {
            tex_key: tex_key.into(),
            offset,
            size,
        }
    }

    /// Slice `count` equally sized frames from a horizontal strip.
    pub fn strip(tex_key: &str, origin: Vec2, size: Vec2, count: usize) -> Vec<SpriteFrame> {
        let key: Arc<str> = Arc::from(tex_key);
        (0..count)
            .map(|i| SpriteFrame {
                tex_key: key.clone(),
                offset: origin + Vec2::new(size.x * i as f32, 0.0),
                size,
            })
            .collect()
    }
}

/// Stable numeric identifier derived from a clip name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub u64);

impl ClipId {
    /// Hash a clip name. Deterministic across runs (FxHash has no random state).
    pub fn from_name(name: &str) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write(name.as_bytes());
        ClipId(hasher.finish())
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// How long each frame of a clip stays on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameDuration {
    /// Every frame lasts `seconds`.
    Constant { seconds: f32 },
    /// Frame `i` lasts `base * curve(i / frame_count)`.
    Curved { base: f32, curve: FrameCurve },
}

impl Default for FrameDuration {
    fn default() -> Self {
        FrameDuration::Constant { seconds: 0.1 }
    }
}

/// Serialized form of a clip. Converted into [`AnimationClip`] through
/// validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationClipDef {
    pub name: String,
    pub frames: Vec<SpriteFrame>,
    #[serde(default)]
    pub duration: FrameDuration,
    #[serde(default = "default_looped")]
    pub looped: bool,
}

fn default_looped() -> bool {
    true
}

/// Immutable definition of one named sprite animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnimationClipDef", into = "AnimationClipDef")]
pub struct AnimationClip {
    name: String,
    id: ClipId,
    frames: Vec<SpriteFrame>,
    duration: FrameDuration,
    looped: bool,
    cycle_duration: f64,
}

impl AnimationClip {
    /// Create a validated clip.
    ///
    /// Fails with [`AnimationError::InvalidAsset`] when `frames` is empty or
    /// the duration model yields a non-positive (or non-finite) duration for
    /// any frame.
    pub fn new(
        name: impl Into<String>,
        frames: Vec<SpriteFrame>,
        duration: FrameDuration,
        looped: bool,
    ) -> Result<Self> {
        let name = name.into();
        if frames.is_empty() {
            return Err(AnimationError::invalid(&name, "clip has no frames"));
        }
        let mut clip = Self {
            id: ClipId::from_name(&name),
            name,
            frames,
            duration,
            looped,
            cycle_duration: 0.0,
        };
        for index in 0..clip.frames.len() {
            let d = clip.frame_duration(index);
            if !(d.is_finite() && d > 0.0) {
                return Err(AnimationError::invalid(
                    &clip.name,
                    format!("frame {index} has non-positive duration {d}"),
                ));
            }
            clip.cycle_duration += f64::from(d);
        }
        Ok(clip)
    }

    /// Shorthand for a clip where every frame lasts `seconds`.
    pub fn constant(
        name: impl Into<String>,
        frames: Vec<SpriteFrame>,
        seconds: f32,
        looped: bool,
    ) -> Result<Self> {
        Self::new(name, frames, FrameDuration::Constant { seconds }, looped)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ClipId {
        self.id
    }

    pub fn frames(&self) -> &[SpriteFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn looped(&self) -> bool {
        self.looped
    }

    pub fn duration_model(&self) -> &FrameDuration {
        &self.duration
    }

    /// Frame reference at `index`.
    pub fn frame_at(&self, index: usize) -> Result<&SpriteFrame> {
        self.frames.get(index).ok_or(AnimationError::OutOfRange {
            what: "frame",
            index,
            len: self.frames.len(),
        })
    }

    pub fn first_frame(&self) -> &SpriteFrame {
        &self.frames[0]
    }

    pub fn last_frame(&self) -> &SpriteFrame {
        &self.frames[self.frames.len() - 1]
    }

    /// Time one pass through every frame takes, in seconds.
    pub fn cycle_duration(&self) -> f64 {
        self.cycle_duration
    }

    /// Display time of frame `index` in seconds.
    pub fn frame_duration(&self, index: usize) -> f32 {
        match &self.duration {
            FrameDuration::Constant { seconds } => *seconds,
            FrameDuration::Curved { base, curve } => {
                base * curve.evaluate(index as f32 / self.frames.len() as f32)
            }
        }
    }
}

impl TryFrom<AnimationClipDef> for AnimationClip {
    type Error = AnimationError;

    fn try_from(def: AnimationClipDef) -> Result<Self> {
        AnimationClip::new(def.name, def.frames, def.duration, def.looped)
    }
}

impl From<AnimationClip> for AnimationClipDef {
    fn from(clip: AnimationClip) -> Self {
        AnimationClipDef {
            name: clip.name,
            frames: clip.frames,
            duration: clip.duration,
            looped: clip.looped,
        }
    }
}

/// Ordered, immutable collection of clips used by one kind of entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationSet {
    clips: Vec<Arc<AnimationClip>>,
}

impl AnimationSet {
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self {
            clips: clips.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse a set from JSON of the form `{"clips": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn count(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnimationClip>> {
        self.clips.iter()
    }

    pub fn by_index(&self, index: usize) -> Result<&Arc<AnimationClip>> {
        self.clips.get(index).ok_or(AnimationError::OutOfRange {
            what: "clip",
            index,
            len: self.clips.len(),
        })
    }

    /// First clip whose name matches exactly.
    pub fn by_name(&self, name: &str) -> Result<&Arc<AnimationClip>> {
        self.clips
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| AnimationError::not_found_name(name))
    }

    /// First clip with the given id.
    pub fn by_id(&self, id: ClipId) -> Result<&Arc<AnimationClip>> {
        self.clips
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| AnimationError::not_found_id(id))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.clips.iter().any(|c| c.name() == name)
    }

    pub fn contains_id(&self, id: ClipId) -> bool {
        self.clips.iter().any(|c| c.id() == id)
    }
}

/// Central registry of reusable animation sets keyed by string IDs.
#[derive(Resource, Default)]
pub struct AnimationStore {
    pub sets: FxHashMap<String, Arc<AnimationSet>>,
}

impl AnimationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, set: AnimationSet) -> Arc<AnimationSet> {
        let set = Arc::new(set);
        self.sets.insert(key.into(), set.clone());
        set
    }

    pub fn get(&self, key: &str) -> Result<Arc<AnimationSet>> {
        self.sets
            .get(key)
            .cloned()
            .ok_or_else(|| AnimationError::NotFound {
                kind: "set",
                key: key.to_string(),
            })
    }

    /// Load a JSON animation set from disk and register it under `key`.
    pub fn load_set_from_file(
        &mut self,
        key: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Arc<AnimationSet>> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let set = AnimationSet::from_json_str(&json)?;
        let key = key.into();
        info!(
            "Loaded animation set '{}' ({} clips) from {:?}",
            key,
            set.count(),
            path
        );
        Ok(self.insert(key, set))
    }
}
