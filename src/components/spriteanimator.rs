//! Per-entity sprite animation playback.
//!
//! [`SpriteAnimator`] is the frame-advance state machine for one entity. It
//! holds a shared reference to the clip being played, the frame index and
//! the time spent on that frame, and pushes frame images into a
//! [`FrameSink`] (normally the entity's [`Sprite`]) whenever the visible
//! frame changes.
//!
//! Playback states:
//! - `Idle`: no clip, advancing does nothing
//! - `Playing`: a clip is assigned and frames advance with time
//! - `Finished`: a non-looping clip went past its last frame; time still
//!   accumulates but the displayed frame stays on the last one
//!
//! Culling is orthogonal: a culled animator keeps advancing but does not
//! push frames until it becomes visible again.
//!
//! Animators are driven by
//! [`sprite_animator_update`](crate::systems::spriteanimator::sprite_animator_update)
//! once registered with the
//! [`SpriteAnimatorScheduler`](crate::resources::animatorscheduler::SpriteAnimatorScheduler).

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Component;
use glam::Vec2;
use smallvec::SmallVec;

use crate::components::sprite::{FrameSink, Sprite};
use crate::error::{AnimationError, Result};
use crate::resources::animationstore::{AnimationClip, AnimationSet, ClipId};
use crate::resources::animatorconfig::AnimatorConfig;
use crate::resources::visibility::LocalRect;

/// Relative slack when comparing elapsed time against a frame duration.
///
/// Absorbs f32 rounding so that advancing by exactly `k * duration` lands on
/// frame `k` instead of stopping one frame short.
const FRAME_TIME_TOLERANCE: f32 = 1e-4;

/// Whether an animator is culled when its bounds leave the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullingMode {
    /// Never culled; frames are always pushed.
    AlwaysAnimate,
    /// Culled whenever the bounds do not intersect the viewport.
    #[default]
    AutoCull,
}

/// Which transform position feeds culling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionSource {
    #[default]
    World,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Playing,
    Finished,
}

/// What happened during one [`SpriteAnimator::advance`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// The frame index moved at least once.
    pub frame_changed: bool,
    /// How many times playback went through the end of the clip.
    pub finished_passes: u32,
}

/// Marker that takes an animator out of the update pass without removing
/// it. Inserting it requests deferred deactivation; removing it registers
/// the animator again.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AnimatorInactive;

pub type FinishedListener = Box<dyn FnMut(&AnimationClip) + Send + Sync>;

#[derive(Component)]
#[require(Sprite)]
pub struct SpriteAnimator {
    controller: Option<Arc<AnimationSet>>,
    clip: Option<Arc<AnimationClip>>,
    frame_count: usize,
    current_frame: usize,
    elapsed: f32,
    frame_duration: f32,
    speed: f32,
    cull_mode: CullingMode,
    culled: bool,
    position_source: PositionSource,
    is_static: bool,
    static_position: Vec2,
    bounds: LocalRect,
    play_on_awake: bool,
    listeners: SmallVec<[FinishedListener; 1]>,
}

impl Default for SpriteAnimator {
    fn default() -> Self {
        Self {
            controller: None,
            clip: None,
            frame_count: 0,
            current_frame: 0,
            elapsed: 0.0,
            frame_duration: 0.0,
            speed: 1.0,
            cull_mode: CullingMode::default(),
            culled: false,
            position_source: PositionSource::default(),
            is_static: false,
            static_position: Vec2::ZERO,
            bounds: LocalRect::default(),
            play_on_awake: true,
            listeners: SmallVec::new(),
        }
    }
}

impl fmt::Debug for SpriteAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpriteAnimator")
            .field("clip", &self.clip.as_ref().map(|c| c.name()))
            .field("current_frame", &self.current_frame)
            .field("frame_count", &self.frame_count)
            .field("elapsed", &self.elapsed)
            .field("frame_duration", &self.frame_duration)
            .field("speed", &self.speed)
            .field("cull_mode", &self.cull_mode)
            .field("culled", &self.culled)
            .field("position_source", &self.position_source)
            .field("is_static", &self.is_static)
            .field("bounds", &self.bounds)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SpriteAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animator using the configured default speed and culling mode.
    pub fn from_config(config: &AnimatorConfig) -> Self {
        Self::new()
            .with_speed(config.default_speed)
            .with_cull_mode(config.cull_mode)
    }

    /// Animator that starts clip 0 of `set` when its entity is spawned.
    pub fn with_controller(set: Arc<AnimationSet>) -> Self {
        Self {
            controller: Some(set),
            ..Self::default()
        }
    }

    pub fn with_play_on_awake(mut self, play_on_awake: bool) -> Self {
        self.play_on_awake = play_on_awake;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    pub fn with_cull_mode(mut self, mode: CullingMode) -> Self {
        self.cull_mode = mode;
        if mode == CullingMode::AlwaysAnimate {
            self.culled = false;
        }
        self
    }

    pub fn with_bounds(mut self, bounds: LocalRect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_position_source(mut self, source: PositionSource) -> Self {
        self.position_source = source;
        self
    }

    // ---- playback ----

    /// Start the first clip of the controller if the animator was built to
    /// play on awake and nothing is playing yet.
    pub fn awake(&mut self, sink: &mut impl FrameSink) {
        if !self.play_on_awake || self.clip.is_some() {
            return;
        }
        if let Some(clip) = self
            .controller
            .as_ref()
            .and_then(|set| set.by_index(0).ok())
            .cloned()
        {
            self.play(clip, sink);
        }
    }

    /// Replace the controller. Plays its first clip, or goes idle when the
    /// set is missing or empty.
    pub fn set_controller(&mut self, set: Option<Arc<AnimationSet>>, sink: &mut impl FrameSink) {
        let first = set.as_ref().and_then(|s| s.by_index(0).ok()).cloned();
        self.controller = set;
        match first {
            Some(clip) => self.play(clip, sink),
            None => self.stop(),
        }
    }

    pub fn controller(&self) -> Option<&Arc<AnimationSet>> {
        self.controller.as_ref()
    }

    /// Play `clip` from its first frame.
    ///
    /// The first frame is pushed right away, even while culled, so the sink
    /// never keeps showing a frame from the previous clip.
    pub fn play(&mut self, clip: Arc<AnimationClip>, sink: &mut impl FrameSink) {
        self.frame_count = clip.frame_count();
        self.current_frame = 0;
        self.elapsed = 0.0;
        self.frame_duration = clip.frame_duration(0);
        sink.set_frame(clip.first_frame());
        self.clip = Some(clip);
    }

    /// Play the controller clip named `name`. On error nothing changes.
    pub fn play_by_name(&mut self, name: &str, sink: &mut impl FrameSink) -> Result<()> {
        let clip = match &self.controller {
            Some(set) => set.by_name(name)?.clone(),
            None => return Err(AnimationError::not_found_name(name)),
        };
        self.play(clip, sink);
        Ok(())
    }

    /// Play the controller clip at `index`. On error nothing changes.
    pub fn play_by_index(&mut self, index: usize, sink: &mut impl FrameSink) -> Result<()> {
        let clip = match &self.controller {
            Some(set) => set.by_index(index)?.clone(),
            None => {
                return Err(AnimationError::OutOfRange {
                    what: "clip",
                    index,
                    len: 0,
                });
            }
        };
        self.play(clip, sink);
        Ok(())
    }

    /// Play the controller clip with id `id`. On error nothing changes.
    pub fn play_by_id(&mut self, id: ClipId, sink: &mut impl FrameSink) -> Result<()> {
        let clip = match &self.controller {
            Some(set) => set.by_id(id)?.clone(),
            None => return Err(AnimationError::not_found_id(id)),
        };
        self.play(clip, sink);
        Ok(())
    }

    /// Drop the current clip and go idle.
    pub fn stop(&mut self) {
        self.clip = None;
        self.frame_count = 0;
        self.current_frame = 0;
        self.elapsed = 0.0;
        self.frame_duration = 0.0;
    }

    /// Advance playback by `delta` seconds (scaled by speed).
    ///
    /// Handles any number of frame steps and loop wraps in one call. Whole
    /// cycles of a looping clip are skipped arithmetically, so the cost does
    /// not grow with `delta`. Finished listeners run once per pass through
    /// the end of the clip. At most one frame is pushed to `sink`, and only
    /// when not culled.
    pub fn advance(&mut self, delta: f32, sink: &mut impl FrameSink) -> AdvanceOutcome {
        let mut outcome = AdvanceOutcome::default();
        if self.frame_count == 0 {
            return outcome;
        }
        let step = delta * self.speed;
        if !step.is_finite() || step <= 0.0 || !(self.elapsed + step).is_finite() {
            return outcome;
        }
        let Some(clip) = self.clip.as_deref() else {
            return outcome;
        };

        self.elapsed += step;

        // A finished non-looping clip sits at frame_count and never re-enters this loop.
        while self.current_frame < self.frame_count
            && self.elapsed >= self.frame_duration * (1.0 - FRAME_TIME_TOLERANCE)
        {
            self.elapsed = (self.elapsed - self.frame_duration).max(0.0);
            self.current_frame += 1;
            outcome.frame_changed = true;

            if self.current_frame >= self.frame_count {
                let mut passes: u32 = 1;
                if clip.looped() {
                    self.current_frame = 0;
                    self.frame_duration = clip.frame_duration(0);
                    let cycle = clip.cycle_duration();
                    if f64::from(self.elapsed) >= cycle {
                        let (skipped, rest) = skip_whole_cycles(self.elapsed, cycle);
                        passes = passes.saturating_add(skipped);
                        self.elapsed = rest;
                    }
                }
                outcome.finished_passes = outcome.finished_passes.saturating_add(passes);
                if !self.listeners.is_empty() {
                    for _ in 0..passes {
                        for listener in self.listeners.iter_mut() {
                            listener(clip);
                        }
                    }
                }
            } else {
                self.frame_duration = clip.frame_duration(self.current_frame);
            }
        }

        if outcome.frame_changed && !self.culled {
            let index = self.current_frame.min(self.frame_count - 1);
            sink.set_frame(&clip.frames()[index]);
        }
        outcome
    }

    fn push_current_frame(&self, sink: &mut impl FrameSink) {
        if let Some(clip) = self.clip.as_deref() {
            sink.set_frame(&clip.frames()[self.displayed_frame()]);
        }
    }

    // ---- culling ----

    /// Set the culled flag. Becoming visible pushes the current frame.
    pub fn set_culled(&mut self, culled: bool, sink: &mut impl FrameSink) {
        let was_culled = self.culled;
        self.culled = culled;
        if was_culled && !culled {
            self.push_current_frame(sink);
        }
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Switching to [`CullingMode::AlwaysAnimate`] un-culls immediately.
    pub fn set_cull_mode(&mut self, mode: CullingMode, sink: &mut impl FrameSink) {
        self.cull_mode = mode;
        if mode == CullingMode::AlwaysAnimate {
            self.set_culled(false, sink);
        }
    }

    pub fn cull_mode(&self) -> CullingMode {
        self.cull_mode
    }

    pub fn bounds(&self) -> LocalRect {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: LocalRect) {
        self.bounds = bounds;
    }

    // ---- position ----

    /// Mark the entity as static. Turning it on snapshots `world_position`,
    /// which [`position`](Self::position) then returns until cleared.
    pub fn set_static(&mut self, is_static: bool, world_position: Vec2) {
        self.is_static = is_static;
        if is_static {
            self.static_position = world_position;
        }
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn position_source(&self) -> PositionSource {
        self.position_source
    }

    pub fn set_position_source(&mut self, source: PositionSource) {
        self.position_source = source;
    }

    /// Position used for culling.
    pub fn position(&self, world: Vec2, local: Vec2) -> Vec2 {
        if self.is_static {
            return self.static_position;
        }
        match self.position_source {
            PositionSource::World => world,
            PositionSource::Local => local,
        }
    }

    // ---- speed ----

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Negative (and NaN) speeds are clamped to zero.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    // ---- listeners ----

    pub fn add_finished_listener(
        &mut self,
        listener: impl FnMut(&AnimationClip) + Send + Sync + 'static,
    ) {
        self.listeners.push(Box::new(listener));
    }

    pub fn clear_finished_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn finished_listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ---- state ----

    pub fn state(&self) -> AnimatorState {
        if self.frame_count == 0 {
            AnimatorState::Idle
        } else if self.current_frame >= self.frame_count {
            AnimatorState::Finished
        } else {
            AnimatorState::Playing
        }
    }

    pub fn current_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    /// Raw frame index. Equals `frame_count` once a non-looping clip ends.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Frame index being displayed, clamped to the last frame.
    pub fn displayed_frame(&self) -> usize {
        self.current_frame.min(self.frame_count.saturating_sub(1))
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Time spent on the current frame.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn frame_duration(&self) -> f32 {
        self.frame_duration
    }
}

/// Remove whole cycles of length `cycle` from `elapsed`.
///
/// Returns the number of cycles removed and the time left in the current
/// cycle. A remainder within rounding distance of either end of the cycle
/// snaps to the cycle start; the distance grows with `elapsed` because an
/// f32 cannot place a large time inside a short cycle any more precisely.
fn skip_whole_cycles(elapsed: f32, cycle: f64) -> (u32, f32) {
    let t = f64::from(elapsed);
    let slack = (t * f64::from(f32::EPSILON)).max(cycle * f64::from(FRAME_TIME_TOLERANCE));
    let mut passes = (t / cycle).floor();
    let mut rest = t - passes * cycle;
    if cycle - rest <= slack {
        passes += 1.0;
        rest = 0.0;
    } else if rest <= slack {
        rest = 0.0;
    }
    // float to int casts saturate
    (passes as u32, rest as f32)
}
