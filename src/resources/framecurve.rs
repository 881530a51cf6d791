//! Normalized curves used to scale per-frame durations.
//!
//! A [`FrameCurve`] maps the normalized frame position `frame / frame_count`
//! (always in `[0, 1)`) to a multiplier applied to a clip's base frame
//! duration. See [`FrameDuration::Curved`](super::animationstore::FrameDuration).

use serde::{Deserialize, Serialize};

/// Easing functions for curve interpolation.
///
/// These functions transform a linear `t` value (0.0 to 1.0) to create
/// different acceleration/deceleration curves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed (no easing).
    Linear,
    /// Starts slow, accelerates (quadratic).
    QuadIn,
    /// Starts fast, decelerates (quadratic).
    QuadOut,
    /// Slow start and end (quadratic).
    QuadInOut,
    /// Starts slow, accelerates (cubic).
    CubicIn,
    /// Starts fast, decelerates (cubic).
    CubicOut,
    /// Slow start and end (cubic).
    CubicInOut,
}

/// Apply an easing function to a normalized time value.
///
/// The input `t` is clamped to [0.0, 1.0] before evaluation.
pub fn ease(e: Easing, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match e {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => t * (2.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                -1.0 + (4.0 - 2.0 * t) * t
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => {
            let p = t - 1.0;
            p * p * p + 1.0
        }
        Easing::CubicInOut => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                let p = 2.0 * t - 2.0;
                0.5 * p * p * p + 1.0
            }
        }
    }
}

/// One control point of a keyframed curve.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// A curve over normalized time `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FrameCurve {
    /// Same value everywhere.
    Constant { value: f32 },
    /// `from + (to - from) * ease(t)`.
    Eased { easing: Easing, from: f32, to: f32 },
    /// Piecewise-linear through the keys, held flat outside the first/last key.
    Keys { keys: Vec<CurveKey> },
}

impl Default for FrameCurve {
    fn default() -> Self {
        FrameCurve::Constant { value: 1.0 }
    }
}

impl FrameCurve {
    pub fn constant(value: f32) -> Self {
        FrameCurve::Constant { value }
    }

    pub fn eased(easing: Easing, from: f32, to: f32) -> Self {
        FrameCurve::Eased { easing, from, to }
    }

    /// Build a keyframed curve. Keys are sorted by time.
    pub fn keys(mut keys: Vec<CurveKey>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        FrameCurve::Keys { keys }
    }

    /// Evaluate the curve at `t`, clamped to [0, 1].
    ///
    /// An empty key list evaluates to `1.0` so a malformed curve falls back
    /// to the unscaled base duration.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FrameCurve::Constant { value } => *value,
            FrameCurve::Eased { easing, from, to } => from + (to - from) * ease(*easing, t),
            FrameCurve::Keys { keys } => evaluate_keys(keys, t),
        }
    }
}

fn evaluate_keys(keys: &[CurveKey], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 1.0;
    };
    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }
    // keys are sorted, so the first key past `t` closes the segment
    let upper = keys.partition_point(|k| k.time <= t);
    let a = keys[upper - 1];
    let b = keys[upper];
    let span = b.time - a.time;
    if span <= f32::EPSILON {
        return b.value;
    }
    a.value + (b.value - a.value) * ((t - a.time) / span)
}
