//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per frame, applying `time_scale` to the provided delta.
//! [`on_tick`] is the single entry point a host loop calls per frame.
use bevy_ecs::prelude::*;
use log::warn;

use crate::resources::worldtime::WorldTime;

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is expected to be the unscaled frame delta in seconds. Negative or
/// non-finite values are treated as zero. The system applies the current
/// `time_scale` and writes both `elapsed` and `delta`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let dt = if dt.is_finite() && dt >= 0.0 {
        dt
    } else {
        warn!("Ignoring invalid frame delta {dt}");
        0.0
    };
    let mut wt = world.get_resource_or_init::<WorldTime>();
    let scaled_dt = dt * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.frame_count += 1;
}

/// Advance the clock by `dt` and run `schedule` once.
pub fn on_tick(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
}
