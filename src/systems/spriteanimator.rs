//! Sprite animator systems.
//!
//! - [`sprite_animator_update`] is the per-tick driver: it refreshes the
//!   [`VisibilityTracker`] from the camera, applies pending deactivations,
//!   advances every registered [`SpriteAnimator`] and updates culling.
//! - The lifecycle observers keep the
//!   [`SpriteAnimatorScheduler`] in sync with the world: adding the component
//!   registers the entity (creating the scheduler on demand), removing it
//!   deregisters the entity immediately, and the [`AnimatorInactive`] marker
//!   toggles deferred deactivation.
//!
//! # Tick Flow
//!
//! 1. Host calls [`on_tick`](crate::systems::time::on_tick) with the frame delta
//! 2. [`sprite_animator_update`] refreshes the viewport bounds once
//! 3. Pending deactivations are compacted out of the active list
//! 4. Each active animator advances, then `AutoCull` animators get their
//!    culled flag from the shared viewport snapshot
//! 5. Animators that went through a clip's end trigger an [`AnimationEndEvent`]

use std::sync::Arc;

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::components::globaltransform2d::GlobalTransform2D;
use crate::components::mapposition::MapPosition;
use crate::components::sprite::Sprite;
use crate::components::spriteanimator::{AnimatorInactive, CullingMode, SpriteAnimator};
use crate::events::animationend::AnimationEndEvent;
use crate::resources::animatorscheduler::{SpriteAnimatorScheduler, register_animator};
use crate::resources::camera2d::Camera2DRes;
use crate::resources::visibility::VisibilityTracker;
use crate::resources::worldtime::WorldTime;

/// Advance all registered animators and update their culling.
///
/// Contract
/// - Does nothing while no [`SpriteAnimatorScheduler`] exists.
/// - Reads [`WorldTime`] for the delta and [`Camera2DRes`] for the viewport
///   (the previous bounds are kept when there is no camera).
/// - Mutates [`SpriteAnimator`] state and pushes frames into [`Sprite`].
/// - Triggers one [`AnimationEndEvent`] per animator that finished at least
///   one pass, carrying the pass count.
pub fn sprite_animator_update(
    scheduler: Option<ResMut<SpriteAnimatorScheduler>>,
    camera: Option<Res<Camera2DRes>>,
    mut tracker: ResMut<VisibilityTracker>,
    time: Res<WorldTime>,
    mut query: Query<(
        &mut SpriteAnimator,
        &mut Sprite,
        Option<&MapPosition>,
        Option<&GlobalTransform2D>,
    )>,
    mut commands: Commands,
) {
    let Some(mut scheduler) = scheduler else {
        return;
    };

    if let Some(camera) = camera {
        tracker.refresh_from_camera(&camera);
    }

    scheduler.compact();

    let delta = time.delta.max(0.0);
    for &entity in scheduler.active() {
        let Ok((mut animator, mut sprite, local, global)) = query.get_mut(entity) else {
            debug!("Skipping animator entity {entity:?}: missing components");
            continue;
        };

        let outcome = animator.advance(delta, &mut *sprite);
        if outcome.finished_passes > 0 {
            if let Some(clip) = animator.current_clip() {
                commands.trigger(AnimationEndEvent {
                    entity,
                    clip_name: Arc::from(clip.name()),
                    clip_id: clip.id(),
                    passes: outcome.finished_passes,
                });
            }
        }

        if animator.cull_mode() == CullingMode::AutoCull {
            let (world_pos, local_pos) = resolve_positions(local, global);
            let position = animator.position(world_pos, local_pos);
            let visible = tracker.intersects_rect(position, &animator.bounds());
            animator.set_culled(!visible, &mut *sprite);
        }
    }
}

/// World and local positions, each falling back to the other (then the
/// origin) when its component is missing.
fn resolve_positions(
    local: Option<&MapPosition>,
    global: Option<&GlobalTransform2D>,
) -> (Vec2, Vec2) {
    let local = local.map(|p| p.pos);
    let world = global.map(|g| g.position);
    (
        world.or(local).unwrap_or(Vec2::ZERO),
        local.or(world).unwrap_or(Vec2::ZERO),
    )
}

/// Queue a registration that only happens if the entity still carries an
/// active animator once commands are applied.
fn queue_registration(commands: &mut Commands, entity: Entity) {
    commands.queue(move |world: &mut World| {
        let should_register = world.get_entity(entity).is_ok_and(|e| {
            e.contains::<SpriteAnimator>() && !e.contains::<AnimatorInactive>()
        });
        if should_register {
            register_animator(world, entity);
        }
    });
}

/// Start play-on-awake clips and register new animators.
pub fn on_sprite_animator_added(
    trigger: On<Add, SpriteAnimator>,
    mut query: Query<(&mut SpriteAnimator, &mut Sprite)>,
    mut commands: Commands,
) {
    let entity = trigger.event().entity;
    if let Ok((mut animator, mut sprite)) = query.get_mut(entity) {
        animator.awake(&mut *sprite);
    }
    queue_registration(&mut commands, entity);
}

/// Deregister animators synchronously when the component goes away.
pub fn on_sprite_animator_removed(
    trigger: On<Remove, SpriteAnimator>,
    scheduler: Option<ResMut<SpriteAnimatorScheduler>>,
) {
    if let Some(mut scheduler) = scheduler {
        scheduler.destroy(trigger.event().entity);
    }
}

pub fn on_animator_deactivated(
    trigger: On<Add, AnimatorInactive>,
    scheduler: Option<ResMut<SpriteAnimatorScheduler>>,
) {
    if let Some(mut scheduler) = scheduler {
        scheduler.deactivate(trigger.event().entity);
    }
}

pub fn on_animator_reactivated(trigger: On<Remove, AnimatorInactive>, mut commands: Commands) {
    queue_registration(&mut commands, trigger.event().entity);
}

/// Register the lifecycle observers and the resources the update system
/// reads.
pub fn install_sprite_animator_observers(world: &mut World) {
    world.init_resource::<VisibilityTracker>();
    world.init_resource::<WorldTime>();
    world.add_observer(on_sprite_animator_added);
    world.add_observer(on_sprite_animator_removed);
    world.add_observer(on_animator_deactivated);
    world.add_observer(on_animator_reactivated);
    world.flush();
}
