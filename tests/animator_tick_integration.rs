//! Animator tick integration tests: scheduler lifecycle, culling and events.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bevy_ecs::prelude::*;
use glam::Vec2;

use sprite_animator::components::globaltransform2d::GlobalTransform2D;
use sprite_animator::components::mapposition::MapPosition;
use sprite_animator::components::sprite::Sprite;
use sprite_animator::components::spriteanimator::{
    AnimatorInactive, CullingMode, PositionSource, SpriteAnimator,
};
use sprite_animator::events::animationend::AnimationEndEvent;
use sprite_animator::resources::animationstore::{AnimationClip, AnimationSet, SpriteFrame};
use sprite_animator::resources::animatorconfig::AnimatorConfig;
use sprite_animator::resources::animatorscheduler::{
    SpriteAnimatorScheduler, active_animator_count, has_scheduler, teardown_scheduler,
};
use sprite_animator::resources::camera2d::Camera2DRes;
use sprite_animator::resources::screensize::ScreenSize;
use sprite_animator::resources::visibility::LocalRect;
use sprite_animator::resources::worldtime::WorldTime;
use sprite_animator::systems::spriteanimator::{
    install_sprite_animator_observers, sprite_animator_update,
};
use sprite_animator::systems::time::on_tick;

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn walk_set() -> Arc<AnimationSet> {
    let frames = SpriteFrame::strip("hero", Vec2::ZERO, Vec2::new(16.0, 16.0), 4);
    let walk = AnimationClip::constant("walk", frames.clone(), 0.1, true).unwrap();
    let die = AnimationClip::constant("die", frames, 0.1, false).unwrap();
    Arc::new(AnimationSet::new(vec![walk, die]))
}

/// World with a [-5, 5] x [-5, 5] viewport and the animator observers.
fn make_world() -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(Camera2DRes::new(Vec2::ZERO, 5.0, 1.0));
    install_sprite_animator_observers(&mut world);
    world
}

fn make_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(sprite_animator_update);
    schedule
}

fn spawn_animator(world: &mut World, pos: Vec2, animator: SpriteAnimator) -> Entity {
    let entity = world
        .spawn((MapPosition { pos }, GlobalTransform2D::at(pos), animator))
        .id();
    world.flush();
    entity
}

fn animator(world: &World, entity: Entity) -> &SpriteAnimator {
    world.get::<SpriteAnimator>(entity).unwrap()
}

fn scheduler(world: &World) -> &SpriteAnimatorScheduler {
    world.resource::<SpriteAnimatorScheduler>()
}

/// Observer tallies: (events received, passes reported).
fn count_ends(world: &mut World) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let events = Arc::new(AtomicUsize::new(0));
    let passes = Arc::new(AtomicUsize::new(0));
    let (events_clone, passes_clone) = (events.clone(), passes.clone());
    world.add_observer(move |trigger: On<AnimationEndEvent>| {
        events_clone.fetch_add(1, Ordering::SeqCst);
        passes_clone.fetch_add(trigger.event().passes as usize, Ordering::SeqCst);
    });
    world.flush();
    (events, passes)
}

#[test]
fn test_scheduler_created_on_first_spawn() {
    let mut world = make_world();
    assert!(!has_scheduler(&world));

    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    assert!(has_scheduler(&world));
    assert!(scheduler(&world).is_active(e));
    assert_eq!(scheduler(&world).active_count(), 1);
}

#[test]
fn test_play_on_awake_pushes_first_frame() {
    let mut world = make_world();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    let a = animator(&world, e);
    assert_eq!(a.current_clip().map(|c| c.name()), Some("walk"));
    assert_eq!(a.current_frame(), 0);
    let sprite = world.get::<Sprite>(e).unwrap();
    assert_eq!(sprite.tex_key.as_deref(), Some("hero"));
    assert_eq!(sprite.revision, 1);
}

#[test]
fn test_play_on_awake_disabled_stays_idle() {
    let mut world = make_world();
    let e = spawn_animator(
        &mut world,
        Vec2::ZERO,
        SpriteAnimator::with_controller(walk_set()).with_play_on_awake(false),
    );
    assert!(animator(&world, e).current_clip().is_none());
    assert_eq!(world.get::<Sprite>(e).unwrap().revision, 0);
}

#[test]
fn test_walk_scenario_through_ticks() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    on_tick(&mut world, &mut schedule, 0.25);
    let a = animator(&world, e);
    assert_eq!(a.current_frame(), 2);
    assert!(approx_eq(a.elapsed(), 0.05));

    on_tick(&mut world, &mut schedule, 0.15);
    let a = animator(&world, e);
    assert_eq!(a.current_frame(), 0);
    assert!(approx_eq(a.elapsed(), 0.0));
}

#[test]
fn test_animation_end_event_reports_wraps() {
    let mut world = make_world();
    let (events, passes) = count_ends(&mut world);
    let names = Arc::new(std::sync::Mutex::new(Vec::<Arc<str>>::new()));
    let names_clone = names.clone();
    world.add_observer(move |trigger: On<AnimationEndEvent>| {
        names_clone.lock().unwrap().push(trigger.event().clip_name.clone());
    });
    world.flush();
    let mut schedule = make_schedule();
    spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    // 0.85s of a 0.4s loop: two wraps in one tick.
    on_tick(&mut world, &mut schedule, 0.85);
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(passes.load(Ordering::SeqCst), 2);

    // 0.4s more: one wrap.
    on_tick(&mut world, &mut schedule, 0.4);
    assert_eq!(events.load(Ordering::SeqCst), 2);
    assert_eq!(passes.load(Ordering::SeqCst), 3);
    assert!(names.lock().unwrap().iter().all(|n| n.as_ref() == "walk"));
}

#[test]
fn test_large_tick_wraps_without_stalling() {
    let mut world = make_world();
    let (events, passes) = count_ends(&mut world);
    let mut schedule = make_schedule();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    on_tick(&mut world, &mut schedule, 1000.0);
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(passes.load(Ordering::SeqCst), 2500);
    let a = animator(&world, e);
    assert_eq!(a.current_frame(), 0);
    assert!(approx_eq(a.elapsed(), 0.0));

    on_tick(&mut world, &mut schedule, 1e8);
    assert_eq!(events.load(Ordering::SeqCst), 2);
    let a = animator(&world, e);
    assert_eq!(a.current_frame(), 0);
    assert!(approx_eq(a.elapsed(), 0.0));
}

#[test]
fn test_non_looping_clip_ends_once() {
    let mut world = make_world();
    let (events, passes) = count_ends(&mut world);
    let mut schedule = make_schedule();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));
    {
        let mut entity = world.entity_mut(e);
        let mut sprite = std::mem::take(&mut *entity.get_mut::<Sprite>().unwrap());
        entity
            .get_mut::<SpriteAnimator>()
            .unwrap()
            .play_by_name("die", &mut sprite)
            .unwrap();
        entity.insert(sprite);
    }

    for _ in 0..10 {
        on_tick(&mut world, &mut schedule, 0.1);
    }
    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(passes.load(Ordering::SeqCst), 1);
    assert_eq!(animator(&world, e).displayed_frame(), 3);
}

#[test]
fn test_deactivate_same_tick_is_never_advanced() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    world.entity_mut(e).insert(AnimatorInactive);
    world.flush();
    assert!(scheduler(&world).is_pending_removal(e));

    on_tick(&mut world, &mut schedule, 0.25);
    assert!(!scheduler(&world).is_active(e));
    assert_eq!(scheduler(&world).pending_count(), 0);
    assert_eq!(animator(&world, e).current_frame(), 0);
}

#[test]
fn test_spawn_inactive_never_registers() {
    let mut world = make_world();
    let e = world
        .spawn((SpriteAnimator::with_controller(walk_set()), AnimatorInactive))
        .id();
    world.flush();
    let registered = has_scheduler(&world) && scheduler(&world).is_active(e);
    assert!(!registered);
}

#[test]
fn test_reactivation_resumes_advancing() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    world.entity_mut(e).insert(AnimatorInactive);
    world.flush();
    on_tick(&mut world, &mut schedule, 0.1);
    assert!(!scheduler(&world).is_active(e));

    world.entity_mut(e).remove::<AnimatorInactive>();
    world.flush();
    assert!(scheduler(&world).is_active(e));

    on_tick(&mut world, &mut schedule, 0.1);
    assert_eq!(animator(&world, e).current_frame(), 1);
}

#[test]
fn test_toggle_inactive_within_one_tick_keeps_single_registration() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    world.entity_mut(e).insert(AnimatorInactive);
    world.flush();
    world.entity_mut(e).remove::<AnimatorInactive>();
    world.flush();

    on_tick(&mut world, &mut schedule, 0.1);
    assert_eq!(scheduler(&world).active_count(), 1);
    assert_eq!(animator(&world, e).current_frame(), 1);
}

#[test]
fn test_despawn_removes_from_scheduler_immediately() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let a = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));
    let b = spawn_animator(&mut world, Vec2::ONE, SpriteAnimator::with_controller(walk_set()));

    world.entity_mut(a).insert(AnimatorInactive);
    world.flush();
    world.despawn(a);

    assert!(!scheduler(&world).is_active(a));
    assert!(!scheduler(&world).is_pending_removal(a));
    assert!(scheduler(&world).is_active(b));

    on_tick(&mut world, &mut schedule, 0.1);
    assert_eq!(animator(&world, b).current_frame(), 1);
}

#[test]
fn test_culling_edge_touching_rect_is_visible() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let bounds = LocalRect::new(Vec2::ZERO, Vec2::new(2.0, 2.0));
    let edge = spawn_animator(
        &mut world,
        Vec2::new(4.0, 4.0),
        SpriteAnimator::with_controller(walk_set()).with_bounds(bounds),
    );
    let outside = spawn_animator(
        &mut world,
        Vec2::new(7.0, 7.0),
        SpriteAnimator::with_controller(walk_set()).with_bounds(bounds),
    );

    on_tick(&mut world, &mut schedule, 0.0);
    assert!(!animator(&world, edge).is_culled());
    assert!(animator(&world, outside).is_culled());
}

#[test]
fn test_culled_animator_advances_without_pushing_frames() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = spawn_animator(
        &mut world,
        Vec2::new(50.0, 0.0),
        SpriteAnimator::with_controller(walk_set()),
    );

    on_tick(&mut world, &mut schedule, 0.0);
    assert!(animator(&world, e).is_culled());
    let revision = world.get::<Sprite>(e).unwrap().revision;

    on_tick(&mut world, &mut schedule, 0.1);
    assert_eq!(animator(&world, e).current_frame(), 1);
    assert_eq!(world.get::<Sprite>(e).unwrap().revision, revision);

    // Moving the camera onto the entity pushes the current frame.
    world.resource_mut::<Camera2DRes>().position = Vec2::new(50.0, 0.0);
    on_tick(&mut world, &mut schedule, 0.0);
    assert!(!animator(&world, e).is_culled());
    let sprite = world.get::<Sprite>(e).unwrap();
    assert_eq!(sprite.revision, revision + 1);
    assert!(approx_eq(sprite.offset.x, 16.0));
}

#[test]
fn test_always_animate_is_never_culled() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = spawn_animator(
        &mut world,
        Vec2::new(100.0, 100.0),
        SpriteAnimator::with_controller(walk_set()).with_cull_mode(CullingMode::AlwaysAnimate),
    );
    let revision = world.get::<Sprite>(e).unwrap().revision;

    on_tick(&mut world, &mut schedule, 0.1);
    assert!(!animator(&world, e).is_culled());
    assert_eq!(world.get::<Sprite>(e).unwrap().revision, revision + 1);
}

#[test]
fn test_local_position_source_uses_map_position() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let e = world
        .spawn((
            MapPosition::new(0.0, 0.0),
            GlobalTransform2D::at(Vec2::new(100.0, 0.0)),
            SpriteAnimator::with_controller(walk_set()).with_position_source(PositionSource::Local),
        ))
        .id();
    world.flush();

    on_tick(&mut world, &mut schedule, 0.0);
    assert!(!animator(&world, e).is_culled());
}

#[test]
fn test_teardown_then_spawn_recreates_scheduler() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    let old = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));

    assert!(teardown_scheduler(&mut world));
    assert!(!has_scheduler(&world));

    // Without a scheduler the update is a no-op.
    on_tick(&mut world, &mut schedule, 0.1);
    assert_eq!(animator(&world, old).current_frame(), 0);

    let new = spawn_animator(&mut world, Vec2::ZERO, SpriteAnimator::with_controller(walk_set()));
    assert!(has_scheduler(&world));
    assert!(scheduler(&world).is_active(new));
    assert!(!scheduler(&world).is_active(old));
}

#[test]
fn test_no_animators_reports_zero_active() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    on_tick(&mut world, &mut schedule, 0.1);
    assert!(!has_scheduler(&world));
    assert_eq!(active_animator_count(&world), 0);
}

#[test]
fn test_config_animators_under_screen_sized_camera() {
    let mut world = make_world();
    let mut schedule = make_schedule();
    // 720 px tall at 72 px per unit: a [-8.9, 8.9] x [-5, 5] viewport
    let screen = ScreenSize { w: 1280, h: 720 };
    world.insert_resource(screen);
    world.insert_resource(Camera2DRes::from_screen(Vec2::ZERO, 72.0, screen));

    let mut config = AnimatorConfig::new();
    config.default_speed = 2.0;
    let set = walk_set();
    let inside = spawn_animator(
        &mut world,
        Vec2::new(8.0, 0.0),
        SpriteAnimator::from_config(&config),
    );
    let outside = spawn_animator(
        &mut world,
        Vec2::new(0.0, 8.0),
        SpriteAnimator::from_config(&config),
    );
    assert_eq!(active_animator_count(&world), 2);

    for e in [inside, outside] {
        let mut entity = world.entity_mut(e);
        let mut sprite = std::mem::take(&mut *entity.get_mut::<Sprite>().unwrap());
        entity
            .get_mut::<SpriteAnimator>()
            .unwrap()
            .set_controller(Some(set.clone()), &mut sprite);
        entity.insert(sprite);
    }

    on_tick(&mut world, &mut schedule, 0.1);
    assert!(!animator(&world, inside).is_culled());
    assert!(animator(&world, outside).is_culled());
    // speed 2.0 from the config
    assert_eq!(animator(&world, inside).current_frame(), 2);
    assert_eq!(animator(&world, outside).current_frame(), 2);
}
