//! Sprite animator headless driver.
//!
//! Builds an ECS world, spawns a grid of animated entities (a fraction of
//! them outside the camera), and runs the animator update for a number of
//! ticks. Useful for profiling the update pass and checking culling counts
//! without a window.
//!
//! # Main Loop
//!
//! 1. Load `animator.ini` (defaults when missing); size the camera from it
//!    or from `--width`/`--height`
//! 2. Load the animation set from JSON, or build the built-in demo set
//! 3. Spawn entities with [`SpriteAnimator`] + positions; observers register them
//! 4. For each tick: update time, run the schedule, tally events
//! 5. Log active, culled and finished counts
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --animators 10000 --ticks 600
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use bevy_ecs::prelude::*;
use clap::Parser;
use glam::Vec2;
use log::{error, info};

use sprite_animator::components::globaltransform2d::GlobalTransform2D;
use sprite_animator::components::mapposition::MapPosition;
use sprite_animator::components::sprite::Sprite;
use sprite_animator::components::spriteanimator::SpriteAnimator;
use sprite_animator::error::Result;
use sprite_animator::events::animationend::AnimationEndEvent;
use sprite_animator::resources::animationstore::{
    AnimationClip, AnimationSet, AnimationStore, FrameDuration, SpriteFrame,
};
use sprite_animator::resources::animatorconfig::AnimatorConfig;
use sprite_animator::resources::animatorscheduler::active_animator_count;
use sprite_animator::resources::camera2d::Camera2DRes;
use sprite_animator::resources::framecurve::{Easing, FrameCurve};
use sprite_animator::resources::screensize::ScreenSize;
use sprite_animator::resources::visibility::LocalRect;
use sprite_animator::resources::worldtime::WorldTime;
use sprite_animator::systems::spriteanimator::{
    install_sprite_animator_observers, sprite_animator_update,
};
use sprite_animator::systems::time::on_tick;

const SET_KEY: &str = "demo";

/// Sprite animator headless driver
#[derive(Parser)]
#[command(version, about = "Runs sprite animators headless and reports culling statistics.")]
struct Cli {
    /// Path to the INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./animator.ini")]
    config: PathBuf,

    /// JSON animation set to play. A built-in set is used when omitted.
    #[arg(long, value_name = "PATH")]
    clips: Option<PathBuf>,

    /// Number of animated entities to spawn.
    #[arg(long, default_value_t = 2048)]
    animators: usize,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Half width of the square entities are scattered over, in world units.
    #[arg(long, default_value_t = 20.0)]
    spread: f32,

    /// Render width in pixels. With --height, sizes the camera from the
    /// screen instead of the config file.
    #[arg(long, requires = "height")]
    width: Option<i32>,

    /// Render height in pixels.
    #[arg(long, requires = "width")]
    height: Option<i32>,

    /// Pixels per world unit when the camera is sized from the screen.
    #[arg(long, default_value_t = 72.0)]
    zoom: f32,
}

fn demo_set() -> Result<AnimationSet> {
    let size = Vec2::new(16.0, 16.0);
    Ok(AnimationSet::new(vec![
        AnimationClip::constant(
            "idle",
            SpriteFrame::strip("hero", Vec2::ZERO, size, 4),
            0.15,
            true,
        )?,
        AnimationClip::new(
            "run",
            SpriteFrame::strip("hero", Vec2::new(0.0, 16.0), size, 6),
            FrameDuration::Curved {
                base: 0.1,
                curve: FrameCurve::eased(Easing::QuadInOut, 1.5, 0.75),
            },
            true,
        )?,
        AnimationClip::constant(
            "vanish",
            SpriteFrame::strip("hero", Vec2::new(0.0, 32.0), size, 5),
            0.08,
            false,
        )?,
    ]))
}

fn load_set(cli: &Cli, store: &mut AnimationStore) -> Result<Arc<AnimationSet>> {
    match &cli.clips {
        Some(path) => store.load_set_from_file(SET_KEY, path),
        None => Ok(store.insert(SET_KEY, demo_set()?)),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = AnimatorConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        info!("{e}; using defaults");
    }

    let mut store = AnimationStore::new();
    let set = match load_set(&cli, &mut store) {
        Ok(set) => set,
        Err(e) => {
            error!("Failed to load animation set: {e}");
            std::process::exit(1);
        }
    };
    if set.is_empty() {
        error!("Animation set has no clips");
        std::process::exit(1);
    }

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    let camera = match (cli.width, cli.height) {
        (Some(w), Some(h)) => {
            let screen = ScreenSize { w, h };
            world.insert_resource(screen);
            Camera2DRes::from_screen(Vec2::ZERO, cli.zoom, screen)
        }
        _ => Camera2DRes::new(Vec2::ZERO, config.vertical_half_extent, config.aspect_ratio),
    };
    info!(
        "Camera half extent {:.2}, aspect {:.3}",
        camera.vertical_half_extent, camera.aspect_ratio
    );
    world.insert_resource(camera);
    world.insert_resource(config.clone());
    world.insert_resource(store);
    install_sprite_animator_observers(&mut world);

    let finished = Arc::new(AtomicU64::new(0));
    let finished_clone = finished.clone();
    world.add_observer(move |trigger: On<AnimationEndEvent>| {
        finished_clone.fetch_add(u64::from(trigger.event().passes), Ordering::Relaxed);
    });
    world.flush();

    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..cli.animators {
        let pos = Vec2::new(
            (rng.f32() * 2.0 - 1.0) * cli.spread,
            (rng.f32() * 2.0 - 1.0) * cli.spread,
        );
        let animator = SpriteAnimator::from_config(&config)
            .with_bounds(LocalRect::new(Vec2::ZERO, Vec2::ONE));
        world.spawn((MapPosition { pos }, GlobalTransform2D::at(pos), animator));
    }
    world.flush();

    // Hand every animator the set, spread its clips around and jitter speeds.
    let mut animators = world.query::<(&mut SpriteAnimator, &mut Sprite)>();
    for (i, (mut animator, mut sprite)) in animators.iter_mut(&mut world).enumerate() {
        animator.set_controller(Some(set.clone()), &mut *sprite);
        let speed = animator.speed() * (0.75 + rng.f32() * 0.5);
        animator.set_speed(speed);
        if let Err(e) = animator.play_by_index(i % set.count(), &mut *sprite) {
            error!("{e}");
        }
    }

    let mut update = Schedule::default();
    update.add_systems(sprite_animator_update);

    // --------------- Main loop ---------------
    let start = Instant::now();
    for _ in 0..cli.ticks {
        on_tick(&mut world, &mut update, cli.dt);
    }
    let elapsed = start.elapsed();

    let culled = world
        .query::<&SpriteAnimator>()
        .iter(&world)
        .filter(|a| a.is_culled())
        .count();
    let active = active_animator_count(&world);
    info!(
        "{} ticks in {:.2?} ({:.1} us/tick): {} active, {} culled, {} animation ends",
        cli.ticks,
        elapsed,
        elapsed.as_secs_f64() * 1e6 / cli.ticks.max(1) as f64,
        active,
        culled,
        finished.load(Ordering::Relaxed)
    );
}
