//! Registry of animators driven by the per-tick update.
//!
//! [`SpriteAnimatorScheduler`] is a world resource that exists at most once.
//! It is created lazily on the first registration and torn down by removing
//! the resource; after teardown [`has_scheduler`] reports `false` and the next
//! registration creates a fresh one.
//!
//! Removal comes in two flavours:
//! - [`deactivate`](SpriteAnimatorScheduler::deactivate) only records the
//!   intent. The entity keeps its slot until [`compact`](SpriteAnimatorScheduler::compact)
//!   runs at the start of the next update pass, so deactivating from inside
//!   the pass never disturbs the iteration.
//! - [`destroy`](SpriteAnimatorScheduler::destroy) removes the entity at once
//!   and cancels any pending deactivation. Used when the animator component
//!   goes away.

use bevy_ecs::prelude::*;
use log::{debug, info};
use rustc_hash::FxHashSet;

use crate::resources::animatorconfig::AnimatorConfig;

const DEFAULT_ACTIVE_CAPACITY: usize = 2048;
const DEFAULT_PENDING_CAPACITY: usize = 128;

#[derive(Resource, Debug)]
pub struct SpriteAnimatorScheduler {
    active: Vec<Entity>,
    pending_removal: FxHashSet<Entity>,
}

impl FromWorld for SpriteAnimatorScheduler {
    fn from_world(world: &mut World) -> Self {
        let scheduler = match world.get_resource::<AnimatorConfig>() {
            Some(config) => Self::with_config(config),
            None => Self::new(),
        };
        info!(
            "Sprite animator scheduler created (capacity {})",
            scheduler.active.capacity()
        );
        scheduler
    }
}

impl SpriteAnimatorScheduler {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ACTIVE_CAPACITY, DEFAULT_PENDING_CAPACITY)
    }

    pub fn with_capacity(active: usize, pending: usize) -> Self {
        Self {
            active: Vec::with_capacity(active),
            pending_removal: FxHashSet::with_capacity_and_hasher(pending, Default::default()),
        }
    }

    pub fn with_config(config: &AnimatorConfig) -> Self {
        Self::with_capacity(config.active_capacity, config.pending_capacity)
    }

    /// Append `entity` to the active list. No duplicate check: register
    /// exactly once per activation.
    pub fn register(&mut self, entity: Entity) {
        self.active.push(entity);
    }

    /// Request removal at the next [`compact`](Self::compact).
    pub fn deactivate(&mut self, entity: Entity) {
        self.pending_removal.insert(entity);
    }

    /// Remove `entity` now and cancel its pending deactivation, if any.
    pub fn destroy(&mut self, entity: Entity) {
        self.active.retain(|e| *e != entity);
        self.pending_removal.remove(&entity);
    }

    /// Apply pending deactivations. Each pending entry removes one
    /// registration of its entity.
    pub fn compact(&mut self) {
        if self.pending_removal.is_empty() {
            return;
        }
        let pending = &mut self.pending_removal;
        self.active.retain(|e| !pending.remove(e));
        let stale = self.pending_removal.len();
        if stale > 0 {
            debug!("Dropped {stale} deactivation(s) for unregistered animators");
        }
        self.pending_removal.clear();
    }

    pub fn active(&self) -> &[Entity] {
        &self.active
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.active.contains(&entity)
    }

    pub fn is_pending_removal(&self, entity: Entity) -> bool {
        self.pending_removal.contains(&entity)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_removal.len()
    }
}

/// Whether the scheduler currently exists.
pub fn has_scheduler(world: &World) -> bool {
    world.contains_resource::<SpriteAnimatorScheduler>()
}

/// Create the scheduler if it does not exist yet.
pub fn ensure_scheduler(world: &mut World) -> Mut<'_, SpriteAnimatorScheduler> {
    world.get_resource_or_init::<SpriteAnimatorScheduler>()
}

/// Tear the scheduler down. Returns whether one existed.
pub fn teardown_scheduler(world: &mut World) -> bool {
    let existed = world.remove_resource::<SpriteAnimatorScheduler>().is_some();
    if existed {
        info!("Sprite animator scheduler torn down");
    }
    existed
}

/// Register `entity`, creating the scheduler on demand.
pub fn register_animator(world: &mut World, entity: Entity) {
    ensure_scheduler(world).register(entity);
}

/// Deactivate `entity` if a scheduler exists.
pub fn deactivate_animator(world: &mut World, entity: Entity) {
    if let Some(mut scheduler) = world.get_resource_mut::<SpriteAnimatorScheduler>() {
        scheduler.deactivate(entity);
    }
}

/// Registered animator count, 0 when no scheduler exists yet.
pub fn active_animator_count(world: &World) -> usize {
    world
        .get_resource::<SpriteAnimatorScheduler>()
        .map_or(0, |s| s.active_count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(world: &mut World, n: usize) -> Vec<Entity> {
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn test_register_and_compact() {
        let mut world = World::new();
        let e = entities(&mut world, 3);
        let mut s = SpriteAnimatorScheduler::new();
        for &entity in &e {
            s.register(entity);
        }
        s.deactivate(e[1]);
        assert!(s.is_active(e[1]));
        assert!(s.is_pending_removal(e[1]));

        s.compact();
        assert_eq!(s.active(), &[e[0], e[2]]);
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn test_destroy_cancels_pending() {
        let mut world = World::new();
        let e = entities(&mut world, 2);
        let mut s = SpriteAnimatorScheduler::new();
        s.register(e[0]);
        s.register(e[1]);
        s.deactivate(e[0]);
        s.destroy(e[0]);
        assert!(!s.is_active(e[0]));
        assert!(!s.is_pending_removal(e[0]));
        s.compact();
        assert_eq!(s.active(), &[e[1]]);
        // destroying twice is harmless
        s.destroy(e[0]);
        assert_eq!(s.active_count(), 1);
    }

    #[test]
    fn test_deactivate_then_reregister_keeps_one_slot() {
        let mut world = World::new();
        let e = entities(&mut world, 1)[0];
        let mut s = SpriteAnimatorScheduler::new();
        s.register(e);
        s.deactivate(e);
        s.register(e);
        s.compact();
        assert_eq!(s.active(), &[e]);
    }

    #[test]
    fn test_deactivate_unregistered_is_dropped() {
        let mut world = World::new();
        let e = entities(&mut world, 2);
        let mut s = SpriteAnimatorScheduler::new();
        s.register(e[0]);
        s.deactivate(e[1]);
        s.compact();
        assert_eq!(s.active(), &[e[0]]);
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn test_active_count_without_scheduler() {
        let mut world = World::new();
        assert_eq!(active_animator_count(&world), 0);
        let e = world.spawn_empty().id();
        register_animator(&mut world, e);
        assert_eq!(active_animator_count(&world), 1);
        teardown_scheduler(&mut world);
        assert_eq!(active_animator_count(&world), 0);
    }

    #[test]
    fn test_lazy_lifecycle() {
        let mut world = World::new();
        let e = world.spawn_empty().id();
        assert!(!has_scheduler(&world));
        deactivate_animator(&mut world, e);
        assert!(!has_scheduler(&world));

        register_animator(&mut world, e);
        assert!(has_scheduler(&world));
        assert!(world.resource::<SpriteAnimatorScheduler>().is_active(e));

        assert!(teardown_scheduler(&mut world));
        assert!(!has_scheduler(&world));
        assert!(!teardown_scheduler(&mut world));

        register_animator(&mut world, e);
        assert!(has_scheduler(&world));
        assert_eq!(world.resource::<SpriteAnimatorScheduler>().active_count(), 1);
    }

    #[test]
    fn test_capacity_from_config() {
        let mut world = World::new();
        let mut config = AnimatorConfig::new();
        config.active_capacity = 4096;
        world.insert_resource(config);
        let e = world.spawn_empty().id();
        register_animator(&mut world, e);
        assert!(world.resource::<SpriteAnimatorScheduler>().active.capacity() >= 4096);
    }
}
