//! Sprite animator library.
//!
//! Sprite-sheet animation playback for large numbers of entities, with
//! viewport culling. This module exposes the ECS components, resources,
//! systems, and events for use in host applications and integration tests.

pub mod components;
pub mod error;
pub mod events;
pub mod resources;
pub mod systems;
