//! ECS components for animated entities.
//!
//! Submodules overview:
//! - [`globaltransform2d`] – world-space transform written by the host
//! - [`mapposition`] – local position (pivot) for an entity
//! - [`sprite`] – 2D sprite that receives frame images ([`sprite::FrameSink`])
//! - [`spriteanimator`] – per-entity playback state machine and culling state

pub mod globaltransform2d;
pub mod mapposition;
pub mod sprite;
pub mod spriteanimator;
