//! Engine systems.
//!
//! Submodules overview
//! - [`spriteanimator`] – advance registered animators, cull, and keep the scheduler in sync
//! - [`time`] – update simulation time and delta; per-frame entry point

pub mod spriteanimator;
pub mod time;
