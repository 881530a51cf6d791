//! Event types emitted by the animation systems.
//!
//! Submodules:
//! - [`animationend`] – a clip played through its last frame
pub mod animationend;
