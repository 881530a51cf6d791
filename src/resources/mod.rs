//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution.
//!
//! Overview
//! - `animationstore` – clips, animation sets and the store that shares them
//! - `animatorconfig` – INI-backed playback defaults
//! - `animatorscheduler` – the registry of animators driven each tick
//! - `camera2d` – shared 2D camera used for culling
//! - `framecurve` – normalized curves for variable frame durations
//! - `screensize` – current render dimensions in pixels
//! - `visibility` – viewport bounds and visibility queries
//! - `worldtime` – simulation time and delta
pub mod animationstore;
pub mod animatorconfig;
pub mod animatorscheduler;
pub mod camera2d;
pub mod framecurve;
pub mod screensize;
pub mod visibility;
pub mod worldtime;
