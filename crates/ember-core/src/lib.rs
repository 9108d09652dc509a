//! Ember Core - Core types for the Ember editor
//!
//! This crate provides the foundational types shared by the asset and import
//! crates:
//! - Mathematical primitives (re-exported from glam)
//! - Transform with matrix decomposition
//! - Color

pub mod types;

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
pub use types::{Color, Transform};
