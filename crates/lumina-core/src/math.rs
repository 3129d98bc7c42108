//! Math types backed by [`glam`].
//!
//! Distance-field generation works in `f32` pixel space, so only the 2D types
//! are re-exported here.
//!
//! ```
//! use lumina_core::math::Vec2;
//!
//! let a = Vec2::new(1.0, 0.0);
//! let b = Vec2::new(0.0, 1.0);
//! assert_eq!(a.perp_dot(b), 1.0);
//! ```
//!
//! [`glam`]: https://docs.rs/glam

pub use glam::{Vec2, vec2};
