//! Camera module.
//!
//! The renderer only reads the view and projection matrices through the
//! `Camera` trait. Cameras are owned and driven by the caller.

mod camera;

pub use camera::{Camera, FirstPersonCamera};
