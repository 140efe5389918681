//! Scene module
//!
//! The renderer does not load or own scene data. A `SceneLoader` turns a
//! file into a `Drawable`, which the geometry pass binds and draws.

mod drawable;

pub use drawable::{Drawable, SceneLoader, SceneVertex, MATERIAL_SET_INDEX};
