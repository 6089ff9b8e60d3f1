//! Procedural spiral galaxy point clouds for Bevy scenes.
//!
//! [`galaxy::generate`] turns a [`galaxy::GalaxyConfig`] into flat position and color
//! buffers. [`galaxy::GalaxyState`] keeps exactly one generated galaxy installed in a
//! renderer, freeing the previous one before the next is created.

pub mod galaxy;
pub mod prelude;
