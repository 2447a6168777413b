//! Random picture slideshow: catalog, rotation engine, image transform and
//! the timer loop that drives a display surface.

pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod rotation;
pub mod surface;
pub mod transform;

pub use error::Error;
