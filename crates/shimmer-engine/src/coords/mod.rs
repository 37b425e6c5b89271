//! Coordinate types shared by hosts and the surface.
//!
//! Conventions:
//! - layout sizes are logical (CSS) pixels
//! - the backing canvas is sized in physical pixels (`logical * device_pixel_ratio`)

mod viewport;

pub use viewport::Viewport;
