pub mod config;
pub mod geometry;
pub mod note;

pub use config::*;
pub use geometry::*;
pub use note::*;
