//! Choropleth map core: configuration, viewport fitting, selection effects and
//! event routing on top of a host-supplied render surface.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod fit;
pub mod map;
pub mod markers;
pub mod styles;

pub use config::*;
pub use controller::*;
pub use error::*;
pub use events::*;
pub use fit::*;
pub use map::*;
pub use markers::*;
pub use styles::*;
