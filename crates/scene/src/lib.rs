pub mod picking;
pub mod regions;
pub mod selection;

pub use picking::*;
pub use regions::*;
pub use selection::*;
