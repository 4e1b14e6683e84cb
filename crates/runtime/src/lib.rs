pub mod gate;
pub mod surface;

pub use gate::*;
pub use surface::*;
