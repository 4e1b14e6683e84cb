pub mod arena;
pub mod bounds;
pub mod ids;
pub mod math;
pub mod viewport;

// Dependency-free geometry primitives shared by the map crates.
pub use arena::*;
pub use bounds::*;
pub use ids::*;
pub use viewport::*;
