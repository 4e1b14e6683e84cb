pub mod feature_collection;
pub mod ingest;
pub mod normalize;
pub mod source;

pub use feature_collection::*;
pub use ingest::*;
pub use normalize::*;
pub use source::*;
