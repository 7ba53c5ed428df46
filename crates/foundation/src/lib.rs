pub mod bounds;
pub mod coord;
pub mod math;
pub mod time;

// Foundation crate: small, well-tested geographic primitives only.
pub use bounds::*;
pub use coord::*;
pub use time::*;
