pub mod bounds;
pub mod coord;
pub mod math;
pub mod time;

// Foundation crate: torus primitives only, no I/O and no dependencies.
pub use bounds::*;
pub use coord::*;
pub use time::*;
