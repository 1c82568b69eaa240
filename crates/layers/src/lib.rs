pub mod grid;
pub mod hover;
pub mod layer;
pub mod outline;
pub mod pixels;
pub mod raster;
pub mod symbology;

pub use layer::*;
pub use symbology::*;
