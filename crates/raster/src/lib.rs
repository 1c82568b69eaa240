pub mod bitmap;
pub mod color;
pub mod framebuffer;
pub mod surface;

pub use bitmap::*;
pub use color::*;
pub use framebuffer::*;
pub use surface::*;
