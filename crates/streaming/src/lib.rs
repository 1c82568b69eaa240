pub mod cache;
pub mod fetcher;
pub mod io;
pub mod key;
pub mod pipeline;
pub mod pixels;
pub mod protocol;
pub mod queue;
pub mod residency;
pub mod tileset;

pub use cache::*;
pub use fetcher::*;
pub use io::*;
pub use key::*;
pub use pipeline::*;
pub use pixels::*;
pub use protocol::*;
pub use queue::*;
pub use residency::*;
pub use tileset::*;
