pub mod config;
pub mod controller;
pub mod engine;
pub mod input;

pub use config::*;
pub use controller::*;
pub use engine::*;
pub use input::*;
