pub mod modular;

pub use modular::*;
