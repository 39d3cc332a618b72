pub mod spawning;
pub mod types;

pub use spawning::*;
pub use types::*;
