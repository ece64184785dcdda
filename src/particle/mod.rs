// particle/mod.rs
// Re-exports for the particle module

mod trajectory;
mod types;

pub use trajectory::*;
pub use types::*;
