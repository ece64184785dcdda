// field/mod.rs
// Read-only field sampling for visualization

pub mod cache;
pub mod sampler;
pub use cache::{SamplerCache, SamplerKey};
pub use sampler::{FieldPoint, FieldSampler};
