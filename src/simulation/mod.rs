// simulation/mod.rs
// Re-exports and module declarations for simulation submodules

pub mod collision;
pub mod forces;
pub mod integrator;
pub mod simulation;
pub mod validation;
pub mod world;
pub use simulation::*;
pub use world::World;

#[cfg(test)]
mod tests;
