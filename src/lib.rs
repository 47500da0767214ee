//! Renders the public surface of a compiled .NET module as deterministic
//! C# declaration text, suitable for diffing between builds.

pub mod model;
pub mod renderer;

#[cfg(test)]
mod tests;

pub use model::*;
pub use renderer::*;
