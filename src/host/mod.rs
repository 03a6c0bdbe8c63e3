//! The parts of the surrounding build engine the generator plugs into: the per-unit component
//! container with its binary lifecycle, and the task graph.

pub mod events;
pub mod tasks;
