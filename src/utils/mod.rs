//! Utility modules: collaborators around the bundle pipeline.

pub mod command;
pub mod date;
pub mod glob;
