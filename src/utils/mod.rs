//! Utility modules.
pub mod wire;
