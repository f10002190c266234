//! Command implementations.

pub mod cache;
pub mod extract;
pub mod predict;
pub mod train;
