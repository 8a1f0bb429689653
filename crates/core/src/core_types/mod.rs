//! Core types and utilities

pub mod units;
pub mod wind;

pub use units::*;
pub use wind::*;
