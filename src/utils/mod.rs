//! Utility functions and constants

pub mod constants;

pub use constants::*;
