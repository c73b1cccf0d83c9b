//! Simulation constants and defaults

/// Default simulation timestep
pub const SIM_TIMESTEP: f64 = 0.01;

/// Width of one sink field, sign and padding included
pub const SINK_FIELD_WIDTH: usize = 15;

/// Digits after the decimal point in a sink field
pub const SINK_FIELD_PRECISION: usize = 8;

/// Threshold above which a logic level reads as true
pub const LOGIC_THRESHOLD: f64 = 0.0;
