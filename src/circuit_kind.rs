//! CircuitKind enum for efficient dispatch of heterogeneous circuit types
//!
//! This module provides a closed enum over every concrete circuit type, so
//! the graph can store different kinds in one collection and dispatch with
//! a match instead of a trait object.

use crate::circuit::{Circuit, Ports};
use crate::circuits::*;
use crate::container::Container;

/// Delegate a `Circuit` method to the wrapped circuit
macro_rules! dispatch_method {
    ($self:ident, $method:ident, $($args:expr),*) => {
        match $self {
            CircuitKind::Math(c) => c.$method($($args),*),
            CircuitKind::Gain(c) => c.$method($($args),*),
            CircuitKind::Logic(c) => c.$method($($args),*),
            CircuitKind::Compare(c) => c.$method($($args),*),
            CircuitKind::FlipFlop(c) => c.$method($($args),*),
            CircuitKind::Pi(c) => c.$method($($args),*),
            CircuitKind::Pid(c) => c.$method($($args),*),
            CircuitKind::Limiter(c) => c.$method($($args),*),
            CircuitKind::Lowpass(c) => c.$method($($args),*),
            CircuitKind::Highpass(c) => c.$method($($args),*),
            CircuitKind::Bandpass(c) => c.$method($($args),*),
            CircuitKind::RcLowpass(c) => c.$method($($args),*),
            CircuitKind::RcHighpass(c) => c.$method($($args),*),
            CircuitKind::Trilinear(c) => c.$method($($args),*),
            CircuitKind::MinMax(c) => c.$method($($args),*),
            CircuitKind::Derivative(c) => c.$method($($args),*),
            CircuitKind::Integral(c) => c.$method($($args),*),
            CircuitKind::Delay(c) => c.$method($($args),*),
            CircuitKind::PeakDetector(c) => c.$method($($args),*),
            CircuitKind::Average(c) => c.$method($($args),*),
            CircuitKind::WindowAverage(c) => c.$method($($args),*),
            CircuitKind::Phasor(c) => c.$method($($args),*),
            CircuitKind::Flip(c) => c.$method($($args),*),
            CircuitKind::Sink(c) => c.$method($($args),*),
            CircuitKind::Oscillator(c) => c.$method($($args),*),
            CircuitKind::Relay(c) => c.$method($($args),*),
            CircuitKind::Container(c) => c.$method($($args),*),
        }
    };
}

/// Type-erased enum wrapping all circuit types
///
/// The variant is fixed when a factory builds the instance; nothing is
/// looked up by name at step time.
#[derive(Debug)]
pub enum CircuitKind {
    // Arithmetic
    Math(Math),
    Gain(Gain),

    // Logic
    Logic(Logic),
    Compare(Compare),
    FlipFlop(FlipFlop),

    // Control
    Pi(Pi),
    Pid(Pid),
    Limiter(Limiter),

    // Filters
    Lowpass(Lowpass),
    Highpass(Highpass),
    Bandpass(Bandpass),
    RcLowpass(RcLowpass),
    RcHighpass(RcHighpass),

    // Lookup tables
    Trilinear(Trilinear),

    // Signal processing
    MinMax(MinMax),
    Derivative(Derivative),
    Integral(Integral),
    Delay(Delay),
    PeakDetector(PeakDetector),
    Average(Average),
    WindowAverage(WindowAverage),
    Phasor(Phasor),
    Flip(Flip),

    // Output
    Sink(Sink),

    // Sources
    Oscillator(Oscillator),

    // Composition
    Relay(Relay),
    Container(Container),
}

impl Circuit for CircuitKind {
    fn update(&mut self, ports: &mut Ports<'_>) {
        dispatch_method!(self, update, ports)
    }

    fn params(&self) -> Vec<f64> {
        dispatch_method!(self, params,)
    }

    fn int_params(&self) -> Vec<i64> {
        dispatch_method!(self, int_params,)
    }

    fn release(&mut self) {
        dispatch_method!(self, release,)
    }
}

impl CircuitKind {
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            CircuitKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            CircuitKind::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_sink(&self) -> Option<&Sink> {
        match self {
            CircuitKind::Sink(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sink_mut(&mut self) -> Option<&mut Sink> {
        match self {
            CircuitKind::Sink(s) => Some(s),
            _ => None,
        }
    }
}

/// Implement From trait for all circuit types
macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for CircuitKind {
                fn from(circuit: $ty) -> Self {
                    CircuitKind::$variant(circuit)
                }
            }
        )*
    };
}

impl_from! {
    Math(Math),
    Gain(Gain),
    Logic(Logic),
    Compare(Compare),
    FlipFlop(FlipFlop),
    Pi(Pi),
    Pid(Pid),
    Limiter(Limiter),
    Lowpass(Lowpass),
    Highpass(Highpass),
    Bandpass(Bandpass),
    RcLowpass(RcLowpass),
    RcHighpass(RcHighpass),
    Trilinear(Trilinear),
    MinMax(MinMax),
    Derivative(Derivative),
    Integral(Integral),
    Delay(Delay),
    PeakDetector(PeakDetector),
    Average(Average),
    WindowAverage(WindowAverage),
    Phasor(Phasor),
    Flip(Flip),
    Sink(Sink),
    Oscillator(Oscillator),
    Relay(Relay),
    Container(Container),
}
