//! Kind registry
//!
//! Binds circuit kind names to the behaviour a new instance runs. The
//! registry is consulted only while a circuit is being constructed; the
//! resolved behaviour is stored on the instance.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Family a behaviour belongs to; family factories accept only their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Math,
    Logic,
    Comparison,
    Control,
    Filter,
    FlipFlop,
    Interpolation,
    SignalProcessing,
    Output,
    Source,
    Relay,
    Container,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Math => "maths",
            Family::Logic => "logic",
            Family::Comparison => "comparison",
            Family::Control => "control",
            Family::Filter => "filter",
            Family::FlipFlop => "flip-flop",
            Family::Interpolation => "interpolation",
            Family::SignalProcessing => "signal processing",
            Family::Output => "output",
            Family::Source => "signal source",
            Family::Relay => "relay",
            Family::Container => "container",
        }
    }
}

/// Update behaviour a registered name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Behavior {
    Add,
    Sub,
    Mul,
    Div,
    Abs,
    Pow,
    Gain,
    And,
    Or,
    Not,
    Xor,
    Nor,
    GreaterOrEqual,
    LessOrEqual,
    Equal,
    DFlipFlop,
    DrFlipFlop,
    SrFlipFlop,
    JkFlipFlop,
    Pi,
    Pid,
    Limiter,
    Lowpass,
    Highpass,
    Bandpass,
    RcLowpass,
    RcHighpass,
    Trilinear,
    MinMax,
    Derivative,
    Integral,
    Delay,
    PeakDetector,
    Average,
    WindowAverage,
    Phasor,
    Flip,
    Sink,
    Oscillator,
    Relay,
    Container,
}

impl Behavior {
    /// Every built-in behaviour
    pub const ALL: [Behavior; 41] = [
        Behavior::Add,
        Behavior::Sub,
        Behavior::Mul,
        Behavior::Div,
        Behavior::Abs,
        Behavior::Pow,
        Behavior::Gain,
        Behavior::And,
        Behavior::Or,
        Behavior::Not,
        Behavior::Xor,
        Behavior::Nor,
        Behavior::GreaterOrEqual,
        Behavior::LessOrEqual,
        Behavior::Equal,
        Behavior::DFlipFlop,
        Behavior::DrFlipFlop,
        Behavior::SrFlipFlop,
        Behavior::JkFlipFlop,
        Behavior::Pi,
        Behavior::Pid,
        Behavior::Limiter,
        Behavior::Lowpass,
        Behavior::Highpass,
        Behavior::Bandpass,
        Behavior::RcLowpass,
        Behavior::RcHighpass,
        Behavior::Trilinear,
        Behavior::MinMax,
        Behavior::Derivative,
        Behavior::Integral,
        Behavior::Delay,
        Behavior::PeakDetector,
        Behavior::Average,
        Behavior::WindowAverage,
        Behavior::Phasor,
        Behavior::Flip,
        Behavior::Sink,
        Behavior::Oscillator,
        Behavior::Relay,
        Behavior::Container,
    ];

    /// Name the behaviour is registered under by default
    pub fn name(&self) -> &'static str {
        match self {
            Behavior::Add => "opADD",
            Behavior::Sub => "opSUB",
            Behavior::Mul => "opMUL",
            Behavior::Div => "opDIV",
            Behavior::Abs => "opABS",
            Behavior::Pow => "opPOW",
            Behavior::Gain => "gain",
            Behavior::And => "opAND",
            Behavior::Or => "opOR",
            Behavior::Not => "opNOT",
            Behavior::Xor => "opXOR",
            Behavior::Nor => "opNOR",
            Behavior::GreaterOrEqual => "GreaterOrEqual",
            Behavior::LessOrEqual => "LessOrEqual",
            Behavior::Equal => "Equal",
            Behavior::DFlipFlop => "DFlipFlop",
            Behavior::DrFlipFlop => "DRFlipFlop",
            Behavior::SrFlipFlop => "SRFlipFlop",
            Behavior::JkFlipFlop => "JKFlipFlop",
            Behavior::Pi => "PI",
            Behavior::Pid => "PID",
            Behavior::Limiter => "limiter",
            Behavior::Lowpass => "SKLP",
            Behavior::Highpass => "ActiveHighPass",
            Behavior::Bandpass => "ActiveBandPass",
            Behavior::RcLowpass => "PassiveLowPass",
            Behavior::RcHighpass => "PassiveHighPass",
            Behavior::Trilinear => "i3Dlin",
            Behavior::MinMax => "minmax",
            Behavior::Derivative => "derivative",
            Behavior::Integral => "integral",
            Behavior::Delay => "delay",
            Behavior::PeakDetector => "peaker",
            Behavior::Average => "Average",
            Behavior::WindowAverage => "avg",
            Behavior::Phasor => "Phasor",
            Behavior::Flip => "Flip",
            Behavior::Sink => "output",
            Behavior::Oscillator => "waver",
            Behavior::Relay => "relay",
            Behavior::Container => "container",
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Behavior::Add
            | Behavior::Sub
            | Behavior::Mul
            | Behavior::Div
            | Behavior::Abs
            | Behavior::Pow
            | Behavior::Gain => Family::Math,
            Behavior::And | Behavior::Or | Behavior::Not | Behavior::Xor | Behavior::Nor => {
                Family::Logic
            }
            Behavior::GreaterOrEqual | Behavior::LessOrEqual | Behavior::Equal => {
                Family::Comparison
            }
            Behavior::DFlipFlop
            | Behavior::DrFlipFlop
            | Behavior::SrFlipFlop
            | Behavior::JkFlipFlop => Family::FlipFlop,
            Behavior::Pi | Behavior::Pid | Behavior::Limiter => Family::Control,
            Behavior::Lowpass
            | Behavior::Highpass
            | Behavior::Bandpass
            | Behavior::RcLowpass
            | Behavior::RcHighpass => Family::Filter,
            Behavior::Trilinear => Family::Interpolation,
            Behavior::MinMax
            | Behavior::Derivative
            | Behavior::Integral
            | Behavior::Delay
            | Behavior::PeakDetector
            | Behavior::Average
            | Behavior::WindowAverage
            | Behavior::Phasor
            | Behavior::Flip => Family::SignalProcessing,
            Behavior::Sink => Family::Output,
            Behavior::Oscillator => Family::Source,
            Behavior::Relay => Family::Relay,
            Behavior::Container => Family::Container,
        }
    }
}

impl std::fmt::Display for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name → behaviour table
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: HashMap<String, Behavior>,
}

impl KindRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in behaviour under its default name
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for behavior in Behavior::ALL {
            registry.kinds.insert(behavior.name().to_string(), behavior);
        }
        registry
    }

    /// Bind `name` to `behavior`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, behavior: Behavior) -> Result<()> {
        let name = name.into();
        if self.kinds.contains_key(&name) {
            return Err(Error::DuplicateKind { name });
        }
        self.kinds.insert(name, behavior);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<Behavior> {
        self.kinds
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownKind {
                name: name.to_string(),
            })
    }

    /// Resolve and require a family
    pub fn resolve_in(&self, name: &str, family: Family) -> Result<Behavior> {
        let behavior = self.resolve(name)?;
        if behavior.family() != family {
            return Err(Error::KindMismatch {
                name: name.to_string(),
                expected: family.as_str(),
            });
        }
        Ok(behavior)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
