//! Logic, comparison and flip-flop circuits
//!
//! A signal is logically true when it is strictly greater than zero.
//! Outputs are always exactly 1.0 or 0.0.

use crate::circuit::{Circuit, Ports};
use crate::utils::constants::LOGIC_THRESHOLD;

#[inline]
fn is_high(value: f64) -> bool {
    value > LOGIC_THRESHOLD
}

#[inline]
fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Logic gate selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
    Not,
    /// True when some, but not all, inputs are true
    Xor,
    Nor,
}

/// Logic gate: N→1
#[derive(Debug, Clone, Copy)]
pub struct Logic {
    op: LogicOp,
}

impl Logic {
    pub fn new(op: LogicOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> LogicOp {
        self.op
    }
}

impl Circuit for Logic {
    #[inline]
    fn update(&mut self, ports: &mut Ports<'_>) {
        let result = match self.op {
            LogicOp::And => ports.inputs().all(is_high),
            LogicOp::Or => ports.inputs().any(is_high),
            LogicOp::Not => !is_high(ports.input(0)),
            LogicOp::Nor => !ports.inputs().any(is_high),
            LogicOp::Xor => {
                let high = ports.inputs().filter(|&v| is_high(v)).count();
                high > 0 && high < ports.num_inputs()
            }
        };
        ports.set_output(0, truth(result));
    }
}

/// Comparison selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    GreaterOrEqual,
    LessOrEqual,
    Equal,
}

/// Comparator: 2→1, out = in[0] <op> in[1]
#[derive(Debug, Clone, Copy)]
pub struct Compare {
    op: CompareOp,
}

impl Compare {
    pub fn new(op: CompareOp) -> Self {
        Self { op }
    }
}

impl Circuit for Compare {
    #[inline]
    fn update(&mut self, ports: &mut Ports<'_>) {
        let (a, b) = (ports.input(0), ports.input(1));
        let result = match self.op {
            CompareOp::GreaterOrEqual => a >= b,
            CompareOp::LessOrEqual => a <= b,
            CompareOp::Equal => a == b,
        };
        ports.set_output(0, truth(result));
    }
}

/// Flip-flop variant selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipFlopKind {
    /// D → Q follows D
    D,
    /// D, reset → Q follows D unless reset is true
    DReset,
    /// set, reset → reset wins; otherwise set latches Q high, else hold
    SetReset,
    /// J, K → set, reset, toggle when both are true, hold when neither
    Jk,
}

impl FlipFlopKind {
    pub fn num_inputs(&self) -> usize {
        match self {
            FlipFlopKind::D => 1,
            _ => 2,
        }
    }
}

/// Flip-flop: 1 or 2 inputs → 2
///
/// # Ports
/// - Inputs: see [`FlipFlopKind`]
/// - Output 0: Q
/// - Output 1: not Q
///
/// Q starts low. Both outputs are written every step from the stored Q.
#[derive(Debug, Clone, Copy)]
pub struct FlipFlop {
    kind: FlipFlopKind,
    q: bool,
}

impl FlipFlop {
    pub fn new(kind: FlipFlopKind) -> Self {
        Self { kind, q: false }
    }

    pub fn kind(&self) -> FlipFlopKind {
        self.kind
    }

    /// Stored Q
    pub fn q(&self) -> f64 {
        truth(self.q)
    }
}

impl Circuit for FlipFlop {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let a = is_high(ports.input(0));
        self.q = match self.kind {
            FlipFlopKind::D => a,
            FlipFlopKind::DReset => a && !is_high(ports.input(1)),
            FlipFlopKind::SetReset => {
                let reset = is_high(ports.input(1));
                !reset && (a || self.q)
            }
            FlipFlopKind::Jk => match (a, is_high(ports.input(1))) {
                (true, false) => true,
                (false, true) => false,
                (true, true) => !self.q,
                (false, false) => self.q,
            },
        };
        ports.set_output(0, truth(self.q));
        ports.set_output(1, truth(!self.q));
    }

    fn params(&self) -> Vec<f64> {
        vec![truth(self.q), 0.0]
    }
}
