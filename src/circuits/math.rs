//! Arithmetic circuits
//!
//! `opADD` and `opMUL` reduce any number of inputs; `opSUB`, `opDIV` and
//! `opPOW` are binary; `opABS` is unary. `gain` scales a single input.

use crate::circuit::{Circuit, Ports};

/// Arithmetic operation selected at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Abs,
    Pow,
}

impl MathOp {
    /// Fixed input count, `None` for reducers
    pub fn fixed_arity(self) -> Option<usize> {
        match self {
            MathOp::Add | MathOp::Mul => None,
            MathOp::Sub | MathOp::Div | MathOp::Pow => Some(2),
            MathOp::Abs => Some(1),
        }
    }
}

/// Arithmetic circuit: N→1
#[derive(Debug, Clone, Copy)]
pub struct Math {
    op: MathOp,
}

impl Math {
    pub fn new(op: MathOp) -> Self {
        Self { op }
    }

    pub fn op(&self) -> MathOp {
        self.op
    }
}

impl Circuit for Math {
    #[inline]
    fn update(&mut self, ports: &mut Ports<'_>) {
        let result = match self.op {
            MathOp::Add => ports.inputs().sum(),
            MathOp::Mul => ports.inputs().product(),
            MathOp::Sub => ports.input(0) - ports.input(1),
            MathOp::Div => ports.input(0) / ports.input(1),
            MathOp::Abs => ports.input(0).abs(),
            MathOp::Pow => ports.input(0).powf(ports.input(1)),
        };
        ports.set_output(0, result);
    }
}

/// Gain: y = g·u
#[derive(Debug, Clone, Copy)]
pub struct Gain {
    gain: f64,
}

impl Gain {
    pub fn new(gain: f64) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Circuit for Gain {
    #[inline]
    fn update(&mut self, ports: &mut Ports<'_>) {
        let u = ports.input(0);
        ports.set_output(0, u * self.gain);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.gain]
    }
}
