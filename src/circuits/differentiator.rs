//! Derivative and integral of a sampled signal

use crate::circuit::{Circuit, Ports};

/// Central-difference derivative: 1→1
///
/// `y[n] = (u[n] - u[n-2]) / (2·dt)`, the slope at the middle of the last
/// three samples. Sample history starts at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct Derivative {
    prev: f64,
    prev2: f64,
}

impl Derivative {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Circuit for Derivative {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let u = ports.input(0);
        let slope = (u - self.prev2) / (2.0 * ports.dt());
        self.prev2 = self.prev;
        self.prev = u;
        ports.set_output(0, slope);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.prev, self.prev2]
    }
}

/// Running trapezoidal integral: 1→1
///
/// `y[n] = y[n-1] + 0.5·(u[n-1] + u[n])·dt`, with `u[-1] = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integral {
    prev: f64,
    total: f64,
}

impl Integral {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

impl Circuit for Integral {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let u = ports.input(0);
        self.total += (self.prev + u) * ports.dt() * 0.5;
        self.prev = u;
        ports.set_output(0, self.total);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.prev, self.total]
    }
}
