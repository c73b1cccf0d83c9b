//! Signal generators

use std::f64::consts::PI;

use crate::circuit::{Circuit, Ports};

/// Phase-accumulator oscillator: 4→2
///
/// The phase accumulator advances by `freq·dt` each step and keeps only its
/// fractional part.
///
/// # Ports
/// - Input 0: frequency
/// - Input 1: amplitude
/// - Input 2: phase offset (radians)
/// - Input 3: DC offset
/// - Output 0: amp·sin(2π·phase + phi) + offset
/// - Output 1: amp·cos(2π·phase + phi) + offset
#[derive(Debug, Clone, Copy, Default)]
pub struct Oscillator {
    phase: f64,
}

impl Oscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Fractional phase accumulator, in cycles
    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Circuit for Oscillator {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let freq = ports.input(0);
        let amp = ports.input(1);
        let phi = ports.input(2);
        let offset = ports.input(3);

        self.phase += ports.dt() * freq;
        self.phase -= self.phase.trunc();

        let angle = 2.0 * PI * self.phase + phi;
        ports.set_output(0, amp * angle.sin() + offset);
        ports.set_output(1, amp * angle.cos() + offset);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.phase]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::testing::Harness;
    use approx::assert_relative_eq;

    #[test]
    fn test_phase_wraps_after_one_period() {
        let (freq, dt) = (2.0, 0.01);
        let mut osc = Oscillator::new();
        let mut h = Harness::new(4, 2, dt);
        h.set_input(0, freq);
        h.set_input(1, 1.0);

        let steps = (1.0 / freq / dt).round() as usize;
        for _ in 0..steps {
            h.step(&mut osc);
            assert!(osc.phase() >= 0.0 && osc.phase() < 1.0);
        }

        let p = osc.phase();
        assert!(p.min(1.0 - p) <= freq * dt);
    }

    #[test]
    fn test_quadrature_outputs() {
        let mut osc = Oscillator::new();
        let mut h = Harness::new(4, 2, 0.125);
        h.set_input(0, 1.0);
        h.set_input(1, 2.0);
        h.set_input(3, 0.5);

        h.step(&mut osc);
        // one step of 0.125 s at 1 Hz is an eighth of a cycle
        let angle = 2.0 * PI * 0.125;
        assert_relative_eq!(h.output(0), 2.0 * angle.sin() + 0.5, epsilon = 1e-12);
        assert_relative_eq!(h.output(1), 2.0 * angle.cos() + 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_offset() {
        let mut osc = Oscillator::new();
        let mut h = Harness::new(4, 2, 0.01);
        h.set_input(1, 1.0);
        h.set_input(2, PI / 2.0);
        h.step(&mut osc);
        assert_relative_eq!(h.output(0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(h.output(1), 0.0, epsilon = 1e-12);
    }
}
