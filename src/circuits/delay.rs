//! Fixed-length delay line with circular buffer

use crate::circuit::{Circuit, Ports};

/// Delay line: y[n] = u[n - N]
///
/// Holds the last `N` inputs in a circular buffer that starts zeroed, so the
/// output is 0 for the first `N` steps and then replays the input sequence.
/// A zero-length delay passes the input straight through.
///
/// # Example
///
/// ```ignore
/// // three-step delay
/// let delay = Delay::new(3);
/// // inputs 1, 2, 3, 4, 5 → outputs 0, 0, 0, 1, 2
/// ```
#[derive(Debug, Clone)]
pub struct Delay {
    buffer: Vec<f64>,
    /// Slot holding the oldest sample, overwritten next
    write_index: usize,
}

impl Delay {
    pub fn new(steps: usize) -> Self {
        Self {
            buffer: vec![0.0; steps],
            write_index: 0,
        }
    }

    /// Delay length in steps
    pub fn steps(&self) -> usize {
        self.buffer.len()
    }
}

impl Circuit for Delay {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let u = ports.input(0);
        if self.buffer.is_empty() {
            ports.set_output(0, u);
            return;
        }

        let oldest = std::mem::replace(&mut self.buffer[self.write_index], u);
        self.write_index = (self.write_index + 1) % self.buffer.len();
        ports.set_output(0, oldest);
    }

    fn params(&self) -> Vec<f64> {
        self.buffer.clone()
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.buffer.len() as i64, self.write_index as i64]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::testing::Harness;

    fn drive(delay: &mut Delay, inputs: &[f64]) -> Vec<f64> {
        let mut h = Harness::new(1, 1, 0.01);
        inputs
            .iter()
            .map(|&x| {
                h.set_input(0, x);
                h.step(delay);
                h.output(0)
            })
            .collect()
    }

    #[test]
    fn test_delay_replays_after_n_steps() {
        let mut delay = Delay::new(3);
        let out = drive(&mut delay, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_zero_length_passes_through() {
        let mut delay = Delay::new(0);
        let out = drive(&mut delay, &[1.5, -2.0]);
        assert_eq!(out, vec![1.5, -2.0]);
    }

    #[test]
    fn test_single_step_delay() {
        let mut delay = Delay::new(1);
        let out = drive(&mut delay, &[9.0, 8.0, 7.0]);
        assert_eq!(out, vec![0.0, 9.0, 8.0]);
        assert_eq!(delay.int_params(), vec![1, 0]);
    }
}
