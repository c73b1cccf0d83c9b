//! Controller circuits

use crate::circuit::{Circuit, Ports};

/// PI controller: 2→1
///
/// # Control Law
///
/// ```text
/// e        = in[1] - in[0]          (set point minus signal)
/// integral = integral + 0.5·(ki·e_prev + ki·e)·dt
/// out      = kp·e + integral
/// ```
///
/// The integral uses the trapezoidal rule on the weighted error.
///
/// # Ports
/// - Input 0: measured signal
/// - Input 1: set point
/// - Output 0: control signal
#[derive(Debug, Clone)]
pub struct Pi {
    kp: f64,
    ki: f64,
    integral: f64,
    prev_weighted: f64,
    error: f64,
}

impl Pi {
    pub fn new(kp: f64, ki: f64) -> Self {
        Self {
            kp,
            ki,
            integral: 0.0,
            prev_weighted: 0.0,
            error: 0.0,
        }
    }

    /// Accumulated integral term
    pub fn integral(&self) -> f64 {
        self.integral
    }

    fn advance(&mut self, error: f64, dt: f64) {
        self.integral += 0.5 * (self.prev_weighted + self.ki * error) * dt;
        self.prev_weighted = self.ki * error;
        self.error = error;
    }
}

impl Circuit for Pi {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let error = ports.input(1) - ports.input(0);
        self.advance(error, ports.dt());
        ports.set_output(0, error * self.kp + self.integral);
    }

    fn params(&self) -> Vec<f64> {
        vec![
            self.kp,
            self.ki,
            0.0,
            self.integral,
            self.prev_weighted,
            self.error,
        ]
    }
}

/// PID controller: 2→1
///
/// The PI law above plus a backward-difference derivative term
/// `kd·(e - e_prev)/dt`.
///
/// The first update only primes the integral and the previous error; the
/// output is left at its initial value until a second sample exists.
#[derive(Debug, Clone)]
pub struct Pid {
    pi: Pi,
    kd: f64,
    primed: bool,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            pi: Pi::new(kp, ki),
            kd,
            primed: false,
        }
    }

    pub fn integral(&self) -> f64 {
        self.pi.integral
    }
}

impl Circuit for Pid {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let error = ports.input(1) - ports.input(0);
        let prev_error = self.pi.error;
        let dt = ports.dt();
        self.pi.advance(error, dt);

        if !self.primed {
            self.primed = true;
            return;
        }
        let derivative = self.kd * (error - prev_error) / dt;
        ports.set_output(0, error * self.pi.kp + self.pi.integral + derivative);
    }

    fn params(&self) -> Vec<f64> {
        let mut params = self.pi.params();
        params.push(self.kd);
        params
    }
}

/// Limiter: 3→1, out = max(min(signal, upper), lower)
///
/// # Ports
/// - Input 0: signal
/// - Input 1: lower bound
/// - Input 2: upper bound
#[derive(Debug, Clone, Copy, Default)]
pub struct Limiter;

impl Circuit for Limiter {
    #[inline]
    fn update(&mut self, ports: &mut Ports<'_>) {
        let signal = ports.input(0);
        let lower = ports.input(1);
        let upper = ports.input(2);
        ports.set_output(0, signal.min(upper).max(lower));
    }
}
