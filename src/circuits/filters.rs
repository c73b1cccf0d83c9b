//! Filter circuits

use std::f64::consts::PI;

use crate::circuit::{Circuit, Ports};

/// Discretised two-pole (Sallen-Key style) lowpass: 1→1
///
/// Coefficients are fixed at construction from the cutoff, quality factor,
/// gain and timestep:
///
/// ```text
/// w     = 2π·fcut·dt
/// gamma = w / (2Q)
/// wc    = w²
/// alpha = 1 / (1 + gamma + wc)
/// y[n]  = alpha·(gain·wc·x[n] + 2·y[n-1] - y[n-2] + gamma·y[n-2])
/// ```
///
/// The DC gain is `gain`.
#[derive(Debug, Clone)]
pub struct Lowpass {
    fcut: f64,
    q: f64,
    gain: f64,
    wc: f64,
    gamma: f64,
    alpha: f64,
    y1: f64,
    y2: f64,
}

impl Lowpass {
    pub fn new(fcut: f64, q: f64, gain: f64, dt: f64) -> Self {
        let w = fcut * 2.0 * PI * dt;
        let gamma = w / (2.0 * q);
        let wc = w * w;
        let alpha = 1.0 / (1.0 + gamma + wc);

        Self {
            fcut,
            q,
            gain,
            wc,
            gamma,
            alpha,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.fcut
    }
}

impl Circuit for Lowpass {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let x = ports.input(0);
        let v = self.gain * self.wc * x + (2.0 * self.y1 - self.y2) + self.gamma * self.y2;
        let v = v * self.alpha;
        ports.set_output(0, v);

        self.y2 = self.y1;
        self.y1 = v;
    }

    fn params(&self) -> Vec<f64> {
        vec![
            self.fcut, self.q, self.gain, self.wc, self.gamma, self.alpha, self.y1, self.y2,
        ]
    }
}

/// Coefficients shared by the two-pole active filters
#[derive(Debug, Clone, Copy)]
struct TwoPole {
    wc: f64,
    gamma: f64,
    alpha: f64,
}

impl TwoPole {
    fn new(fcut: f64, q: f64, dt: f64) -> Self {
        let w = fcut * 2.0 * PI * dt;
        let gamma = w / (2.0 * q);
        Self {
            wc: w * w,
            gamma,
            alpha: 1.0 / (1.0 + gamma + w * w),
        }
    }
}

/// Last two inputs and outputs of a second-order section
#[derive(Debug, Clone, Copy, Default)]
struct History {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl History {
    fn push(&mut self, x: f64, y: f64) {
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
    }
}

/// Discretised two-pole active highpass: 1→1
///
/// Same coefficients as [`Lowpass`]; the input term is the second
/// difference of the signal:
///
/// ```text
/// y[n] = alpha·(gain·(x[n] - 2·x[n-1] + x[n-2]) + 2·y[n-1] - y[n-2] + gamma·y[n-2])
/// ```
#[derive(Debug, Clone)]
pub struct Highpass {
    fcut: f64,
    q: f64,
    gain: f64,
    coef: TwoPole,
    hist: History,
}

impl Highpass {
    pub fn new(fcut: f64, q: f64, gain: f64, dt: f64) -> Self {
        Self {
            fcut,
            q,
            gain,
            coef: TwoPole::new(fcut, q, dt),
            hist: History::default(),
        }
    }
}

impl Circuit for Highpass {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let x = ports.input(0);
        let TwoPole { gamma, alpha, .. } = self.coef;
        let h = self.hist;
        let y = alpha
            * (self.gain * (x - 2.0 * h.x1 + h.x2) + (2.0 * h.y1 - h.y2) + gamma * h.y2);
        ports.set_output(0, y);
        self.hist.push(x, y);
    }

    fn params(&self) -> Vec<f64> {
        vec![
            self.fcut,
            self.q,
            self.gain,
            self.coef.wc,
            self.coef.gamma,
            self.coef.alpha,
        ]
    }
}

/// Discretised two-pole active bandpass: 1→1
///
/// The quality factor is `fcut / band`:
///
/// ```text
/// y[n] = alpha·(gain·gamma·(x[n] - x[n-2]) + 2·y[n-1] - y[n-2] + gamma·y[n-2])
/// ```
#[derive(Debug, Clone)]
pub struct Bandpass {
    fcut: f64,
    band: f64,
    gain: f64,
    coef: TwoPole,
    hist: History,
}

impl Bandpass {
    pub fn new(fcut: f64, band: f64, gain: f64, dt: f64) -> Self {
        Self {
            fcut,
            band,
            gain,
            coef: TwoPole::new(fcut, fcut / band, dt),
            hist: History::default(),
        }
    }
}

impl Circuit for Bandpass {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let x = ports.input(0);
        let TwoPole { gamma, alpha, .. } = self.coef;
        let h = self.hist;
        let y = alpha * (self.gain * gamma * (x - h.x2) + (2.0 * h.y1 - h.y2) + gamma * h.y2);
        ports.set_output(0, y);
        self.hist.push(x, y);
    }

    fn params(&self) -> Vec<f64> {
        vec![
            self.fcut,
            self.band,
            self.gain,
            self.coef.wc,
            self.coef.gamma,
            self.coef.alpha,
        ]
    }
}

/// Cascade of `order` first-order RC lowpass stages: 1→1
///
/// With `tau = 1/(2π·fcut)` and `a = dt/(tau + dt)`, each stage computes
/// `y[n] = y[n-1] + a·(u[n] - y[n-1])` on the output of the stage before.
#[derive(Debug, Clone)]
pub struct RcLowpass {
    fcut: f64,
    a: f64,
    stages: Vec<f64>,
}

impl RcLowpass {
    pub fn new(fcut: f64, order: usize, dt: f64) -> Self {
        let tau = 1.0 / (2.0 * PI * fcut);
        Self {
            fcut,
            a: dt / (tau + dt),
            stages: vec![0.0; order],
        }
    }

    pub fn order(&self) -> usize {
        self.stages.len()
    }
}

impl Circuit for RcLowpass {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let mut u = ports.input(0);
        for y in self.stages.iter_mut() {
            *y += self.a * (u - *y);
            u = *y;
        }
        ports.set_output(0, u);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.fcut, self.a]
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.stages.len() as i64]
    }
}

/// Cascade of `order` first-order RC highpass stages: 1→1
///
/// With `tau = 1/(2π·fcut)` and `a = tau/(tau + dt)`, each stage computes
/// `y[n] = a·(y[n-1] + u[n] - u[n-1])`.
#[derive(Debug, Clone)]
pub struct RcHighpass {
    fcut: f64,
    a: f64,
    /// Previous input of each stage
    inputs: Vec<f64>,
    /// Previous output of each stage
    outputs: Vec<f64>,
}

impl RcHighpass {
    pub fn new(fcut: f64, order: usize, dt: f64) -> Self {
        let tau = 1.0 / (2.0 * PI * fcut);
        Self {
            fcut,
            a: tau / (tau + dt),
            inputs: vec![0.0; order],
            outputs: vec![0.0; order],
        }
    }

    pub fn order(&self) -> usize {
        self.outputs.len()
    }
}

impl Circuit for RcHighpass {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let mut u = ports.input(0);
        for (prev_u, y) in self.inputs.iter_mut().zip(self.outputs.iter_mut()) {
            *y = self.a * (*y + u - *prev_u);
            *prev_u = u;
            u = *y;
        }
        ports.set_output(0, u);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.fcut, self.a]
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.outputs.len() as i64]
    }
}
