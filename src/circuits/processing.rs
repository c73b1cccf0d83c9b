//! Windowed statistics, averages, peak and edge detection

use crate::circuit::{Circuit, Ports};

/// Windowed min/max: 1→4
///
/// Tracks the running extremes of the input over a fixed number of steps.
/// On the last step of each window it emits the extremes and restarts the
/// window from the current input.
///
/// # Ports
/// - Input 0: signal
/// - Output 0: min (0 except on an emitting step)
/// - Output 1: max (0 except on an emitting step)
/// - Output 2: amplitude (max - min)/2, held until the next window
/// - Output 3: midpoint (max + min)/2, held until the next window
#[derive(Debug, Clone)]
pub struct MinMax {
    window: usize,
    counter: usize,
    min: f64,
    max: f64,
    amp: f64,
    offset: f64,
}

impl MinMax {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            counter: 0,
            min: 0.0,
            max: 0.0,
            amp: 0.0,
            offset: 0.0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Circuit for MinMax {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let x = ports.input(0);
        if x > self.max {
            self.max = x;
        }
        if x < self.min {
            self.min = x;
        }
        self.counter += 1;

        let (mut min_out, mut max_out) = (0.0, 0.0);
        if self.counter == self.window {
            min_out = self.min;
            max_out = self.max;
            self.amp = (self.max - self.min) / 2.0;
            self.offset = (self.max + self.min) / 2.0;

            self.min = x;
            self.max = x;
            self.counter = 0;
        }

        ports.set_output(0, min_out);
        ports.set_output(1, max_out);
        ports.set_output(2, self.amp);
        ports.set_output(3, self.offset);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.min, self.max, self.amp, self.offset]
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.window as i64, self.counter as i64]
    }
}

/// Peak detector: 1→3
///
/// Looks at the last three samples `u[n-2], u[n-1], u[n]`. A maximum is
/// found when `u[n-2] < u[n-1] > u[n]`, a minimum when
/// `u[n-2] > u[n-1] < u[n]`; which one counts is chosen at construction.
///
/// # Ports
/// - Input 0: signal
/// - Output 0: value of the last peak, u[n-1] when found
/// - Output 1: 1.0 on the step a peak is found, else 0.0
/// - Output 2: time between the last two peaks
#[derive(Debug, Clone)]
pub struct PeakDetector {
    upper: bool,
    y2: f64,
    y1: f64,
    y: f64,
    counter: u64,
    peak: f64,
    delay: f64,
}

impl PeakDetector {
    /// `upper = true` detects maxima, `false` detects minima
    pub fn new(upper: bool) -> Self {
        Self {
            upper,
            y2: 0.0,
            y1: 0.0,
            y: 0.0,
            counter: 0,
            peak: 0.0,
            delay: 0.0,
        }
    }
}

impl Circuit for PeakDetector {
    fn update(&mut self, ports: &mut Ports<'_>) {
        self.y2 = self.y1;
        self.y1 = self.y;
        self.y = ports.input(0);

        let found = if self.upper {
            self.y2 < self.y1 && self.y1 > self.y
        } else {
            self.y2 > self.y1 && self.y1 < self.y
        };

        let mut tick = 0.0;
        if found {
            tick = 1.0;
            self.peak = self.y1;
            self.delay = self.counter as f64 * ports.dt();
            self.counter = 0;
        }
        self.counter += 1;

        ports.set_output(0, self.peak);
        ports.set_output(1, tick);
        ports.set_output(2, self.delay);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.y2, self.y1, self.y, self.peak, self.delay]
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.upper as i64, self.counter as i64]
    }
}

/// Running average of everything seen so far: 1→1
#[derive(Debug, Clone, Default)]
pub struct Average {
    sum: f64,
    count: u64,
}

impl Average {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Circuit for Average {
    fn update(&mut self, ports: &mut Ports<'_>) {
        self.sum += ports.input(0);
        self.count += 1;
        ports.set_output(0, self.sum / self.count as f64);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.sum]
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.count as i64]
    }
}

/// Average over a ring buffer of `window` samples: 1→1
///
/// The buffer starts zero-filled. A moving average is emitted every step;
/// otherwise the output changes only when the buffer wraps and is held in
/// between.
#[derive(Debug, Clone)]
pub struct WindowAverage {
    buffer: Vec<f64>,
    cursor: usize,
    total: f64,
    moving: bool,
    out: f64,
}

impl WindowAverage {
    pub fn new(window: usize, moving: bool) -> Self {
        Self {
            buffer: vec![0.0; window],
            cursor: 0,
            total: 0.0,
            moving,
            out: 0.0,
        }
    }

    pub fn window(&self) -> usize {
        self.buffer.len()
    }
}

impl Circuit for WindowAverage {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let x = ports.input(0);
        self.total += x - self.buffer[self.cursor];
        self.buffer[self.cursor] = x;
        self.cursor = (self.cursor + 1) % self.buffer.len();

        if self.moving || self.cursor == 0 {
            self.out = self.total / self.buffer.len() as f64;
        }
        ports.set_output(0, self.out);
    }

    fn params(&self) -> Vec<f64> {
        vec![self.total, self.out]
    }

    fn int_params(&self) -> Vec<i64> {
        vec![
            self.buffer.len() as i64,
            self.cursor as i64,
            self.moving as i64,
        ]
    }
}

/// Phase meter between two signals: 2→2
///
/// Counts the steps during which `in[0] > 0` and `in[1] < 0`. When `in[1]`
/// then turns positive it ticks once and reports the counted time.
///
/// # Ports
/// - Input 0: leading signal
/// - Input 1: lagging signal
/// - Output 0: 1.0 on the step the lag is measured, else 0.0
/// - Output 1: measured lag on that step, else 0.0
#[derive(Debug, Clone, Default)]
pub struct Phasor {
    counter: u64,
    armed: bool,
}

impl Phasor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Circuit for Phasor {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let (lead, lag) = (ports.input(0), ports.input(1));
        if lead > 0.0 && lag < 0.0 {
            self.counter += 1;
            self.armed = true;
        }

        let (mut tick, mut delay) = (0.0, 0.0);
        if lag > 0.0 && self.armed {
            tick = 1.0;
            delay = self.counter as f64 * ports.dt();
            self.counter = 0;
            self.armed = false;
        }
        ports.set_output(0, tick);
        ports.set_output(1, delay);
    }

    fn int_params(&self) -> Vec<i64> {
        vec![self.counter as i64, self.armed as i64]
    }
}

/// Rising-edge detector: 1→1
///
/// Outputs 1.0 on the step the input goes from strictly negative to
/// strictly positive, else 0.0.
#[derive(Debug, Clone, Default)]
pub struct Flip {
    prev: f64,
}

impl Flip {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Circuit for Flip {
    fn update(&mut self, ports: &mut Ports<'_>) {
        let x = ports.input(0);
        let rising = x > 0.0 && self.prev < 0.0;
        ports.set_output(0, if rising { 1.0 } else { 0.0 });
        self.prev = x;
    }

    fn params(&self) -> Vec<f64> {
        vec![self.prev]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::testing::Harness;
    use approx::assert_relative_eq;

    #[test]
    fn test_minmax_emits_once_per_window() {
        let mut mm = MinMax::new(4);
        let mut h = Harness::new(1, 4, 0.01);
        let signal = [1.0, -2.0, 3.0, 0.5, 0.0, 0.25, -0.25, 0.1];
        let mut emitted = Vec::new();

        for (n, &x) in signal.iter().enumerate() {
            h.set_input(0, x);
            h.step(&mut mm);
            if (n + 1) % 4 == 0 {
                emitted.push((h.output(0), h.output(1), h.output(2), h.output(3)));
            } else {
                assert_eq!(h.output(0), 0.0);
                assert_eq!(h.output(1), 0.0);
            }
        }

        assert_eq!(emitted[0], (-2.0, 3.0, 2.5, 0.5));
        // second window starts from the sample that closed the first
        assert_eq!(emitted[1], (-0.25, 0.5, 0.375, 0.125));
    }

    #[test]
    fn test_minmax_holds_amplitude_between_windows() {
        let mut mm = MinMax::new(2);
        let mut h = Harness::new(1, 4, 0.01);
        h.set_input(0, 2.0);
        h.step(&mut mm);
        h.step(&mut mm);
        assert_eq!(h.output(2), 1.0);
        h.set_input(0, 5.0);
        h.step(&mut mm);
        assert_eq!(h.output(2), 1.0);
        assert_eq!(h.output(3), 1.0);
    }

    #[test]
    fn test_peak_detector_finds_maxima() {
        let dt = 0.1;
        let mut pd = PeakDetector::new(true);
        let mut h = Harness::new(1, 3, dt);
        let signal = [0.0, 1.0, 0.0, 1.0, 2.0, 1.0, 0.0];
        let mut ticks = Vec::new();

        for &x in &signal {
            h.set_input(0, x);
            h.step(&mut pd);
            ticks.push(h.output(1));
        }

        assert_eq!(ticks, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(h.output(0), 2.0);
        // peaks detected on steps 2 and 5
        assert_relative_eq!(h.output(2), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_peak_detector_finds_minima() {
        let mut pd = PeakDetector::new(false);
        let mut h = Harness::new(1, 3, 0.1);
        for &x in &[1.0, -1.0, 0.5] {
            h.set_input(0, x);
            h.step(&mut pd);
        }
        assert_eq!(h.output(0), -1.0);
        assert_eq!(h.output(1), 1.0);
    }

    fn feed<C: Circuit>(circuit: &mut C, signal: &[f64]) -> Vec<f64> {
        let mut h = Harness::new(1, 1, 0.1);
        signal
            .iter()
            .map(|&x| {
                h.set_input(0, x);
                h.step(circuit);
                h.output(0)
            })
            .collect()
    }

    #[test]
    fn test_running_average() {
        let mut avg = Average::new();
        assert_eq!(feed(&mut avg, &[2.0, 4.0, 6.0, -4.0]), vec![2.0, 3.0, 4.0, 2.0]);
        assert_eq!(avg.int_params(), vec![4]);
    }

    #[test]
    fn test_window_average_block_and_moving() {
        let signal = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];

        let mut block = WindowAverage::new(3, false);
        assert_eq!(
            feed(&mut block, &signal),
            vec![0.0, 0.0, 2.0, 2.0, 2.0, 5.0, 5.0]
        );

        let mut moving = WindowAverage::new(2, true);
        assert_eq!(
            feed(&mut moving, &signal),
            vec![0.5, 1.5, 2.5, 3.5, 4.5, 5.5, 6.5]
        );
        assert_eq!(moving.window(), 2);
    }

    #[test]
    fn test_phasor_measures_lag() {
        let mut ph = Phasor::new();
        let mut h = Harness::new(2, 2, 0.1);
        let steps = [(1.0, -1.0), (1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (1.0, 1.0)];
        let mut out = Vec::new();
        for (lead, lag) in steps {
            h.set_input(0, lead);
            h.set_input(1, lag);
            h.step(&mut ph);
            out.push((h.output(0), h.output(1)));
        }

        assert_eq!(out[2], (0.0, 0.0));
        assert_eq!(out[3].0, 1.0);
        assert_relative_eq!(out[3].1, 0.3, epsilon = 1e-12);
        // disarmed until the lead/lag pattern repeats
        assert_eq!(out[4], (0.0, 0.0));
    }

    #[test]
    fn test_flip_ticks_on_rising_edges() {
        let mut flip = Flip::new();
        assert_eq!(
            feed(&mut flip, &[1.0, -1.0, 2.0, 3.0, -0.5, 0.0, 1.0, -1.0, 0.5]),
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
    }
}
