//! Per-kind factories
//!
//! Every factory does the same four things: resolve the kind name through
//! the registry (checking its family), build the initial state from the
//! constructor arguments, let the graph allocate the ports, and hand back
//! the new [`CircuitId`]. Failures are returned and also recorded on the
//! machine.
//!
//! [`Factory`] is implemented by [`Machine`] for top-level circuits and by
//! [`Scope`] for circuits built inside a container.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::arena::ChannelArena;
use crate::circuits::*;
use crate::container::{Boundary, Container};
use crate::error::{Error, Result};
use crate::graph::{Blueprint, CircuitId, Placement};
use crate::machine::Machine;
use crate::registry::{Behavior, Family};

fn invalid(kind: &'static str, message: impl Into<String>) -> Error {
    Error::InvalidArgument {
        kind,
        message: message.into(),
    }
}

impl Machine {
    /// Resolve, build and append one circuit
    pub(crate) fn build(
        &mut self,
        placement: Placement,
        name: &str,
        family: Family,
        make: impl FnOnce(Behavior, &mut ChannelArena) -> Result<Blueprint>,
    ) -> Result<CircuitId> {
        let result = self.build_inner(placement, name, family, make);
        self.record(result)
    }

    fn build_inner(
        &mut self,
        placement: Placement,
        name: &str,
        family: Family,
        make: impl FnOnce(Behavior, &mut ChannelArena) -> Result<Blueprint>,
    ) -> Result<CircuitId> {
        let behavior = self.registry.resolve_in(name, family)?;
        self.graph.check_placement(placement)?;
        let blueprint = make(behavior, &mut self.arena)?;
        let (inputs, outputs) = (blueprint.num_inputs, blueprint.num_outputs);
        let id = self.graph.append(&mut self.arena, blueprint, placement)?;
        debug!(circuit = %id, kind = name, inputs, outputs, ?placement, "added circuit");
        Ok(id)
    }

    /// Factories that place circuits inside `container`
    pub fn inside(&mut self, container: CircuitId) -> Result<Scope<'_>> {
        let result = self.graph.check_placement(Placement::Inside(container));
        self.record(result)?;
        Ok(Scope {
            machine: self,
            container,
        })
    }

    /// Grow a container's declared arity by one input or output.
    ///
    /// Appends a relay to the graph and returns it; the relay is run by the
    /// container, never by the step loop.
    pub fn add_boundary_channel(&mut self, container: CircuitId, side: Boundary) -> Result<CircuitId> {
        let id = self.build(
            Placement::Boundary(container, side),
            Behavior::Relay.name(),
            Family::Relay,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 1, Relay)),
        )?;
        debug!(%container, relay = %id, %side, "added boundary channel");
        Ok(id)
    }
}

/// Factories bound to one container
#[derive(Debug)]
pub struct Scope<'a> {
    machine: &'a mut Machine,
    container: CircuitId,
}

impl Scope<'_> {
    pub fn container(&self) -> CircuitId {
        self.container
    }
}

/// Circuit constructors
///
/// # Example
///
/// ```ignore
/// let mut machine = Machine::new();
/// let sum = machine.add_math("opADD", 2)?;
/// let sub = machine.add_container()?;
/// let inner = machine.inside(sub)?.add_gain(2.0)?;
/// ```
pub trait Factory {
    fn machine(&mut self) -> &mut Machine;

    fn placement(&self) -> Placement;

    /// Arithmetic circuit: `opADD`/`opMUL` reduce `num_inputs ≥ 1` inputs,
    /// `opSUB`/`opDIV`/`opPOW` take 2 and `opABS` takes 1.
    fn add_math(&mut self, name: &str, num_inputs: usize) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, name, Family::Math, |behavior, _| {
                let op = match behavior {
                    Behavior::Add => MathOp::Add,
                    Behavior::Sub => MathOp::Sub,
                    Behavior::Mul => MathOp::Mul,
                    Behavior::Div => MathOp::Div,
                    Behavior::Abs => MathOp::Abs,
                    Behavior::Pow => MathOp::Pow,
                    other => {
                        return Err(invalid(
                            "maths",
                            format!("{other} has its own factory"),
                        ))
                    }
                };
                check_arity("maths", op.fixed_arity(), num_inputs)?;
                Ok(Blueprint::new(behavior, num_inputs, 1, Math::new(op)))
            })
    }

    /// Logic gate: `opNOT` takes 1 input, the others `num_inputs ≥ 1`
    fn add_logic(&mut self, name: &str, num_inputs: usize) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, name, Family::Logic, |behavior, _| {
                let (op, fixed) = match behavior {
                    Behavior::And => (LogicOp::And, None),
                    Behavior::Or => (LogicOp::Or, None),
                    Behavior::Not => (LogicOp::Not, Some(1)),
                    Behavior::Xor => (LogicOp::Xor, None),
                    Behavior::Nor => (LogicOp::Nor, None),
                    other => return Err(invalid("logic", format!("{other} is not a gate"))),
                };
                check_arity("logic", fixed, num_inputs)?;
                Ok(Blueprint::new(behavior, num_inputs, 1, Logic::new(op)))
            })
    }

    /// Comparator: 2→1
    fn add_compare(&mut self, name: &str) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, name, Family::Comparison, |behavior, _| {
                let op = match behavior {
                    Behavior::GreaterOrEqual => CompareOp::GreaterOrEqual,
                    Behavior::LessOrEqual => CompareOp::LessOrEqual,
                    Behavior::Equal => CompareOp::Equal,
                    other => {
                        return Err(invalid("comparison", format!("{other} is not a comparison")))
                    }
                };
                Ok(Blueprint::new(behavior, 2, 1, Compare::new(op)))
            })
    }

    fn add_gain(&mut self, gain: f64) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Gain.name(), Family::Math, |behavior, _| {
                Ok(Blueprint::new(behavior, 1, 1, Gain::new(gain)))
            })
    }

    fn add_pi(&mut self, kp: f64, ki: f64) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Pi.name(), Family::Control, |behavior, _| {
                Ok(Blueprint::new(behavior, 2, 1, Pi::new(kp, ki)))
            })
    }

    fn add_pid(&mut self, kp: f64, ki: f64, kd: f64) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Pid.name(), Family::Control, |behavior, _| {
                Ok(Blueprint::new(behavior, 2, 1, Pid::new(kp, ki, kd)))
            })
    }

    /// Clamp: signal, lower and upper bound → 1
    fn add_limiter(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Limiter.name(), Family::Control, |behavior, _| {
                Ok(Blueprint::new(behavior, 3, 1, Limiter))
            })
    }

    /// Two-pole lowpass; coefficients use the machine's current timestep
    fn add_lowpass(&mut self, fcut: f64, q: f64, gain: f64) -> Result<CircuitId> {
        let placement = self.placement();
        let dt = self.machine().dt();
        self.machine()
            .build(placement, Behavior::Lowpass.name(), Family::Filter, |behavior, _| {
                check_positive("SKLP", "cutoff", fcut)?;
                check_positive("SKLP", "quality factor", q)?;
                Ok(Blueprint::new(behavior, 1, 1, Lowpass::new(fcut, q, gain, dt)))
            })
    }

    /// Flip-flop → Q and !Q. `DFlipFlop` takes one input, the others two.
    fn add_flipflop(&mut self, name: &str) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, name, Family::FlipFlop, |behavior, _| {
                let kind = match behavior {
                    Behavior::DFlipFlop => FlipFlopKind::D,
                    Behavior::DrFlipFlop => FlipFlopKind::DReset,
                    Behavior::SrFlipFlop => FlipFlopKind::SetReset,
                    Behavior::JkFlipFlop => FlipFlopKind::Jk,
                    other => return Err(invalid("flip-flop", format!("{other} is not a flip-flop"))),
                };
                Ok(Blueprint::new(behavior, kind.num_inputs(), 2, FlipFlop::new(kind)))
            })
    }

    /// Two-pole active highpass; coefficients use the machine's current
    /// timestep
    fn add_highpass(&mut self, fcut: f64, q: f64, gain: f64) -> Result<CircuitId> {
        let placement = self.placement();
        let dt = self.machine().dt();
        self.machine()
            .build(placement, Behavior::Highpass.name(), Family::Filter, |behavior, _| {
                check_positive("ActiveHighPass", "cutoff", fcut)?;
                check_positive("ActiveHighPass", "quality factor", q)?;
                Ok(Blueprint::new(behavior, 1, 1, Highpass::new(fcut, q, gain, dt)))
            })
    }

    /// Two-pole active bandpass centred on `fcut` with bandwidth `band`
    fn add_bandpass(&mut self, fcut: f64, band: f64, gain: f64) -> Result<CircuitId> {
        let placement = self.placement();
        let dt = self.machine().dt();
        self.machine()
            .build(placement, Behavior::Bandpass.name(), Family::Filter, |behavior, _| {
                check_positive("ActiveBandPass", "cutoff", fcut)?;
                check_positive("ActiveBandPass", "band", band)?;
                Ok(Blueprint::new(behavior, 1, 1, Bandpass::new(fcut, band, gain, dt)))
            })
    }

    /// `order` cascaded RC lowpass stages
    fn add_rc_lowpass(&mut self, fcut: f64, order: usize) -> Result<CircuitId> {
        let placement = self.placement();
        let dt = self.machine().dt();
        self.machine()
            .build(placement, Behavior::RcLowpass.name(), Family::Filter, |behavior, _| {
                check_positive("PassiveLowPass", "cutoff", fcut)?;
                check_order("PassiveLowPass", order)?;
                Ok(Blueprint::new(behavior, 1, 1, RcLowpass::new(fcut, order, dt)))
            })
    }

    /// `order` cascaded RC highpass stages
    fn add_rc_highpass(&mut self, fcut: f64, order: usize) -> Result<CircuitId> {
        let placement = self.placement();
        let dt = self.machine().dt();
        self.machine()
            .build(placement, Behavior::RcHighpass.name(), Family::Filter, |behavior, _| {
                check_positive("PassiveHighPass", "cutoff", fcut)?;
                check_order("PassiveHighPass", order)?;
                Ok(Blueprint::new(behavior, 1, 1, RcHighpass::new(fcut, order, dt)))
            })
    }

    /// Trilinear lookup: x, y, z → one output per table component
    fn add_trilinear(&mut self, grid: Grid3) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Trilinear.name(),
            Family::Interpolation,
            |behavior, _| {
                let components = grid.components();
                Ok(Blueprint::new(behavior, 3, components, Trilinear::new(grid)))
            },
        )
    }

    /// Windowed min/max over `window ≥ 1` steps
    fn add_minmax(&mut self, window: usize) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::MinMax.name(),
            Family::SignalProcessing,
            |behavior, _| {
                if window == 0 {
                    return Err(invalid("minmax", "window must span at least one step"));
                }
                Ok(Blueprint::new(behavior, 1, 4, MinMax::new(window)))
            },
        )
    }

    fn add_derivative(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Derivative.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 1, Derivative::new())),
        )
    }

    fn add_integral(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Integral.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 1, Integral::new())),
        )
    }

    /// Delay line of `steps` steps
    fn add_delay(&mut self, steps: usize) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Delay.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 1, Delay::new(steps))),
        )
    }

    /// Peak detector; `upper` picks maxima, otherwise minima
    fn add_peak_detector(&mut self, upper: bool) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::PeakDetector.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 3, PeakDetector::new(upper))),
        )
    }

    /// Average of every sample seen so far
    fn add_average(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Average.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 1, Average::new())),
        )
    }

    /// Average over the last `window ≥ 1` samples; `moving` emits every
    /// step instead of once per window
    fn add_window_average(&mut self, window: usize, moving: bool) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::WindowAverage.name(),
            Family::SignalProcessing,
            |behavior, _| {
                if window == 0 {
                    return Err(invalid("avg", "window must span at least one step"));
                }
                Ok(Blueprint::new(behavior, 1, 1, WindowAverage::new(window, moving)))
            },
        )
    }

    /// Lag meter: leading and lagging signal → tick and lag
    fn add_phasor(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Phasor.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 2, 2, Phasor::new())),
        )
    }

    /// Rising-edge detector
    fn add_flip(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Flip.name(),
            Family::SignalProcessing,
            |behavior, _| Ok(Blueprint::new(behavior, 1, 1, Flip::new())),
        )
    }

    /// Sink writing to a file created (truncated) at `path`
    fn add_sink(&mut self, path: impl AsRef<Path>, dump: usize) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Sink.name(), Family::Output, |behavior, _| {
                let sink = Sink::create(path, dump)?;
                Ok(Blueprint::new(behavior, 1, 0, sink))
            })
    }

    /// Sink writing to any destination
    fn add_sink_writer(
        &mut self,
        writer: impl Write + Send + 'static,
        dump: usize,
    ) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Sink.name(), Family::Output, |behavior, _| {
                Ok(Blueprint::new(behavior, 1, 0, Sink::from_writer(writer, dump)))
            })
    }

    /// Sine/cosine oscillator: frequency, amplitude, phase, offset → 2
    fn add_oscillator(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Oscillator.name(), Family::Source, |behavior, _| {
                Ok(Blueprint::new(behavior, 4, 2, Oscillator::new()))
            })
    }

    fn add_relay(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine()
            .build(placement, Behavior::Relay.name(), Family::Relay, |behavior, _| {
                Ok(Blueprint::new(behavior, 1, 1, Relay))
            })
    }

    /// Empty container with its own clock channel; grow its ports with
    /// [`Machine::add_boundary_channel`]
    fn add_container(&mut self) -> Result<CircuitId> {
        let placement = self.placement();
        self.machine().build(
            placement,
            Behavior::Container.name(),
            Family::Container,
            |behavior, arena| {
                let clock = arena.allocate(1);
                Ok(Blueprint::new(behavior, 0, 0, Container::new(clock)))
            },
        )
    }
}

fn check_positive(kind: &'static str, what: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(kind, format!("{what} must be positive, got {value}")))
    }
}

fn check_order(kind: &'static str, order: usize) -> Result<()> {
    if order == 0 {
        return Err(invalid(kind, "order must be at least 1"));
    }
    Ok(())
}

fn check_arity(kind: &'static str, fixed: Option<usize>, num_inputs: usize) -> Result<()> {
    match fixed {
        Some(n) if n != num_inputs => Err(invalid(
            kind,
            format!("expected {n} input(s), got {num_inputs}"),
        )),
        None if num_inputs == 0 => Err(invalid(kind, "at least one input is required")),
        _ => Ok(()),
    }
}

impl Factory for Machine {
    fn machine(&mut self) -> &mut Machine {
        self
    }

    fn placement(&self) -> Placement {
        Placement::TopLevel
    }
}

impl Factory for Scope<'_> {
    fn machine(&mut self) -> &mut Machine {
        self.machine
    }

    fn placement(&self) -> Placement {
        Placement::Inside(self.container)
    }
}
