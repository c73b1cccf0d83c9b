//! Simulation machine
//!
//! The host-facing facade: it owns the channel arena, the circuit graph and
//! the kind registry, and exposes wiring, scheduling, introspection and
//! shutdown. Construction goes through the [`Factory`](crate::Factory)
//! trait, which `Machine` implements for top-level circuits.
//!
//! # Step contract
//!
//! Each step runs every top-level circuit in registration order. A circuit
//! reads committed (`current`) values and writes pending values. An eager
//! circuit has its outputs committed as soon as it returns, so later
//! circuits see them in the same step; everything else becomes visible at
//! the bulk commit that ends the step. Channel 0 then advances by `dt`.

use std::fmt;
use std::io::Write;

use tracing::{debug, info, instrument, trace, warn};

use crate::arena::{ChannelArena, ChannelId};
use crate::circuit::{Circuit, Ports};
use crate::container::Boundary;
use crate::error::{Direction, Error, Result};
use crate::graph::{CircuitGraph, CircuitId, Instance};
use crate::registry::{Behavior, KindRegistry};
use crate::settings::Settings;

#[derive(Debug)]
pub struct Machine {
    pub(crate) arena: ChannelArena,
    pub(crate) graph: CircuitGraph,
    pub(crate) registry: KindRegistry,
    pub(crate) settings: Settings,
    errors: Vec<Error>,
    error_count: usize,
    steps: u64,
    released: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Machine with default settings and every built-in kind registered
    pub fn new() -> Self {
        Self {
            arena: ChannelArena::new(),
            graph: CircuitGraph::new(),
            registry: KindRegistry::with_builtins(),
            settings: Settings::default(),
            errors: Vec::new(),
            error_count: 0,
            steps: 0,
            released: false,
        }
    }

    /// Machine using validated settings
    pub fn with_settings(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let mut machine = Self::new();
        machine.settings = settings;
        Ok(machine)
    }

    /// Set the timestep (builder style)
    pub fn with_dt(mut self, dt: f64) -> Result<Self> {
        let settings = Settings {
            dt,
            ..self.settings.clone()
        };
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn dt(&self) -> f64 {
        self.settings.dt
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Bind an extra name to a built-in behaviour
    pub fn register_kind(&mut self, name: &str, behavior: Behavior) -> Result<()> {
        let result = self.registry.register(name, behavior);
        self.record(result)
    }

    /// Accumulate a failed construction or wiring result and pass it on
    pub(crate) fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!(error = %err, "construction error");
            self.errors.push(err.clone());
            self.error_count += 1;
        }
        result
    }

    /// Structural errors recorded since the machine was built
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Errors not yet acknowledged
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Acknowledge and return the outstanding errors, allowing `run` again
    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    /// Alias `dest.inputs[dest_slot]` to `src.outputs[src_slot]`.
    ///
    /// For a container, output slot *k* is the output of its *k*-th output
    /// relay, and input slot *k* is the input of its *k*-th input relay.
    pub fn connect(
        &mut self,
        src: CircuitId,
        src_slot: usize,
        dest: CircuitId,
        dest_slot: usize,
    ) -> Result<()> {
        let result = self.connect_inner(src, src_slot, dest, dest_slot);
        self.record(result)
    }

    fn connect_inner(
        &mut self,
        src: CircuitId,
        src_slot: usize,
        dest: CircuitId,
        dest_slot: usize,
    ) -> Result<()> {
        let ch = self.output_channel(src, src_slot)?;
        let (target, slot) = self.input_target(dest, dest_slot)?;
        self.graph[target].alias_input(slot, ch);
        debug!(%src, src_slot, %dest, dest_slot, channel = %ch, "connected");
        Ok(())
    }

    /// Alias an input to channel 0, the elapsed simulation time
    pub fn connect_time(&mut self, dest: CircuitId, dest_slot: usize) -> Result<()> {
        let result = self.connect_channel(ChannelId::TIME, dest, dest_slot);
        self.record(result)
    }

    /// Alias an input to a container's private clock channel
    pub fn connect_container_clock(
        &mut self,
        container: CircuitId,
        dest: CircuitId,
        dest_slot: usize,
    ) -> Result<()> {
        let result = self
            .container(container)
            .map(|c| c.clock())
            .and_then(|clock| self.connect_channel(clock, dest, dest_slot));
        self.record(result)
    }

    /// Make a sub-circuit read what the container receives on input
    /// `boundary_slot`
    pub fn connect_boundary_input(
        &mut self,
        container: CircuitId,
        boundary_slot: usize,
        dest: CircuitId,
        dest_slot: usize,
    ) -> Result<()> {
        let result = self
            .boundary_relay(container, Direction::Input, boundary_slot)
            .and_then(|relay| self.connect_inner(relay, 0, dest, dest_slot));
        self.record(result)
    }

    /// Feed a sub-circuit output to the container's output `boundary_slot`
    pub fn connect_boundary_output(
        &mut self,
        src: CircuitId,
        src_slot: usize,
        container: CircuitId,
        boundary_slot: usize,
    ) -> Result<()> {
        let result = self
            .boundary_relay(container, Direction::Output, boundary_slot)
            .and_then(|relay| self.connect_inner(src, src_slot, relay, 0));
        self.record(result)
    }

    fn connect_channel(&mut self, ch: ChannelId, dest: CircuitId, dest_slot: usize) -> Result<()> {
        let (target, slot) = self.input_target(dest, dest_slot)?;
        self.graph[target].alias_input(slot, ch);
        debug!(%dest, dest_slot, channel = %ch, "connected channel");
        Ok(())
    }

    /// Write `value` to both buffers of the channel input `slot` reads.
    ///
    /// The last call to this or to a connect on the same slot decides what
    /// the slot sees.
    pub fn set_external_input(&mut self, id: CircuitId, slot: usize, value: f64) -> Result<()> {
        let result = self
            .input_target(id, slot)
            .map(|(target, slot)| self.graph[target].inputs()[slot]);
        let ch = self.record(result)?;
        self.arena.set(ch, value);
        Ok(())
    }

    /// Commit this circuit's outputs as soon as it runs
    pub fn set_eager(&mut self, id: CircuitId, eager: bool) -> Result<()> {
        let result = self.graph.get_mut(id).map(|instance| instance.set_eager(eager));
        self.record(result)
    }

    /// Resolve an input slot, following a container to its input relay
    fn input_target(&self, id: CircuitId, slot: usize) -> Result<(CircuitId, usize)> {
        let instance = self.graph.get(id)?;
        if let Some(container) = instance.circuit().as_container() {
            let relay = container
                .boundary(Direction::Input)
                .get(slot)
                .copied()
                .ok_or(Error::NoSuchSlot {
                    circuit: id,
                    slot,
                    direction: Direction::Input,
                })?;
            return Ok((relay, 0));
        }
        if slot >= instance.inputs().len() {
            return Err(Error::NoSuchSlot {
                circuit: id,
                slot,
                direction: Direction::Input,
            });
        }
        Ok((id, slot))
    }

    /// Resolve an output slot to its channel, following a container to its
    /// output relay
    fn output_channel(&self, id: CircuitId, slot: usize) -> Result<ChannelId> {
        let instance = self.graph.get(id)?;
        let no_slot = || Error::NoSuchSlot {
            circuit: id,
            slot,
            direction: Direction::Output,
        };
        match instance.circuit().as_container() {
            Some(container) => {
                let relay = container
                    .boundary(Direction::Output)
                    .get(slot)
                    .copied()
                    .ok_or_else(no_slot)?;
                Ok(self.graph[relay].outputs()[0])
            }
            None => instance.outputs().get(slot).copied().ok_or_else(no_slot),
        }
    }

    fn container(&self, id: CircuitId) -> Result<&crate::container::Container> {
        self.graph
            .get(id)?
            .circuit()
            .as_container()
            .ok_or(Error::NotAContainer(id))
    }

    fn boundary_relay(&self, id: CircuitId, side: Boundary, slot: usize) -> Result<CircuitId> {
        self.container(id)?
            .boundary(side)
            .get(slot)
            .copied()
            .ok_or(Error::NoSuchSlot {
                circuit: id,
                slot,
                direction: side,
            })
    }

    /// Print channel `ch` on every line of `sink`
    pub fn track_channel(&mut self, sink: CircuitId, ch: ChannelId) -> Result<()> {
        let result = self.track_inner(sink, ch);
        self.record(result)
    }

    /// Print output `slot` of `circuit` on every line of `sink`
    pub fn track_output(&mut self, sink: CircuitId, circuit: CircuitId, slot: usize) -> Result<()> {
        let result = self
            .output_channel(circuit, slot)
            .and_then(|ch| self.track_inner(sink, ch));
        self.record(result)
    }

    fn track_inner(&mut self, sink: CircuitId, ch: ChannelId) -> Result<()> {
        if !self.arena.contains(ch) {
            return Err(Error::NoSuchChannel(ch));
        }
        self.graph
            .get_mut(sink)?
            .circuit_mut()
            .as_sink_mut()
            .ok_or(Error::NotASink(sink))?
            .track(ch);
        debug!(%sink, channel = %ch, "tracking channel");
        Ok(())
    }

    /// Advance the graph by one step
    pub fn step(&mut self) {
        trace!(step = self.steps, time = self.time(), "step");
        for i in 0..self.graph.top_level().len() {
            let id = self.graph.top_level()[i];
            self.run_instance(id);
        }
        self.arena.commit_all();
        self.arena.advance(ChannelId::TIME, self.settings.dt);
        self.steps += 1;
    }

    /// Run one circuit's turn and commit its outputs if it is eager
    pub(crate) fn run_instance(&mut self, id: CircuitId) {
        if self.graph[id].is_container() {
            self.update_container(id);
            return;
        }

        let dt = self.settings.dt;
        let instance = &mut self.graph[id];
        let eager = instance.is_eager();
        let (circuit, inputs, original_inputs, outputs) = instance.split();
        let mut ports = Ports::new(&mut self.arena, inputs, original_inputs, outputs, dt);
        circuit.update(&mut ports);
        if eager {
            for &ch in outputs {
                self.arena.commit(ch);
            }
        }
    }

    /// Run exactly `steps` steps.
    ///
    /// Refuses to start while construction errors are unacknowledged.
    #[instrument(skip(self), fields(dt = self.settings.dt))]
    pub fn run(&mut self, steps: u64) -> Result<()> {
        if !self.errors.is_empty() {
            let count = self.errors.len();
            warn!(count, "refusing to run with unacknowledged construction errors");
            return Err(Error::Unacknowledged { count });
        }
        for _ in 0..steps {
            self.step();
        }
        info!(steps, time = self.time(), "run complete");
        Ok(())
    }

    /// Run for `duration` seconds of simulation time, rounded to whole steps
    pub fn run_for(&mut self, duration: f64) -> Result<()> {
        let settings = Settings {
            duration: Some(duration),
            ..self.settings.clone()
        };
        let result = settings.validate();
        self.record(result)?;
        self.run(settings.steps())
    }

    /// Steps executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Release external resources (sink destinations). Only the first call
    /// does anything.
    pub fn shutdown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut released = 0usize;
        for i in 0..self.graph.len() {
            let instance = &mut self.graph[CircuitId::new(i)];
            if instance.behavior() == Behavior::Sink {
                released += 1;
            }
            instance.circuit_mut().release();
        }
        info!(sinks = released, "machine shut down");
    }

    /// Elapsed simulation time
    pub fn time(&self) -> f64 {
        self.arena.read(ChannelId::TIME)
    }

    /// Committed value of a channel
    pub fn value(&self, ch: ChannelId) -> Result<f64> {
        if self.arena.contains(ch) {
            Ok(self.arena.read(ch))
        } else {
            Err(Error::NoSuchChannel(ch))
        }
    }

    /// Pending value of a channel
    pub fn pending_value(&self, ch: ChannelId) -> Result<f64> {
        if self.arena.contains(ch) {
            Ok(self.arena.pending(ch))
        } else {
            Err(Error::NoSuchChannel(ch))
        }
    }

    /// Committed value of output `slot` of a circuit (containers included)
    pub fn output_value(&self, id: CircuitId, slot: usize) -> Result<f64> {
        let ch = self.output_channel(id, slot)?;
        Ok(self.arena.read(ch))
    }

    pub fn num_channels(&self) -> usize {
        self.arena.len()
    }

    pub fn num_circuits(&self) -> usize {
        self.graph.len()
    }

    pub fn circuit(&self, id: CircuitId) -> Result<&Instance> {
        self.graph.get(id)
    }

    pub fn inputs(&self, id: CircuitId) -> Result<&[ChannelId]> {
        Ok(self.graph.get(id)?.inputs())
    }

    pub fn original_inputs(&self, id: CircuitId) -> Result<&[ChannelId]> {
        Ok(self.graph.get(id)?.original_inputs())
    }

    pub fn outputs(&self, id: CircuitId) -> Result<&[ChannelId]> {
        Ok(self.graph.get(id)?.outputs())
    }

    pub fn params(&self, id: CircuitId) -> Result<Vec<f64>> {
        Ok(self.graph.get(id)?.circuit().params())
    }

    pub fn int_params(&self, id: CircuitId) -> Result<Vec<i64>> {
        Ok(self.graph.get(id)?.circuit().int_params())
    }

    pub fn kind(&self, id: CircuitId) -> Result<Behavior> {
        Ok(self.graph.get(id)?.behavior())
    }

    pub fn is_eager(&self, id: CircuitId) -> Result<bool> {
        Ok(self.graph.get(id)?.is_eager())
    }

    pub fn top_level(&self) -> &[CircuitId] {
        self.graph.top_level()
    }

    pub fn sub_circuits(&self, container: CircuitId) -> Result<&[CircuitId]> {
        Ok(self.container(container)?.sub_circuits())
    }

    pub fn boundary(&self, container: CircuitId, side: Boundary) -> Result<&[CircuitId]> {
        Ok(self.container(container)?.boundary(side))
    }

    /// Channel and value report of one circuit
    pub fn describe(&self, id: CircuitId) -> Result<Report> {
        let instance = self.graph.get(id)?;
        let port = |&ch: &ChannelId| PortValue {
            channel: ch,
            current: self.arena.read(ch),
            pending: self.arena.pending(ch),
        };
        Ok(Report {
            id,
            kind: instance.behavior(),
            eager: instance.is_eager(),
            inputs: instance.inputs().iter().map(port).collect(),
            outputs: instance.outputs().iter().map(port).collect(),
            params: instance.circuit().params(),
            int_params: instance.circuit().int_params(),
        })
    }

    /// Write [`Machine::describe`] for every circuit
    pub fn dump(&self, mut out: impl Write) -> std::io::Result<()> {
        for (id, _) in self.graph.iter() {
            if let Ok(report) = self.describe(id) {
                write!(out, "{report}")?;
            }
        }
        Ok(())
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Channel index with its committed and pending value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortValue {
    pub channel: ChannelId,
    pub current: f64,
    pub pending: f64,
}

/// Snapshot of one circuit, printable
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: CircuitId,
    pub kind: Behavior,
    pub eager: bool,
    pub inputs: Vec<PortValue>,
    pub outputs: Vec<PortValue>,
    pub params: Vec<f64>,
    pub int_params: Vec<i64>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "circuit {} ({}{})",
            self.id,
            self.kind,
            if self.eager { ", eager" } else { "" }
        )?;
        for (slot, port) in self.inputs.iter().enumerate() {
            writeln!(
                f,
                "  in  {slot}: {} = {} (pending {})",
                port.channel, port.current, port.pending
            )?;
        }
        for (slot, port) in self.outputs.iter().enumerate() {
            writeln!(
                f,
                "  out {slot}: {} = {} (pending {})",
                port.channel, port.current, port.pending
            )?;
        }
        if !self.params.is_empty() {
            writeln!(f, "  params: {:?}", self.params)?;
        }
        if !self.int_params.is_empty() {
            writeln!(f, "  int params: {:?}", self.int_params)?;
        }
        Ok(())
    }
}
