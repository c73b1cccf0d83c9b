//! Core circuit trait and the port view a behaviour runs against
//!
//! A behaviour never owns channels. Each step it is handed a [`Ports`] view
//! onto the shared arena: inputs read committed values, outputs write
//! pending values.

use crate::arena::{ChannelArena, ChannelId};

/// Per-step view of the arena for one circuit instance
pub struct Ports<'a> {
    arena: &'a mut ChannelArena,
    inputs: &'a [ChannelId],
    original_inputs: &'a [ChannelId],
    outputs: &'a [ChannelId],
    dt: f64,
}

impl<'a> Ports<'a> {
    pub fn new(
        arena: &'a mut ChannelArena,
        inputs: &'a [ChannelId],
        original_inputs: &'a [ChannelId],
        outputs: &'a [ChannelId],
        dt: f64,
    ) -> Self {
        Self {
            arena,
            inputs,
            original_inputs,
            outputs,
            dt,
        }
    }

    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Committed value currently seen on input `slot`
    #[inline]
    pub fn input(&self, slot: usize) -> f64 {
        self.arena.read(self.inputs[slot])
    }

    /// Committed values of all inputs, in slot order
    pub fn inputs(&self) -> impl Iterator<Item = f64> + '_ {
        self.inputs.iter().map(|&ch| self.arena.read(ch))
    }

    /// Write the pending value of output `slot`
    #[inline]
    pub fn set_output(&mut self, slot: usize, value: f64) {
        self.arena.write_pending(self.outputs[slot], value);
    }

    /// Whether input `slot` has been wired away from its private channel
    #[inline]
    pub fn is_connected(&self, slot: usize) -> bool {
        self.inputs[slot] != self.original_inputs[slot]
    }

    /// Committed value of an arbitrary channel
    #[inline]
    pub fn channel(&self, ch: ChannelId) -> f64 {
        self.arena.read(ch)
    }

    /// Simulation timestep
    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Elapsed simulation time (channel 0)
    #[inline]
    pub fn time(&self) -> f64 {
        self.arena.read(ChannelId::TIME)
    }
}

/// Update behaviour of a circuit kind
///
/// # Contract
///
/// - `update` reads inputs through [`Ports::input`] and writes every output
///   it owns through [`Ports::set_output`]. It must not fail: numeric edge
///   cases propagate as IEEE special values.
/// - Arity is fixed by the factory at construction; a behaviour may rely on
///   the number of ports it was built with.
///
/// # Example
///
/// ```ignore
/// struct Doubler;
///
/// impl Circuit for Doubler {
///     fn update(&mut self, ports: &mut Ports<'_>) {
///         let x = ports.input(0);
///         ports.set_output(0, 2.0 * x);
///     }
/// }
/// ```
pub trait Circuit {
    /// Run one step
    fn update(&mut self, ports: &mut Ports<'_>);

    /// Floating-point parameter block, for introspection
    fn params(&self) -> Vec<f64> {
        Vec::new()
    }

    /// Integer parameter block, for introspection
    fn int_params(&self) -> Vec<i64> {
        Vec::new()
    }

    /// Release any external resource held by the circuit.
    ///
    /// Called once per instance by the machine's shutdown pass.
    fn release(&mut self) {}
}
