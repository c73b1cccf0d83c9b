//! Append-only circuit graph
//!
//! Instances enter the graph only through [`CircuitGraph::append`], which
//! allocates their channels in the arena first. Neither instances nor
//! channels are ever removed, so every [`CircuitId`] and [`ChannelId`] handed
//! out stays valid and keeps its meaning.

use std::ops::{Index, IndexMut};

use crate::arena::{ChannelArena, ChannelId};
use crate::circuit_kind::CircuitKind;
use crate::error::{Direction, Error, Result};
use crate::registry::Behavior;

/// Index of a circuit instance in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircuitId(usize);

impl CircuitId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CircuitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// One node of the dataflow graph
#[derive(Debug)]
pub struct Instance {
    behavior: Behavior,
    inputs: Vec<ChannelId>,
    original_inputs: Vec<ChannelId>,
    outputs: Vec<ChannelId>,
    circuit: CircuitKind,
    eager: bool,
    owner: Option<CircuitId>,
}

impl Instance {
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Channels read each step, after wiring
    pub fn inputs(&self) -> &[ChannelId] {
        &self.inputs
    }

    /// Channels allocated for the input slots at construction
    pub fn original_inputs(&self) -> &[ChannelId] {
        &self.original_inputs
    }

    pub fn outputs(&self) -> &[ChannelId] {
        &self.outputs
    }

    pub fn circuit(&self) -> &CircuitKind {
        &self.circuit
    }

    pub fn circuit_mut(&mut self) -> &mut CircuitKind {
        &mut self.circuit
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// Container this instance was built inside, if any
    pub fn owner(&self) -> Option<CircuitId> {
        self.owner
    }

    pub fn is_container(&self) -> bool {
        self.circuit.as_container().is_some()
    }

    /// Borrow the parts a behaviour needs to run: the circuit mutably, the
    /// channel lists shared.
    pub(crate) fn split(&mut self) -> (&mut CircuitKind, &[ChannelId], &[ChannelId], &[ChannelId]) {
        (
            &mut self.circuit,
            &self.inputs,
            &self.original_inputs,
            &self.outputs,
        )
    }

    pub(crate) fn alias_input(&mut self, slot: usize, ch: ChannelId) {
        self.inputs[slot] = ch;
    }

    pub(crate) fn set_eager(&mut self, eager: bool) {
        self.eager = eager;
    }
}

/// What a factory hands the graph: the resolved behaviour, its arity and
/// its initialised state
#[derive(Debug)]
pub struct Blueprint {
    pub behavior: Behavior,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub circuit: CircuitKind,
}

impl Blueprint {
    pub fn new(
        behavior: Behavior,
        num_inputs: usize,
        num_outputs: usize,
        circuit: impl Into<CircuitKind>,
    ) -> Self {
        Self {
            behavior,
            num_inputs,
            num_outputs,
            circuit: circuit.into(),
        }
    }
}

/// Where a new instance is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Run by the machine's own step loop
    TopLevel,
    /// Run inside a container's turn
    Inside(CircuitId),
    /// A boundary relay of a container; run by the container's relay phases
    Boundary(CircuitId, Direction),
}

#[derive(Debug, Default)]
pub struct CircuitGraph {
    instances: Vec<Instance>,
    top_level: Vec<CircuitId>,
}

impl CircuitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, id: CircuitId) -> Result<&Instance> {
        self.instances.get(id.0).ok_or(Error::NoSuchCircuit(id))
    }

    pub fn get_mut(&mut self, id: CircuitId) -> Result<&mut Instance> {
        self.instances.get_mut(id.0).ok_or(Error::NoSuchCircuit(id))
    }

    /// Top-level circuits in registration order
    pub fn top_level(&self) -> &[CircuitId] {
        &self.top_level
    }

    pub fn iter(&self) -> impl Iterator<Item = (CircuitId, &Instance)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, instance)| (CircuitId(i), instance))
    }

    /// Check that `placement` names an existing container
    pub fn check_placement(&self, placement: Placement) -> Result<()> {
        match placement {
            Placement::TopLevel => Ok(()),
            Placement::Inside(container) | Placement::Boundary(container, _) => {
                if self.get(container)?.is_container() {
                    Ok(())
                } else {
                    Err(Error::NotAContainer(container))
                }
            }
        }
    }

    /// Allocate the blueprint's channels (inputs first, then outputs, one
    /// contiguous run) and store the new instance.
    pub fn append(
        &mut self,
        arena: &mut ChannelArena,
        blueprint: Blueprint,
        placement: Placement,
    ) -> Result<CircuitId> {
        self.check_placement(placement)?;

        let Blueprint {
            behavior,
            num_inputs,
            num_outputs,
            circuit,
        } = blueprint;

        let first = arena.allocate(num_inputs + num_outputs);
        let inputs: Vec<ChannelId> = ChannelArena::run(first, num_inputs).collect();
        let outputs: Vec<ChannelId> =
            ChannelArena::run(ChannelId::new(first.index() + num_inputs), num_outputs).collect();

        let id = CircuitId(self.instances.len());
        let owner = match placement {
            Placement::TopLevel => None,
            Placement::Inside(c) | Placement::Boundary(c, _) => Some(c),
        };
        self.instances.push(Instance {
            behavior,
            original_inputs: inputs.clone(),
            inputs,
            outputs,
            circuit,
            eager: false,
            owner,
        });

        match placement {
            Placement::TopLevel => self.top_level.push(id),
            Placement::Inside(c) => self.container_mut(c).push_sub(id),
            Placement::Boundary(c, side) => self.container_mut(c).push_boundary(side, id),
        }

        Ok(id)
    }

    fn container_mut(&mut self, id: CircuitId) -> &mut crate::container::Container {
        match self.instances[id.0].circuit.as_container_mut() {
            Some(container) => container,
            None => unreachable!("placement checked before append"),
        }
    }
}

impl Index<CircuitId> for CircuitGraph {
    type Output = Instance;

    fn index(&self, id: CircuitId) -> &Instance {
        &self.instances[id.0]
    }
}

impl IndexMut<CircuitId> for CircuitGraph {
    fn index_mut(&mut self, id: CircuitId) -> &mut Instance {
        &mut self.instances[id.0]
    }
}
