//! Container composition
//!
//! A container is a circuit whose turn in the schedule runs a private,
//! ordered list of sub-circuits. Its external ports are boundary relays:
//! input-side relays carry values in, output-side relays carry values out.
//! Everything lives in the same graph and arena; the container only holds
//! indices.

use crate::arena::ChannelId;
use crate::circuit::{Circuit, Ports};
use crate::error::Direction;
use crate::graph::CircuitId;
use crate::machine::Machine;

/// Which boundary list of a container
pub type Boundary = Direction;

#[derive(Debug, Clone)]
pub struct Container {
    sub_circuits: Vec<CircuitId>,
    boundary_in: Vec<CircuitId>,
    boundary_out: Vec<CircuitId>,
    clock: ChannelId,
}

impl Container {
    pub fn new(clock: ChannelId) -> Self {
        Self {
            sub_circuits: Vec::new(),
            boundary_in: Vec::new(),
            boundary_out: Vec::new(),
            clock,
        }
    }

    /// Sub-circuits in private registration order
    pub fn sub_circuits(&self) -> &[CircuitId] {
        &self.sub_circuits
    }

    pub fn boundary(&self, side: Boundary) -> &[CircuitId] {
        match side {
            Direction::Input => &self.boundary_in,
            Direction::Output => &self.boundary_out,
        }
    }

    /// Private clock channel, advanced at the start of every turn
    pub fn clock(&self) -> ChannelId {
        self.clock
    }

    /// Declared (inputs, outputs)
    pub fn arity(&self) -> (usize, usize) {
        (self.boundary_in.len(), self.boundary_out.len())
    }

    pub(crate) fn push_sub(&mut self, id: CircuitId) {
        self.sub_circuits.push(id);
    }

    pub(crate) fn push_boundary(&mut self, side: Boundary, id: CircuitId) {
        match side {
            Direction::Input => self.boundary_in.push(id),
            Direction::Output => self.boundary_out.push(id),
        }
    }
}

impl Circuit for Container {
    /// Containers are driven by [`Machine::update_container`]; the plain
    /// behaviour hook has nothing to do.
    fn update(&mut self, _ports: &mut Ports<'_>) {}

    fn int_params(&self) -> Vec<i64> {
        vec![
            self.sub_circuits.len() as i64,
            self.boundary_in.len() as i64,
            self.boundary_out.len() as i64,
            self.clock.index() as i64,
        ]
    }
}

impl Machine {
    /// One turn of a container:
    ///
    /// 1. advance the private clock
    /// 2. copy each input relay's source into its output, visible at once
    /// 3. run the sub-circuits in their registration order
    /// 4. copy each output relay's source into its pending output, and
    ///    commit it too when the container is eager
    pub(crate) fn update_container(&mut self, id: CircuitId) {
        let Some(container) = self.graph[id].circuit().as_container() else {
            return;
        };
        let clock = container.clock();
        let subs = container.sub_circuits().to_vec();
        let inputs = container.boundary(Direction::Input).to_vec();
        let outputs = container.boundary(Direction::Output).to_vec();
        let eager = self.graph[id].is_eager();
        let dt = self.settings.dt;

        self.arena.advance(clock, dt);

        for relay in inputs {
            let (src, dst) = self.relay_channels(relay);
            let value = self.arena.read(src);
            self.arena.set(dst, value);
        }

        for sub in subs {
            self.run_instance(sub);
        }

        for relay in outputs {
            let (src, dst) = self.relay_channels(relay);
            let value = self.arena.read(src);
            self.arena.write_pending(dst, value);
            if eager {
                self.arena.commit(dst);
            }
        }
    }

    fn relay_channels(&self, relay: CircuitId) -> (ChannelId, ChannelId) {
        let instance = &self.graph[relay];
        (instance.inputs()[0], instance.outputs()[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_lists_grow_independently() {
        let mut container = Container::new(ChannelId::new(5));
        container.push_boundary(Direction::Input, CircuitId::new(1));
        container.push_boundary(Direction::Input, CircuitId::new(2));
        container.push_boundary(Direction::Output, CircuitId::new(3));
        container.push_sub(CircuitId::new(4));

        assert_eq!(container.arity(), (2, 1));
        assert_eq!(
            container.boundary(Direction::Input),
            &[CircuitId::new(1), CircuitId::new(2)]
        );
        assert_eq!(container.sub_circuits(), &[CircuitId::new(4)]);
        assert_eq!(container.int_params(), vec![1, 2, 1, 5]);
        assert_eq!(container.clock(), ChannelId::new(5));
    }
}
