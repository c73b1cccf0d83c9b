//! circuitsim - Fixed-timestep synchronous dataflow simulation kernel
//!
//! A graph of circuits, each reading and writing numbered channels in a
//! shared arena, stepped forward in lockstep to simulate coupled control
//! loops, filters, logic and signal generators.
//!
//! # Architecture
//!
//! - Channels live in a [`ChannelArena`] holding committed and pending
//!   values. Channel 0 is elapsed time.
//! - Circuits are appended to an append-only [`CircuitGraph`]; registration
//!   order is evaluation order.
//! - Behaviours are a closed enum ([`CircuitKind`]) resolved by name through
//!   the [`KindRegistry`] once, at construction.
//! - Outputs are committed at the end of the step, or straight away for
//!   eager circuits.
//! - A [`Container`] runs a private sub-graph inside its own turn and looks
//!   like any other circuit from outside.
//!
//! # Example
//!
//! ```rust,ignore
//! use circuitsim::prelude::*;
//!
//! let mut machine = Machine::new();
//! let product = machine.add_math("opMUL", 3)?;
//! for (slot, value) in [2.0, 3.0, 5.0].into_iter().enumerate() {
//!     machine.set_external_input(product, slot, value)?;
//! }
//! machine.run(1)?;
//! assert_eq!(machine.output_value(product, 0)?, 30.0);
//! ```

pub mod arena;
pub mod circuit;
pub mod circuit_kind;
pub mod circuits;
pub mod container;
pub mod error;
pub mod factory;
pub mod graph;
pub mod machine;
pub mod registry;
pub mod settings;
pub mod utils;

pub use arena::{ChannelArena, ChannelId};
pub use circuit::{Circuit, Ports};
pub use circuit_kind::CircuitKind;
pub use container::{Boundary, Container};
pub use error::{Direction, Error, Result};
pub use factory::{Factory, Scope};
pub use graph::{Blueprint, CircuitGraph, CircuitId, Instance, Placement};
pub use machine::{Machine, PortValue, Report};
pub use registry::{Behavior, Family, KindRegistry};
pub use settings::Settings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::arena::ChannelId;
    pub use crate::circuits::{Grid3, SharedBuffer};
    pub use crate::error::{Direction, Error, Result};
    pub use crate::factory::Factory;
    pub use crate::graph::CircuitId;
    pub use crate::machine::Machine;
    pub use crate::registry::Behavior;
    pub use crate::settings::Settings;
}
