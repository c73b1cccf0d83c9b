//! Passthrough relay

use crate::circuit::{Circuit, Ports};

/// Relay: 1→1, y = u
///
/// Containers use relays as their boundary channels. Made eager, a relay
/// forwards a value to later circuits within the same step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Relay;

impl Circuit for Relay {
    #[inline]
    fn update(&mut self, ports: &mut Ports<'_>) {
        let u = ports.input(0);
        ports.set_output(0, u);
    }
}
