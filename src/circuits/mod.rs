//! Circuit kind library

mod control;
mod delay;
mod differentiator;
mod filters;
mod interpolation;
mod logic;
mod math;
mod processing;
mod relay;
mod sink;
mod sources;

pub use control::{Limiter, Pi, Pid};
pub use delay::Delay;
pub use differentiator::{Derivative, Integral};
pub use filters::{Bandpass, Highpass, Lowpass, RcHighpass, RcLowpass};
pub use interpolation::{Grid3, Trilinear};
pub use logic::{Compare, CompareOp, FlipFlop, FlipFlopKind, Logic, LogicOp};
pub use math::{Gain, Math, MathOp};
pub use processing::{Average, Flip, MinMax, PeakDetector, Phasor, WindowAverage};
pub use relay::Relay;
pub use sink::{SharedBuffer, Sink};
pub use sources::Oscillator;
