//! Construction and wiring errors

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::arena::ChannelId;
use crate::graph::CircuitId;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a circuit a slot lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

/// Structural errors raised while a graph is being built or wired.
///
/// Behaviours never fail at step time; everything here is reported to the
/// host at construction time and also accumulated by the machine, hence
/// `Clone` with shared sources.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("circuit kind [{name}] was not found")]
    UnknownKind { name: String },

    #[error("circuit kind [{name}] is already registered")]
    DuplicateKind { name: String },

    #[error("type [{name}] is not a {expected} circuit")]
    KindMismatch { name: String, expected: &'static str },

    #[error("invalid argument for {kind}: {message}")]
    InvalidArgument { kind: &'static str, message: String },

    #[error("cannot open sink destination {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("circuit {0} does not exist")]
    NoSuchCircuit(CircuitId),

    #[error("circuit {circuit} has no {direction} slot {slot}")]
    NoSuchSlot {
        circuit: CircuitId,
        slot: usize,
        direction: Direction,
    },

    #[error("channel {0} does not exist")]
    NoSuchChannel(ChannelId),

    #[error("circuit {0} is not a container")]
    NotAContainer(CircuitId),

    #[error("circuit {0} is not a sink")]
    NotASink(CircuitId),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("settings file could not be parsed: {0}")]
    SettingsFormat(#[source] Arc<serde_json::Error>),

    #[error("settings file could not be read: {0}")]
    SettingsIo(#[source] Arc<io::Error>),

    #[error("{count} construction error(s) have not been acknowledged")]
    Unacknowledged { count: usize },
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SettingsFormat(Arc::new(err))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::SettingsIo(Arc::new(err))
    }
}
