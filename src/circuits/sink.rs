//! Data sink: writes tracked channel values as text lines
//!
//! Each activation writes one line holding every tracked channel, in
//! registration order, as a fixed-width `{:15.8}` field followed by a space.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::arena::ChannelId;
use crate::circuit::{Circuit, Ports};
use crate::error::{Error, Result};
use crate::utils::constants::{SINK_FIELD_PRECISION, SINK_FIELD_WIDTH};

/// Periodic or triggered line writer: 1→0
///
/// # Modes
///
/// - Periodic: while the `record` input is unconnected, a line is written
///   every `dump` steps. `dump = 0` never writes.
/// - Triggered: once `record` has been wired to another circuit, a line is
///   written on every step where `record > 0`.
///
/// The destination is held until [`Circuit::release`] is called by the
/// machine's shutdown pass, which flushes and closes it exactly once.
pub struct Sink {
    writer: Option<Box<dyn Write + Send>>,
    dump: usize,
    counter: usize,
    channels: Vec<ChannelId>,
    lines: u64,
    failed: bool,
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("open", &self.writer.is_some())
            .field("dump", &self.dump)
            .field("counter", &self.counter)
            .field("channels", &self.channels)
            .field("lines", &self.lines)
            .finish()
    }
}

impl Sink {
    /// Create the file at `path`, truncating it
    pub fn create(path: impl AsRef<Path>, dump: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::ResourceUnavailable {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Ok(Self::from_writer(BufWriter::new(file), dump))
    }

    /// Write to any destination
    pub fn from_writer(writer: impl Write + Send + 'static, dump: usize) -> Self {
        Self {
            writer: Some(Box::new(writer)),
            dump,
            counter: 0,
            channels: Vec::new(),
            lines: 0,
            failed: false,
        }
    }

    /// Append a channel to every future line
    pub fn track(&mut self, ch: ChannelId) {
        self.channels.push(ch);
    }

    pub fn tracked(&self) -> &[ChannelId] {
        &self.channels
    }

    /// Lines written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn write_line(&mut self, ports: &Ports<'_>) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };

        let mut line = String::with_capacity((SINK_FIELD_WIDTH + 1) * self.channels.len() + 1);
        for &ch in &self.channels {
            let _ = write!(
                line,
                "{:w$.p$} ",
                ports.channel(ch),
                w = SINK_FIELD_WIDTH,
                p = SINK_FIELD_PRECISION
            );
        }
        line.push('\n');

        match writer.write_all(line.as_bytes()) {
            Ok(()) => self.lines += 1,
            Err(err) if !self.failed => {
                warn!(error = %err, "sink write failed; further failures are not reported");
                self.failed = true;
            }
            Err(_) => {}
        }
    }
}

impl Circuit for Sink {
    fn update(&mut self, ports: &mut Ports<'_>) {
        if ports.is_connected(0) {
            if ports.input(0) > 0.0 {
                self.write_line(ports);
            }
            return;
        }

        if self.dump == 0 {
            return;
        }
        self.counter += 1;
        if self.counter == self.dump {
            self.counter = 0;
            self.write_line(ports);
        }
    }

    fn int_params(&self) -> Vec<i64> {
        let mut params = vec![self.dump as i64, self.channels.len() as i64];
        params.extend(self.channels.iter().map(|ch| ch.index() as i64));
        params
    }

    fn release(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(err) = writer.flush() {
                warn!(error = %err, "sink flush failed on release");
            }
        }
    }
}

/// Shared in-memory destination, handy for inspecting sink output
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as UTF-8
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "buffer lock poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::testing::Harness;

    #[test]
    fn test_periodic_dump() {
        let buffer = SharedBuffer::new();
        let mut sink = Sink::from_writer(buffer.clone(), 2);
        let mut h = Harness::new(1, 0, 0.5);
        sink.track(ChannelId::TIME);

        for _ in 0..5 {
            h.step(&mut sink);
        }

        assert_eq!(sink.lines(), 2);
        assert_eq!(
            buffer.contents(),
            format!("{:15.8} \n{:15.8} \n", 0.5, 1.5)
        );
    }

    #[test]
    fn test_zero_dump_never_writes() {
        let buffer = SharedBuffer::new();
        let mut sink = Sink::from_writer(buffer.clone(), 0);
        let mut h = Harness::new(1, 0, 0.1);
        sink.track(ChannelId::TIME);
        for _ in 0..10 {
            h.step(&mut sink);
        }
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn test_triggered_mode_when_record_is_wired() {
        let buffer = SharedBuffer::new();
        let mut sink = Sink::from_writer(buffer.clone(), 1);
        let mut h = Harness::new(1, 0, 0.1);
        let trigger = h.arena.allocate(1);
        h.inputs[0] = trigger;
        sink.track(trigger);

        h.step(&mut sink);
        h.arena.set(trigger, 1.0);
        h.step(&mut sink);
        h.arena.set(trigger, -1.0);
        h.step(&mut sink);

        assert_eq!(sink.lines(), 1);
        assert_eq!(buffer.contents(), format!("{:15.8} \n", 1.0));
    }

    #[test]
    fn test_release_closes_once() {
        let mut sink = Sink::from_writer(SharedBuffer::new(), 1);
        assert!(sink.is_open());
        sink.release();
        assert!(!sink.is_open());
        sink.release();
        assert!(!sink.is_open());
    }

    #[test]
    fn test_create_reports_unavailable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        let err = Sink::create(&path, 1).unwrap_err();
        assert!(matches!(err, Error::ResourceUnavailable { .. }));
    }
}
