//! Channel arena
//!
//! Two parallel value buffers, `current` and `pending`, indexed by
//! [`ChannelId`]. Channels are handed out in contiguous runs and never
//! freed, so an id stays valid for the lifetime of the arena.

/// Index of a channel in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(usize);

impl ChannelId {
    /// Channel 0 holds elapsed simulation time
    pub const TIME: ChannelId = ChannelId(0);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Growable storage for committed and pending channel values
///
/// Out-of-range access is a programming error and panics through slice
/// indexing; every id handed out by [`ChannelArena::allocate`] is in bounds.
#[derive(Debug, Clone)]
pub struct ChannelArena {
    current: Vec<f64>,
    pending: Vec<f64>,
}

impl Default for ChannelArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelArena {
    /// Create an arena holding only the time channel
    pub fn new() -> Self {
        Self {
            current: vec![0.0],
            pending: vec![0.0],
        }
    }

    /// Number of allocated channels, time channel included
    #[inline]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// The time channel is always present
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Extend both buffers by `n` zeroed slots, returning the first new id
    pub fn allocate(&mut self, n: usize) -> ChannelId {
        debug_assert_eq!(self.current.len(), self.pending.len());
        let first = ChannelId(self.current.len());
        self.current.resize(first.0 + n, 0.0);
        self.pending.resize(first.0 + n, 0.0);
        first
    }

    /// Ids of a contiguous run starting at `first`
    pub fn run(first: ChannelId, n: usize) -> impl Iterator<Item = ChannelId> {
        (first.0..first.0 + n).map(ChannelId)
    }

    /// Whether `ch` was handed out by this arena
    #[inline]
    pub fn contains(&self, ch: ChannelId) -> bool {
        ch.0 < self.current.len()
    }

    /// Committed value
    #[inline]
    pub fn read(&self, ch: ChannelId) -> f64 {
        self.current[ch.0]
    }

    /// Value written this step, not yet committed
    #[inline]
    pub fn pending(&self, ch: ChannelId) -> f64 {
        self.pending[ch.0]
    }

    #[inline]
    pub fn write_pending(&mut self, ch: ChannelId, value: f64) {
        self.pending[ch.0] = value;
    }

    /// Write both buffers, making `value` visible immediately
    #[inline]
    pub fn set(&mut self, ch: ChannelId, value: f64) {
        self.current[ch.0] = value;
        self.pending[ch.0] = value;
    }

    /// current := pending for one channel
    #[inline]
    pub fn commit(&mut self, ch: ChannelId) {
        self.current[ch.0] = self.pending[ch.0];
    }

    /// current := pending for every channel
    pub fn commit_all(&mut self) {
        self.current.copy_from_slice(&self.pending);
    }

    /// Add `dt` to both buffers of a clock channel
    #[inline]
    pub fn advance(&mut self, ch: ChannelId, dt: f64) {
        self.pending[ch.0] += dt;
        self.current[ch.0] = self.pending[ch.0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_arena_holds_time_channel() {
        let arena = ChannelArena::new();
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.read(ChannelId::TIME), 0.0);
    }

    #[test]
    fn test_allocate_is_contiguous_and_zeroed() {
        let mut arena = ChannelArena::new();
        let a = arena.allocate(3);
        let b = arena.allocate(2);

        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 4);
        assert_eq!(arena.len(), 6);
        for ch in ChannelArena::run(a, 5) {
            assert_eq!(arena.read(ch), 0.0);
            assert_eq!(arena.pending(ch), 0.0);
        }
    }

    #[test]
    fn test_allocate_zero_returns_next_index() {
        let mut arena = ChannelArena::new();
        let first = arena.allocate(0);
        assert_eq!(first.index(), 1);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_pending_is_invisible_until_commit() {
        let mut arena = ChannelArena::new();
        let ch = arena.allocate(1);

        arena.write_pending(ch, 4.5);
        assert_eq!(arena.read(ch), 0.0);
        assert_eq!(arena.pending(ch), 4.5);

        arena.commit(ch);
        assert_eq!(arena.read(ch), 4.5);
    }

    #[test]
    fn test_commit_all_and_advance() {
        let mut arena = ChannelArena::new();
        let ch = arena.allocate(2);
        arena.write_pending(ch, 1.0);
        arena.write_pending(ChannelId::new(ch.index() + 1), 2.0);
        arena.commit_all();
        assert_eq!(arena.read(ch), 1.0);
        assert_eq!(arena.read(ChannelId::new(2)), 2.0);

        arena.advance(ChannelId::TIME, 0.25);
        arena.advance(ChannelId::TIME, 0.25);
        assert_eq!(arena.read(ChannelId::TIME), 0.5);
        assert_eq!(arena.pending(ChannelId::TIME), 0.5);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds_read_panics() {
        let arena = ChannelArena::new();
        arena.read(ChannelId::new(7));
    }
}
