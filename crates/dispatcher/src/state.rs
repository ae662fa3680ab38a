//! Dispatcher lifecycle state

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one dispatcher: `Running -> Closing -> Closed`, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Receiving, draining and flushing
    Running = 0,
    /// Queue closed; final drain-and-flush in progress
    Closing = 1,
    /// Worker acknowledged shutdown and exited
    Closed = 2,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Running,
            1 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Atomic cell shared by the handle and the worker
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(DispatcherState::Running as u8))
    }

    pub(crate) fn get(&self) -> DispatcherState {
        DispatcherState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move forward to `next`; a later state is never overwritten by an earlier one.
    pub(crate) fn advance(&self, next: DispatcherState) {
        self.0.fetch_max(next as u8, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_only_moves_forward() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), DispatcherState::Running);

        cell.advance(DispatcherState::Closed);
        cell.advance(DispatcherState::Closing);
        assert_eq!(cell.get(), DispatcherState::Closed);
    }
}
