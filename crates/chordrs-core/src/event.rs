// Chordrs Event Types
// Key transition events and listener return codes for the event bus

use std::fmt;

use crate::KeyPosition;

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Down,
    Up,
}

impl KeyState {
    /// Returns true if this is a key-down transition
    pub fn is_down(self) -> bool {
        matches!(self, KeyState::Down)
    }

    /// Returns true if this is a key-up transition
    pub fn is_up(self) -> bool {
        matches!(self, KeyState::Up)
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyState::Down => write!(f, "down"),
            KeyState::Up => write!(f, "up"),
        }
    }
}

/// A single key transition as delivered by the event bus.
///
/// The engine holds on to key-down events while a window is ambiguous, so the
/// whole event is kept (not just the position) and can be passed through or
/// re-published unchanged later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionEvent {
    pub position: KeyPosition,
    pub state: KeyState,
    /// Milliseconds on the host's monotonic clock
    pub timestamp_ms: u64,
}

impl PositionEvent {
    /// Shorthand for a key-down event
    pub fn down(position: KeyPosition, timestamp_ms: u64) -> Self {
        Self {
            position,
            state: KeyState::Down,
            timestamp_ms,
        }
    }

    /// Shorthand for a key-up event
    pub fn up(position: KeyPosition, timestamp_ms: u64) -> Self {
        Self {
            position,
            state: KeyState::Up,
            timestamp_ms,
        }
    }

    /// Returns true if this is a key-down transition
    pub fn is_down(&self) -> bool {
        self.state.is_down()
    }
}

impl fmt::Display for PositionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @{}ms", self.position, self.state, self.timestamp_ms)
    }
}

/// What the listener tells the bus to do with a delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerResult {
    /// Not ours; keep delivering to the remaining listeners unchanged
    Bubble,
    /// Retained for now; the event may be re-published later
    Captured,
    /// Fully consumed; no further delivery
    Handled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_predicates() {
        assert!(KeyState::Down.is_down());
        assert!(!KeyState::Down.is_up());
        assert!(KeyState::Up.is_up());
        assert!(!KeyState::Up.is_down());
    }

    #[test]
    fn test_event_shorthands() {
        let down = PositionEvent::down(KeyPosition(4), 100);
        assert!(down.is_down());
        assert_eq!(down.position, KeyPosition(4));
        assert_eq!(down.timestamp_ms, 100);

        let up = PositionEvent::up(KeyPosition(4), 150);
        assert!(!up.is_down());
        assert_eq!(up.state, KeyState::Up);
    }

    #[test]
    fn test_event_display() {
        let ev = PositionEvent::down(KeyPosition(2), 30);
        assert_eq!(ev.to_string(), "pos2 down @30ms");
    }
}
