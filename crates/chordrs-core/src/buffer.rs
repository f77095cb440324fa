// Chordrs Pressed-Key Buffer
// Ordered capture of raw key-down events not yet resolved

use smallvec::SmallVec;

use crate::definition::MAX_KEYS_PER_COMBO;
use crate::{KeyPosition, PositionEvent};

/// Maximum number of key-down events held while a window is ambiguous.
///
/// The limit can only be approached by very fast typing against very large
/// timeouts; overflow fails open rather than dropping input.
pub const MAX_CAPTURED_KEYS: usize = 8;

/// Append-only FIFO of captured key-down events, fixed capacity.
///
/// Entries keep the original bus event so a capture can later be passed
/// through or re-published unchanged. Lives only for the duration of one
/// ambiguity window.
#[derive(Debug, Default)]
pub struct PressedKeyBuffer {
    held: SmallVec<[PositionEvent; MAX_CAPTURED_KEYS]>,
}

impl PressedKeyBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of captured events
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Check if nothing is captured
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Returns true if a key-down at `position` is currently captured
    pub fn contains(&self, position: KeyPosition) -> bool {
        self.held.iter().any(|ev| ev.position == position)
    }

    /// Capture a key-down event.
    ///
    /// A full buffer fails open: the overflow is logged and `false` is
    /// returned so the caller lets the event through un-delayed instead of
    /// dropping it.
    pub fn capture(&mut self, event: PositionEvent) -> bool {
        if self.held.len() >= MAX_CAPTURED_KEYS {
            log::warn!(
                "pressed-key buffer full ({MAX_CAPTURED_KEYS}); \
                 passing {event} through un-delayed"
            );
            return false;
        }
        self.held.push(event);
        true
    }

    /// Move the oldest captured event for each of `positions` out of the
    /// buffer, compacting the remaining entries in place. Repeats of a
    /// position (key auto-repeat within one window) stay behind so they can
    /// still be replayed. Both the extracted events and the survivors keep
    /// their relative arrival order.
    pub fn extract(
        &mut self,
        positions: &[KeyPosition],
    ) -> SmallVec<[PositionEvent; MAX_KEYS_PER_COMBO]> {
        let mut taken: SmallVec<[PositionEvent; MAX_KEYS_PER_COMBO]> = SmallVec::new();
        self.held.retain(|ev| {
            if positions.contains(&ev.position)
                && !taken.iter().any(|t| t.position == ev.position)
            {
                taken.push(*ev);
                false
            } else {
                true
            }
        });
        taken
    }

    /// Take every captured event in arrival order, leaving the buffer empty
    pub fn drain(&mut self) -> SmallVec<[PositionEvent; MAX_CAPTURED_KEYS]> {
        std::mem::take(&mut self.held)
    }
}
