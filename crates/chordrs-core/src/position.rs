// Chordrs Key Position Type
// Identifies a single physical key location on the scan matrix

use std::fmt;

/// Identifies a single physical key on the keyboard matrix.
///
/// This is a newtype wrapper around u16 for type safety. Positions are
/// assigned by the scan matrix and stable for the lifetime of the device;
/// they carry no keycode meaning of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct KeyPosition(pub u16);

impl KeyPosition {
    /// Get the raw numeric position value
    pub fn index(self) -> u16 {
        self.0
    }
}

impl From<u16> for KeyPosition {
    fn from(index: u16) -> Self {
        KeyPosition(index)
    }
}

impl From<KeyPosition> for u16 {
    fn from(position: KeyPosition) -> Self {
        position.0
    }
}

impl fmt::Display for KeyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos{}", self.0)
    }
}
