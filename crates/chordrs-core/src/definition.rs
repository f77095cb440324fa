// Chordrs Combo Definition
// Static description of one key-position combination and its bound action

use smallvec::SmallVec;

use crate::KeyPosition;

/// Maximum number of key positions a single combo may require.
///
/// This also sizes the slot array of an active instance, so it is a hard
/// limit rather than a tunable default.
pub const MAX_KEYS_PER_COMBO: usize = 4;

/// Layer identifier as reported by the host's layer query.
pub type LayerId = u8;

/// Opaque handle to a bound action.
///
/// The engine never interprets the handle; it is carried from configuration
/// to the host's press/release dispatch unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ActionHandle(pub u32);

/// Activation-layer predicate of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerFilter {
    /// Eligible regardless of the active layer
    Any,
    /// Eligible only while one of the listed layers is active
    Only(SmallVec<[LayerId; 4]>),
}

impl LayerFilter {
    /// Returns true if the definition is eligible while `layer` is active
    pub fn matches(&self, layer: LayerId) -> bool {
        match self {
            LayerFilter::Any => true,
            LayerFilter::Only(layers) => layers.contains(&layer),
        }
    }
}

/// Errors raised while constructing a combo definition
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("a combo requires at least two key positions, got {0}")]
    TooFewPositions(usize),

    #[error("a combo may span at most {MAX_KEYS_PER_COMBO} key positions, got {0}")]
    TooManyPositions(usize),

    #[error("duplicate key position {0}")]
    DuplicatePosition(KeyPosition),
}

/// One configured combo: a set of key positions that, pressed together within
/// `timeout_ms`, resolve to a single bound action instead of individual
/// keystrokes.
///
/// Definitions are immutable once registered. Specificity is the number of
/// required positions (`arity`); ties between definitions of equal arity are
/// broken by registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboDefinition {
    /// Required positions, stored sorted for order-independent matching
    positions: SmallVec<[KeyPosition; MAX_KEYS_PER_COMBO]>,
    timeout_ms: u64,
    slow_release: bool,
    action: ActionHandle,
    layers: LayerFilter,
}

impl ComboDefinition {
    /// Create a definition from its required positions.
    ///
    /// Defaults to fast release and eligibility on every layer; use
    /// [`with_slow_release`](Self::with_slow_release) and
    /// [`with_layers`](Self::with_layers) to override.
    pub fn new(
        positions: impl IntoIterator<Item = KeyPosition>,
        timeout_ms: u64,
        action: ActionHandle,
    ) -> Result<Self, DefinitionError> {
        let mut positions: SmallVec<[KeyPosition; MAX_KEYS_PER_COMBO]> =
            positions.into_iter().collect();
        if positions.len() < 2 {
            return Err(DefinitionError::TooFewPositions(positions.len()));
        }
        if positions.len() > MAX_KEYS_PER_COMBO {
            return Err(DefinitionError::TooManyPositions(positions.len()));
        }
        positions.sort();
        for pair in positions.windows(2) {
            if pair[0] == pair[1] {
                return Err(DefinitionError::DuplicatePosition(pair[0]));
            }
        }
        Ok(Self {
            positions,
            timeout_ms,
            slow_release: false,
            action,
            layers: LayerFilter::Any,
        })
    }

    /// Set the release policy (see [`slow_release`](Self::slow_release))
    pub fn with_slow_release(mut self, slow_release: bool) -> Self {
        self.slow_release = slow_release;
        self
    }

    /// Restrict eligibility to the given layers
    pub fn with_layers(mut self, layers: impl IntoIterator<Item = LayerId>) -> Self {
        self.layers = LayerFilter::Only(layers.into_iter().collect());
        self
    }

    /// Required positions, sorted ascending
    pub fn positions(&self) -> &[KeyPosition] {
        &self.positions
    }

    /// Number of required positions; the definition's specificity
    pub fn arity(&self) -> usize {
        self.positions.len()
    }

    /// Window length granted to complete this combo
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// If true, the release action fires after the *last* constituent key-up;
    /// otherwise after the first.
    pub fn slow_release(&self) -> bool {
        self.slow_release
    }

    /// The bound action handle
    pub fn action(&self) -> ActionHandle {
        self.action
    }

    /// The activation-layer predicate
    pub fn layers(&self) -> &LayerFilter {
        &self.layers
    }

    /// Returns true if `position` is one of the required positions
    pub fn requires(&self, position: KeyPosition) -> bool {
        self.positions.binary_search(&position).is_ok()
    }

    /// The lowest required position; used as the position argument of the
    /// opaque press/release callbacks.
    pub fn anchor(&self) -> KeyPosition {
        self.positions[0]
    }

    /// Returns true if the definition is eligible while `layer` is active
    pub fn eligible_on(&self, layer: LayerId) -> bool {
        self.layers.matches(layer)
    }
}
