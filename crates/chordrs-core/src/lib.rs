// Chordrs Core Library
// Combo resolution engine for keyboard input pipelines
//
// Disambiguates key-press events flowing over an ordered event bus: key
// positions configured as a combo and pressed within a bounded time window
// resolve to one synthesized action instead of independent keystrokes. The
// engine is a single bus listener plus a single deferred timeout callback,
// with fixed-capacity working sets that fail open on overflow.

pub mod active;
pub mod buffer;
pub mod candidate;
pub mod config;
pub mod definition;
pub mod engine;
pub mod event;
pub mod position;
pub mod registry;
pub mod timeout;

pub use active::{ActiveComboTable, ReleaseOutcome, MAX_ACTIVE_COMBOS};
pub use buffer::{PressedKeyBuffer, MAX_CAPTURED_KEYS};
pub use candidate::{Candidate, CandidateSet, MAX_CANDIDATES};
pub use config::{ComboConfig, ComboSpec, ConfigError};
pub use definition::{
    ActionHandle, ComboDefinition, DefinitionError, LayerFilter, LayerId, MAX_KEYS_PER_COMBO,
};
pub use engine::{ComboEngine, ComboHost};
pub use event::{KeyState, ListenerResult, PositionEvent};
pub use position::KeyPosition;
pub use registry::{ComboRegistry, DefId, MAX_COMBOS_PER_KEY};
pub use timeout::TimeoutGovernor;
