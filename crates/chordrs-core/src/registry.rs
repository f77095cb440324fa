// Chordrs Definition Registry
// Immutable combo table with a per-position index for candidate seeding

use std::cmp::Reverse;
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::{ComboDefinition, KeyPosition};

/// Maximum number of definitions indexed under one key position.
///
/// A position whose index slot is full simply has one fewer usable combo;
/// registration of the rest of the definition still succeeds.
pub const MAX_COMBOS_PER_KEY: usize = 5;

/// Identifier of a registered definition.
///
/// Assigned in registration order, which doubles as the tie-break id between
/// definitions of equal arity.
pub type DefId = u16;

/// Immutable table of combo definitions plus a per-position index into it.
///
/// Built once at startup, read-only while the engine processes events. Each
/// index slot is kept sorted by arity descending, then id ascending, so the
/// candidate set seeded from a slot can be intersected against any other slot
/// in a single linear merge.
#[derive(Debug, Default)]
pub struct ComboRegistry {
    definitions: Vec<ComboDefinition>,
    index: HashMap<KeyPosition, SmallVec<[DefId; MAX_COMBOS_PER_KEY]>>,
}

impl ComboRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if no definitions are registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Insert a definition into the table and into every covered position's
    /// index slot.
    ///
    /// A full slot is a per-position capacity error: it is logged and the
    /// definition is skipped for that position only (fail-open). Returns the
    /// assigned definition id.
    pub fn register(&mut self, definition: ComboDefinition) -> DefId {
        let id = self.definitions.len() as DefId;
        let key = (Reverse(definition.arity()), id);
        for &position in definition.positions() {
            let definitions = &self.definitions;
            let slot = self.index.entry(position).or_default();
            if slot.len() >= MAX_COMBOS_PER_KEY {
                log::warn!(
                    "index slot for {position} is full ({MAX_COMBOS_PER_KEY}); \
                     combo {id} will not match on it"
                );
                continue;
            }
            let at = slot
                .iter()
                .position(|&other| key < (Reverse(definitions[other as usize].arity()), other))
                .unwrap_or(slot.len());
            slot.insert(at, id);
        }
        self.definitions.push(definition);
        id
    }

    /// Look up a registered definition by id.
    ///
    /// Ids are only produced by [`register`](Self::register); an out-of-range
    /// id is a caller bug and panics.
    pub fn definition(&self, id: DefId) -> &ComboDefinition {
        &self.definitions[id as usize]
    }

    /// Definitions covering `position`, in slot sort order. Empty when the
    /// position participates in no combo.
    pub fn slot(&self, position: KeyPosition) -> &[DefId] {
        self.index
            .get(&position)
            .map(|slot| slot.as_slice())
            .unwrap_or(&[])
    }

    /// The slot ordering key of a registered definition: arity descending,
    /// then id ascending.
    pub(crate) fn sort_key(&self, id: DefId) -> (Reverse<usize>, DefId) {
        (Reverse(self.definition(id).arity()), id)
    }
}
