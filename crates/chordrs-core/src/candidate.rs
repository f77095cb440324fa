// Chordrs Candidate Tracker
// Live set of combo definitions still consistent with the open window

use smallvec::SmallVec;

use crate::registry::{ComboRegistry, DefId, MAX_COMBOS_PER_KEY};
use crate::{KeyPosition, LayerId};

/// Maximum number of simultaneously live candidates.
///
/// A window is seeded from a single index slot, so this can never be exceeded
/// while [`MAX_COMBOS_PER_KEY`] bounds the slot length.
pub const MAX_CANDIDATES: usize = MAX_COMBOS_PER_KEY;

/// A definition still consistent with every key pressed in the open window,
/// paired with the absolute deadline by which it must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub def: DefId,
    /// First relevant key-down timestamp plus the definition's timeout
    pub deadline_ms: u64,
}

/// The fixed-capacity candidate set of one ambiguity window.
///
/// Candidates are kept in registry index order (arity descending, id
/// ascending), identical to every index slot, so intersecting against a slot
/// is a single linear merge. An empty set means no window is open.
#[derive(Debug, Default)]
pub struct CandidateSet {
    live: SmallVec<[Candidate; MAX_CANDIDATES]>,
}

impl CandidateSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live candidates
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Check if no candidates are live (no window is open)
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Drop all candidates
    pub fn clear(&mut self) {
        self.live.clear();
    }

    /// Iterate over live candidates in sort order
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.live.iter()
    }

    /// The earliest deadline among live candidates
    pub fn min_deadline(&self) -> Option<u64> {
        self.live.iter().map(|c| c.deadline_ms).min()
    }

    /// Seed the set for a new window from the index slot of the first pressed
    /// position, keeping only definitions eligible on the active layer.
    /// Returns the number of candidates seeded.
    pub fn seed(
        &mut self,
        registry: &ComboRegistry,
        position: KeyPosition,
        layer: LayerId,
        now_ms: u64,
    ) -> usize {
        self.live.clear();
        for &id in registry.slot(position) {
            let definition = registry.definition(id);
            if !definition.eligible_on(layer) {
                continue;
            }
            self.live.push(Candidate {
                def: id,
                deadline_ms: now_ms.saturating_add(definition.timeout_ms()),
            });
        }
        self.live.len()
    }

    /// Drop candidates whose deadline has already passed (deadline at or
    /// before `now_ms`). Returns the number of survivors.
    pub fn prune_expired(&mut self, now_ms: u64) -> usize {
        self.live.retain(|candidate| candidate.deadline_ms > now_ms);
        self.live.len()
    }

    /// Keep only candidates whose definition also covers the newly pressed
    /// position, i.e. is present in `slot`. Both sides share the same sort
    /// order, so a single merge pass suffices. Returns the survivor count.
    pub fn intersect(&mut self, registry: &ComboRegistry, slot: &[DefId]) -> usize {
        let mut kept: SmallVec<[Candidate; MAX_CANDIDATES]> = SmallVec::new();
        let mut si = 0;
        for candidate in &self.live {
            let key = registry.sort_key(candidate.def);
            while si < slot.len() && registry.sort_key(slot[si]) < key {
                si += 1;
            }
            if si < slot.len() && slot[si] == candidate.def {
                kept.push(*candidate);
                si += 1;
            }
        }
        self.live = kept;
        self.live.len()
    }
}
