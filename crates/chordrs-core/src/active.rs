// Chordrs Active-Instance Table
// Bookkeeping for activated combos awaiting their constituent key releases

use smallvec::SmallVec;

use crate::definition::MAX_KEYS_PER_COMBO;
use crate::registry::{ComboRegistry, DefId};
use crate::{ComboDefinition, KeyPosition, PositionEvent};

/// Maximum number of simultaneously held activated combos.
pub const MAX_ACTIVE_COMBOS: usize = 4;

/// An activated combo waiting for its constituent keys to be released.
///
/// One slot per required position, in the definition's position order. Slots
/// are filled from the pressed-key buffer at activation and cleared as
/// key-ups arrive; the instance is destroyed once every slot is empty.
#[derive(Debug)]
struct ActiveCombo {
    def: DefId,
    slots: SmallVec<[Option<PositionEvent>; MAX_KEYS_PER_COMBO]>,
}

impl ActiveCombo {
    fn new(def: DefId, definition: &ComboDefinition, captured: &[PositionEvent]) -> Self {
        let slots = definition
            .positions()
            .iter()
            .map(|&position| captured.iter().find(|ev| ev.position == position).copied())
            .collect();
        Self { def, slots }
    }
}

/// What a key-up matched in the table.
#[derive(Debug, Default)]
pub struct ReleaseOutcome {
    /// True if some instance held the position; the key-up is consumed
    pub consumed: bool,
    /// Instances whose release policy fired on this key-up
    pub fired: SmallVec<[DefId; 2]>,
}

/// The live set of activated combos.
#[derive(Debug, Default)]
pub struct ActiveComboTable {
    instances: SmallVec<[ActiveCombo; MAX_ACTIVE_COMBOS]>,
}

impl ActiveComboTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if no combos are active
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Whether another instance can be allocated
    pub fn has_capacity(&self) -> bool {
        self.instances.len() < MAX_ACTIVE_COMBOS
    }

    /// Install an instance for a winning definition. The caller has already
    /// checked [`has_capacity`](Self::has_capacity) and moved `captured` out
    /// of the pressed-key buffer.
    pub fn activate(&mut self, def: DefId, definition: &ComboDefinition, captured: &[PositionEvent]) {
        self.instances.push(ActiveCombo::new(def, definition, captured));
    }

    /// Apply a key-up at `position` to every instance holding it.
    ///
    /// Clears the matching slot and releases its held event. The release
    /// policy is structural: a fast-release instance fires when every slot
    /// was still full before this key-up (i.e. on the first constituent
    /// release), a slow-release instance fires once every slot is empty (the
    /// last release). Either way the policy fires exactly once per instance.
    /// Instances left with all slots empty are destroyed, compacting the
    /// table.
    pub fn release_position(
        &mut self,
        position: KeyPosition,
        registry: &ComboRegistry,
    ) -> ReleaseOutcome {
        let mut outcome = ReleaseOutcome::default();
        let mut idx = 0;
        while idx < self.instances.len() {
            let instance = &mut self.instances[idx];
            let mut matched = false;
            let mut all_full_before = true;
            for slot in instance.slots.iter_mut() {
                match slot {
                    Some(ev) if ev.position == position => {
                        *slot = None;
                        matched = true;
                    }
                    Some(_) => {}
                    None => all_full_before = false,
                }
            }
            if matched {
                outcome.consumed = true;
                let all_empty = instance.slots.iter().all(Option::is_none);
                let slow = registry.definition(instance.def).slow_release();
                if (slow && all_empty) || (!slow && all_full_before) {
                    outcome.fired.push(instance.def);
                }
                if all_empty {
                    log::debug!("combo {} fully released", instance.def);
                    self.instances.remove(idx);
                    continue;
                }
            }
            idx += 1;
        }
        outcome
    }
}
