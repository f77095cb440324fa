// Chordrs Resolution Engine
// Listener-side state machine that opens, tracks and resolves ambiguity windows

use crate::active::ActiveComboTable;
use crate::buffer::PressedKeyBuffer;
use crate::candidate::CandidateSet;
use crate::registry::{ComboRegistry, DefId};
use crate::timeout::TimeoutGovernor;
use crate::{ActionHandle, KeyPosition, KeyState, LayerId, ListenerResult, PositionEvent};

/// External collaborators of the engine, implemented by the host pipeline.
///
/// The host guarantees that the listener path and the timeout callback run on
/// one cooperative context and never concurrently; the engine does no
/// internal locking.
pub trait ComboHost {
    /// The currently active input layer
    fn active_layer(&self) -> LayerId;

    /// Deliver a resolved event outward. The event is consumed as resolved
    /// and will not be reprocessed by this engine.
    fn pass_key(&mut self, event: PositionEvent);

    /// Re-publish an event onto the bus as fresh input, to be delivered to
    /// every listener again (including this engine).
    fn republish(&mut self, event: PositionEvent);

    /// Arm the single deferred timeout for an absolute deadline. Replaces any
    /// previously armed deadline.
    fn schedule_timeout(&mut self, deadline_ms: u64);

    /// Disarm the deferred timeout. Idempotent: cancelling an unscheduled or
    /// already-fired timer is a no-op.
    fn cancel_timeout(&mut self);

    /// Combo activation callback for the bound action
    fn press_combo(&mut self, action: ActionHandle, position: KeyPosition, timestamp_ms: u64);

    /// Combo deactivation callback for the bound action
    fn release_combo(&mut self, action: ActionHandle, position: KeyPosition, timestamp_ms: u64);
}

/// The combo resolution engine: one bus listener plus one timeout callback.
///
/// State machine: Idle (no candidates) -> Open (candidates and captured keys
/// live) -> Idle again after resolution. A window resolves when the candidate
/// intersection empties, when the timeout fires with fewer than two
/// survivors, or when any key-up arrives while the window is open. Resolution
/// either activates the pending winner or replays every captured key in
/// arrival order.
///
/// All working sets are fixed-capacity and owned by the engine instance;
/// capacity overflow fails open (keys are delivered un-delayed, never
/// dropped).
#[derive(Debug)]
pub struct ComboEngine {
    registry: ComboRegistry,
    candidates: CandidateSet,
    buffer: PressedKeyBuffer,
    /// Most specific fully-pressed candidate, retained until resolution
    pending_winner: Option<DefId>,
    active: ActiveComboTable,
    governor: TimeoutGovernor,
}

impl ComboEngine {
    /// Create an engine over a registry built before the first event
    pub fn new(registry: ComboRegistry) -> Self {
        Self {
            registry,
            candidates: CandidateSet::new(),
            buffer: PressedKeyBuffer::new(),
            pending_winner: None,
            active: ActiveComboTable::new(),
            governor: TimeoutGovernor::new(),
        }
    }

    /// The definition registry backing this engine
    pub fn registry(&self) -> &ComboRegistry {
        &self.registry
    }

    /// Returns true while an ambiguity window is open
    pub fn window_open(&self) -> bool {
        !self.candidates.is_empty()
    }

    /// Bus listener entry point for key transition events
    pub fn on_position_event<H: ComboHost>(
        &mut self,
        event: PositionEvent,
        host: &mut H,
    ) -> ListenerResult {
        match event.state {
            KeyState::Down => self.on_key_down(event, host),
            KeyState::Up => self.on_key_up(event, host),
        }
    }

    /// Deferred-timeout entry point.
    ///
    /// The callback may wake up after its deadline was superseded by a new
    /// event; such stale fires are validated away and ignored.
    pub fn on_timeout<H: ComboHost>(&mut self, now_ms: u64, host: &mut H) {
        let Some(deadline) = self.governor.validate_fire(now_ms) else {
            log::debug!("stale timeout fire at {now_ms}ms ignored");
            return;
        };
        if self.candidates.prune_expired(deadline) < 2 {
            self.resolve(host);
        } else {
            self.governor.update(self.candidates.min_deadline(), host);
        }
    }

    fn on_key_down<H: ComboHost>(&mut self, event: PositionEvent, host: &mut H) -> ListenerResult {
        if !self.window_open() {
            let seeded = self.candidates.seed(
                &self.registry,
                event.position,
                host.active_layer(),
                event.timestamp_ms,
            );
            if seeded == 0 {
                return ListenerResult::Bubble;
            }
            if !self.buffer.capture(event) {
                // cannot delay the seed key; close the window it just opened
                self.candidates.clear();
                return ListenerResult::Bubble;
            }
            log::debug!("window opened by {event} with {seeded} candidate(s)");
            self.governor.update(self.candidates.min_deadline(), host);
            return ListenerResult::Captured;
        }

        self.candidates.prune_expired(event.timestamp_ms);
        let remaining = self
            .candidates
            .intersect(&self.registry, self.registry.slot(event.position));
        if !self.buffer.capture(event) {
            // every survivor requires the uncaptured position and can never
            // be satisfied; close the window now instead of letting it
            // linger until its timeout
            let replayed = self.resolve(host);
            if replayed > 1 {
                host.republish(event);
                return ListenerResult::Captured;
            }
            return ListenerResult::Bubble;
        }

        match remaining {
            0 => {
                // nothing is consistent with the new key; flush everything,
                // re-publishing the tail so it can be reprocessed
                self.resolve(host);
                ListenerResult::Captured
            }
            n => {
                // the most specific satisfied candidate becomes the pending
                // winner, but a still-viable more specific one gets its
                // chance to complete first
                if let Some(winner) = self.first_satisfied() {
                    self.pending_winner = Some(winner);
                    if n == 1 {
                        self.resolve(host);
                        return ListenerResult::Captured;
                    }
                }
                self.governor.update(self.candidates.min_deadline(), host);
                ListenerResult::Captured
            }
        }
    }

    fn on_key_up<H: ComboHost>(&mut self, event: PositionEvent, host: &mut H) -> ListenerResult {
        // a key-up can never belong to an unresolved combo; any open window
        // must resolve before the release is routed
        let replayed = if self.window_open() {
            self.resolve(host)
        } else {
            0
        };

        let outcome = self.active.release_position(event.position, &self.registry);
        for &def in &outcome.fired {
            let definition = self.registry.definition(def);
            host.release_combo(definition.action(), definition.anchor(), event.timestamp_ms);
        }
        if outcome.consumed {
            return ListenerResult::Handled;
        }
        if replayed > 1 {
            // the replay re-published key-downs behind this release; re-raise
            // it once so relative ordering survives reprocessing
            host.republish(event);
            return ListenerResult::Captured;
        }
        ListenerResult::Bubble
    }

    /// Close the open window.
    ///
    /// Activates the pending winner when its captured keys are all present;
    /// otherwise replays the buffer in arrival order. Returns the number of
    /// captured key-downs released back into the pipeline.
    fn resolve<H: ComboHost>(&mut self, host: &mut H) -> usize {
        self.governor.cancel(host);
        self.candidates.clear();
        if let Some(def) = self.pending_winner.take() {
            if self.try_activate(def, host) {
                return self.republish_leftovers(host);
            }
        }
        self.replay(host)
    }

    fn try_activate<H: ComboHost>(&mut self, def: DefId, host: &mut H) -> bool {
        if !self.active.has_capacity() {
            log::warn!("active combo table full; replaying keys instead of activating combo {def}");
            return false;
        }
        let definition = self.registry.definition(def);
        for &position in definition.positions() {
            if !self.buffer.contains(position) {
                log::error!("combo {def} resolved as winner but {position} was never captured; replaying");
                return false;
            }
        }
        let captured = self.buffer.extract(definition.positions());
        let Some(first) = captured.first().copied() else {
            log::error!("combo {def} resolved as winner with no captured keys; replaying");
            return false;
        };
        self.active.activate(def, definition, &captured);
        host.press_combo(definition.action(), definition.anchor(), first.timestamp_ms);
        log::debug!("activated combo {def} with press timestamp {}ms", first.timestamp_ms);
        true
    }

    /// Release the buffer in arrival order: the first key-down is delivered
    /// outward as resolved, every subsequent one is re-published so
    /// downstream listeners (including this engine) see it again.
    fn replay<H: ComboHost>(&mut self, host: &mut H) -> usize {
        let held = self.buffer.drain();
        for (i, event) in held.iter().enumerate() {
            if i == 0 {
                host.pass_key(*event);
            } else {
                host.republish(*event);
            }
        }
        held.len()
    }

    /// Captured keys that outlived the winning combo are no longer claimed by
    /// any window; re-publish them all for independent reprocessing.
    fn republish_leftovers<H: ComboHost>(&mut self, host: &mut H) -> usize {
        let held = self.buffer.drain();
        if !held.is_empty() {
            log::debug!("{} captured key(s) outlived the winner; re-publishing", held.len());
        }
        for event in &held {
            host.republish(*event);
        }
        held.len()
    }

    /// The first candidate in sort order whose required positions are all
    /// captured: the most specific satisfied one, ties broken by lowest id.
    fn first_satisfied(&self) -> Option<DefId> {
        self.candidates
            .iter()
            .map(|candidate| candidate.def)
            .find(|&def| self.is_fully_pressed(def))
    }

    fn is_fully_pressed(&self, def: DefId) -> bool {
        self.registry
            .definition(def)
            .positions()
            .iter()
            .all(|&position| self.buffer.contains(position))
    }
}
