// Chordrs Timeout Governor
// Single outstanding deferred deadline for the earliest unresolved candidate

use crate::engine::ComboHost;

/// Tracks the engine's single scheduled timeout callback.
///
/// Every candidate mutation is funneled through [`update`](Self::update), so
/// the host timer is always armed for exactly the minimum live deadline, or
/// disarmed when no candidate remains. The callback may still fire after its
/// deadline was superseded by a new event; [`validate_fire`](Self::validate_fire)
/// detects such stale wake-ups so they can be ignored.
#[derive(Debug, Default)]
pub struct TimeoutGovernor {
    armed_at: Option<u64>,
}

impl TimeoutGovernor {
    /// Create a disarmed governor
    pub fn new() -> Self {
        Self::default()
    }

    /// The deadline the host timer is currently armed for
    pub fn armed_at(&self) -> Option<u64> {
        self.armed_at
    }

    /// Re-arm for `deadline`, or disarm on `None`.
    ///
    /// No host call is made when the deadline is unchanged; cancelling an
    /// unarmed timer is a no-op.
    pub fn update<H: ComboHost>(&mut self, deadline: Option<u64>, host: &mut H) {
        if deadline == self.armed_at {
            return;
        }
        match deadline {
            Some(at) => host.schedule_timeout(at),
            None => host.cancel_timeout(),
        }
        self.armed_at = deadline;
    }

    /// Disarm the timer
    pub fn cancel<H: ComboHost>(&mut self, host: &mut H) {
        self.update(None, host);
    }

    /// Validate a timer wake-up against the stored deadline.
    ///
    /// Returns the armed deadline when it has genuinely elapsed at `now_ms`;
    /// `None` means the fire is stale (cancelled or rescheduled since it was
    /// queued) and must be ignored.
    pub fn validate_fire(&self, now_ms: u64) -> Option<u64> {
        match self.armed_at {
            Some(at) if now_ms >= at => Some(at),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionHandle, KeyPosition, LayerId, PositionEvent};

    /// Host stub that records timer traffic only
    #[derive(Default)]
    struct TimerHost {
        scheduled: Vec<u64>,
        cancels: usize,
    }

    impl ComboHost for TimerHost {
        fn active_layer(&self) -> LayerId {
            0
        }
        fn pass_key(&mut self, _event: PositionEvent) {}
        fn republish(&mut self, _event: PositionEvent) {}
        fn schedule_timeout(&mut self, deadline_ms: u64) {
            self.scheduled.push(deadline_ms);
        }
        fn cancel_timeout(&mut self) {
            self.cancels += 1;
        }
        fn press_combo(&mut self, _action: ActionHandle, _position: KeyPosition, _ts: u64) {}
        fn release_combo(&mut self, _action: ActionHandle, _position: KeyPosition, _ts: u64) {}
    }

    #[test]
    fn test_update_skips_unchanged_deadline() {
        let mut governor = TimeoutGovernor::new();
        let mut host = TimerHost::default();

        governor.update(Some(100), &mut host);
        governor.update(Some(100), &mut host);
        assert_eq!(host.scheduled, vec![100]);

        governor.update(Some(50), &mut host);
        assert_eq!(host.scheduled, vec![100, 50]);
        assert_eq!(governor.armed_at(), Some(50));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut governor = TimeoutGovernor::new();
        let mut host = TimerHost::default();

        governor.cancel(&mut host);
        assert_eq!(host.cancels, 0);

        governor.update(Some(100), &mut host);
        governor.cancel(&mut host);
        governor.cancel(&mut host);
        assert_eq!(host.cancels, 1);
        assert_eq!(governor.armed_at(), None);
    }

    #[test]
    fn test_validate_fire() {
        let mut governor = TimeoutGovernor::new();
        let mut host = TimerHost::default();

        // unarmed: every fire is stale
        assert_eq!(governor.validate_fire(500), None);

        governor.update(Some(100), &mut host);
        assert_eq!(governor.validate_fire(99), None);
        assert_eq!(governor.validate_fire(100), Some(100));
        assert_eq!(governor.validate_fire(140), Some(100));
    }
}
