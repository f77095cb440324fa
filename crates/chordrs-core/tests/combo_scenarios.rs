// Chordrs Combo Scenario Tests
//
// End-to-end scenarios driving the engine through a simulated event bus:
// config -> registry -> engine -> listener results, with re-published events
// fed back through the engine the way the bus would re-deliver them.
//
// Run with: cargo test --test combo_scenarios

use std::collections::VecDeque;

use chordrs_core::{
    ActionHandle, ComboConfig, ComboEngine, ComboHost, ComboSpec, KeyPosition, LayerId,
    ListenerResult, PositionEvent,
};

/// Host double that models the surrounding pipeline: an ordered delivery log
/// for resolved events, a re-publish queue, a single timer slot, and a
/// recording action dispatcher.
#[derive(Default)]
struct BusHost {
    layer: LayerId,
    queue: VecDeque<PositionEvent>,
    delivered: Vec<PositionEvent>,
    armed: Option<u64>,
    pressed: Vec<(ActionHandle, KeyPosition, u64)>,
    released: Vec<(ActionHandle, KeyPosition, u64)>,
}

impl ComboHost for BusHost {
    fn active_layer(&self) -> LayerId {
        self.layer
    }
    fn pass_key(&mut self, event: PositionEvent) {
        self.delivered.push(event);
    }
    fn republish(&mut self, event: PositionEvent) {
        self.queue.push_back(event);
    }
    fn schedule_timeout(&mut self, deadline_ms: u64) {
        self.armed = Some(deadline_ms);
    }
    fn cancel_timeout(&mut self) {
        self.armed = None;
    }
    fn press_combo(&mut self, action: ActionHandle, position: KeyPosition, timestamp_ms: u64) {
        self.pressed.push((action, position, timestamp_ms));
    }
    fn release_combo(&mut self, action: ActionHandle, position: KeyPosition, timestamp_ms: u64) {
        self.released.push((action, position, timestamp_ms));
    }
}

/// Deliver one event to the engine, logging a bubbled event as delivered and
/// then re-delivering anything the engine re-published.
fn dispatch(engine: &mut ComboEngine, host: &mut BusHost, event: PositionEvent) -> ListenerResult {
    let result = engine.on_position_event(event, host);
    if result == ListenerResult::Bubble {
        host.delivered.push(event);
    }
    pump(engine, host);
    result
}

fn fire_timeout(engine: &mut ComboEngine, host: &mut BusHost, now_ms: u64) {
    engine.on_timeout(now_ms, host);
    pump(engine, host);
}

/// Re-published events re-enter the bus after the current dispatch completes
fn pump(engine: &mut ComboEngine, host: &mut BusHost) {
    while let Some(event) = host.queue.pop_front() {
        let result = engine.on_position_event(event, host);
        if result == ListenerResult::Bubble {
            host.delivered.push(event);
        }
    }
}

fn combo(positions: &[u16], timeout_ms: u64, action: u32) -> ComboSpec {
    ComboSpec {
        name: None,
        key_positions: positions.to_vec(),
        timeout_ms,
        slow_release: false,
        layers: None,
        action,
    }
}

fn engine_of(specs: Vec<ComboSpec>) -> ComboEngine {
    let config = ComboConfig { combos: specs };
    ComboEngine::new(config.build_registry().expect("valid combos"))
}

fn down(position: u16, timestamp_ms: u64) -> PositionEvent {
    PositionEvent::down(KeyPosition(position), timestamp_ms)
}

fn up(position: u16, timestamp_ms: u64) -> PositionEvent {
    PositionEvent::up(KeyPosition(position), timestamp_ms)
}

#[test]
fn test_specificity_upgrade_to_larger_combo() {
    // A = {1,2}, B = {1,2,3}, both 200ms
    let mut engine = engine_of(vec![combo(&[1, 2], 200, 1), combo(&[1, 2, 3], 200, 2)]);
    let mut host = BusHost::default();

    assert_eq!(dispatch(&mut engine, &mut host, down(1, 0)), ListenerResult::Captured);
    assert_eq!(host.armed, Some(200));

    // A is fully pressed but B is still viable: nothing activates yet
    assert_eq!(dispatch(&mut engine, &mut host, down(2, 50)), ListenerResult::Captured);
    assert!(host.pressed.is_empty());
    assert!(engine.window_open());

    // B completes and wins despite A having been satisfied first
    assert_eq!(dispatch(&mut engine, &mut host, down(3, 100)), ListenerResult::Captured);
    assert_eq!(host.pressed, vec![(ActionHandle(2), KeyPosition(1), 0)]);
    assert!(host.delivered.is_empty());
    assert_eq!(host.armed, None);
}

#[test]
fn test_lone_key_released_on_timeout() {
    let mut engine = engine_of(vec![combo(&[1, 2], 100, 1)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    assert_eq!(host.armed, Some(100));

    fire_timeout(&mut engine, &mut host, 100);
    assert!(!engine.window_open());
    assert_eq!(host.delivered, vec![down(1, 0)]);
    assert!(host.pressed.is_empty());
    assert_eq!(host.armed, None);
}

#[test]
fn test_disjoint_combos_resolve_and_reprocess() {
    // pos1 and pos3 belong to unrelated combos: the second key-down empties
    // the intersection, pos1 replays and pos3 seeds a fresh window
    let mut engine = engine_of(vec![combo(&[1, 2], 100, 1), combo(&[3, 4], 100, 2)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    assert_eq!(dispatch(&mut engine, &mut host, down(3, 20)), ListenerResult::Captured);

    assert_eq!(host.delivered, vec![down(1, 0)]);
    assert!(engine.window_open());
    assert_eq!(host.armed, Some(120));

    // the re-seeded window completes normally, timestamped at pos3's press
    dispatch(&mut engine, &mut host, down(4, 30));
    assert_eq!(host.pressed, vec![(ActionHandle(2), KeyPosition(3), 20)]);
}

#[test]
fn test_replayed_key_can_form_new_combo() {
    // nested/overlapping definitions: pos3 breaks the {1,2} window but then
    // combines with pos2 into its own combo
    let mut engine = engine_of(vec![combo(&[1, 2], 100, 1), combo(&[2, 3], 100, 2)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    dispatch(&mut engine, &mut host, down(3, 20));
    assert_eq!(host.delivered, vec![down(1, 0)]);

    dispatch(&mut engine, &mut host, down(2, 30));
    // anchor is pos2 (lowest of {2,3}); press timestamp is pos3's capture
    assert_eq!(host.pressed, vec![(ActionHandle(2), KeyPosition(2), 20)]);
}

#[test]
fn test_fast_release_fires_once_on_first_key_up() {
    let mut engine = engine_of(vec![combo(&[1, 2], 100, 1)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    dispatch(&mut engine, &mut host, down(2, 10));
    assert_eq!(host.pressed.len(), 1);

    assert_eq!(dispatch(&mut engine, &mut host, up(1, 50)), ListenerResult::Handled);
    assert_eq!(host.released, vec![(ActionHandle(1), KeyPosition(1), 50)]);

    assert_eq!(dispatch(&mut engine, &mut host, up(2, 60)), ListenerResult::Handled);
    assert_eq!(host.released.len(), 1);
    assert!(host.delivered.is_empty());
}

#[test]
fn test_slow_release_fires_once_on_last_key_up() {
    let mut spec = combo(&[5, 6], 100, 3);
    spec.slow_release = true;
    let mut engine = engine_of(vec![spec]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(5, 0));
    dispatch(&mut engine, &mut host, down(6, 10));

    assert_eq!(dispatch(&mut engine, &mut host, up(5, 50)), ListenerResult::Handled);
    assert!(host.released.is_empty());

    assert_eq!(dispatch(&mut engine, &mut host, up(6, 90)), ListenerResult::Handled);
    assert_eq!(host.released, vec![(ActionHandle(3), KeyPosition(5), 90)]);
}

#[test]
fn test_key_up_flushes_window_preserving_order() {
    // window holds two captured keys when an unrelated key-up arrives; the
    // key-up forces closure and is re-raised behind the replayed key-downs
    let mut engine = engine_of(vec![combo(&[1, 2, 3], 500, 1)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    dispatch(&mut engine, &mut host, down(2, 10));
    assert_eq!(dispatch(&mut engine, &mut host, up(9, 20)), ListenerResult::Captured);

    assert_eq!(host.delivered, vec![down(1, 0), down(2, 10), up(9, 20)]);
    assert!(!engine.window_open());
    assert!(host.pressed.is_empty());
    assert_eq!(host.armed, None);
}

#[test]
fn test_lone_captured_key_then_unmatched_key_up_bubbles() {
    // replay of a single key re-publishes nothing, so the key-up bubbles
    let mut engine = engine_of(vec![combo(&[1, 2], 500, 1)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    assert_eq!(dispatch(&mut engine, &mut host, up(9, 20)), ListenerResult::Bubble);
    assert_eq!(host.delivered, vec![down(1, 0), up(9, 20)]);
}

#[test]
fn test_timeout_governor_tracks_minimum_deadline() {
    let mut engine = engine_of(vec![
        combo(&[1, 2], 50, 1),
        combo(&[1, 3], 100, 2),
        combo(&[1, 4], 150, 3),
    ]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    assert_eq!(host.armed, Some(50));

    // two candidates survive the first deadline: reschedule only
    fire_timeout(&mut engine, &mut host, 50);
    assert!(engine.window_open());
    assert_eq!(host.armed, Some(100));

    // a single survivor resolves with no winner
    fire_timeout(&mut engine, &mut host, 100);
    assert!(!engine.window_open());
    assert_eq!(host.delivered, vec![down(1, 0)]);
    assert_eq!(host.armed, None);
}

#[test]
fn test_buffer_overflow_never_drops_keys() {
    // repeated key-downs without releases keep the window open until the
    // buffer fills; the overflowing key closes the window, the oldest capture
    // is delivered, and the rest (overflowing key included) is re-published
    // in order behind it
    let mut engine = engine_of(vec![combo(&[1, 2], 10_000, 1)]);
    let mut host = BusHost::default();

    for i in 0..chordrs_core::MAX_CAPTURED_KEYS as u64 {
        assert_eq!(
            dispatch(&mut engine, &mut host, down(1, i)),
            ListenerResult::Captured
        );
    }
    assert_eq!(
        dispatch(&mut engine, &mut host, down(1, 8)),
        ListenerResult::Captured
    );
    assert_eq!(host.delivered, vec![down(1, 0)]);

    // drain the pipeline: each replay delivers its head and the re-published
    // tail re-forms a window until nothing is left
    while let Some(at) = host.armed {
        fire_timeout(&mut engine, &mut host, at);
    }
    assert!(!engine.window_open());
    assert_eq!(host.delivered.len(), chordrs_core::MAX_CAPTURED_KEYS + 1);
    assert!(host.pressed.is_empty());
}

#[test]
fn test_auto_repeat_within_window_is_not_dropped() {
    // pos1 auto-repeats before pos2 completes the combo: the combo activates
    // off the first press and the repeat re-enters the pipeline, where it
    // seeds a fresh window of its own
    let mut engine = engine_of(vec![combo(&[1, 2], 10_000, 1)]);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(1, 0));
    dispatch(&mut engine, &mut host, down(1, 30));
    dispatch(&mut engine, &mut host, down(2, 50));

    assert_eq!(host.pressed, vec![(ActionHandle(1), KeyPosition(1), 0)]);
    assert!(engine.window_open());
    assert_eq!(host.armed, Some(10_030));

    // the repeat resolves alone at its timeout
    fire_timeout(&mut engine, &mut host, 10_030);
    assert_eq!(host.delivered, vec![down(1, 30)]);
}

#[test]
fn test_layer_predicate_gates_eligibility() {
    let mut spec = combo(&[1, 2], 100, 1);
    spec.layers = Some(vec![1]);
    let mut engine = engine_of(vec![spec]);
    let mut host = BusHost::default();

    // base layer: the combo is not eligible, keys flow through
    assert_eq!(dispatch(&mut engine, &mut host, down(1, 0)), ListenerResult::Bubble);
    assert_eq!(host.delivered, vec![down(1, 0)]);

    host.layer = 1;
    assert_eq!(dispatch(&mut engine, &mut host, down(1, 10)), ListenerResult::Captured);
    dispatch(&mut engine, &mut host, down(2, 20));
    assert_eq!(host.pressed.len(), 1);
}

#[test]
fn test_engine_built_from_toml_config() -> anyhow::Result<()> {
    let config = ComboConfig::from_toml_str(
        r#"
        [[combos]]
        name = "esc"
        key_positions = [16, 17]
        timeout_ms = 80
        action = 100
        "#,
    )?;
    let mut engine = ComboEngine::new(config.build_registry()?);
    let mut host = BusHost::default();

    dispatch(&mut engine, &mut host, down(16, 0));
    dispatch(&mut engine, &mut host, down(17, 40));
    assert_eq!(host.pressed, vec![(ActionHandle(100), KeyPosition(16), 0)]);
    Ok(())
}
