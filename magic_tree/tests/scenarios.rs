//! End-to-end scenarios: simulated hands → engine → payload.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use glam::{Vec2, Vec3};
use magic_tree::config::EngineConfig;
use magic_tree::engine::{Engine, FrameInput};
use magic_tree::selection::{SelectableObject, SelectionEvent};
use magic_tree::source::{spawn_landmark_source, SimHands, SimInput, SimLandmarkSource};
use tree_field::{FieldConfig, OrnamentPlacement};

const DT: f32 = 1.0 / 60.0;

fn small_field() -> FieldConfig {
    let mut field = FieldConfig::default();
    field.layers[0].count = 60;
    field.layers[1].count = 10;
    field
}

/// Scene with one card, `id`, fixed at `at` in both states.
fn one_card_engine(id: &str, at: Vec3) -> Engine {
    let mut cfg = EngineConfig { field: small_field(), seed: Some(9), ..EngineConfig::default() };
    cfg.resources.catalog.clear();
    let mut engine = Engine::new(&cfg).unwrap();
    engine
        .registry_mut()
        .insert(SelectableObject::new(id, OrnamentPlacement { formed: at, exploded: at, speed: 1.0 }));
    engine
}

fn run_frames(engine: &mut Engine, hands: &SimHands, frames: usize) -> Vec<SelectionEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        events.extend(engine.step(FrameInput::Fresh(hands.detections()), DT).events);
    }
    events
}

#[test]
fn open_then_close_explodes_and_reforms() {
    let cfg = EngineConfig { field: small_field(), seed: Some(1), ..EngineConfig::default() };
    let mut engine = Engine::new(&cfg).unwrap();
    let mut hands = SimHands::default();

    hands.left_open = true;
    run_frames(&mut engine, &hands, 120);
    let open = engine.animation();
    assert!(open.expansion > 0.95, "expansion after opening: {}", open.expansion);
    assert!(open.rotation > 0.0);

    hands.left_open = false;
    run_frames(&mut engine, &hands, 120);
    let closed = engine.animation();
    assert!(closed.expansion < 0.05, "expansion after closing: {}", closed.expansion);
    // The yaw keeps turning in either state.
    assert!(closed.rotation > open.rotation);
}

#[test]
fn pinch_grabs_and_releases_card_under_pointer() {
    let mut engine = one_card_engine("O1", Vec3::ZERO);
    let mut hands = SimHands { pointer: Vec2::ZERO, ..SimHands::default() };

    let mut held = Vec::new();
    let mut events = Vec::new();
    for pinch in [false, true, true, true, false] {
        hands.pinch = pinch;
        let payload = engine.step(FrameInput::Fresh(hands.detections()), DT);
        held.push(payload.selection.held.clone());
        events.extend(payload.events);
    }

    let o1 = Some("O1".to_string());
    assert_eq!(held, vec![None, o1.clone(), o1.clone(), o1, None]);
    assert_eq!(
        events,
        vec![
            SelectionEvent::Grabbed { id: "O1".into(), fallback: false },
            SelectionEvent::Released { id: "O1".into() },
        ]
    );
}

#[test]
fn hover_shows_before_the_press() {
    let mut engine = one_card_engine("O1", Vec3::ZERO);
    let hands = SimHands { pointer: Vec2::ZERO, ..SimHands::default() };
    let payload = engine.step(FrameInput::Fresh(hands.detections()), DT);
    assert_eq!(payload.selection.hovered.as_deref(), Some("O1"));
    assert!(payload.ornaments[0].is_hovered);
}

#[test]
fn moving_onto_a_card_while_pinched_does_not_grab() {
    let mut engine = one_card_engine("O1", Vec3::ZERO);
    let mut hands = SimHands { pointer: Vec2::new(0.9, 0.9), pinch: true, ..SimHands::default() };
    assert!(run_frames(&mut engine, &hands, 3).is_empty());

    hands.pointer = Vec2::ZERO;
    assert!(run_frames(&mut engine, &hands, 3).is_empty());
    assert_eq!(engine.status().held, None);

    // A fresh press does grab.
    hands.pinch = false;
    run_frames(&mut engine, &hands, 1);
    hands.pinch = true;
    let events = run_frames(&mut engine, &hands, 1);
    assert_eq!(events, vec![SelectionEvent::Grabbed { id: "O1".into(), fallback: false }]);
}

#[test]
fn empty_press_falls_back_only_once_exploded() {
    // Behind the camera: no ray ever hits it.
    let mut engine = one_card_engine("B", Vec3::new(0.0, 0.0, 100.0));
    let mut hands = SimHands::default();

    hands.pinch = true;
    assert!(run_frames(&mut engine, &hands, 1).is_empty());
    hands.pinch = false;
    run_frames(&mut engine, &hands, 1);

    hands.left_open = true;
    run_frames(&mut engine, &hands, 120);
    assert!(engine.animation().expansion > 0.5);

    hands.pinch = true;
    let events = run_frames(&mut engine, &hands, 1);
    assert_eq!(events, vec![SelectionEvent::Grabbed { id: "B".into(), fallback: true }]);
}

#[test]
fn losing_the_pointer_hand_releases() {
    let mut engine = one_card_engine("O1", Vec3::ZERO);
    let mut hands = SimHands::default();
    run_frames(&mut engine, &hands, 1);
    hands.pinch = true;
    run_frames(&mut engine, &hands, 1);
    assert_eq!(engine.status().held.as_deref(), Some("O1"));

    hands.right_present = false;
    let events = run_frames(&mut engine, &hands, 1);
    assert_eq!(events, vec![SelectionEvent::Released { id: "O1".into() }]);
}

#[test]
fn threaded_source_drives_the_engine() {
    let cfg = EngineConfig { field: small_field(), seed: Some(5), ..EngineConfig::default() };
    let mut engine = Engine::new(&cfg).unwrap();
    let (tx, rx) = mpsc::channel();
    let source = spawn_landmark_source(SimLandmarkSource::new(rx, 240.0)).unwrap();
    tx.send(SimInput::LeftOpen(true)).unwrap();

    for _ in 0..400 {
        engine.step(FrameInput::from(source.take_latest()), DT);
        if engine.animation().expansion > 0.5 { break; }
        thread::sleep(Duration::from_millis(2));
    }
    assert!(engine.hands().left.is_open);
    assert!(engine.animation().expansion > 0.5);
    assert!(engine.stats().inference_frames > 0);

    tx.send(SimInput::Quit).ok();
    source.stop().unwrap();
}
