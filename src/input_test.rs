#![allow(clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn touch(id: i64, x: f64, y: f64) -> TouchPoint {
    TouchPoint { id, x, y }
}

fn alt() -> Modifiers {
    Modifiers { alt: true, ..Default::default() }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Default::default() }
}

fn payload() -> DragPayload {
    DragPayload { id: "d1".into(), url: "https://cdn.test/a.png".into(), thumbnail_url: None, file: None, timestamp: 0 }
}

fn pinching(distance: f64) -> GestureInterpreter {
    let mut g = GestureInterpreter::new();
    let out = g.touch_start(&[touch(1, 0.0, 0.0), touch(2, distance, 0.0)]);
    assert_eq!(out, vec![Gesture::PinchStart]);
    g
}

// =============================================================
// Modifiers
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.precise_zoom());
    assert!(!m.pan());
}

#[test]
fn meta_counts_as_precise_zoom() {
    assert!(Modifiers { meta: true, ..Default::default() }.precise_zoom());
}

// =============================================================
// Pointer sessions
// =============================================================

#[test]
fn primary_down_when_armed_starts_stroke() {
    let mut g = GestureInterpreter::new();
    let out = g.pointer_down(pt(5.0, 6.0), Button::Primary, Modifiers::default(), true);
    assert_eq!(out, vec![Gesture::StrokeStart(pt(5.0, 6.0))]);
    assert_eq!(g.pointer_move(pt(7.0, 8.0)), vec![Gesture::StrokeMove(pt(7.0, 8.0))]);
    assert_eq!(g.pointer_up(pt(7.0, 8.0)), vec![Gesture::StrokeEnd]);
    assert_eq!(g.pointer_state(), PointerState::Idle);
}

#[test]
fn primary_down_when_not_armed_presses() {
    let mut g = GestureInterpreter::new();
    assert_eq!(g.pointer_down(pt(1.0, 1.0), Button::Primary, Modifiers::default(), false), vec![Gesture::Press(pt(1.0, 1.0))]);
    assert_eq!(g.pointer_move(pt(2.0, 3.0)), vec![Gesture::DragTo(pt(2.0, 3.0))]);
    assert_eq!(g.pointer_up(pt(2.0, 3.0)), vec![Gesture::Release(pt(2.0, 3.0))]);
}

#[test]
fn alt_drag_pans_even_when_armed() {
    let mut g = GestureInterpreter::new();
    assert_eq!(g.pointer_down(pt(10.0, 10.0), Button::Primary, alt(), true), vec![Gesture::PanStart]);
    assert_eq!(g.pointer_move(pt(15.0, 7.0)), vec![Gesture::PanMove { dx: 5.0, dy: -3.0 }]);
    assert_eq!(g.pointer_move(pt(16.0, 7.0)), vec![Gesture::PanMove { dx: 1.0, dy: 0.0 }]);
    assert_eq!(g.pointer_up(pt(16.0, 7.0)), vec![Gesture::PanEnd]);
}

#[test]
fn middle_and_secondary_buttons_pan() {
    for button in [Button::Middle, Button::Secondary] {
        let mut g = GestureInterpreter::new();
        assert_eq!(g.pointer_down(pt(0.0, 0.0), button, Modifiers::default(), true), vec![Gesture::PanStart]);
    }
}

#[test]
fn pan_move_without_motion_emits_nothing() {
    let mut g = GestureInterpreter::new();
    g.pointer_down(pt(3.0, 3.0), Button::Middle, Modifiers::default(), false);
    assert!(g.pointer_move(pt(3.0, 3.0)).is_empty());
}

#[test]
fn second_pointer_down_during_session_is_ignored() {
    let mut g = GestureInterpreter::new();
    g.pointer_down(pt(0.0, 0.0), Button::Primary, Modifiers::default(), true);
    assert!(g.pointer_down(pt(9.0, 9.0), Button::Middle, Modifiers::default(), true).is_empty());
    assert_eq!(g.pointer_state(), PointerState::Stroking);
}

#[test]
fn idle_move_and_up_emit_nothing() {
    let mut g = GestureInterpreter::new();
    assert!(g.pointer_move(pt(1.0, 1.0)).is_empty());
    assert!(g.pointer_up(pt(1.0, 1.0)).is_empty());
}

#[test]
fn non_finite_points_are_dropped() {
    let mut g = GestureInterpreter::new();
    assert!(g.pointer_down(pt(f64::NAN, 0.0), Button::Primary, Modifiers::default(), true).is_empty());
    assert_eq!(g.pointer_state(), PointerState::Idle);
}

// =============================================================
// Wheel
// =============================================================

#[test]
fn ctrl_wheel_zooms_exponentially() {
    let g = GestureInterpreter::new();
    let out = g.wheel(pt(50.0, 60.0), WheelDelta { dx: 0.0, dy: -100.0 }, ctrl());
    assert_eq!(out, vec![Gesture::ZoomAt { point: pt(50.0, 60.0), factor: 0.999_f64.powf(-100.0) }]);
}

#[test]
fn plain_wheel_pans_both_axes() {
    let g = GestureInterpreter::new();
    let out = g.wheel(pt(0.0, 0.0), WheelDelta { dx: 4.0, dy: 12.0 }, Modifiers::default());
    assert_eq!(out, vec![Gesture::PanMove { dx: -4.0, dy: -12.0 }]);
}

#[test]
fn zero_wheel_emits_nothing() {
    let g = GestureInterpreter::new();
    assert!(g.wheel(pt(0.0, 0.0), WheelDelta { dx: 0.0, dy: 0.0 }, Modifiers::default()).is_empty());
    assert!(g.wheel(pt(0.0, 0.0), WheelDelta { dx: 3.0, dy: 0.0 }, ctrl()).is_empty());
}

// =============================================================
// Touch
// =============================================================

#[test]
fn single_touch_is_left_to_pointer_events() {
    let mut g = GestureInterpreter::new();
    assert!(g.touch_start(&[touch(1, 0.0, 0.0)]).is_empty());
    assert!(!g.is_pinching());
}

#[test]
fn two_touches_snapshot_distance_and_center() {
    let g = pinching(100.0);
    let p = g.pinch().unwrap();
    assert_eq!(p.distance, 100.0);
    assert_eq!(p.center, pt(50.0, 0.0));
}

#[test]
fn pinch_spread_beyond_dead_zone_zooms() {
    let mut g = pinching(100.0);
    // Spread symmetrically about the same center: pure zoom, no pan.
    let out = g.touch_move(&[touch(1, -25.0, 0.0), touch(2, 125.0, 0.0)]);
    assert_eq!(out, vec![Gesture::ZoomAt { point: pt(50.0, 0.0), factor: 1.5 }]);
    assert_eq!(g.pinch().unwrap().distance, 150.0);
}

#[test]
fn pinch_jitter_inside_dead_zone_is_suppressed() {
    let mut g = pinching(100.0);
    let out = g.touch_move(&[touch(1, -0.5, 0.0), touch(2, 100.5, 0.0)]);
    assert!(out.is_empty());
    // Distance baseline is kept so slow pinches accumulate.
    assert_eq!(g.pinch().unwrap().distance, 100.0);
    let out = g.touch_move(&[touch(1, -1.5, 0.0), touch(2, 101.5, 0.0)]);
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0], Gesture::ZoomAt { factor, .. } if (factor - 1.03).abs() < 1e-12));
}

#[test]
fn two_finger_drag_beyond_threshold_pans() {
    let mut g = pinching(100.0);
    let out = g.touch_move(&[touch(1, 0.0, 10.0), touch(2, 100.0, 10.0)]);
    assert_eq!(out, vec![Gesture::PanMove { dx: 0.0, dy: 10.0 }]);
}

#[test]
fn two_finger_drag_below_threshold_is_ignored() {
    let mut g = pinching(100.0);
    assert!(g.touch_move(&[touch(1, 0.0, 2.0), touch(2, 100.0, 2.0)]).is_empty());
}

#[test]
fn pinch_start_cancels_active_stroke() {
    let mut g = GestureInterpreter::new();
    g.pointer_down(pt(0.0, 0.0), Button::Primary, Modifiers::default(), true);
    let out = g.touch_start(&[touch(1, 0.0, 0.0), touch(2, 10.0, 0.0)]);
    assert_eq!(out, vec![Gesture::PointerCancel, Gesture::PinchStart]);
    assert_eq!(g.pointer_state(), PointerState::Idle);
}

#[test]
fn pointer_down_is_suppressed_while_pinching() {
    let mut g = pinching(100.0);
    assert!(g.pointer_down(pt(0.0, 0.0), Button::Primary, Modifiers::default(), true).is_empty());
}

#[test]
fn third_touch_does_not_restart_pinch() {
    let mut g = pinching(100.0);
    let out = g.touch_start(&[touch(1, 0.0, 0.0), touch(2, 100.0, 0.0), touch(3, 500.0, 500.0)]);
    assert!(out.is_empty());
    assert!(g.is_pinching());
    assert_eq!(g.pinch().unwrap().distance, 100.0);
}

#[test]
fn pinch_ends_when_fewer_than_two_touches_remain() {
    let mut g = pinching(100.0);
    assert!(g.touch_end(&[touch(1, 0.0, 0.0), touch(2, 100.0, 0.0)]).is_empty());
    assert_eq!(g.touch_end(&[touch(1, 0.0, 0.0)]), vec![Gesture::PinchEnd]);
    assert!(!g.is_pinching());
    assert!(g.touch_end(&[]).is_empty());
}

#[test]
fn lifting_one_of_three_touches_reanchors_pinch() {
    let (a, b, c) = (touch(1, 0.0, 0.0), touch(2, 100.0, 0.0), touch(3, 400.0, 300.0));
    let mut g = pinching(100.0);
    g.touch_start(&[a, b, c]);

    assert!(g.touch_end(&[b, c]).is_empty());
    assert!(g.is_pinching());
    let pinch = g.pinch().unwrap();
    assert_eq!(pinch.distance, 300.0_f64.hypot(300.0));
    assert_eq!(pinch.center, pt(250.0, 150.0));

    // The remaining pair hasn't moved, so nothing happens.
    assert!(g.touch_move(&[b, c]).is_empty());
}

// =============================================================
// Drop
// =============================================================

#[test]
fn drop_uses_live_transform() {
    let g = GestureInterpreter::new();
    let vt = ViewportTransform { scale_x: 2.0, scale_y: 2.0, translate_x: 100.0, translate_y: 40.0 };
    let out = g.drop_at(payload(), pt(300.0, 240.0), &vt);
    assert_eq!(out, vec![Gesture::Drop { payload: payload(), screen: pt(300.0, 240.0), logical: pt(100.0, 100.0) }]);
}
