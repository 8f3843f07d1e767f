//! Input model: modifier keys, mouse buttons, touches, and the gesture interpreter.
//!
//! Raw pointer, wheel, and touch events go into [`GestureInterpreter`], which
//! tracks the active pointer session and any two-finger gesture and emits
//! discrete [`Gesture`]s. The interpreter only classifies input; it never
//! touches document or camera state. All points it emits are in screen space
//! except the logical drop point, which is resolved against the live viewport
//! at drop time.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::{Point, ViewportTransform};
use crate::consts::{PINCH_DEAD_ZONE, TOUCH_PAN_THRESHOLD_PX, WHEEL_ZOOM_BASE};
use crate::payload::DragPayload;

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Wheel input zooms instead of panning. Trackpad pinches arrive as
    /// ctrl+wheel in browsers.
    #[must_use]
    pub fn precise_zoom(self) -> bool {
        self.ctrl || self.meta
    }

    /// A primary-button drag pans instead of drawing or selecting.
    #[must_use]
    pub fn pan(self) -> bool {
        self.alt
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// One active touch contact, in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Host-assigned touch identifier.
    pub id: i64,
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A discrete operation classified from raw input.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// A pan drag began.
    PanStart,
    /// Shift the view by a screen-space delta.
    PanMove { dx: f64, dy: f64 },
    /// The pan drag ended.
    PanEnd,
    /// Multiply the zoom by `factor`, anchored at the screen point.
    ZoomAt { point: Point, factor: f64 },
    /// A freehand stroke began at this screen point.
    StrokeStart(Point),
    /// The stroke continued to this screen point.
    StrokeMove(Point),
    /// The stroke finished.
    StrokeEnd,
    /// Primary press while not drawing (selection interaction).
    Press(Point),
    /// The pressed pointer moved.
    DragTo(Point),
    /// The pressed pointer was released.
    Release(Point),
    /// The current pointer session was interrupted and must be abandoned.
    PointerCancel,
    /// A two-finger gesture took over; drawing and selection are suspended.
    PinchStart,
    /// The two-finger gesture ended; the prior mode is restored.
    PinchEnd,
    /// An external payload was dropped at `screen`, which maps to `logical`.
    Drop { payload: DragPayload, screen: Point, logical: Point },
}

/// The active single-pointer session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PointerState {
    /// No pointer is down.
    #[default]
    Idle,
    /// Dragging the view; carries the previous screen position.
    Panning { last: Point },
    /// Capturing a freehand stroke.
    Stroking,
    /// Primary button held in selection mode.
    Pressing,
}

/// Snapshot of a two-finger gesture, updated whenever an operation is emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchState {
    /// Finger distance at the last emitted zoom.
    pub distance: f64,
    /// Finger midpoint at the last emitted pan.
    pub center: Point,
}

/// Classifies raw input streams into [`Gesture`]s.
#[derive(Debug, Clone, Default)]
pub struct GestureInterpreter {
    pointer: PointerState,
    touches: Vec<TouchPoint>,
    pinch: Option<PinchState>,
}

impl GestureInterpreter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pointer_state(&self) -> PointerState {
        self.pointer
    }

    #[must_use]
    pub fn pinch(&self) -> Option<PinchState> {
        self.pinch
    }

    /// Whether a two-finger gesture currently owns the input.
    #[must_use]
    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Pointer pressed. `draw_armed` says whether a primary press starts a stroke.
    pub fn pointer_down(&mut self, screen: Point, button: Button, modifiers: Modifiers, draw_armed: bool) -> Vec<Gesture> {
        if self.pinch.is_some() || self.pointer != PointerState::Idle || !screen.is_finite() {
            return Vec::new();
        }
        if button != Button::Primary || modifiers.pan() {
            self.pointer = PointerState::Panning { last: screen };
            return vec![Gesture::PanStart];
        }
        if draw_armed {
            self.pointer = PointerState::Stroking;
            vec![Gesture::StrokeStart(screen)]
        } else {
            self.pointer = PointerState::Pressing;
            vec![Gesture::Press(screen)]
        }
    }

    /// Pointer moved, with or without a button held.
    pub fn pointer_move(&mut self, screen: Point) -> Vec<Gesture> {
        if !screen.is_finite() {
            return Vec::new();
        }
        match self.pointer {
            PointerState::Idle => Vec::new(),
            PointerState::Panning { last } => {
                self.pointer = PointerState::Panning { last: screen };
                let (dx, dy) = (screen.x - last.x, screen.y - last.y);
                if dx == 0.0 && dy == 0.0 {
                    Vec::new()
                } else {
                    vec![Gesture::PanMove { dx, dy }]
                }
            }
            PointerState::Stroking => vec![Gesture::StrokeMove(screen)],
            PointerState::Pressing => vec![Gesture::DragTo(screen)],
        }
    }

    /// Pointer released. Ends whatever session is active.
    pub fn pointer_up(&mut self, screen: Point) -> Vec<Gesture> {
        let previous = std::mem::take(&mut self.pointer);
        match previous {
            PointerState::Idle => Vec::new(),
            PointerState::Panning { .. } => vec![Gesture::PanEnd],
            PointerState::Stroking => vec![Gesture::StrokeEnd],
            PointerState::Pressing => vec![Gesture::Release(screen)],
        }
    }

    /// Wheel or trackpad scroll. Zooms with the precise-zoom modifier, pans otherwise.
    #[must_use]
    pub fn wheel(&self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Gesture> {
        if !delta.dx.is_finite() || !delta.dy.is_finite() {
            return Vec::new();
        }
        if modifiers.precise_zoom() {
            if delta.dy == 0.0 || !screen.is_finite() {
                return Vec::new();
            }
            return vec![Gesture::ZoomAt { point: screen, factor: WHEEL_ZOOM_BASE.powf(delta.dy) }];
        }
        if delta.dx == 0.0 && delta.dy == 0.0 {
            return Vec::new();
        }
        vec![Gesture::PanMove { dx: -delta.dx, dy: -delta.dy }]
    }

    /// Touch contact added. `active` lists every touch currently down.
    ///
    /// With two or more contacts a pinch begins, using the first two; any
    /// pointer session in progress is cancelled. Single touches are left to
    /// the host's pointer events.
    pub fn touch_start(&mut self, active: &[TouchPoint]) -> Vec<Gesture> {
        self.touches = active.to_vec();
        let Some(snapshot) = self.snapshot() else {
            return Vec::new();
        };
        if self.pinch.is_some() {
            // Extra finger: re-anchor on the first two without a new transition.
            self.pinch = Some(snapshot);
            return Vec::new();
        }
        let mut out = Vec::new();
        if std::mem::take(&mut self.pointer) != PointerState::Idle {
            out.push(Gesture::PointerCancel);
        }
        self.pinch = Some(snapshot);
        out.push(Gesture::PinchStart);
        out
    }

    /// Touch contacts moved.
    pub fn touch_move(&mut self, active: &[TouchPoint]) -> Vec<Gesture> {
        self.touches = active.to_vec();
        let Some((a, b)) = self.first_two() else {
            return Vec::new();
        };
        let Some(pinch) = self.pinch.as_mut() else {
            return Vec::new();
        };
        let mut out = Vec::new();

        let center = a.midpoint(b);
        let (dx, dy) = (center.x - pinch.center.x, center.y - pinch.center.y);
        if dx.hypot(dy) > TOUCH_PAN_THRESHOLD_PX {
            out.push(Gesture::PanMove { dx, dy });
            pinch.center = center;
        }

        let distance = a.distance(b);
        if pinch.distance > 0.0 && distance > 0.0 {
            let ratio = distance / pinch.distance;
            if (ratio - 1.0).abs() > PINCH_DEAD_ZONE {
                out.push(Gesture::ZoomAt { point: center, factor: ratio });
                pinch.distance = distance;
            }
        } else if distance > 0.0 {
            pinch.distance = distance;
        }
        out
    }

    /// Touch contacts lifted. `active` lists the touches still down.
    pub fn touch_end(&mut self, active: &[TouchPoint]) -> Vec<Gesture> {
        self.touches = active.to_vec();
        if self.pinch.is_none() {
            return Vec::new();
        }
        match self.snapshot() {
            // The first two may now be a different pair; measure from them.
            Some(snapshot) => {
                self.pinch = Some(snapshot);
                Vec::new()
            }
            None => {
                self.pinch = None;
                vec![Gesture::PinchEnd]
            }
        }
    }

    /// Resolve a drop against the transform that is live right now.
    #[must_use]
    pub fn drop_at(&self, payload: DragPayload, screen: Point, viewport: &ViewportTransform) -> Vec<Gesture> {
        if !screen.is_finite() {
            return Vec::new();
        }
        vec![Gesture::Drop { payload, screen, logical: viewport.to_logical(screen) }]
    }

    fn snapshot(&self) -> Option<PinchState> {
        let (a, b) = self.first_two()?;
        Some(PinchState { distance: a.distance(b), center: a.midpoint(b) })
    }

    fn first_two(&self) -> Option<(Point, Point)> {
        match self.touches.as_slice() {
            [a, b, ..] => Some((a.point(), b.point())),
            _ => None,
        }
    }
}
