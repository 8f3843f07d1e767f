//! Engine: ties input, mode, document, and loading together.
//!
//! `EngineCore` owns all canvas state and is fully synchronous. Every input
//! handler returns a list of [`Action`]s for the host: redraw requests, cursor
//! changes, callbacks, and image loads to perform. A load comes back through
//! [`EngineCore::apply_load`] with the ticket it was issued under; tickets that
//! were superseded or cancelled in the meantime are discarded on arrival.
//!
//! `Engine` wraps the core with a Tokio driver that performs the loads itself,
//! so mutations still happen only on the caller's task.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::camera::{Point, Rect, ViewportTransform};
use crate::config::CanvasConfig;
use crate::doc::{BackgroundImage, CanvasObject, DocStore, DroppedImage, ObjectId, PathObject};
use crate::error::{ExportError, LoadError};
use crate::export::{self, CompositeFile};
use crate::fit::{fit, placement_scale};
use crate::grid::GridConfig;
use crate::hit::{self, HitPart};
use crate::input::{Button, Gesture, GestureInterpreter, Modifiers, PointerState, TouchPoint, WheelDelta};
use crate::loader::{DecodedImage, HttpImageSource, ImageSource, load_image};
use crate::mode::{Cursor, Mode, ModeChange, ModeMachine, ModeState};
use crate::monitor::DropMonitor;
use crate::payload::DragPayload;
use crate::render::{self, Overlay, RasterView};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A non-fatal message for the host to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Identifies one issued image load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub u64);

/// What a load is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSlot {
    /// Only the newest background load is ever applied.
    Background,
    /// Each drop is its own slot.
    Drop,
}

/// An image the host should fetch and hand back to [`EngineCore::apply_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub slot: LoadSlot,
    pub url: String,
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    SetCursor(Cursor),
    ModeChanged(ModeChange),
    /// A stroke finished; carries the final path string.
    PathCompleted(String),
    /// A valid payload was dropped. Sent before its image loads.
    DropAccepted { payload_id: String },
    LoadImage(LoadRequest),
    ObjectAdded { id: ObjectId },
    ObjectDeleted { id: ObjectId },
    SelectionChanged(Option<ObjectId>),
    /// The background was replaced or removed; carries its native size.
    BackgroundChanged { native: Option<(u32, u32)> },
    Notify(Notice),
}

/// Pointer interaction in progress while selecting.
#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    /// Moving a dropped image; `last` is the previous logical pointer.
    Moving { id: ObjectId, last: Point },
    /// Rubber-band selection between two screen points.
    Marquee { start: Point, current: Point },
}

#[derive(Debug)]
enum PendingLoad {
    Background { url: String },
    Drop { payload_id: String, url: String, center: Point, started: Instant },
}

/// Core engine state: all logic that doesn't depend on a runtime or display.
pub struct EngineCore {
    pub doc: DocStore,
    pub viewport: ViewportTransform,
    pub gestures: GestureInterpreter,
    pub mode: ModeMachine,
    pub config: CanvasConfig,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
    selected: Option<ObjectId>,
    drag: Option<DragState>,
    cursor: Cursor,
    grid: GridConfig,
    grid_tile: Option<RgbaImage>,
    pending: HashMap<LoadTicket, PendingLoad>,
    next_ticket: u64,
    background_ticket: Option<LoadTicket>,
    monitor: DropMonitor,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(CanvasConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: CanvasConfig) -> Self {
        let grid = GridConfig::default();
        Self {
            doc: DocStore::new(),
            viewport: ViewportTransform::default(),
            gestures: GestureInterpreter::new(),
            mode: ModeMachine::new(),
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
            selected: None,
            drag: None,
            cursor: Cursor::Default,
            grid_tile: grid.pattern(),
            grid,
            pending: HashMap::new(),
            next_ticket: 0,
            background_ticket: None,
            monitor: DropMonitor::new(),
        }
    }

    // --- Queries ---

    /// The currently selected object, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ObjectId> {
        self.selected
    }

    /// The mode in effect, or `None` while a two-finger gesture suspends it.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.mode.mode()
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    #[must_use]
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    #[must_use]
    pub fn drop_monitor(&self) -> &DropMonitor {
        &self.monitor
    }

    /// Loads issued but not yet applied or cancelled.
    #[must_use]
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Marquee rectangle in screen space while one is being dragged.
    #[must_use]
    pub fn marquee(&self) -> Option<Rect> {
        match self.drag {
            Some(DragState::Marquee { start, current }) => Some(Rect::from_corners(start, current)),
            _ => None,
        }
    }

    // --- Host inputs ---

    /// Host toggled the drawing intent.
    pub fn set_drawing_intent(&mut self, intent: bool) -> Vec<Action> {
        let mut actions = Vec::new();
        let change = self.mode.set_intent(intent);
        self.on_mode_change(change, &mut actions);
        actions
    }

    /// Container resized. Refits the background.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.viewport_width = width_css;
        self.viewport_height = height_css;
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.refit_background();
        vec![Action::RenderNeeded]
    }

    /// Replace the grid appearance and regenerate its tile.
    pub fn set_grid(&mut self, grid: GridConfig) -> Vec<Action> {
        self.grid_tile = grid.pattern();
        self.grid = grid;
        vec![Action::RenderNeeded]
    }

    /// Assign or remove the background image.
    ///
    /// A new URL supersedes any background load still in flight. Dropped
    /// images are kept either way.
    pub fn set_background_url(&mut self, url: Option<&str>) -> Vec<Action> {
        if let Some(stale) = self.background_ticket.take() {
            if self.pending.remove(&stale).is_some() {
                debug!(ticket = stale.0, "background load superseded");
            }
        }

        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            if self.remove_background() {
                info!("background removed");
                return vec![Action::BackgroundChanged { native: None }, Action::RenderNeeded];
            }
            return Vec::new();
        };

        let ticket = self.issue_ticket(PendingLoad::Background { url: url.to_string() });
        self.background_ticket = Some(ticket);
        info!(%url, ticket = ticket.0, "loading background");
        vec![Action::LoadImage(LoadRequest { ticket, slot: LoadSlot::Background, url: url.to_string() })]
    }

    /// Deliver the outcome of a load issued through [`Action::LoadImage`].
    pub fn apply_load(&mut self, ticket: LoadTicket, result: Result<DecodedImage, LoadError>) -> Vec<Action> {
        let Some(pending) = self.pending.remove(&ticket) else {
            debug!(ticket = ticket.0, "discarding stale image load");
            return Vec::new();
        };
        match pending {
            PendingLoad::Background { url } => {
                self.background_ticket = None;
                self.apply_background(url, result)
            }
            PendingLoad::Drop { payload_id, url, center, started } => {
                let outcome = self.place_dropped_image(payload_id, url, center, result);
                self.monitor.record(started.elapsed(), outcome.is_ok());
                match outcome {
                    Ok(actions) => actions,
                    Err(e) => {
                        warn!(error = %e, "dropped image failed to load");
                        vec![notify(NoticeLevel::Error, format!("Failed to load dropped image: {e}"))]
                    }
                }
            }
        }
    }

    /// Select a dropped image. Forces `Select` mode.
    pub fn select(&mut self, id: ObjectId) -> Vec<Action> {
        let mut actions = Vec::new();
        self.select_into(id, &mut actions);
        actions
    }

    /// Clear the selection. Restores `Draw` when drawing intent is set.
    pub fn deselect(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.deselect_into(&mut actions);
        actions
    }

    /// Remove a dropped image, leaving every other object in place.
    pub fn delete_object(&mut self, id: ObjectId) -> Vec<Action> {
        let mut actions = Vec::new();
        self.delete_into(id, &mut actions);
        actions
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let gestures = self.gestures.pointer_down(screen_pt, button, modifiers, self.mode.is_draw_armed());
        self.apply_gestures(gestures)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        let gestures = self.gestures.pointer_move(screen_pt);
        let mut actions = Vec::new();
        if self.gestures.pointer_state() == PointerState::Idle && !self.gestures.is_pinching() {
            self.update_hover(screen_pt, &mut actions);
        }
        for gesture in gestures {
            self.apply_gesture(gesture, &mut actions);
        }
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point) -> Vec<Action> {
        let gestures = self.gestures.pointer_up(screen_pt);
        self.apply_gestures(gestures)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        let gestures = self.gestures.wheel(screen_pt, delta, modifiers);
        self.apply_gestures(gestures)
    }

    pub fn on_touch_start(&mut self, active: &[TouchPoint]) -> Vec<Action> {
        let gestures = self.gestures.touch_start(active);
        self.apply_gestures(gestures)
    }

    pub fn on_touch_move(&mut self, active: &[TouchPoint]) -> Vec<Action> {
        let gestures = self.gestures.touch_move(active);
        self.apply_gestures(gestures)
    }

    pub fn on_touch_end(&mut self, active: &[TouchPoint]) -> Vec<Action> {
        let gestures = self.gestures.touch_end(active);
        self.apply_gestures(gestures)
    }

    /// An external payload was dropped at a screen point.
    pub fn on_drop(&mut self, payload: DragPayload, screen_pt: Point) -> Vec<Action> {
        let gestures = self.gestures.drop_at(payload, screen_pt, &self.viewport);
        self.apply_gestures(gestures)
    }

    /// Drop with raw drag data JSON.
    pub fn on_drop_json(&mut self, raw: &str, screen_pt: Point) -> Vec<Action> {
        match DragPayload::from_json(raw) {
            Ok(payload) => self.on_drop(payload, screen_pt),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable drop payload");
                vec![notify(NoticeLevel::Warning, format!("Could not read dropped item: {e}"))]
            }
        }
    }

    // --- Output ---

    /// Rasterize the live view: grid, objects, and selection chrome.
    #[must_use]
    pub fn render(&self) -> Option<RgbaImage> {
        let view = RasterView::from_viewport(&self.viewport, self.viewport_width, self.viewport_height, self.dpr)?;
        let mut out = view.blank();
        let overlay = Overlay {
            grid: self.grid_tile.as_ref(),
            selected: self.selected.and_then(|id| self.doc.image(&id)),
            marquee: self.marquee(),
        };
        render::draw(&mut out, &self.doc, &view, &overlay);
        Some(out)
    }

    // --- Gesture dispatch ---

    fn apply_gestures(&mut self, gestures: Vec<Gesture>) -> Vec<Action> {
        let mut actions = Vec::new();
        for gesture in gestures {
            self.apply_gesture(gesture, &mut actions);
        }
        actions
    }

    fn apply_gesture(&mut self, gesture: Gesture, actions: &mut Vec<Action>) {
        match gesture {
            Gesture::PanStart => self.set_cursor(Cursor::Grab, actions),
            Gesture::PanMove { dx, dy } => {
                self.viewport.pan(dx, dy);
                actions.push(Action::RenderNeeded);
            }
            Gesture::PanEnd => self.set_cursor(self.mode.cursor(), actions),
            Gesture::ZoomAt { point, factor } => {
                self.viewport.zoom_to_point(point, factor);
                actions.push(Action::RenderNeeded);
            }
            Gesture::StrokeStart(screen) => self.start_stroke(screen, actions),
            Gesture::StrokeMove(screen) => {
                let logical = self.viewport.to_logical(screen);
                if let Some(path) = self.doc.preview_path_mut() {
                    path.data.line_to(logical);
                    actions.push(Action::RenderNeeded);
                }
            }
            Gesture::StrokeEnd => self.finish_stroke(actions),
            Gesture::Press(screen) => self.press(screen, actions),
            Gesture::DragTo(screen) => self.drag_to(screen, actions),
            Gesture::Release(screen) => self.release(screen, actions),
            Gesture::PointerCancel => {
                self.abort_stroke(actions);
                if self.drag.take().is_some() {
                    actions.push(Action::RenderNeeded);
                }
            }
            Gesture::PinchStart => {
                let change = self.mode.begin_gesture();
                self.on_mode_change(change, actions);
            }
            Gesture::PinchEnd => {
                let change = self.mode.end_gesture();
                self.on_mode_change(change, actions);
            }
            Gesture::Drop { payload, logical, .. } => self.accept_drop(payload, logical, actions),
        }
    }

    fn on_mode_change(&mut self, change: Option<ModeChange>, actions: &mut Vec<Action>) {
        let Some(change) = change else {
            return;
        };
        match change.from {
            ModeState::Active(Mode::Draw) => self.abort_stroke(actions),
            ModeState::Active(Mode::Select) => self.drag = None,
            ModeState::GestureActive { .. } => {}
        }
        info!(from = ?change.from, to = ?change.to, "mode changed");
        actions.push(Action::ModeChanged(change));
        self.set_cursor(self.mode.cursor(), actions);
    }

    fn set_cursor(&mut self, cursor: Cursor, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor = cursor;
            actions.push(Action::SetCursor(cursor));
        }
    }

    fn update_hover(&mut self, screen: Point, actions: &mut Vec<Action>) {
        let over_control = self.mode.selection_enabled()
            && hit::hit_test(screen, &self.doc, &self.viewport, self.selected)
                .is_some_and(|h| h.part == HitPart::DeleteControl);
        let cursor = if over_control { Cursor::Pointer } else { self.mode.cursor() };
        self.set_cursor(cursor, actions);
    }

    // --- Strokes ---

    fn start_stroke(&mut self, screen: Point, actions: &mut Vec<Action>) {
        let removed = self.doc.clear_paths();
        if removed > 0 {
            debug!(removed, "cleared previous paths for new stroke");
        }
        self.doc.add(CanvasObject::Path(PathObject::preview(self.viewport.to_logical(screen))));
        actions.push(Action::RenderNeeded);
    }

    fn finish_stroke(&mut self, actions: &mut Vec<Action>) {
        let Some(path) = self.doc.preview_path_mut() else {
            return;
        };
        if path.data.is_degenerate() {
            let id = path.id;
            self.doc.remove(&id);
            debug!("discarded degenerate stroke");
            actions.push(Action::RenderNeeded);
            return;
        }
        path.data.close();
        path.committed = true;
        let svg = path.data.to_svg();
        info!(points = path.data.points().len(), "stroke committed");
        actions.push(Action::PathCompleted(svg));
        actions.push(Action::RenderNeeded);
    }

    fn abort_stroke(&mut self, actions: &mut Vec<Action>) {
        if let Some(id) = self.doc.preview_path_mut().map(|p| p.id) {
            self.doc.remove(&id);
            debug!("aborted stroke in progress");
            actions.push(Action::RenderNeeded);
        }
    }

    // --- Selection interaction ---

    fn press(&mut self, screen: Point, actions: &mut Vec<Action>) {
        if !self.mode.selection_enabled() {
            return;
        }
        match hit::hit_test(screen, &self.doc, &self.viewport, self.selected) {
            Some(h) if h.part == HitPart::DeleteControl => self.delete_into(h.object_id, actions),
            Some(h) => {
                self.select_into(h.object_id, actions);
                self.drag = Some(DragState::Moving { id: h.object_id, last: self.viewport.to_logical(screen) });
            }
            None => {
                self.deselect_into(actions);
                // Deselecting may have re-armed drawing.
                if self.mode.selection_enabled() {
                    self.drag = Some(DragState::Marquee { start: screen, current: screen });
                }
            }
        }
    }

    fn drag_to(&mut self, screen: Point, actions: &mut Vec<Action>) {
        match self.drag {
            Some(DragState::Moving { id, last }) => {
                let logical = self.viewport.to_logical(screen);
                if let Some(img) = self.doc.image_mut(&id) {
                    img.left += logical.x - last.x;
                    img.top += logical.y - last.y;
                    actions.push(Action::RenderNeeded);
                }
                self.drag = Some(DragState::Moving { id, last: logical });
            }
            Some(DragState::Marquee { start, .. }) => {
                self.drag = Some(DragState::Marquee { start, current: screen });
                actions.push(Action::RenderNeeded);
            }
            None => {}
        }
    }

    fn release(&mut self, screen: Point, actions: &mut Vec<Action>) {
        let Some(DragState::Marquee { start, .. }) = self.drag.take() else {
            return;
        };
        actions.push(Action::RenderNeeded);
        let area = Rect::from_corners(start, screen);
        if area.width <= 0.0 || area.height <= 0.0 {
            return;
        }
        let inside = self
            .doc
            .dropped_images()
            .rev()
            .find(|img| area.contains_rect(&self.viewport.rect_to_screen(&img.bounds())))
            .map(|img| img.id);
        if let Some(id) = inside {
            self.select_into(id, actions);
        }
    }

    fn select_into(&mut self, id: ObjectId, actions: &mut Vec<Action>) {
        if self.doc.image(&id).is_none() || self.selected == Some(id) {
            return;
        }
        self.selected = Some(id);
        debug!(%id, "object selected");
        actions.push(Action::SelectionChanged(Some(id)));
        actions.push(Action::RenderNeeded);
        let change = self.mode.set_has_selection(true);
        self.on_mode_change(change, actions);
    }

    fn deselect_into(&mut self, actions: &mut Vec<Action>) {
        if self.selected.take().is_none() {
            return;
        }
        actions.push(Action::SelectionChanged(None));
        actions.push(Action::RenderNeeded);
        let change = self.mode.set_has_selection(false);
        self.on_mode_change(change, actions);
    }

    fn delete_into(&mut self, id: ObjectId, actions: &mut Vec<Action>) {
        if self.doc.image(&id).is_none() {
            return;
        }
        self.doc.remove(&id);
        if matches!(self.drag, Some(DragState::Moving { id: moving, .. }) if moving == id) {
            self.drag = None;
        }
        info!(%id, "dropped image deleted");
        actions.push(Action::ObjectDeleted { id });
        if self.selected == Some(id) {
            self.deselect_into(actions);
        }
        actions.push(Action::RenderNeeded);
    }

    // --- Drops and loads ---

    fn accept_drop(&mut self, payload: DragPayload, logical: Point, actions: &mut Vec<Action>) {
        if let Err(e) = payload.validate(self.config.max_image_bytes) {
            warn!(payload_id = %payload.id, error = %e, "rejected drop");
            actions.push(notify(NoticeLevel::Warning, format!("Cannot place dropped item: {e}")));
            return;
        }
        let url = payload.url.clone();
        let ticket = self.issue_ticket(PendingLoad::Drop {
            payload_id: payload.id.clone(),
            url: url.clone(),
            center: logical,
            started: Instant::now(),
        });
        info!(payload_id = %payload.id, %url, ticket = ticket.0, x = logical.x, y = logical.y, "drop accepted");
        actions.push(Action::DropAccepted { payload_id: payload.id });
        actions.push(Action::LoadImage(LoadRequest { ticket, slot: LoadSlot::Drop, url }));
    }

    fn place_dropped_image(
        &mut self,
        payload_id: String,
        url: String,
        center: Point,
        result: Result<DecodedImage, LoadError>,
    ) -> Result<Vec<Action>, LoadError> {
        let image = result?;
        let (width, height) = (image.width(), image.height());
        let scale = placement_scale(f64::from(width), f64::from(height), self.config.max_placement)
            .ok_or(LoadError::InvalidDimensions { width, height })?;
        let img = DroppedImage::centered_at(payload_id, url, image, center, scale);
        let id = img.id;
        info!(%id, width, height, scale, "dropped image placed");
        self.doc.add(CanvasObject::Image(img));
        Ok(vec![Action::ObjectAdded { id }, Action::RenderNeeded])
    }

    fn apply_background(&mut self, url: String, result: Result<DecodedImage, LoadError>) -> Vec<Action> {
        let image = match result {
            Ok(image) => image,
            Err(e) => {
                warn!(%url, error = %e, "background failed to load");
                return vec![notify(NoticeLevel::Error, format!("Failed to load background image: {e}"))];
            }
        };
        let native = (image.width(), image.height());
        info!(%url, width = native.0, height = native.1, "background set");
        self.doc.add(CanvasObject::Background(BackgroundImage::new(url, image)));
        self.refit_background();
        vec![Action::BackgroundChanged { native: Some(native) }, Action::RenderNeeded]
    }

    fn remove_background(&mut self) -> bool {
        let Some(id) = self.doc.background().map(|bg| bg.id) else {
            return false;
        };
        self.doc.remove(&id).is_some()
    }

    fn refit_background(&mut self) {
        let (width, height, reserved) = (self.viewport_width, self.viewport_height, self.config.reserved_bottom);
        let Some(bg) = self.doc.background_mut() else {
            return;
        };
        let Some(f) = fit(f64::from(bg.native_width()), f64::from(bg.native_height()), width, height, reserved) else {
            debug!(width, height, "container too small to fit background");
            return;
        };
        bg.scale = f.scale;
        bg.left = f.left;
        bg.top = f.top;
        debug!(scale = f.scale, left = f.left, top = f.top, "background fitted");
    }

    fn issue_ticket(&mut self, load: PendingLoad) -> LoadTicket {
        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        self.pending.insert(ticket, load);
        ticket
    }

    fn cancel_drop_loads(&mut self) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, load| !matches!(load, PendingLoad::Drop { .. }));
        before - self.pending.len()
    }
}

fn notify(level: NoticeLevel, message: String) -> Action {
    Action::Notify(Notice { level, message })
}

/// The surface the orchestration layer drives the canvas through.
pub trait CanvasController {
    /// Remove every path.
    fn clear_path(&mut self) -> Vec<Action>;
    /// Remove every dropped image and cancel drops still loading.
    fn clear_dropped_images(&mut self) -> Vec<Action>;
    fn has_path(&self) -> bool;
    fn has_dropped_images(&self) -> bool;
    /// Background region at native resolution, or `None` without a background.
    fn export_cropped_to_background(&self) -> Option<RgbaImage>;
    /// The visible canvas at device resolution.
    fn export_full(&self) -> Option<RgbaImage>;
    /// Hand off a dropped payload at a screen point.
    fn handle_drop(&mut self, payload: DragPayload, screen_pt: Point) -> Vec<Action>;
}

impl CanvasController for EngineCore {
    fn clear_path(&mut self) -> Vec<Action> {
        let removed = self.doc.clear_paths();
        if removed == 0 {
            return Vec::new();
        }
        info!(removed, "paths cleared");
        vec![Action::RenderNeeded]
    }

    fn clear_dropped_images(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        let cancelled = self.cancel_drop_loads();
        let removed = self.doc.clear_dropped_images();
        if let Some(DragState::Moving { .. }) = self.drag {
            self.drag = None;
        }
        if self.selected.is_some_and(|id| removed.contains(&id)) {
            self.deselect_into(&mut actions);
        }
        if removed.is_empty() && cancelled == 0 {
            return actions;
        }
        info!(removed = removed.len(), cancelled, "dropped images cleared");
        actions.extend(removed.into_iter().map(|id| Action::ObjectDeleted { id }));
        actions.push(Action::RenderNeeded);
        actions
    }

    fn has_path(&self) -> bool {
        self.doc.has_path()
    }

    fn has_dropped_images(&self) -> bool {
        self.doc.has_dropped_images()
    }

    fn export_cropped_to_background(&self) -> Option<RgbaImage> {
        export::export_cropped_to_background(&self.doc)
    }

    fn export_full(&self) -> Option<RgbaImage> {
        export::export_full(&self.doc, &self.viewport, self.viewport_width, self.viewport_height, self.dpr)
    }

    fn handle_drop(&mut self, payload: DragPayload, screen_pt: Point) -> Vec<Action> {
        self.on_drop(payload, screen_pt)
    }
}

/// Encode the background-cropped composite for submission.
///
/// `Ok(None)` when there is no background to crop to.
///
/// # Errors
///
/// Returns [`ExportError`] if PNG encoding fails.
pub fn composite_file(canvas: &dyn CanvasController) -> Result<Option<CompositeFile>, ExportError> {
    match canvas.export_cropped_to_background() {
        Some(raster) => CompositeFile::from_raster(&raster).map(Some),
        None => Ok(None),
    }
}

type LoadOutcome = (LoadTicket, Result<DecodedImage, LoadError>);

/// The full engine: the core plus a Tokio driver that performs image loads.
///
/// Methods that can issue loads spawn them and must be called from within
/// a Tokio runtime.
pub struct Engine {
    pub core: EngineCore,
    source: Arc<dyn ImageSource>,
    loads: JoinSet<LoadOutcome>,
}

impl Engine {
    #[must_use]
    pub fn new(core: EngineCore, source: Arc<dyn ImageSource>) -> Self {
        Self { core, source, loads: JoinSet::new() }
    }

    /// Engine fetching over HTTP and from local files.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn with_http(config: CanvasConfig) -> Result<Self, LoadError> {
        let source = HttpImageSource::new(&config)?;
        Ok(Self::new(EngineCore::with_config(config), Arc::new(source)))
    }

    /// Spawn every requested load and return the remaining actions.
    pub fn dispatch(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let mut rest = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                Action::LoadImage(request) => self.spawn_load(request),
                other => rest.push(other),
            }
        }
        rest
    }

    fn spawn_load(&mut self, request: LoadRequest) {
        let source = Arc::clone(&self.source);
        let timeout = self.core.config.load_timeout;
        debug!(ticket = request.ticket.0, url = %request.url, "spawning image load");
        self.loads.spawn(async move {
            let result = load_image(source.as_ref(), &request.url, timeout).await;
            (request.ticket, result)
        });
    }

    /// Wait for the next load to finish and apply it. `None` when idle.
    pub async fn next_load(&mut self) -> Option<Vec<Action>> {
        loop {
            match self.loads.join_next().await? {
                Ok((ticket, result)) => {
                    let actions = self.core.apply_load(ticket, result);
                    return Some(self.dispatch(actions));
                }
                Err(e) => error!(error = %e, "image load task failed"),
            }
        }
    }

    /// Apply loads until none remain in flight.
    pub async fn settle(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        while let Some(more) = self.next_load().await {
            actions.extend(more);
        }
        actions
    }

    // --- Delegated inputs ---

    pub fn set_drawing_intent(&mut self, intent: bool) -> Vec<Action> {
        self.core.set_drawing_intent(intent)
    }

    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) -> Vec<Action> {
        self.core.set_viewport(width_css, height_css, dpr)
    }

    pub fn set_grid(&mut self, grid: GridConfig) -> Vec<Action> {
        self.core.set_grid(grid)
    }

    pub fn set_background_url(&mut self, url: Option<&str>) -> Vec<Action> {
        let actions = self.core.set_background_url(url);
        self.dispatch(actions)
    }

    pub fn select(&mut self, id: ObjectId) -> Vec<Action> {
        self.core.select(id)
    }

    pub fn deselect(&mut self) -> Vec<Action> {
        self.core.deselect()
    }

    pub fn delete_object(&mut self, id: ObjectId) -> Vec<Action> {
        self.core.delete_object(id)
    }

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_touch_start(&mut self, active: &[TouchPoint]) -> Vec<Action> {
        self.core.on_touch_start(active)
    }

    pub fn on_touch_move(&mut self, active: &[TouchPoint]) -> Vec<Action> {
        self.core.on_touch_move(active)
    }

    pub fn on_touch_end(&mut self, active: &[TouchPoint]) -> Vec<Action> {
        self.core.on_touch_end(active)
    }

    pub fn on_drop_json(&mut self, raw: &str, screen_pt: Point) -> Vec<Action> {
        let actions = self.core.on_drop_json(raw, screen_pt);
        self.dispatch(actions)
    }

    #[must_use]
    pub fn render(&self) -> Option<RgbaImage> {
        self.core.render()
    }
}

impl CanvasController for Engine {
    fn clear_path(&mut self) -> Vec<Action> {
        self.core.clear_path()
    }

    fn clear_dropped_images(&mut self) -> Vec<Action> {
        self.core.clear_dropped_images()
    }

    fn has_path(&self) -> bool {
        self.core.has_path()
    }

    fn has_dropped_images(&self) -> bool {
        self.core.has_dropped_images()
    }

    fn export_cropped_to_background(&self) -> Option<RgbaImage> {
        self.core.export_cropped_to_background()
    }

    fn export_full(&self) -> Option<RgbaImage> {
        self.core.export_full()
    }

    fn handle_drop(&mut self, payload: DragPayload, screen_pt: Point) -> Vec<Action> {
        let actions = self.core.on_drop(payload, screen_pt);
        self.dispatch(actions)
    }
}
