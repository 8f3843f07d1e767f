//! Drawing mode state machine.
//!
//! The canvas is either drawing (`Draw`) or manipulating objects (`Select`).
//! The effective mode is derived from two inputs: the host's drawing intent
//! and whether an object is selected. `Draw` holds iff intent is set and
//! nothing is selected. A two-finger gesture suspends both modes and restores
//! the derived mode when it ends.

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

/// Interaction mode of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Objects can be selected, dragged, and marquee-selected.
    #[default]
    Select,
    /// Primary presses capture freehand strokes; selection is off.
    Draw,
}

/// Full machine state, including the gesture suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeState {
    Active(Mode),
    /// A multi-touch gesture owns input. `resume` is the mode to restore.
    GestureActive { resume: Mode },
}

impl Default for ModeState {
    fn default() -> Self {
        Self::Active(Mode::Select)
    }
}

/// A state change, reported so the host can refresh its affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: ModeState,
    pub to: ModeState,
}

/// Pointer affordance the host should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Default,
    /// Pen-shaped cursor shown while drawing.
    Pen,
    /// Open hand shown while panning.
    Grab,
    /// Shown over the delete control.
    Pointer,
}

const PEN_CURSOR_CSS: &str = concat!(
    "url(\"data:image/svg+xml;utf8,",
    "<svg width='24' height='24' viewBox='0 0 24 24' xmlns='http://www.w3.org/2000/svg'>",
    "<path d='M22 4L20 6L5 21L1 23L3 19L18 4L22 4Z' fill='%23000' stroke='%23fff' stroke-width='1.5'/>",
    "</svg>\") 2 22, crosshair"
);

impl Cursor {
    /// CSS `cursor` value for this affordance.
    #[must_use]
    pub fn css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Pen => PEN_CURSOR_CSS,
            Self::Grab => "grab",
            Self::Pointer => "pointer",
        }
    }
}

/// Derives the interaction mode from drawing intent and selection.
#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    intent: bool,
    has_selection: bool,
    state: ModeState,
}

impl ModeMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ModeState {
        self.state
    }

    /// The mode in effect, or `None` while a gesture suspends both.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        match self.state {
            ModeState::Active(mode) => Some(mode),
            ModeState::GestureActive { .. } => None,
        }
    }

    #[must_use]
    pub fn intent(&self) -> bool {
        self.intent
    }

    /// Primary presses start strokes.
    #[must_use]
    pub fn is_draw_armed(&self) -> bool {
        self.state == ModeState::Active(Mode::Draw)
    }

    /// Objects can be selected and marquee selection is available.
    #[must_use]
    pub fn selection_enabled(&self) -> bool {
        self.state == ModeState::Active(Mode::Select)
    }

    /// Cursor matching the current state.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        if self.is_draw_armed() { Cursor::Pen } else { Cursor::Default }
    }

    /// Host toggled the drawing intent.
    pub fn set_intent(&mut self, intent: bool) -> Option<ModeChange> {
        self.intent = intent;
        self.reevaluate()
    }

    /// Selection gained or lost its object.
    pub fn set_has_selection(&mut self, has_selection: bool) -> Option<ModeChange> {
        self.has_selection = has_selection;
        self.reevaluate()
    }

    /// Suspend drawing and selection for a multi-touch gesture.
    pub fn begin_gesture(&mut self) -> Option<ModeChange> {
        let ModeState::Active(mode) = self.state else {
            return None;
        };
        self.transition(ModeState::GestureActive { resume: mode })
    }

    /// Restore the suspended mode.
    pub fn end_gesture(&mut self) -> Option<ModeChange> {
        let ModeState::GestureActive { resume } = self.state else {
            return None;
        };
        self.transition(ModeState::Active(resume))
    }

    fn derived(&self) -> Mode {
        if self.intent && !self.has_selection { Mode::Draw } else { Mode::Select }
    }

    fn reevaluate(&mut self) -> Option<ModeChange> {
        let derived = self.derived();
        match self.state {
            ModeState::Active(_) => self.transition(ModeState::Active(derived)),
            // Inputs may change mid-gesture; only the resume target moves.
            ModeState::GestureActive { .. } => {
                self.state = ModeState::GestureActive { resume: derived };
                None
            }
        }
    }

    fn transition(&mut self, to: ModeState) -> Option<ModeChange> {
        if self.state == to {
            return None;
        }
        let change = ModeChange { from: self.state, to };
        self.state = to;
        Some(change)
    }
}
