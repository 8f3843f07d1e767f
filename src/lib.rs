//! Interactive canvas compositing engine.
//!
//! The canvas shows a background image fitted to its container, lets the user
//! draw a freehand path over it, accepts dragged-in images as movable
//! overlays, and exports a composite of everything. The host layer forwards
//! raw pointer, wheel, touch, and drop events to [`engine::EngineCore`] (or
//! the Tokio-driven [`engine::Engine`]) and acts on the returned
//! [`engine::Action`]s: redraws, cursor changes, callbacks, and image loads.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine, testable [`engine::EngineCore`], and the controller surface |
//! | [`doc`] | Object layer: background, dropped images, and paths |
//! | [`camera`] | Viewport transform and coordinate conversions |
//! | [`input`] | Input event types and the gesture interpreter |
//! | [`mode`] | Draw/select mode state machine and cursors |
//! | [`path`] | Freehand path data and its SVG path string |
//! | [`hit`] | Hit-testing against dropped images and delete controls |
//! | [`fit`] | Background fit and drop placement scale |
//! | [`render`] | Software rasterizer for the live view and exports |
//! | [`export`] | Composite export and PNG encoding |
//! | [`grid`] | Background grid appearance |
//! | [`loader`] | Image fetching and decoding |
//! | [`payload`] | Drag-and-drop payloads |
//! | [`monitor`] | Drop timing history |
//! | [`config`] | Environment-driven settings |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants (zoom limits, placement sizes, etc.) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod export;
pub mod fit;
pub mod grid;
pub mod hit;
pub mod input;
pub mod loader;
pub mod mode;
pub mod monitor;
pub mod path;
pub mod payload;
pub mod render;
