//! Object layer: what is on the canvas and the store that owns it.
//!
//! Three kinds of object exist. The background image sits lowest and is never
//! selectable or hit-testable. Dropped images are selectable and carry their
//! own [`DeleteControl`]. Paths are non-interactive strokes; at most one is
//! uncommitted (the live preview) at a time.
//!
//! `DocStore` keeps objects in draw order. The background, when present, is
//! always at index 0; everything else stacks in insertion order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use uuid::Uuid;

use crate::camera::{Point, Rect};
use crate::consts::{DELETE_CONTROL_OFFSET_X_PX, DELETE_CONTROL_OFFSET_Y_PX, DELETE_CONTROL_SIZE_PX};
use crate::loader::DecodedImage;
use crate::path::PathData;

/// Unique identifier for a canvas object.
pub type ObjectId = Uuid;

/// The base image everything else is composited over.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub id: ObjectId,
    /// Where the pixels came from.
    pub url: String,
    pub image: DecodedImage,
    /// Display scale assigned by the fit engine.
    pub scale: f64,
    /// Logical position of the top-left corner.
    pub left: f64,
    pub top: f64,
}

impl BackgroundImage {
    /// A background at identity scale; the fit engine positions it later.
    #[must_use]
    pub fn new(url: impl Into<String>, image: DecodedImage) -> Self {
        Self { id: Uuid::new_v4(), url: url.into(), image, scale: 1.0, left: 0.0, top: 0.0 }
    }

    #[must_use]
    pub fn native_width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn native_height(&self) -> u32 {
        self.image.height()
    }

    /// Displayed extent in logical coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            f64::from(self.native_width()) * self.scale,
            f64::from(self.native_height()) * self.scale,
        )
    }
}

/// Removal affordance attached to a dropped image.
///
/// The control is a circle centered at a fixed screen-pixel offset from the
/// object's top-right corner, so it keeps its size at every zoom level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteControl {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Diameter in screen pixels.
    pub size: f64,
}

impl Default for DeleteControl {
    fn default() -> Self {
        Self { offset_x: DELETE_CONTROL_OFFSET_X_PX, offset_y: DELETE_CONTROL_OFFSET_Y_PX, size: DELETE_CONTROL_SIZE_PX }
    }
}

impl DeleteControl {
    /// Screen-space center for an object whose screen bounds are `bounds`.
    #[must_use]
    pub fn center(&self, bounds: &Rect) -> Point {
        Point::new(bounds.right() + self.offset_x, bounds.y + self.offset_y)
    }

    /// Whether the screen point `p` activates the control.
    #[must_use]
    pub fn hit(&self, bounds: &Rect, p: Point) -> bool {
        self.center(bounds).distance(p) <= self.size * 0.5
    }
}

/// An auxiliary image placed by drag-and-drop.
#[derive(Debug, Clone)]
pub struct DroppedImage {
    pub id: ObjectId,
    /// Identifier of the payload this image came from.
    pub source_id: String,
    pub url: String,
    pub image: DecodedImage,
    /// Logical position of the top-left corner.
    pub left: f64,
    pub top: f64,
    /// Uniform display scale.
    pub scale: f64,
    pub delete_control: DeleteControl,
}

impl DroppedImage {
    /// Place an image of the given scale centered on a logical point.
    #[must_use]
    pub fn centered_at(source_id: impl Into<String>, url: impl Into<String>, image: DecodedImage, center: Point, scale: f64) -> Self {
        let width = f64::from(image.width()) * scale;
        let height = f64::from(image.height()) * scale;
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.into(),
            url: url.into(),
            image,
            left: center.x - width * 0.5,
            top: center.y - height * 0.5,
            scale,
            delete_control: DeleteControl::default(),
        }
    }

    /// Displayed extent in logical coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            f64::from(self.image.width()) * self.scale,
            f64::from(self.image.height()) * self.scale,
        )
    }
}

/// A freehand path object.
#[derive(Debug, Clone)]
pub struct PathObject {
    pub id: ObjectId,
    pub data: PathData,
    /// `false` while the stroke is still being captured.
    pub committed: bool,
}

impl PathObject {
    /// An uncommitted preview seeded with the stroke's first point.
    #[must_use]
    pub fn preview(start: Point) -> Self {
        Self { id: Uuid::new_v4(), data: PathData::start(start), committed: false }
    }
}

/// Everything that can live on the canvas.
#[derive(Debug, Clone)]
pub enum CanvasObject {
    Background(BackgroundImage),
    Image(DroppedImage),
    Path(PathObject),
}

impl CanvasObject {
    #[must_use]
    pub fn id(&self) -> ObjectId {
        match self {
            Self::Background(bg) => bg.id,
            Self::Image(img) => img.id,
            Self::Path(path) => path.id,
        }
    }

    /// Only dropped images take part in selection.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

/// In-memory store of canvas objects in draw order.
#[derive(Debug, Default)]
pub struct DocStore {
    objects: Vec<CanvasObject>,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object on top of the stack.
    ///
    /// A background goes to the bottom instead, replacing any previous one,
    /// which is returned.
    pub fn add(&mut self, object: CanvasObject) -> Option<CanvasObject> {
        if !matches!(object, CanvasObject::Background(_)) {
            self.objects.push(object);
            return None;
        }
        if matches!(self.objects.first(), Some(CanvasObject::Background(_))) {
            return Some(std::mem::replace(&mut self.objects[0], object));
        }
        self.objects.insert(0, object);
        None
    }

    /// Remove an object by id, returning it if it was present.
    pub fn remove(&mut self, id: &ObjectId) -> Option<CanvasObject> {
        let index = self.objects.iter().position(|o| o.id() == *id)?;
        Some(self.objects.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&CanvasObject> {
        self.objects.iter().find(|o| o.id() == *id)
    }

    /// All objects, bottom first.
    #[must_use]
    pub fn all(&self) -> &[CanvasObject] {
        &self.objects
    }

    /// Objects matching `pred`, bottom first.
    pub fn find<P>(&self, mut pred: P) -> Vec<&CanvasObject>
    where
        P: FnMut(&CanvasObject) -> bool,
    {
        self.objects.iter().filter(|o| pred(*o)).collect()
    }

    #[must_use]
    pub fn background(&self) -> Option<&BackgroundImage> {
        match self.objects.first() {
            Some(CanvasObject::Background(bg)) => Some(bg),
            _ => None,
        }
    }

    pub fn background_mut(&mut self) -> Option<&mut BackgroundImage> {
        match self.objects.first_mut() {
            Some(CanvasObject::Background(bg)) => Some(bg),
            _ => None,
        }
    }

    #[must_use]
    pub fn image(&self, id: &ObjectId) -> Option<&DroppedImage> {
        self.dropped_images().find(|img| img.id == *id)
    }

    pub fn image_mut(&mut self, id: &ObjectId) -> Option<&mut DroppedImage> {
        self.objects.iter_mut().find_map(|o| match o {
            CanvasObject::Image(img) if img.id == *id => Some(img),
            _ => None,
        })
    }

    /// Dropped images, bottom first.
    pub fn dropped_images(&self) -> impl DoubleEndedIterator<Item = &DroppedImage> {
        self.objects.iter().filter_map(|o| match o {
            CanvasObject::Image(img) => Some(img),
            _ => None,
        })
    }

    /// The path currently being captured, if any.
    pub fn preview_path_mut(&mut self) -> Option<&mut PathObject> {
        self.objects.iter_mut().find_map(|o| match o {
            CanvasObject::Path(path) if !path.committed => Some(path),
            _ => None,
        })
    }

    /// Whether a committed path exists.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.objects
            .iter()
            .any(|o| matches!(o, CanvasObject::Path(path) if path.committed))
    }

    #[must_use]
    pub fn has_dropped_images(&self) -> bool {
        self.dropped_images().next().is_some()
    }

    /// Remove every path, committed or not. Returns how many were removed.
    pub fn clear_paths(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| !matches!(o, CanvasObject::Path(_)));
        before - self.objects.len()
    }

    /// Remove every dropped image, returning their ids.
    pub fn clear_dropped_images(&mut self) -> Vec<ObjectId> {
        let removed = self.dropped_images().map(|img| img.id).collect();
        self.objects.retain(|o| !matches!(o, CanvasObject::Image(_)));
        removed
    }

    /// Number of objects currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the store contains no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
