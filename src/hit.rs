#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, ViewportTransform};
use crate::doc::{DocStore, ObjectId};

/// Which part of an object was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    Body,
    DeleteControl,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub object_id: ObjectId,
    pub part: HitPart,
}

/// Test which object (if any) is under `screen_pt`, checking the selected
/// object's delete control first.
///
/// Only dropped images are candidates; the background and paths never are.
/// The delete control is shown, and therefore hittable, only on the selected
/// image, and it never counts as part of the body.
#[must_use]
pub fn hit_test(screen_pt: Point, doc: &DocStore, viewport: &ViewportTransform, selected_id: Option<ObjectId>) -> Option<Hit> {
    if !screen_pt.is_finite() {
        return None;
    }

    if let Some(img) = selected_id.and_then(|id| doc.image(&id)) {
        let bounds = viewport.rect_to_screen(&img.bounds());
        if img.delete_control.hit(&bounds, screen_pt) {
            return Some(Hit { object_id: img.id, part: HitPart::DeleteControl });
        }
    }

    doc.dropped_images()
        .rev()
        .find(|img| viewport.rect_to_screen(&img.bounds()).contains(screen_pt))
        .map(|img| Hit { object_id: img.id, part: HitPart::Body })
}
