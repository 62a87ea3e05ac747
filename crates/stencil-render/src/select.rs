//! Per-mode object selection.

use crate::options::RenderMode;
use stencil_core::{ObjectType, Template, TemplateObject};

/// Smallest width and height of an image or shape that counts as a main
/// object in thumbnails.
pub const MIN_MAIN_EXTENT: f64 = 20.0;

fn is_main_object(object: &TemplateObject) -> bool {
    match object.object_type {
        ObjectType::Text => true,
        ObjectType::Image => object
            .node_data
            .extent()
            .is_none_or(|(w, h)| w >= MIN_MAIN_EXTENT && h >= MIN_MAIN_EXTENT),
        ObjectType::Shape => object
            .node_data
            .extent()
            .is_some_and(|(w, h)| w >= MIN_MAIN_EXTENT && h >= MIN_MAIN_EXTENT),
        ObjectType::Group => false,
    }
}

fn is_cheap(object: &TemplateObject) -> bool {
    object.object_type != ObjectType::Group
        && !object.node_data.has_filters()
        && !object.node_data.has_shadow()
}

/// Objects to draw for `mode`, back to front.
///
/// The mode filter runs first, then `cap` keeps the first objects in
/// declaration order, then survivors are sorted by `zIndex` with
/// declaration order breaking ties.
pub fn select_objects(template: &Template, mode: RenderMode, cap: Option<usize>) -> Vec<&TemplateObject> {
    let mut selected: Vec<(usize, &TemplateObject)> = template
        .objects
        .iter()
        .enumerate()
        .filter(|(_, object)| match mode {
            RenderMode::FastPreview => is_cheap(object),
            RenderMode::Thumbnail => is_main_object(object),
            RenderMode::HighQuality => true,
        })
        .take(cap.unwrap_or(usize::MAX))
        .collect();

    selected.sort_by_key(|(index, object)| (object.node_data.z_index.unwrap_or(0), *index));
    selected.into_iter().map(|(_, object)| object).collect()
}
