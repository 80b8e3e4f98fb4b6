//! Canonical default shapes for every node kind in a project document.
//!
//! Each factory returns the default-valued JSON object for its kind. The
//! reconstruction pass copies whitelisted fields from the untrusted source
//! onto these templates, so a field a factory does not emit (and no whitelist
//! names) can never reach the output.

use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Common shape shared by the stage and by sprites.
///
/// `scripts` is deliberately absent: it is optional in the document format
/// and appears in output only when the input carries it.
pub fn container() -> Map<String, Value> {
    object(json!({
        "objName": "",
        "variables": [],
        "lists": [],
        "sounds": [],
        "costumes": [],
        "currentCostumeIndex": 0,
        "scriptComments": [],
    }))
}

/// The project root. `objName` is pinned to `"Stage"` and is not part of any
/// copy whitelist, so input can never rename the root.
pub fn stage() -> Map<String, Value> {
    let mut target = container();
    target.extend(object(json!({
        "objName": "Stage",
        "penLayerMD5": "",
        "tempoBPM": 60,
        "videoAlpha": 0.5,
        "children": [],
        "info": {},
    })));
    target
}

/// A sprite: the container shape plus placement and presentation fields.
pub fn sprite() -> Map<String, Value> {
    let mut target = container();
    target.extend(object(json!({
        "scratchX": 0,
        "scratchY": 0,
        "scale": 1,
        "direction": 90,
        "rotationStyle": "normal",
        "isDraggable": false,
        "indexInLibrary": 1,
        "visible": true,
        "spriteInfo": {},
    })));
    target
}

/// A value watcher. `mode` is optional, like `scripts` on containers.
pub fn watcher() -> Map<String, Value> {
    object(json!({
        "target": "",
        "cmd": "",
        "param": "",
        "color": 0,
        "label": "",
        "sliderMin": 0,
        "sliderMax": 100,
        "isDiscrete": true,
        "x": 0,
        "y": 0,
        "visible": false,
    }))
}

/// A list watcher. `contents` is opaque passthrough.
pub fn list_watcher() -> Map<String, Value> {
    object(json!({
        "listName": "",
        "contents": [],
        "isPersistent": false,
        "x": 0,
        "y": 0,
        "width": 200,
        "height": 200,
        "visible": false,
    }))
}

/// A variable. `value` is opaque (number, string, or boolean in practice).
pub fn variable() -> Map<String, Value> {
    object(json!({
        "name": "",
        "value": 0,
        "isPersistent": false,
    }))
}
