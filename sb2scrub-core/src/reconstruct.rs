//! Whitelist reconstruction of untrusted project documents.
//!
//! Nothing in this module trusts its input. Every output record starts from a
//! schema template and receives only fields named on a fixed whitelist:
//! unknown fields never survive, missing fields keep their defaults, and
//! nested collections are rebuilt element by element rather than copied
//! wholesale.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema;

/// Container fields shared by the stage and by sprites. `variables` and
/// `lists` are handled recursively and are not on this list.
const CONTAINER_FIELDS: &[&str] = &[
    "currentCostumeIndex",
    "scripts",
    "scriptComments",
    "sounds",
    "costumes",
];

/// Stage-only fields. `objName` is deliberately absent: the root keeps its
/// factory name no matter what the input claims.
const STAGE_FIELDS: &[&str] = &["penLayerMD5", "tempoBPM", "videoAlpha", "info"];

const SPRITE_FIELDS: &[&str] = &[
    "objName",
    "scratchX",
    "scratchY",
    "scale",
    "direction",
    "rotationStyle",
    "isDraggable",
    "indexInLibrary",
    "visible",
    "spriteInfo",
];

const WATCHER_FIELDS: &[&str] = &[
    "target",
    "cmd",
    "param",
    "color",
    "label",
    "mode",
    "sliderMin",
    "sliderMax",
    "isDiscrete",
    "x",
    "y",
    "visible",
];

const LIST_WATCHER_FIELDS: &[&str] = &[
    "listName",
    "contents",
    "isPersistent",
    "x",
    "y",
    "width",
    "height",
    "visible",
];

const VARIABLE_FIELDS: &[&str] = &["name", "value", "isPersistent"];

/// The kind of a stage child, re-derived structurally on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageChildKind {
    Sprite,
    Watcher,
    ListWatcher,
    Unknown,
}

/// Counters describing what one reconstruction pass kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionReport {
    /// Children classified as sprites.
    pub sprites: usize,

    /// Children classified as value watchers.
    pub watchers: usize,

    /// Children classified as list watchers.
    pub list_watchers: usize,

    /// Variables rebuilt across the stage and all sprites.
    pub variables: usize,

    /// Children matching no probe, dropped from the output.
    pub dropped_children: usize,
}

/// A reconstructed project document plus the counters gathered on the way.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub document: Value,
    pub report: ReconstructionReport,
}

/// Copy `field` from `source` onto `target` if `source` actually carries it.
///
/// Falsy values (`0`, `false`, `""`, `null`) still count as present. Fields
/// the source lacks leave the target's current value untouched.
fn copy_if_present(target: &mut Map<String, Value>, source: &Map<String, Value>, field: &str) {
    if let Some(value) = source.get(field) {
        target.insert(field.to_string(), value.clone());
    }
}

fn copy_fields(target: &mut Map<String, Value>, source: &Map<String, Value>, fields: &[&str]) {
    for field in fields {
        copy_if_present(target, source, field);
    }
}

/// Classify one untrusted stage child.
///
/// Ordered, first-match structural probe. The order is a compatibility
/// contract: a malformed child carrying several discriminating fields is
/// classified by the first probe that matches. Non-object values carry no
/// fields and are always `Unknown`.
pub fn classify(child: &Value) -> StageChildKind {
    match child.as_object() {
        Some(object) if object.contains_key("objName") => StageChildKind::Sprite,
        Some(object) if object.contains_key("cmd") => StageChildKind::Watcher,
        Some(object) if object.contains_key("listName") => StageChildKind::ListWatcher,
        _ => StageChildKind::Unknown,
    }
}

fn reconstruct_variable(source: &Map<String, Value>) -> Map<String, Value> {
    let mut variable = schema::variable();
    copy_fields(&mut variable, source, VARIABLE_FIELDS);
    variable
}

fn reconstruct_list_watcher(source: &Map<String, Value>) -> Map<String, Value> {
    let mut list = schema::list_watcher();
    copy_fields(&mut list, source, LIST_WATCHER_FIELDS);
    list
}

fn reconstruct_watcher(source: &Map<String, Value>) -> Map<String, Value> {
    let mut watcher = schema::watcher();
    copy_fields(&mut watcher, source, WATCHER_FIELDS);
    watcher
}

/// Apply the container-common whitelist, rebuilding the `variables` and
/// `lists` collections element by element in source order.
///
/// A collection that is absent, or present but not an array, leaves the
/// factory default (empty) in place. Non-object elements are skipped.
fn reconstruct_container(
    target: &mut Map<String, Value>,
    source: &Map<String, Value>,
    report: &mut ReconstructionReport,
) {
    copy_fields(target, source, CONTAINER_FIELDS);

    if let Some(Value::Array(variables)) = source.get("variables") {
        let rebuilt: Vec<Value> = variables
            .iter()
            .filter_map(Value::as_object)
            .map(|variable| Value::Object(reconstruct_variable(variable)))
            .collect();
        report.variables += rebuilt.len();
        target.insert("variables".to_string(), Value::Array(rebuilt));
    }

    if let Some(Value::Array(lists)) = source.get("lists") {
        let rebuilt: Vec<Value> = lists
            .iter()
            .filter_map(Value::as_object)
            .map(|list| Value::Object(reconstruct_list_watcher(list)))
            .collect();
        target.insert("lists".to_string(), Value::Array(rebuilt));
    }
}

fn reconstruct_sprite(
    source: &Map<String, Value>,
    report: &mut ReconstructionReport,
) -> Map<String, Value> {
    let mut sprite = schema::sprite();
    reconstruct_container(&mut sprite, source, report);
    copy_fields(&mut sprite, source, SPRITE_FIELDS);
    sprite
}

/// Rebuild an untrusted project document into a schema-conformant one.
///
/// Pure: no I/O, no shared state; the same input always yields the same
/// output. A child matching no probe is dropped, counted, and reported
/// through `tracing::warn!` — never fatal. A root that is not an object (or
/// lacks `children`) reconstructs to a fully-defaulted stage.
pub fn reconstruct_project(source: &Value) -> Reconstruction {
    let empty = Map::new();
    let source_stage = source.as_object().unwrap_or(&empty);

    let mut report = ReconstructionReport::default();
    let mut stage = schema::stage();

    reconstruct_container(&mut stage, source_stage, &mut report);
    copy_fields(&mut stage, source_stage, STAGE_FIELDS);

    let mut children = Vec::new();
    if let Some(Value::Array(source_children)) = source_stage.get("children") {
        for child in source_children {
            match (classify(child), child.as_object()) {
                (StageChildKind::Sprite, Some(source)) => {
                    report.sprites += 1;
                    children.push(Value::Object(reconstruct_sprite(source, &mut report)));
                }
                (StageChildKind::Watcher, Some(source)) => {
                    report.watchers += 1;
                    children.push(Value::Object(reconstruct_watcher(source)));
                }
                (StageChildKind::ListWatcher, Some(source)) => {
                    report.list_watchers += 1;
                    children.push(Value::Object(reconstruct_list_watcher(source)));
                }
                _ => {
                    report.dropped_children += 1;
                    tracing::warn!(child = %child, "dropping unknown stage child");
                }
            }
        }
    }
    stage.insert("children".to_string(), Value::Array(children));

    Reconstruction {
        document: Value::Object(stage),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn children_of(document: &Value) -> &Vec<Value> {
        document["children"].as_array().unwrap()
    }

    #[test]
    fn drops_unexpected_sprite_fields() {
        let input = json!({
            "objName": "Stage",
            "children": [{"objName": "Sprite1", "unexpectedField": 42}],
        });

        let Reconstruction { document, report } = reconstruct_project(&input);
        let children = children_of(&document);

        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["objName"], "Sprite1");
        assert!(children[0].get("unexpectedField").is_none());
        assert_eq!(children[0]["scale"], 1);
        assert_eq!(report.sprites, 1);
        assert_eq!(report.dropped_children, 0);
    }

    #[test]
    fn empty_document_reconstructs_to_full_defaults() {
        let Reconstruction { document, report } = reconstruct_project(&json!({}));

        assert_eq!(document["objName"], "Stage");
        assert_eq!(document["penLayerMD5"], "");
        assert_eq!(document["tempoBPM"], 60);
        assert_eq!(document["videoAlpha"], 0.5);
        assert_eq!(document["currentCostumeIndex"], 0);
        assert_eq!(document["variables"], json!([]));
        assert_eq!(document["lists"], json!([]));
        assert_eq!(document["sounds"], json!([]));
        assert_eq!(document["costumes"], json!([]));
        assert_eq!(document["scriptComments"], json!([]));
        assert_eq!(document["info"], json!({}));
        assert_eq!(document["children"], json!([]));
        assert_eq!(report, ReconstructionReport::default());
    }

    #[test]
    fn non_object_root_reconstructs_to_full_defaults() {
        let Reconstruction { document, .. } = reconstruct_project(&json!([1, 2, 3]));
        assert_eq!(document["objName"], "Stage");
        assert_eq!(document["children"], json!([]));
    }

    #[test]
    fn stage_name_cannot_be_overridden() {
        let input = json!({"objName": "Hijacked", "tempoBPM": 120});
        let Reconstruction { document, .. } = reconstruct_project(&input);

        assert_eq!(document["objName"], "Stage");
        assert_eq!(document["tempoBPM"], 120);
    }

    #[test]
    fn classify_prefers_sprite_over_watcher() {
        assert_eq!(
            classify(&json!({"objName": "A", "cmd": "getVar:"})),
            StageChildKind::Sprite
        );
    }

    #[test]
    fn classify_prefers_watcher_over_list_watcher() {
        assert_eq!(
            classify(&json!({"cmd": "getVar:", "listName": "L"})),
            StageChildKind::Watcher
        );
    }

    #[test]
    fn classify_rejects_non_objects() {
        assert_eq!(classify(&json!(null)), StageChildKind::Unknown);
        assert_eq!(classify(&json!("sprite")), StageChildKind::Unknown);
        assert_eq!(classify(&json!([1])), StageChildKind::Unknown);
        assert_eq!(classify(&json!({"foo": "bar"})), StageChildKind::Unknown);
    }

    #[test]
    fn ambiguous_child_reconstructs_as_sprite() {
        let input = json!({
            "children": [{"objName": "A", "cmd": "getVar:", "listName": "L"}],
        });
        let Reconstruction { document, report } = reconstruct_project(&input);
        let children = children_of(&document);

        // The sprite whitelist carries neither `cmd` nor `listName`.
        assert_eq!(children[0]["objName"], "A");
        assert!(children[0].get("cmd").is_none());
        assert!(children[0].get("listName").is_none());
        assert_eq!(report.sprites, 1);
        assert_eq!(report.watchers, 0);
    }

    #[test]
    fn list_watcher_child_keeps_contents_verbatim() {
        let input = json!({
            "objName": "Stage",
            "children": [{"listName": "L", "contents": [1, 2, 3]}],
        });
        let Reconstruction { document, report } = reconstruct_project(&input);
        let children = children_of(&document);

        assert_eq!(children.len(), 1);
        assert_eq!(children[0]["listName"], "L");
        assert_eq!(children[0]["contents"], json!([1, 2, 3]));
        assert_eq!(children[0]["visible"], false);
        assert_eq!(children[0]["width"], 200);
        assert_eq!(report.list_watchers, 1);
    }

    #[test]
    fn unknown_children_are_dropped_and_counted() {
        let input = json!({
            "objName": "Stage",
            "children": [{"foo": "bar"}, "garbage", 7],
        });
        let Reconstruction { document, report } = reconstruct_project(&input);

        assert_eq!(children_of(&document).len(), 0);
        assert_eq!(report.dropped_children, 3);
    }

    #[test]
    fn variables_are_rebuilt_field_by_field() {
        let input = json!({
            "variables": [{"name": "x", "value": 5, "extra": "drop-me"}],
        });
        let Reconstruction { document, report } = reconstruct_project(&input);

        assert_eq!(
            document["variables"],
            json!([{"name": "x", "value": 5, "isPersistent": false}])
        );
        assert_eq!(report.variables, 1);
    }

    #[test]
    fn falsy_values_still_count_as_present() {
        let input = json!({
            "children": [{
                "objName": "",
                "visible": false,
                "scale": 0,
                "scratchX": 0,
            }],
        });
        let Reconstruction { document, .. } = reconstruct_project(&input);
        let children = children_of(&document);

        assert_eq!(children[0]["objName"], "");
        assert_eq!(children[0]["visible"], false);
        assert_eq!(children[0]["scale"], 0);
    }

    #[test]
    fn optional_scripts_copied_only_if_present() {
        let with = json!({"scripts": [["whenGreenFlag"]]});
        let Reconstruction { document, .. } = reconstruct_project(&with);
        assert_eq!(document["scripts"], json!([["whenGreenFlag"]]));

        let without = json!({"objName": "Stage"});
        let Reconstruction { document, .. } = reconstruct_project(&without);
        assert!(document.get("scripts").is_none());
    }

    #[test]
    fn optional_watcher_mode_copied_only_if_present() {
        let input = json!({
            "children": [
                {"cmd": "getVar:", "mode": 2},
                {"cmd": "timer"},
            ],
        });
        let Reconstruction { document, .. } = reconstruct_project(&input);
        let children = children_of(&document);

        assert_eq!(children[0]["mode"], 2);
        assert!(children[1].get("mode").is_none());
    }

    #[test]
    fn children_keep_source_order() {
        let input = json!({
            "children": [
                {"objName": "A"},
                {"cmd": "timer"},
                {"listName": "L"},
                {"objName": "B"},
            ],
        });
        let Reconstruction { document, .. } = reconstruct_project(&input);
        let children = children_of(&document);

        assert_eq!(children[0]["objName"], "A");
        assert_eq!(children[1]["cmd"], "timer");
        assert_eq!(children[2]["listName"], "L");
        assert_eq!(children[3]["objName"], "B");
    }

    #[test]
    fn variables_keep_source_order_and_skip_non_objects() {
        let input = json!({
            "variables": [
                {"name": "a", "value": 1},
                "junk",
                {"name": "b", "value": 2},
            ],
        });
        let Reconstruction { document, report } = reconstruct_project(&input);
        let variables = document["variables"].as_array().unwrap();

        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0]["name"], "a");
        assert_eq!(variables[1]["name"], "b");
        assert_eq!(report.variables, 2);
    }

    #[test]
    fn non_array_collections_keep_factory_defaults() {
        let input = json!({
            "variables": "oops",
            "lists": {"listName": "L"},
            "children": 9,
        });
        let Reconstruction { document, report } = reconstruct_project(&input);

        assert_eq!(document["variables"], json!([]));
        assert_eq!(document["lists"], json!([]));
        assert_eq!(document["children"], json!([]));
        assert_eq!(report, ReconstructionReport::default());
    }

    #[test]
    fn nested_lists_are_rebuilt_not_copied() {
        let input = json!({
            "lists": [{"listName": "L", "contents": ["a"], "evil": true}],
        });
        let Reconstruction { document, .. } = reconstruct_project(&input);
        let lists = document["lists"].as_array().unwrap();

        assert_eq!(lists[0]["listName"], "L");
        assert_eq!(lists[0]["contents"], json!(["a"]));
        assert!(lists[0].get("evil").is_none());
        assert_eq!(lists[0]["height"], 200);
    }

    #[test]
    fn sprite_children_rebuild_their_own_collections() {
        let input = json!({
            "children": [{
                "objName": "Sprite1",
                "variables": [{"name": "hp", "value": 10, "extra": 1}],
                "lists": [{"listName": "inv", "junk": 0}],
            }],
        });
        let Reconstruction { document, report } = reconstruct_project(&input);
        let sprite = &children_of(&document)[0];

        assert_eq!(
            sprite["variables"],
            json!([{"name": "hp", "value": 10, "isPersistent": false}])
        );
        assert_eq!(sprite["lists"][0]["listName"], "inv");
        assert!(sprite["lists"][0].get("junk").is_none());
        assert_eq!(report.variables, 1);
    }

    #[test]
    fn whitelist_closure_over_hostile_watcher() {
        let input = json!({
            "children": [{
                "cmd": "getVar:",
                "target": "Stage",
                "__proto__": {"polluted": true},
                "constructor": "evil",
                "extraneous": [1, 2],
            }],
        });
        let Reconstruction { document, .. } = reconstruct_project(&input);
        let watcher = children_of(&document)[0].as_object().unwrap();

        for key in watcher.keys() {
            assert!(WATCHER_FIELDS.contains(&key.as_str()), "unexpected key {key}");
        }
    }

    #[test]
    fn reconstruction_is_idempotent() {
        let input = json!({
            "objName": "Renamed",
            "tempoBPM": 90,
            "variables": [{"name": "score", "value": "12"}],
            "lists": [{"listName": "words", "contents": ["a", "b"]}],
            "children": [
                {"objName": "Cat", "scale": 2, "scripts": [["whenClicked"]]},
                {"cmd": "getVar:", "mode": 1},
                {"listName": "L"},
                {"nonsense": true},
            ],
        });

        let first = reconstruct_project(&input);
        let second = reconstruct_project(&first.document);

        assert_eq!(first.document, second.document);
        assert_eq!(second.report.dropped_children, 0);
        assert_eq!(second.report.sprites, first.report.sprites);
        assert_eq!(second.report.watchers, first.report.watchers);
        assert_eq!(second.report.list_watchers, first.report.list_watchers);
    }
}
