// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project export and import.
//!
//! A project is the whole annotated map as one JSON document. Import
//! validates the document's shape before anything in the store changes.

use crate::error::ProjectError;
use crate::models::marker::{check_markers, Marker};
use crate::models::project::ProjectDocument;
use crate::state::store::MapStore;
use crate::util::time::{iso_date, now_millis};
use serde_json::Value;
use std::path::Path;

/// Build a project document from the current store contents.
pub fn export(store: &MapStore) -> ProjectDocument {
    ProjectDocument::new(
        now_millis(),
        store.map_reference().map(str::to_string),
        store.markers().to_vec(),
    )
}

/// Suggested file name for an export made at `timestamp`.
pub fn default_file_name(timestamp: i64) -> String {
    format!("map-project-{}.json", iso_date(timestamp))
}

pub fn to_json(document: &ProjectDocument) -> Result<String, ProjectError> {
    serde_json::to_string_pretty(document).map_err(|e| ProjectError::Shape(e.to_string()))
}

/// Export project data to a JSON file.
pub fn export_file(document: &ProjectDocument, path: &Path) -> Result<(), ProjectError> {
    let json = to_json(document)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Parse and validate a project document. Unknown fields are ignored.
pub fn parse(text: &str) -> Result<ProjectDocument, ProjectError> {
    let value: Value = serde_json::from_str(text).map_err(ProjectError::Parse)?;

    let object = value
        .as_object()
        .ok_or_else(|| ProjectError::Shape("project must be a JSON object".to_string()))?;

    match object.get("markers") {
        Some(Value::Array(_)) => {}
        Some(_) => return Err(ProjectError::Shape("'markers' must be an array".to_string())),
        None => return Err(ProjectError::Shape("missing 'markers'".to_string())),
    }

    match object.get("mapUrl") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ProjectError::Shape(
                "'mapUrl' must be a string or null".to_string(),
            ))
        }
    }

    let document: ProjectDocument =
        serde_json::from_value(value).map_err(|e| ProjectError::Shape(e.to_string()))?;
    check_markers(&document.markers).map_err(ProjectError::Shape)?;
    Ok(document)
}

/// Import project data from a JSON file.
pub fn import_file(path: &Path) -> Result<ProjectDocument, ProjectError> {
    let json = std::fs::read_to_string(path)?;
    parse(&json)
}

/// Replace the store contents with a project. Clears the undo history
/// and triggers a durable write of both keys through the store's
/// subscribers.
pub fn import(store: &mut MapStore, document: ProjectDocument) {
    let markers: Vec<Marker> = document
        .markers
        .into_iter()
        .map(|mut marker| {
            marker.coords = marker.coords.clamp();
            marker
        })
        .collect();

    log::info!(
        "Importing project v{} with {} markers",
        document.version,
        markers.len()
    );
    store.replace_all(markers, document.map_url);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::marker::{default_markers, Coordinates, MarkerDraft, MarkerType};
    use crate::models::project::PROJECT_VERSION;
    use crate::state::store::StoreEvent;

    fn busy_store() -> MapStore {
        let mut store = MapStore::new(default_markers(), Some("map.png".to_string()));
        store
            .add_marker(Coordinates::new(60.0, 60.0), MarkerDraft::new("Gate", MarkerType::Place))
            .unwrap();
        store
    }

    #[test]
    fn test_export_import_restores_state() {
        let mut store = busy_store();
        let markers = store.markers().to_vec();

        let json = to_json(&export(&store)).unwrap();
        store.delete_marker("sample-1").unwrap();
        store.set_map_reference(None);

        import(&mut store, parse(&json).unwrap());

        assert_eq!(store.markers(), markers.as_slice());
        assert_eq!(store.map_reference(), Some("map.png"));
        assert!(!store.can_undo());
    }

    #[test]
    fn test_export_document_shape() {
        let store = busy_store();
        let value: Value = serde_json::from_str(&to_json(&export(&store)).unwrap()).unwrap();

        assert_eq!(value["version"], PROJECT_VERSION);
        assert!(value["timestamp"].as_i64().unwrap() > 0);
        assert_eq!(value["mapUrl"], "map.png");
        assert_eq!(value["markers"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_import_empty_project() {
        let mut store = busy_store();
        let events = store.subscribe();
        let document =
            parse(r#"{"version":"1.0","timestamp":0,"mapUrl":null,"markers":[]}"#).unwrap();

        import(&mut store, document);

        assert!(store.markers().is_empty());
        assert_eq!(store.map_reference(), None);
        assert!(!store.can_undo());
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::Replaced {
                markers: Vec::new(),
                map: None
            }
        );
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(parse("{nope"), Err(ProjectError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(matches!(
            parse(r#"{"markers":{}}"#),
            Err(ProjectError::Shape(_))
        ));
        assert!(matches!(parse(r#"{"mapUrl":null}"#), Err(ProjectError::Shape(_))));
        assert!(matches!(
            parse(r#"{"markers":[],"mapUrl":42}"#),
            Err(ProjectError::Shape(_))
        ));
        assert!(matches!(
            parse(r#"{"markers":[{"id":"x"}]}"#),
            Err(ProjectError::Shape(_))
        ));
        assert!(matches!(parse("[]"), Err(ProjectError::Shape(_))));
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let document = parse(
            r#"{"markers":[{"id":"a","coords":{"x":1,"y":2},"title":"T","type":"INFO","createdAt":1,"color":"red"}],"author":"me"}"#,
        )
        .unwrap();

        assert_eq!(document.version, PROJECT_VERSION);
        assert_eq!(document.markers.len(), 1);
        assert_eq!(document.map_url, None);
    }

    #[test]
    fn test_failed_parse_leaves_store_untouched() {
        let store = busy_store();
        let before = store.markers().to_vec();

        assert!(parse(r#"{"markers":"nope"}"#).is_err());
        assert_eq!(store.markers(), before.as_slice());
        assert!(store.can_undo());
    }

    #[test]
    fn test_import_clamps_coordinates() {
        let mut store = MapStore::new(Vec::new(), None);
        let document = parse(
            r#"{"markers":[{"id":"a","coords":{"x":-5,"y":150},"title":"T","type":"SHOP","createdAt":1}]}"#,
        )
        .unwrap();

        import(&mut store, document);
        assert_eq!(store.markers()[0].coords, Coordinates::new(0.0, 100.0));
    }

    #[test]
    fn test_default_file_name() {
        assert_eq!(default_file_name(0), "map-project-1970-01-01.json");
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let document = export(&busy_store());

        export_file(&document, &path).unwrap();
        assert_eq!(import_file(&path).unwrap(), document);
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            import_file(&dir.path().join("missing.json")),
            Err(ProjectError::Io(_))
        ));
    }

    #[test]
    fn test_parse_accepts_fractional_timestamp() {
        let document = parse(r#"{"timestamp":1700000000000.5,"markers":[]}"#).unwrap();
        assert_eq!(document.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let json = r#"{"markers":[
            {"id":"a","coords":{"x":1,"y":1},"title":"One","type":"INFO","createdAt":0},
            {"id":"a","coords":{"x":2,"y":2},"title":"Two","type":"SHOP","createdAt":0}
        ]}"#;
        let err = parse(json).unwrap_err();
        assert!(matches!(&err, ProjectError::Shape(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn test_parse_rejects_blank_title() {
        let json = r#"{"markers":[
            {"id":"a","coords":{"x":1,"y":1},"title":"   ","type":"INFO","createdAt":0}
        ]}"#;
        let err = parse(json).unwrap_err();
        assert!(matches!(&err, ProjectError::Shape(msg) if msg.contains("empty title")));
    }
}
