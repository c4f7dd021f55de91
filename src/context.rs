// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application context.
//!
//! Owns the marker store and its auto-save, wired together at startup.
//! The UI holds one of these and routes every user intent through it.

use crate::config::AppConfig;
use crate::error::{ProjectError, StoreError};
use crate::io::persistence::{self, PersistenceAdapter, SaveStatus, WriteMode};
use crate::io::serialization;
use crate::io::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::models::marker::{Coordinates, Marker, MarkerDraft};
use crate::models::project::ProjectDocument;
use crate::state::history::History;
use crate::state::store::MapStore;
use std::path::Path;
use std::sync::Arc;

pub struct AppContext {
    store: MapStore,
    persistence: PersistenceAdapter,
}

impl AppContext {
    /// Open the durable store named by the configuration (or the platform
    /// default) and restore the saved state.
    pub fn open(config: &AppConfig) -> Self {
        let dir = config.storage_dir.clone().or_else(FileStore::default_dir);
        let (backend, mode): (Arc<dyn KeyValueStore>, _) = match dir {
            Some(dir) => {
                log::info!("Using storage directory {}", dir.display());
                (Arc::new(FileStore::new(dir)), WriteMode::Background)
            }
            None => {
                log::warn!("No data directory available, changes will not be kept");
                (Arc::new(MemoryStore::new()), WriteMode::Inline)
            }
        };
        Self::with_backend(backend, mode, config)
    }

    pub fn with_backend(
        backend: Arc<dyn KeyValueStore>,
        mode: WriteMode,
        config: &AppConfig,
    ) -> Self {
        let loaded = persistence::load(backend.as_ref());
        let mut store = MapStore::with_history(
            loaded.markers,
            loaded.map_reference,
            History::with_max_size(config.max_undo_depth),
        );
        let events = store.subscribe();
        let persistence = PersistenceAdapter::new(backend, events, mode)
            .with_debounce_delay(config.autosave_debounce());

        Self { store, persistence }
    }

    pub fn markers(&self) -> &[Marker] {
        self.store.markers()
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.store.marker(id)
    }

    pub fn map_reference(&self) -> Option<&str> {
        self.store.map_reference()
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.persistence.status()
    }

    pub fn persistence(&mut self) -> &mut PersistenceAdapter {
        &mut self.persistence
    }

    /// Write any pending change now. Called when the app exits.
    pub fn flush(&mut self) {
        self.persistence.flush();
    }

    pub fn add_marker(
        &mut self,
        coords: Coordinates,
        draft: MarkerDraft,
    ) -> Result<String, StoreError> {
        self.store.add_marker(coords, draft)
    }

    pub fn edit_marker(&mut self, id: &str, draft: MarkerDraft) -> Result<(), StoreError> {
        self.store.edit_marker(id, draft)
    }

    pub fn delete_marker(&mut self, id: &str) -> Result<(), StoreError> {
        self.store.delete_marker(id)
    }

    pub fn set_map_reference(&mut self, map_reference: Option<String>) {
        self.store.set_map_reference(map_reference);
    }

    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    pub fn export_project(&self) -> ProjectDocument {
        serialization::export(&self.store)
    }

    pub fn import_project(&mut self, document: ProjectDocument) {
        serialization::import(&mut self.store, document);
    }

    /// Export to a file, e.g. one picked in a save dialog.
    pub fn export_project_file(&self, path: &Path) -> Result<(), ProjectError> {
        serialization::export_file(&self.export_project(), path)?;
        log::info!("Exported project to {}", path.display());
        Ok(())
    }

    /// Import from a file. The store is untouched if the file is invalid.
    pub fn import_project_file(&mut self, path: &Path) -> Result<(), ProjectError> {
        let document = serialization::import_file(path)?;
        self.import_project(document);
        log::info!("Imported project from {}", path.display());
        Ok(())
    }

    /// Import from project JSON text (e.g. a dropped file's contents).
    pub fn import_project_json(&mut self, json: &str) -> Result<(), ProjectError> {
        let document = serialization::parse(json)?;
        self.import_project(document);
        Ok(())
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::persistence::{MAP_KEY, MARKERS_KEY};
    use crate::models::marker::MarkerType;

    fn inline_context(backend: Arc<MemoryStore>) -> AppContext {
        AppContext::with_backend(backend, WriteMode::Inline, &AppConfig::default())
    }

    #[test]
    fn test_starts_with_samples() {
        let context = inline_context(Arc::new(MemoryStore::new()));
        assert_eq!(context.markers().len(), 2);
        assert_eq!(context.map_reference(), None);
        assert_eq!(context.save_status(), SaveStatus::Idle);
        assert!(!context.can_undo());
    }

    #[test]
    fn test_state_survives_reopen() {
        let backend = Arc::new(MemoryStore::new());

        let id = {
            let mut context = inline_context(backend.clone());
            context.set_map_reference(Some("map.png".to_string()));
            context
                .add_marker(Coordinates::new(60.0, 60.0), MarkerDraft::new("Gate", MarkerType::Place))
                .unwrap()
            // dropped here, which flushes the pending marker write
        };

        let context = inline_context(backend);
        assert_eq!(context.markers().len(), 3);
        assert_eq!(context.marker(&id).unwrap().title, "Gate");
        assert_eq!(context.map_reference(), Some("map.png"));
        assert!(!context.can_undo());
    }

    #[test]
    fn test_import_json_writes_both_keys() {
        let backend = Arc::new(MemoryStore::new());
        let mut context = inline_context(backend.clone());

        context
            .import_project_json(r#"{"version":"1.0","timestamp":0,"mapUrl":"m.png","markers":[]}"#)
            .unwrap();
        context.persistence().poll();

        assert_eq!(backend.get(MARKERS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(backend.get(MAP_KEY).unwrap().as_deref(), Some("\"m.png\""));
        assert_eq!(context.save_status(), SaveStatus::Saved);
    }

    #[test]
    fn test_bad_import_keeps_state() {
        let backend = Arc::new(MemoryStore::new());
        let mut context = inline_context(backend.clone());

        assert!(context.import_project_json("not json").is_err());
        assert_eq!(context.markers().len(), 2);
        context.persistence().poll();
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn test_undo_depth_from_config() {
        let config = AppConfig {
            max_undo_depth: 1,
            ..AppConfig::default()
        };
        let mut context =
            AppContext::with_backend(Arc::new(MemoryStore::new()), WriteMode::Inline, &config);

        context.delete_marker("sample-1").unwrap();
        context.delete_marker("sample-2").unwrap();

        assert!(context.undo());
        assert!(!context.undo());
        assert_eq!(context.markers().len(), 1);
    }

    #[test]
    fn test_project_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let mut context = inline_context(Arc::new(MemoryStore::new()));

        context.export_project_file(&path).unwrap();
        context.delete_marker("sample-1").unwrap();
        context.import_project_file(&path).unwrap();

        assert_eq!(context.markers().len(), 2);
        assert!(!context.can_undo());
    }

    #[test]
    fn test_flush_persists_while_open() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        };
        let mut context = AppContext::open(&config);

        context
            .add_marker(Coordinates::new(10.0, 10.0), MarkerDraft::new("Gate", MarkerType::Place))
            .unwrap();
        context.flush();

        assert_eq!(context.save_status(), SaveStatus::Saved);
        let saved = persistence::load(&FileStore::new(dir.path()));
        assert_eq!(saved.markers.len(), 3);
    }

    #[test]
    fn test_import_with_duplicate_ids_keeps_state() {
        let backend = Arc::new(MemoryStore::new());
        let mut context = inline_context(backend.clone());
        let json = r#"{"markers":[
            {"id":"a","coords":{"x":1,"y":1},"title":"One","type":"INFO","createdAt":0},
            {"id":"a","coords":{"x":2,"y":2},"title":"Two","type":"INFO","createdAt":0}
        ]}"#;

        assert!(matches!(
            context.import_project_json(json),
            Err(ProjectError::Shape(_))
        ));
        assert_eq!(context.markers().len(), 2);
        context.persistence().poll();
        assert_eq!(backend.write_count(), 0);
    }
}
