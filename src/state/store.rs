// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The marker store.
//!
//! [`MapStore`] is the single authoritative holder of the marker list and
//! the background map reference. Every marker mutation pushes a snapshot
//! onto the undo history before it changes anything, and every change is
//! published to subscribers (the persistence adapter) as a [`StoreEvent`].

use super::history::History;
use crate::error::StoreError;
use crate::models::marker::{placeholder_image_url, Coordinates, Marker, MarkerDraft};
use crate::util::time::now_millis;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Change notification carrying an owned copy of the new state.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    MarkersChanged(Vec<Marker>),
    MapChanged(Option<String>),
    /// Markers and map were replaced wholesale (project import).
    Replaced {
        markers: Vec<Marker>,
        map: Option<String>,
    },
}

pub struct MapStore {
    markers: Vec<Marker>,
    map_reference: Option<String>,
    history: History,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl MapStore {
    #[cfg(test)]
    pub fn new(markers: Vec<Marker>, map_reference: Option<String>) -> Self {
        Self::with_history(markers, map_reference, History::new())
    }

    pub fn with_history(
        markers: Vec<Marker>,
        map_reference: Option<String>,
        history: History,
    ) -> Self {
        Self {
            markers,
            map_reference: non_empty(map_reference),
            history,
            subscribers: Vec::new(),
        }
    }

    /// Receive every subsequent change to the store.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn map_reference(&self) -> Option<&str> {
        self.map_reference.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Add a marker at `coords` (clamped to the map) and return its id.
    pub fn add_marker(
        &mut self,
        coords: Coordinates,
        draft: MarkerDraft,
    ) -> Result<String, StoreError> {
        if !draft.has_title() {
            return Err(StoreError::Validation);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let image_url = if draft.image_url.is_empty() {
            placeholder_image_url(&id)
        } else {
            draft.image_url
        };

        let marker = Marker {
            id: id.clone(),
            coords: coords.clamp(),
            title: draft.title,
            description: draft.description,
            marker_type: draft.marker_type,
            image_url: Some(image_url),
            created_at: now_millis(),
        };

        self.save_to_history();
        self.markers.push(marker);
        log::info!("Added marker {}, total: {}", id, self.markers.len());
        self.publish_markers();
        Ok(id)
    }

    /// Replace the editable fields of a marker. An empty image URL keeps
    /// the marker's current image.
    pub fn edit_marker(&mut self, id: &str, draft: MarkerDraft) -> Result<(), StoreError> {
        if !draft.has_title() {
            return Err(StoreError::Validation);
        }
        let idx = self.index_of(id)?;

        self.save_to_history();
        let marker = &mut self.markers[idx];
        marker.title = draft.title;
        marker.description = draft.description;
        marker.marker_type = draft.marker_type;
        if !draft.image_url.is_empty() {
            marker.image_url = Some(draft.image_url);
        }
        log::info!("Edited marker {}", id);
        self.publish_markers();
        Ok(())
    }

    pub fn delete_marker(&mut self, id: &str) -> Result<(), StoreError> {
        let idx = self.index_of(id)?;

        self.save_to_history();
        self.markers.remove(idx);
        log::info!("Deleted marker {}, total: {}", id, self.markers.len());
        self.publish_markers();
        Ok(())
    }

    /// Replace the background map. Not recorded in the undo history.
    pub fn set_map_reference(&mut self, map_reference: Option<String>) {
        self.map_reference = non_empty(map_reference);
        match self.map_reference {
            Some(_) => log::info!("Map reference set"),
            None => log::info!("Map reference cleared"),
        }
        self.publish(StoreEvent::MapChanged(self.map_reference.clone()));
    }

    /// Restore the marker list from before the most recent marker change.
    /// Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.markers = previous;
                log::info!("Undo, total: {}", self.markers.len());
                self.publish_markers();
                true
            }
            None => false,
        }
    }

    /// Replace markers and map wholesale and start a fresh history.
    pub fn replace_all(&mut self, markers: Vec<Marker>, map_reference: Option<String>) {
        self.markers = markers;
        self.map_reference = non_empty(map_reference);
        self.history.clear();
        log::info!("Replaced state with {} markers", self.markers.len());
        self.publish(StoreEvent::Replaced {
            markers: self.markers.clone(),
            map: self.map_reference.clone(),
        });
    }

    fn index_of(&self, id: &str) -> Result<usize, StoreError> {
        self.markers
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn save_to_history(&mut self) {
        self.history.push(self.markers.clone());
    }

    fn publish_markers(&mut self) {
        self.publish(StoreEvent::MarkersChanged(self.markers.clone()));
    }

    fn publish(&mut self, event: StoreEvent) {
        // Drop subscribers whose receiver is gone.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::marker::{default_markers, MarkerType};

    fn sample_store() -> MapStore {
        MapStore::new(default_markers(), None)
    }

    #[test]
    fn test_add_then_undo_restores_defaults() {
        let mut store = sample_store();
        let before = store.markers().to_vec();

        store
            .add_marker(
                Coordinates::new(60.0, 60.0),
                MarkerDraft::new("Gate", MarkerType::Place),
            )
            .unwrap();

        assert_eq!(store.markers().len(), 3);
        let added = store.markers().last().unwrap();
        assert!(!added.image_url.as_deref().unwrap_or_default().is_empty());

        assert!(store.undo());
        assert_eq!(store.markers(), before.as_slice());
    }

    #[test]
    fn test_undo_n_times_restores_state() {
        let mut store = sample_store();
        let original = store.markers().to_vec();

        let id = store
            .add_marker(
                Coordinates::new(10.0, 10.0),
                MarkerDraft::new("A", MarkerType::Info),
            )
            .unwrap();
        store
            .edit_marker(&id, MarkerDraft::new("A2", MarkerType::Shop))
            .unwrap();
        store.delete_marker("sample-1").unwrap();
        store
            .edit_marker("sample-2", MarkerDraft::new("Stairs", MarkerType::Warning))
            .unwrap();

        assert_eq!(store.history_len(), 4);
        for _ in 0..4 {
            assert!(store.undo());
        }
        assert_eq!(store.markers(), original.as_slice());
        assert!(!store.can_undo());
        assert!(!store.undo());
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_edits() {
        let mut store = sample_store();
        store
            .edit_marker("sample-1", MarkerDraft::new("First", MarkerType::Info))
            .unwrap();
        store
            .edit_marker("sample-1", MarkerDraft::new("Second", MarkerType::Info))
            .unwrap();

        store.undo();
        assert_eq!(store.marker("sample-1").unwrap().title, "First");
        store.undo();
        assert_eq!(store.marker("sample-1").unwrap().title, "Main Entrance");
    }

    #[test]
    fn test_add_with_empty_title_is_rejected() {
        let mut store = sample_store();
        let result = store.add_marker(
            Coordinates::new(50.0, 50.0),
            MarkerDraft::new("  ", MarkerType::Info),
        );

        assert_eq!(result, Err(StoreError::Validation));
        assert_eq!(store.markers().len(), 2);
        assert!(!store.can_undo());
    }

    #[test]
    fn test_add_clamps_coordinates() {
        let mut store = sample_store();
        let id = store
            .add_marker(
                Coordinates::new(-5.0, 150.0),
                MarkerDraft::new("Edge", MarkerType::Info),
            )
            .unwrap();

        assert_eq!(store.marker(&id).unwrap().coords, Coordinates::new(0.0, 100.0));
    }

    #[test]
    fn test_placeholders_are_unique() {
        let mut store = sample_store();
        let a = store
            .add_marker(Coordinates::new(1.0, 1.0), MarkerDraft::new("A", MarkerType::Info))
            .unwrap();
        let b = store
            .add_marker(Coordinates::new(2.0, 2.0), MarkerDraft::new("B", MarkerType::Info))
            .unwrap();

        let image_a = store.marker(&a).unwrap().image_url.clone();
        let image_b = store.marker(&b).unwrap().image_url.clone();
        assert!(image_a.is_some());
        assert_ne!(image_a, image_b);
    }

    #[test]
    fn test_add_keeps_supplied_image() {
        let mut store = sample_store();
        let id = store
            .add_marker(
                Coordinates::new(5.0, 5.0),
                MarkerDraft::new("Pic", MarkerType::Shop).with_image_url("data:image/png;base64,AA=="),
            )
            .unwrap();

        assert_eq!(
            store.marker(&id).unwrap().image_url.as_deref(),
            Some("data:image/png;base64,AA==")
        );
    }

    #[test]
    fn test_edit_with_empty_image_keeps_previous() {
        let mut store = sample_store();
        let before = store.marker("sample-1").unwrap().clone();

        store
            .edit_marker(
                "sample-1",
                MarkerDraft::new("Renamed", MarkerType::Shop).with_description("new text"),
            )
            .unwrap();

        let after = store.marker("sample-1").unwrap();
        assert_eq!(after.image_url, before.image_url);
        assert_eq!(after.title, "Renamed");
        assert_eq!(after.description, "new text");
        assert_eq!(after.marker_type, MarkerType::Shop);
        assert_eq!(after.coords, before.coords);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn test_edit_replaces_image_when_supplied() {
        let mut store = sample_store();
        store
            .edit_marker(
                "sample-2",
                MarkerDraft::new("Stairs", MarkerType::Warning).with_image_url("https://example.com/a.png"),
            )
            .unwrap();

        assert_eq!(
            store.marker("sample-2").unwrap().image_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut store = sample_store();

        assert_eq!(
            store.edit_marker("nope", MarkerDraft::new("X", MarkerType::Info)),
            Err(StoreError::NotFound("nope".to_string()))
        );
        assert_eq!(
            store.delete_marker("nope"),
            Err(StoreError::NotFound("nope".to_string()))
        );
        assert!(!store.can_undo());
        assert_eq!(store.markers().len(), 2);
    }

    #[test]
    fn test_edit_with_empty_title_is_rejected() {
        let mut store = sample_store();
        assert_eq!(
            store.edit_marker("sample-1", MarkerDraft::default()),
            Err(StoreError::Validation)
        );
        assert_eq!(store.marker("sample-1").unwrap().title, "Main Entrance");
    }

    #[test]
    fn test_map_reference_is_not_undoable() {
        let mut store = sample_store();
        store.set_map_reference(Some("https://example.com/map.png".to_string()));

        assert!(!store.can_undo());
        assert_eq!(store.map_reference(), Some("https://example.com/map.png"));

        store.set_map_reference(Some(String::new()));
        assert_eq!(store.map_reference(), None);
    }

    #[test]
    fn test_replace_all_clears_history() {
        let mut store = sample_store();
        store.delete_marker("sample-1").unwrap();
        store.replace_all(Vec::new(), None);

        assert!(store.markers().is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_subscribers_receive_events() {
        let mut store = sample_store();
        let events = store.subscribe();

        store.delete_marker("sample-1").unwrap();
        store.set_map_reference(None);
        store.undo();

        let received: Vec<StoreEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(&received[0], StoreEvent::MarkersChanged(m) if m.len() == 1));
        assert_eq!(received[1], StoreEvent::MapChanged(None));
        assert!(matches!(&received[2], StoreEvent::MarkersChanged(m) if m.len() == 2));
    }

    #[test]
    fn test_dropped_subscriber_is_removed() {
        let mut store = sample_store();
        drop(store.subscribe());
        store.delete_marker("sample-1").unwrap();
        assert!(store.subscribers.is_empty());
    }
}
