// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Auto-save of the marker store to a durable key-value store.
//!
//! The adapter subscribes to [`StoreEvent`]s and is polled from the UI
//! loop. Marker changes are debounced (trailing edge) so a burst of edits
//! results in one write of the latest list. Map changes and project
//! imports are written immediately. Writes are executed in order by a
//! single writer thread and their results come back over a channel, so
//! the UI thread never blocks on disk.

use super::storage::KeyValueStore;
use crate::error::StorageError;
use crate::models::marker::{check_markers, default_markers, Marker};
use crate::state::store::StoreEvent;
use crate::util::debounce::Debouncer;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Storage key of the marker list.
pub const MARKERS_KEY: &str = "markers";
/// Storage key of the map reference.
pub const MAP_KEY: &str = "mapUrl";

/// Longest time `flush` waits for outstanding writes.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable state of the auto-save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing has been written this session.
    Idle,
    /// A write is pending or in flight.
    Saving,
    /// Every scheduled write has completed.
    Saved,
    /// The last batch of writes had a failure.
    Failed,
}

impl SaveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Failed => "Save failed",
        }
    }
}

/// Where writes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// On a dedicated writer thread.
    Background,
    /// Synchronously on the calling thread, for in-memory backends.
    Inline,
}

/// State read back from the durable store at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    pub markers: Vec<Marker>,
    pub map_reference: Option<String>,
}

/// Read both keys. Missing, unreadable or invalid entries fall back to the
/// sample markers and no map.
pub fn load(backend: &dyn KeyValueStore) -> LoadedState {
    let markers = match read_json::<Vec<Marker>>(backend, MARKERS_KEY) {
        Ok(Some(markers)) => match check_markers(&markers) {
            Ok(()) => {
                log::info!("Loaded {} markers from storage", markers.len());
                markers
                    .into_iter()
                    .map(|mut marker| {
                        marker.coords = marker.coords.clamp();
                        marker
                    })
                    .collect()
            }
            Err(reason) => {
                log::warn!("Ignoring saved markers: {}", reason);
                default_markers()
            }
        },
        Ok(None) => {
            log::info!("No saved markers, starting with samples");
            default_markers()
        }
        Err(e) => {
            log::warn!("Failed to load saved markers: {}", e);
            default_markers()
        }
    };

    let map_reference = match read_json::<Option<String>>(backend, MAP_KEY) {
        Ok(map) => map.flatten().filter(|m| !m.is_empty()),
        Err(e) => {
            log::warn!("Failed to load saved map: {}", e);
            None
        }
    };

    LoadedState {
        markers,
        map_reference,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    backend: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match backend.get(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

#[derive(Debug)]
enum WriteJob {
    Markers(Vec<Marker>),
    Map(String),
    RemoveMap,
}

impl WriteJob {
    fn key(&self) -> &'static str {
        match self {
            WriteJob::Markers(_) => MARKERS_KEY,
            WriteJob::Map(_) | WriteJob::RemoveMap => MAP_KEY,
        }
    }

    fn execute(&self, backend: &dyn KeyValueStore) -> Result<(), StorageError> {
        match self {
            WriteJob::Markers(markers) => {
                let json = serde_json::to_string(markers)?;
                backend.set(MARKERS_KEY, &json)
            }
            WriteJob::Map(map) => {
                let json = serde_json::to_string(map)?;
                backend.set(MAP_KEY, &json)
            }
            WriteJob::RemoveMap => backend.remove(MAP_KEY),
        }
    }
}

/// Result of one executed write.
struct WriteOutcome {
    key: &'static str,
    result: Result<(), StorageError>,
}

/// Channels to the writer thread.
struct Writer {
    jobs: Sender<WriteJob>,
    completions: Receiver<WriteOutcome>,
}

pub struct PersistenceAdapter {
    backend: Arc<dyn KeyValueStore>,
    events: Receiver<StoreEvent>,
    debouncer: Debouncer,
    /// Latest marker list waiting for the debounce to fire
    pending_markers: Option<Vec<Marker>>,
    /// `None` in inline mode or once the writer thread has died
    writer: Option<Writer>,
    in_flight: usize,
    failed: bool,
    status: SaveStatus,
}

impl PersistenceAdapter {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        events: Receiver<StoreEvent>,
        mode: WriteMode,
    ) -> Self {
        let writer = match mode {
            WriteMode::Inline => None,
            WriteMode::Background => Some(spawn_writer(Arc::clone(&backend))),
        };

        Self {
            backend,
            events,
            debouncer: Debouncer::default(),
            pending_markers: None,
            writer,
            in_flight: 0,
            failed: false,
            status: SaveStatus::Idle,
        }
    }

    /// Set the delay between the last marker change and the write.
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    pub fn status(&self) -> SaveStatus {
        self.status
    }

    /// When the pending marker write becomes due, if one is scheduled.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn poll(&mut self) {
        self.poll_at(Instant::now());
    }

    /// Process store events, fire the debounce if due and collect
    /// finished writes, as of `now`.
    pub fn poll_at(&mut self, now: Instant) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event, now);
        }

        if self.debouncer.fire_if_due(now) {
            if let Some(markers) = self.pending_markers.take() {
                self.submit(WriteJob::Markers(markers));
            }
        }

        self.collect_completions();
        self.update_status();
    }

    /// Write anything pending right now and wait for all writes to finish,
    /// for at most [`FLUSH_TIMEOUT`].
    pub fn flush(&mut self) {
        self.flush_within(FLUSH_TIMEOUT);
    }

    fn flush_within(&mut self, timeout: Duration) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event, Instant::now());
        }

        self.debouncer.cancel();
        if let Some(markers) = self.pending_markers.take() {
            self.submit(WriteJob::Markers(markers));
        }

        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let Some(writer) = &self.writer else { break };
            let remaining = deadline.saturating_duration_since(Instant::now());
            match writer.completions.recv_timeout(remaining) {
                Ok(outcome) => self.complete(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        "Gave up waiting for {} writes after {:?}",
                        self.in_flight,
                        timeout
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.writer_lost();
                    break;
                }
            }
        }

        self.update_status();
    }

    fn handle_event(&mut self, event: StoreEvent, now: Instant) {
        self.status = SaveStatus::Saving;
        self.failed = false;

        match event {
            StoreEvent::MarkersChanged(markers) => {
                log::debug!(
                    "Scheduling marker save in {:?} ({} markers)",
                    self.debouncer.delay(),
                    markers.len()
                );
                self.pending_markers = Some(markers);
                self.debouncer.schedule(now);
            }
            StoreEvent::MapChanged(map) => self.submit(map_job(map)),
            StoreEvent::Replaced { markers, map } => {
                self.debouncer.cancel();
                self.pending_markers = None;
                self.submit(WriteJob::Markers(markers));
                self.submit(map_job(map));
            }
        }
    }

    fn submit(&mut self, job: WriteJob) {
        log::debug!("Writing '{}'", job.key());

        let job = match &self.writer {
            Some(writer) => match writer.jobs.send(job) {
                Ok(()) => {
                    self.in_flight += 1;
                    return;
                }
                Err(e) => e.0,
            },
            None => job,
        };

        if self.writer.is_some() {
            self.writer_lost();
        }
        let result = job.execute(self.backend.as_ref());
        self.record(job.key(), result);
    }

    fn collect_completions(&mut self) {
        loop {
            let Some(writer) = &self.writer else { return };
            match writer.completions.try_recv() {
                Ok(outcome) => self.complete(outcome),
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.writer_lost();
                    return;
                }
            }
        }
    }

    /// The writer thread has exited. Writes it never reported count as
    /// failed and later writes run on the calling thread.
    fn writer_lost(&mut self) {
        log::error!(
            "Writer thread stopped with {} writes unfinished",
            self.in_flight
        );
        if self.in_flight > 0 {
            self.failed = true;
        }
        self.in_flight = 0;
        self.writer = None;
    }

    fn complete(&mut self, outcome: WriteOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.record(outcome.key, outcome.result);
    }

    fn record(&mut self, key: &str, result: Result<(), StorageError>) {
        match result {
            Ok(()) => log::debug!("Saved '{}'", key),
            Err(e) => {
                log::error!("Failed to save '{}': {}", key, e);
                self.failed = true;
            }
        }
    }

    fn update_status(&mut self) {
        if self.status == SaveStatus::Saving
            && self.in_flight == 0
            && !self.debouncer.is_pending()
        {
            self.status = if self.failed {
                SaveStatus::Failed
            } else {
                SaveStatus::Saved
            };
        }
    }
}

fn map_job(map: Option<String>) -> WriteJob {
    match map {
        Some(map) => WriteJob::Map(map),
        None => WriteJob::RemoveMap,
    }
}

fn spawn_writer(backend: Arc<dyn KeyValueStore>) -> Writer {
    let (sender, jobs) = channel::<WriteJob>();
    let (completions, receiver) = channel();

    std::thread::spawn(move || {
        // Exits once the adapter drops its job sender.
        for job in jobs {
            let outcome = WriteOutcome {
                key: job.key(),
                result: job.execute(backend.as_ref()),
            };
            if completions.send(outcome).is_err() {
                break;
            }
        }
    });

    Writer {
        jobs: sender,
        completions: receiver,
    }
}
