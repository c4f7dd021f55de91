// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Undo history of marker-list snapshots.

use crate::models::marker::Marker;
use std::collections::VecDeque;

/// Undo stack of full marker lists, most recent at the back.
#[derive(Debug, Clone)]
pub struct History {
    /// Past states
    undo_stack: VecDeque<Vec<Marker>>,
    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Default number of snapshots kept.
    pub const DEFAULT_MAX_SIZE: usize = 50;

    pub fn new() -> Self {
        Self::with_max_size(Self::DEFAULT_MAX_SIZE)
    }

    /// Create a history keeping at most `max_size` snapshots (at least one).
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Save a snapshot taken before making a change
    pub fn push(&mut self, snapshot: Vec<Marker>) {
        self.undo_stack.push_back(snapshot);
        // Limit history size
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
    }

    /// Remove and return the most recent snapshot
    pub fn pop(&mut self) -> Option<Vec<Marker>> {
        self.undo_stack.pop_back()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
