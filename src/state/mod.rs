// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory application state: markers, map reference and undo history.

pub mod history;
pub mod store;
