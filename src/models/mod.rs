// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model shared by the state store, persistence and UI.

pub mod marker;
pub mod project;
