// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the MapMark application.

pub mod canvas;
pub mod marker_form;
pub mod properties;
pub mod toolbar;
