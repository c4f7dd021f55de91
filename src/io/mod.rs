// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations: images, project files and durable storage.

pub mod media;
pub mod persistence;
pub mod serialization;
pub mod storage;
