// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Static Assets
//!
//! The web client's build output, held in memory, and the catch-all handler
//! that serves it with client-side-routing fallback.

pub mod fallback;
pub mod tree;

pub use fallback::{resolve, serve_spa, Resolution, ENTRY_DOCUMENT};
pub use tree::{Asset, AssetError, AssetTree};
