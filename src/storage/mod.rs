// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Read-only access to the `holdings` table:
//!
//! ```text
//! holdings(user_id text, name text, symbol text, quantity numeric,
//!          currency text, cost numeric, created_at timestamptz)
//! ```
//!
//! Rows are scoped by the verified Firebase uid; nothing here writes.

pub mod holdings;

pub use holdings::{HoldingsStore, PgHoldingsStore, StorageError};
