// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Portfolio Server - API and static host for the portfolio web client
//!
//! Serves a small JSON API authenticated with Firebase ID tokens, and the
//! built single-page client from an in-memory asset tree.
//!
//! ## Modules
//!
//! - `api` - HTTP routes, CORS and OpenAPI document (Axum)
//! - `assets` - In-memory asset tree and client-side-routing fallback
//! - `auth` - Bearer gate, Firebase ID-token verification
//! - `storage` - Holdings read model (Postgres)
//! - `config` - Environment configuration
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod assets;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
