// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::extract::FromRef;

use crate::assets::AssetTree;
use crate::auth::AuthGate;
use crate::storage::HoldingsStore;

/// Shared, read-only context for every request.
///
/// Nothing in here is mutated after startup: the verifier is stateless per
/// call, the asset tree is frozen, and the store hands out pooled connections.
#[derive(Clone)]
pub struct AppState {
    pub gate: AuthGate,
    pub holdings: Arc<dyn HoldingsStore>,
    pub assets: Arc<AssetTree>,
}

impl AppState {
    pub fn new(gate: AuthGate, holdings: Arc<dyn HoldingsStore>, assets: AssetTree) -> Self {
        Self {
            gate,
            holdings,
            assets: Arc::new(assets),
        }
    }
}

impl FromRef<AppState> for Arc<AssetTree> {
    fn from_ref(state: &AppState) -> Self {
        state.assets.clone()
    }
}
