// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Holdings endpoint.

use axum::{extract::State, Json};

use crate::auth::Auth;
use crate::error::ApiError;
use crate::models::Holding;
use crate::state::AppState;

/// List the signed-in user's holdings, newest first.
#[utoipa::path(
    get,
    path = "/api/holdings",
    tag = "Holdings",
    responses(
        (status = 200, description = "Holdings of the current user", body = Vec<Holding>),
        (status = 401, description = "Missing or invalid credential"),
        (status = 500, description = "Database failure")
    )
)]
pub async fn list_holdings(
    Auth(identity): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Holding>>, ApiError> {
    let holdings = state
        .holdings
        .list_for_user(&identity.uid)
        .await
        .map_err(|e| {
            tracing::error!(uid = %identity.uid, error = %e, "Failed to load holdings");
            ApiError::internal()
        })?;

    Ok(Json(holdings))
}
