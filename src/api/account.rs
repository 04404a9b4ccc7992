// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoint.

use axum::Json;

use crate::auth::Auth;
use crate::models::AccountResponse;

/// Profile of the signed-in user.
///
/// `email` and `name` come straight from the ID-token claims; either is `""`
/// when the provider did not include it.
#[utoipa::path(
    get,
    path = "/api/account",
    tag = "Account",
    responses(
        (status = 200, description = "Current user's profile", body = AccountResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn get_account(Auth(identity): Auth) -> Json<AccountResponse> {
    Json(AccountResponse::from(&identity))
}
