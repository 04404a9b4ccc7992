// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Response bodies of the JSON API. All types derive `Serialize` and
//! `ToSchema` for JSON handling and OpenAPI documentation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::VerifiedIdentity;

// =============================================================================
// Health
// =============================================================================

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

// =============================================================================
// Account
// =============================================================================

/// Profile of the signed-in user, taken from the token claims.
///
/// A claim that is missing or not a string is rendered as `""`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountResponse {
    /// `email` claim.
    pub email: String,
    /// `name` claim.
    pub name: String,
}

impl From<&VerifiedIdentity> for AccountResponse {
    fn from(identity: &VerifiedIdentity) -> Self {
        let claim = |name| identity.claim_str(name).unwrap_or_default().to_string();
        Self {
            email: claim("email"),
            name: claim("name"),
        }
    }
}

// =============================================================================
// Holdings
// =============================================================================

/// One position held by the user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, sqlx::FromRow)]
pub struct Holding {
    /// Instrument name.
    pub name: String,
    /// Ticker symbol.
    pub symbol: String,
    /// Units held.
    pub quantity: f64,
    /// ISO currency code of `cost`.
    pub currency: String,
    /// Total acquisition cost.
    pub cost: f64,
}
