// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the verified identity.
//!
//! Use the `Auth` extractor in handlers behind the authentication gate:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is VerifiedIdentity
//! }
//! ```
//!
//! The extractor never verifies anything itself. It only reads the binding
//! the gate left in the request extensions and rejects with the generic 401
//! when there is none, so a handler mounted without the gate fails closed.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, VerifiedIdentity};

/// Extractor for the identity bound by the gate.
pub struct Auth(pub VerifiedIdentity);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<VerifiedIdentity>() {
            Some(identity) => Ok(Auth(identity.clone())),
            None => {
                tracing::warn!(
                    path = %parts.uri.path(),
                    "Identity-scoped handler reached without a verified identity"
                );
                Err(AuthError::MissingIdentity)
            }
        }
    }
}
