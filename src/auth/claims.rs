// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified identity and its claims.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Registered claims of a Firebase ID token.
///
/// Everything that is not a registered claim (`email`, `name`, `picture`,
/// `firebase`, custom claims) lands in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IdTokenClaims {
    /// Subject (Firebase uid)
    pub sub: String,
    /// Audience (Firebase project id)
    pub aud: String,
    /// Issuer (`https://securetoken.google.com/<project>`)
    pub iss: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Time the user authenticated
    #[serde(default)]
    pub auth_time: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a successful credential verification.
///
/// Built only by a [`CredentialVerifier`](super::CredentialVerifier) and bound
/// to a single request by the authentication gate. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    /// Stable subject identifier (Firebase uid)
    pub uid: String,
    /// Token issuer
    pub issuer: String,
    /// Token audience
    pub audience: String,
    /// Issued at (Unix seconds)
    pub issued_at: i64,
    /// Expiration (Unix seconds)
    pub expires_at: i64,
    /// Authentication time (Unix seconds)
    pub auth_time: i64,
    /// Non-registered claims, loosely typed
    pub claims: Map<String, Value>,
}

impl VerifiedIdentity {
    /// Identity with only a uid; the remaining fields are empty.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            issuer: String::new(),
            audience: String::new(),
            issued_at: 0,
            expires_at: 0,
            auth_time: 0,
            claims: Map::new(),
        }
    }

    /// Add a claim.
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    /// Raw claim value, if present.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// Claim as a string. Absent and non-string claims both yield `None`.
    pub fn claim_str(&self, name: &str) -> Option<&str> {
        self.claim(name).and_then(Value::as_str)
    }

    pub(crate) fn from_claims(claims: IdTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            issuer: claims.iss,
            audience: claims.aud,
            issued_at: claims.iat,
            expires_at: claims.exp,
            auth_time: claims.auth_time,
            claims: claims.extra,
        }
    }
}
