// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant renders the same response: status 401 with the plain-text
//! body `unauthorized\n`. The variant (and its [`AuthError::error_code`]) is
//! only ever written to the server log, so callers cannot tell an expired
//! token from a malformed one or an unreachable identity provider.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Body of every authentication-required response.
pub const UNAUTHORIZED_BODY: &str = "unauthorized\n";

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingAuthHeader,
    /// Header present but not `Bearer <credential>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    /// Token is malformed
    #[error("Token is malformed")]
    MalformedToken,
    /// Token signature is invalid
    #[error("Token signature is invalid")]
    InvalidSignature,
    /// Token has expired
    #[error("Token has expired")]
    TokenExpired,
    /// Token issuer is invalid
    #[error("Token issuer is invalid")]
    InvalidIssuer,
    /// Token audience is invalid
    #[error("Token audience is invalid")]
    InvalidAudience,
    /// Token `iat` or `auth_time` lies in the future
    #[error("Token is not yet valid")]
    TokenNotYetValid,
    /// Token subject is empty or too long
    #[error("Token subject is invalid")]
    InvalidSubject,
    /// JWKS fetch failed
    #[error("Failed to fetch JWKS: {0}")]
    JwksFetchError(String),
    /// No matching key in JWKS
    #[error("No matching key found in JWKS")]
    NoMatchingKey,
    /// Verification did not finish before the deadline
    #[error("Token verification timed out")]
    VerificationTimedOut,
    /// The request went away while verification was in flight
    #[error("Token verification was cancelled")]
    Cancelled,
    /// A handler needing an identity was reached without one bound
    #[error("No verified identity bound to the request")]
    MissingIdentity,
    /// Internal error
    #[error("Internal authentication error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidSubject => "invalid_subject",
            AuthError::JwksFetchError(_) => "jwks_fetch_error",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::VerificationTimedOut => "verification_timed_out",
            AuthError::Cancelled => "cancelled",
            AuthError::MissingIdentity => "missing_identity",
            AuthError::InternalError(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            UNAUTHORIZED_BODY,
        )
            .into_response()
    }
}
