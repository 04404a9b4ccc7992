// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Firebase ID-token authentication for the protected API routes.
//!
//! ## Auth Flow
//!
//! 1. The web client signs the user in with Firebase
//! 2. It sends `Authorization: Bearer <Firebase ID token>`
//! 3. The gate ([`require_identity`]):
//!    - extracts the credential (exact `Bearer ` prefix, no trimming)
//!    - verifies it through a [`CredentialVerifier`]
//!    - binds the [`VerifiedIdentity`] to the request
//! 4. Handlers read it with the [`Auth`] extractor
//!
//! ## Security
//!
//! - Every protected request is verified; outcomes are never cached
//! - All failures collapse into one `401 unauthorized`
//! - Signing keys are fetched over HTTPS and cached per their max-age
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod firebase;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::VerifiedIdentity;
pub use error::AuthError;
pub use extractor::Auth;
pub use firebase::{FirebaseVerifier, FIREBASE_JWKS_URL};
pub use jwks::JwksManager;
pub use middleware::{bearer_credential, require_identity, AuthGate};
pub use verifier::CredentialVerifier;

#[cfg(test)]
pub(crate) use verifier::testing;
