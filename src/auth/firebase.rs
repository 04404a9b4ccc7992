// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase ID-token verification.
//!
//! Checks performed on every call:
//!
//! - header is RS256 and names a `kid` present in the secure-token JWKS
//! - signature, `exp`, `aud == <project>`, `iss == https://securetoken.google.com/<project>`
//! - `iat` and `auth_time` are not in the future
//! - `sub` is non-empty and at most 128 characters

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, Validation};
use tokio_util::sync::CancellationToken;

use super::{
    claims::IdTokenClaims, AuthError, CredentialVerifier, JwksManager, VerifiedIdentity,
};

/// Public JWKS for Firebase ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Upper bound on the uid length Firebase issues.
const MAX_SUBJECT_LEN: usize = 128;

/// Network-backed verifier for Firebase ID tokens.
#[derive(Clone)]
pub struct FirebaseVerifier {
    project_id: String,
    issuer: String,
    jwks: JwksManager,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>, jwks: JwksManager) -> Self {
        let project_id = project_id.into();
        Self {
            issuer: format!("https://securetoken.google.com/{project_id}"),
            project_id,
            jwks,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn jwks(&self) -> &JwksManager {
        &self.jwks
    }

    async fn verify_token(&self, credential: &[u8]) -> Result<VerifiedIdentity, AuthError> {
        // A JWT is base64url segments joined by dots, so non-UTF-8 is malformed.
        let token = std::str::from_utf8(credential).map_err(|_| AuthError::MalformedToken)?;
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::MalformedToken);
        }
        let kid = header.kid.ok_or(AuthError::MalformedToken)?;

        let (decoding_key, algorithm) = self.jwks.get_decoding_key(&kid).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "aud", "iss", "sub"]);

        let token_data =
            decode::<IdTokenClaims>(token, &decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                    ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                    ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                    ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                    _ => AuthError::MalformedToken,
                }
            })?;

        let claims = token_data.claims;
        check_times(&claims, chrono::Utc::now().timestamp())?;

        if claims.sub.is_empty() || claims.sub.len() > MAX_SUBJECT_LEN {
            return Err(AuthError::InvalidSubject);
        }

        Ok(VerifiedIdentity::from_claims(claims))
    }
}

/// `iat` and `auth_time` must not lie beyond `now` plus leeway.
fn check_times(claims: &IdTokenClaims, now: i64) -> Result<(), AuthError> {
    let latest = now + CLOCK_SKEW_LEEWAY as i64;
    if claims.iat > latest || claims.auth_time > latest {
        return Err(AuthError::TokenNotYetValid);
    }
    Ok(())
}

#[async_trait]
impl CredentialVerifier for FirebaseVerifier {
    async fn verify(
        &self,
        credential: &[u8],
        cancel: &CancellationToken,
    ) -> Result<VerifiedIdentity, AuthError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AuthError::Cancelled),
            result = self.verify_token(credential) => result,
        }
    }
}
