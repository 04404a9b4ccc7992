// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication gate middleware for Axum.
//!
//! Applied with `route_layer` to the protected routes:
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/account", get(account::get_account))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         state.clone(),
//!         require_identity,
//!     ));
//! ```
//!
//! ## Flow
//!
//! 1. `Authorization` must start with exactly `Bearer ` (case-sensitive, one
//!    space). Anything else is rejected before the verifier is touched.
//! 2. The rest of the header is handed to the verifier byte-for-byte. No
//!    trimming and no UTF-8 check: `Bearer  x ` yields the credential ` x `.
//! 3. The verifier runs under a per-request [`CancellationToken`] (cancelled
//!    if the request future is dropped) and the configured deadline.
//! 4. On success the [`VerifiedIdentity`] goes into the request extensions.
//!    Any failure is the generic 401; the reason is only logged.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRef, Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio_util::sync::CancellationToken;

use super::{AuthError, CredentialVerifier, VerifiedIdentity};
use crate::state::AppState;

/// Exact scheme prefix of a bearer credential.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Default deadline for one verification.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// What the gate needs: a verifier and a deadline.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn CredentialVerifier>,
    verify_timeout: Duration,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            verifier,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    /// Set the verification deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    pub fn verify_timeout(&self) -> Duration {
        self.verify_timeout
    }

    /// Run the verifier under a deadline.
    ///
    /// `cancel` is handed to the verifier so it can abandon in-flight work;
    /// it is also cancelled here when the deadline passes.
    pub async fn authenticate(
        &self,
        credential: &[u8],
        cancel: &CancellationToken,
    ) -> Result<VerifiedIdentity, AuthError> {
        match tokio::time::timeout(self.verify_timeout, self.verifier.verify(credential, cancel))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(AuthError::VerificationTimedOut)
            }
        }
    }
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}

/// Pull the raw credential out of the `Authorization` header.
///
/// Only the first header value is considered. The prefix is stripped once on
/// the raw bytes and nothing else is touched, so an empty credential
/// (`"Bearer "`) and one carrying obs-text bytes are both left for the
/// verifier to reject.
pub fn bearer_credential(headers: &HeaderMap) -> Result<&[u8], AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?;

    value
        .as_bytes()
        .strip_prefix(BEARER_PREFIX.as_bytes())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Authentication gate middleware function.
pub async fn require_identity(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = {
        let credential = match bearer_credential(request.headers()) {
            Ok(credential) => credential.to_vec(),
            Err(e) => return reject(e),
        };

        let cancel = CancellationToken::new();
        // Dropping the middleware future (client gone) cancels the verifier.
        let _guard = cancel.clone().drop_guard();

        match gate.authenticate(&credential, &cancel).await {
            Ok(identity) => identity,
            Err(e) => return reject(e),
        }
    };

    tracing::debug!(uid = %identity.uid, "Request authenticated");
    request.extensions_mut().insert(identity);
    next.run(request).await
}

fn reject(error: AuthError) -> Response {
    tracing::warn!(
        error_code = error.error_code(),
        error = %error,
        "Authentication failed"
    );
    error.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::ScriptedVerifier;
    use crate::auth::Auth;
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderValue, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    /// Protected router whose handler echoes the bound uid.
    fn app(verifier: Arc<dyn CredentialVerifier>, timeout: Duration) -> Router {
        let gate = AuthGate::new(verifier).with_timeout(timeout);
        Router::new()
            .route(
                "/test",
                get(|Auth(identity): Auth| async move { identity.uid }),
            )
            .route_layer(middleware::from_fn_with_state(gate.clone(), require_identity))
            .with_state(gate)
    }

    fn app_with(verifier: &Arc<ScriptedVerifier>) -> Router {
        app(verifier.clone(), DEFAULT_VERIFY_TIMEOUT)
    }

    fn request(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// Request whose `Authorization` value is arbitrary (valid header) bytes.
    fn raw_request(value: &[u8]) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap())
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_rejected_without_verification() {
        let verifier = Arc::new(ScriptedVerifier::accepting("u"));
        let response = app_with(&verifier).oneshot(request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "unauthorized\n");
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected_without_verification() {
        let verifier = Arc::new(ScriptedVerifier::accepting("u"));
        for header in ["InvalidToken", "Basic sometoken", "bearer token", "BEARER token", "Bearer", ""] {
            let response = app_with(&verifier)
                .oneshot(request(Some(header)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
        }
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn empty_credential_still_reaches_verifier() {
        let verifier = Arc::new(ScriptedVerifier::new(|credential| {
            if credential.is_empty() {
                Err(AuthError::MalformedToken)
            } else {
                Ok(VerifiedIdentity::new("u"))
            }
        }));

        let response = app_with(&verifier)
            .oneshot(request(Some("Bearer ")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(verifier.seen(), vec![String::new()]);
    }

    #[tokio::test]
    async fn non_utf8_credential_reaches_verifier() {
        let verifier = Arc::new(ScriptedVerifier::rejecting(AuthError::MalformedToken));

        let response = app_with(&verifier)
            .oneshot(raw_request(b"Bearer \xff"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "unauthorized\n");
        assert_eq!(verifier.calls(), 1);
        assert_eq!(verifier.seen(), vec!["\u{FFFD}"]);

        app_with(&verifier)
            .oneshot(raw_request(b"Basic \xff"))
            .await
            .unwrap();
        assert_eq!(verifier.calls(), 1);
    }

    #[tokio::test]
    async fn verifier_rejection_is_generic_401() {
        for error in [
            AuthError::TokenExpired,
            AuthError::InvalidSignature,
            AuthError::JwksFetchError("dns failure".into()),
        ] {
            let verifier = Arc::new(ScriptedVerifier::rejecting(error));
            let response = app_with(&verifier)
                .oneshot(request(Some("Bearer invalid-token")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_string(response).await, "unauthorized\n");
        }
    }

    #[tokio::test]
    async fn verified_identity_reaches_handler() {
        let verifier = Arc::new(ScriptedVerifier::new(|credential| {
            if credential == "valid-token" {
                Ok(VerifiedIdentity::new("test-user-123"))
            } else {
                Err(AuthError::InvalidSignature)
            }
        }));

        let response = app_with(&verifier)
            .oneshot(request(Some("Bearer valid-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "test-user-123");
    }

    #[tokio::test]
    async fn prefix_is_stripped_exactly_once() {
        let verifier = Arc::new(ScriptedVerifier::accepting("u"));
        app_with(&verifier)
            .oneshot(request(Some("Bearer my-test-token")))
            .await
            .unwrap();
        app_with(&verifier)
            .oneshot(request(Some("Bearer  token-with-spaces ")))
            .await
            .unwrap();
        app_with(&verifier)
            .oneshot(request(Some("Bearer Bearer x")))
            .await
            .unwrap();

        assert_eq!(
            verifier.seen(),
            vec!["my-test-token", " token-with-spaces ", "Bearer x"]
        );
    }

    #[tokio::test]
    async fn concurrent_requests_each_verify_once() {
        let verifier = Arc::new(ScriptedVerifier::accepting("test-user"));
        let app = app_with(&verifier);

        let (a, b, c) = tokio::join!(
            app.clone().oneshot(request(Some("Bearer token"))),
            app.clone().oneshot(request(Some("Bearer token"))),
            app.clone().oneshot(request(Some("Bearer token"))),
        );

        for response in [a, b, c] {
            assert_eq!(response.unwrap().status(), StatusCode::OK);
        }
        assert_eq!(verifier.calls(), 3);
    }

    /// Verifier that never answers on its own.
    struct StalledVerifier {
        started: Arc<Notify>,
        token: Mutex<Option<CancellationToken>>,
    }

    #[async_trait::async_trait]
    impl CredentialVerifier for StalledVerifier {
        async fn verify(
            &self,
            _credential: &[u8],
            cancel: &CancellationToken,
        ) -> Result<VerifiedIdentity, AuthError> {
            *self.token.lock().unwrap() = Some(cancel.clone());
            self.started.notify_one();
            std::future::pending().await
        }
    }

    fn stalled() -> Arc<StalledVerifier> {
        Arc::new(StalledVerifier {
            started: Arc::new(Notify::new()),
            token: Mutex::new(None),
        })
    }

    #[tokio::test]
    async fn deadline_turns_into_401_and_cancels() {
        let verifier = stalled();
        let app = app(verifier.clone(), Duration::from_millis(20));

        let response = app.oneshot(request(Some("Bearer slow"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = verifier.token.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn dropped_request_cancels_verification() {
        let verifier = stalled();
        let app = app(verifier.clone(), Duration::from_secs(60));

        let started = verifier.started.clone();
        let handle = tokio::spawn(app.oneshot(request(Some("Bearer token"))));
        started.notified().await;

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        let token = verifier.token.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn bearer_credential_rules() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_credential(&headers), Err(AuthError::MissingAuthHeader));

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_credential(&headers), Ok(&b"abc"[..]));

        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(b"Bearer \xff").unwrap());
        assert_eq!(bearer_credential(&headers), Ok(&b"\xff"[..]));

        headers.insert(AUTHORIZATION, "bearer abc".parse().unwrap());
        assert_eq!(bearer_credential(&headers), Err(AuthError::InvalidAuthHeader));
    }
}
