// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential verifier capability.
//!
//! The gate only depends on this trait. Production wires in
//! [`FirebaseVerifier`](super::FirebaseVerifier); tests use a scripted double.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{AuthError, VerifiedIdentity};

/// Verifies a raw bearer credential.
///
/// The credential is the header remainder exactly as received, so it may be
/// empty, padded with whitespace, or not even UTF-8. Implementations must be safe to call concurrently and must not cache
/// verification results between calls. `cancel` fires when the request that
/// asked for the verification is gone; implementations should stop work and
/// return [`AuthError::Cancelled`].
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(
        &self,
        credential: &[u8],
        cancel: &CancellationToken,
    ) -> Result<VerifiedIdentity, AuthError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    type Script = Box<dyn Fn(&str) -> Result<VerifiedIdentity, AuthError> + Send + Sync>;

    /// Verifier double with a scripted answer that records its inputs.
    pub struct ScriptedVerifier {
        script: Script,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedVerifier {
        pub fn new(
            script: impl Fn(&str) -> Result<VerifiedIdentity, AuthError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                script: Box::new(script),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// Accept every credential as `uid`.
        pub fn accepting(uid: &'static str) -> Self {
            Self::new(move |_| Ok(VerifiedIdentity::new(uid)))
        }

        /// Reject every credential with `error`.
        pub fn rejecting(error: AuthError) -> Self {
            Self::new(move |_| Err(error.clone()))
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CredentialVerifier for ScriptedVerifier {
        async fn verify(
            &self,
            credential: &[u8],
            _cancel: &CancellationToken,
        ) -> Result<VerifiedIdentity, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let credential = String::from_utf8_lossy(credential).into_owned();
            self.seen.lock().unwrap().push(credential.clone());
            (self.script)(&credential)
        }
    }
}
