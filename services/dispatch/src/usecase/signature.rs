//! HMAC-SHA256 webhook signature verification.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::DispatchError;

type HmacSha256 = Hmac<Sha256>;

/// How a webhook passed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Signature matched the configured secret.
    Verified,
    /// No secret configured; accepted without a check.
    Unverified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid webhook signature")]
pub struct SignatureError;

impl From<SignatureError> for DispatchError {
    fn from(_: SignatureError) -> Self {
        Self::InvalidSignature
    }
}

/// Checks `base64(HMAC-SHA256(secret, raw_body))` against the signature header.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
}

impl WebhookVerifier {
    /// An empty secret counts as unconfigured.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<Verification, SignatureError> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!(
                verification = "unverified",
                "channel secret not configured, accepting webhook without signature check"
            );
            return Ok(Verification::Unverified);
        };

        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError)?;
        let provided = STANDARD.decode(signature).map_err(|_| SignatureError)?;

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError)?;
        mac.update(body);
        // constant-time
        mac.verify_slice(&provided).map_err(|_| SignatureError)?;

        tracing::debug!(verification = "verified", "webhook signature verified");
        Ok(Verification::Verified)
    }
}

/// Constant-time secret comparison. Both sides are digested under `expected`
/// and checked with `verify_slice`.
pub fn secrets_match(expected: &str, provided: &str) -> bool {
    let digest = |value: &str| {
        HmacSha256::new_from_slice(expected.as_bytes()).map(|mut mac| {
            mac.update(value.as_bytes());
            mac
        })
    };
    let (Ok(expected_mac), Ok(provided_mac)) = (digest(expected), digest(provided)) else {
        return false;
    };
    provided_mac
        .verify_slice(&expected_mac.finalize().into_bytes())
        .is_ok()
}
