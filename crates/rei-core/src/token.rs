//! HS256 bearer tokens for the REST API.
//!
//! Compact form: `base64url(claims_json) "." base64url(hmac_sha256(secret, part0))`.
//! The role carried in the claims is informational only; ingress re-reads the
//! user record on every request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{ReiError, Result};
use crate::types::Role;
use crate::users::UserRecord;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ReiError::InvalidToken(e.to_string()))
    }

    pub fn issue(&self, user: &UserRecord, ttl: Duration, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{sig}"))
    }

    /// Check the signature and expiry and return the claims.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let (payload, sig) = token
            .split_once('.')
            .ok_or_else(|| ReiError::InvalidToken("malformed token".into()))?;
        let sig = URL_SAFE_NO_PAD
            .decode(sig)
            .map_err(|_| ReiError::InvalidToken("malformed signature".into()))?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| ReiError::InvalidToken("bad signature".into()))?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| ReiError::InvalidToken("malformed claims".into()))?;
        let claims: Claims = serde_json::from_slice(&raw)
            .map_err(|_| ReiError::InvalidToken("malformed claims".into()))?;
        if claims.exp <= now.timestamp() {
            return Err(ReiError::TokenExpired);
        }
        Ok(claims)
    }
}
