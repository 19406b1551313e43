//! Signed bearer tokens.
//!
//! Format: `<base64url(claims json)>.<base64url(hmac-sha256)>` where the MAC
//! covers the encoded claims text. Verification is stateless; the subject id
//! is embedded in the claims.

use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    hmac::{Hmac, Mac},
    serde::{Deserialize, Serialize},
    sha2::Sha256,
    tracing::debug,
};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// A freshly issued token together with its expiry (unix seconds).
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Strip the `Bearer ` scheme prefix from an `Authorization` header value.
///
/// Returns `None` for a missing prefix; the scheme is case-sensitive per the
/// header convention used throughout this API.
pub fn strip_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Issues and verifies HMAC-signed subject tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Build a signer with a random secret. Tokens issued by it become
    /// invalid when the process exits.
    pub fn ephemeral(ttl_secs: u64) -> Self {
        use rand::RngCore;

        let mut secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self { secret, ttl_secs }
    }

    /// Issue a token for the given subject id.
    pub fn issue(&self, subject_id: &str) -> Result<IssuedToken> {
        let now = chrono::Utc::now().timestamp();
        let expires_at = now + self.ttl_secs as i64;
        let claims = Claims {
            sub: subject_id.to_string(),
            iat: now,
            exp: expires_at,
        };
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let sig = URL_SAFE_NO_PAD.encode(self.mac_over(payload.as_bytes())?);
        Ok(IssuedToken {
            token: format!("{payload}.{sig}"),
            expires_at,
        })
    }

    /// Verify a token and return the embedded subject id.
    ///
    /// Fails `Unauthorized` on malformed tokens, bad signatures, and expired
    /// claims. The reason is logged at debug, never surfaced to the caller.
    pub fn verify(&self, token: &str) -> Result<String> {
        let Some((payload, sig)) = token.split_once('.') else {
            debug!("token rejected: missing signature separator");
            return Err(Error::unauthorized("invalid token"));
        };

        let Ok(provided) = URL_SAFE_NO_PAD.decode(sig) else {
            debug!("token rejected: signature is not base64url");
            return Err(Error::unauthorized("invalid token"));
        };
        let expected = self.mac_over(payload.as_bytes())?;
        if !constant_time_eq(&expected, &provided) {
            debug!("token rejected: signature mismatch");
            return Err(Error::unauthorized("invalid token"));
        }

        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or_else(|| {
                debug!("token rejected: undecodable claims");
                Error::unauthorized("invalid token")
            })?;

        if claims.exp <= chrono::Utc::now().timestamp() {
            debug!(sub = %claims.sub, "token rejected: expired");
            return Err(Error::unauthorized("token expired"));
        }

        Ok(claims.sub)
    }

    fn mac_over(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| Error::external("init hmac", e))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
