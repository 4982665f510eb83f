use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::util::now_ts;

/// Minimal HS256 session tokens.
///
/// Notes:
/// - Only supports JSON objects for header/payload.
/// - Uses base64url encoding WITHOUT padding.
/// - Performs signature verification using `Hmac::verify_slice`.
/// - Verification is pure: signature and expiry only, no database access.

/// Name of the HTTP-only cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth-token";

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

/// Identity claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Owning user id.
    pub sub: String,
    pub email: String,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Why a token was rejected. Callers collapse all three into a single
/// unauthenticated response; the distinction exists for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature does not verify")]
    InvalidSignature,
    #[error("token is expired")]
    Expired,
}

fn b64url_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn b64url_decode(s: &str) -> Result<Vec<u8>, TokenError> {
    URL_SAFE_NO_PAD
        .decode(s.as_bytes())
        .map_err(|_| TokenError::Malformed)
}

/// Issues and verifies signed session tokens under a single server secret.
///
/// Constructed once at startup from explicit configuration; the secret is
/// never read from the environment at call sites.
pub struct TokenService {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl_secs,
        }
    }

    /// Encode `{ sub, email }` plus an issued-at/expiry window as an
    /// HS256-signed token.
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, serde_json::Error> {
        let now = now_ts();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let header = JwtHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let header_b64 = b64url_encode(&serde_json::to_vec(&header)?);
        let claims_b64 = b64url_encode(&serde_json::to_vec(&claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(format!("{signing_input}.{}", b64url_encode(&signature)))
    }

    /// Decode a token, verify its signature, and check expiry.
    ///
    /// The expiry check runs only after the signature verifies, so a
    /// forged `exp` cannot change the rejection reason.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;

        if claims.exp <= now_ts() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim();
        let mut parts = token.split('.');
        let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Malformed);
        };

        // Parse header to ensure alg/typ are what we expect.
        let header_raw = b64url_decode(header_b64)?;
        let header: JwtHeader =
            serde_json::from_slice(&header_raw).map_err(|_| TokenError::Malformed)?;
        if header.alg != "HS256" || !header.typ.eq_ignore_ascii_case("JWT") {
            return Err(TokenError::Malformed);
        }

        // Verify signature over the full claim set.
        let signing_input = format!("{header_b64}.{payload_b64}");
        let sig = b64url_decode(sig_b64)?;

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&sig)
            .map_err(|_| TokenError::InvalidSignature)?;

        // Parse payload.
        let payload_raw = b64url_decode(payload_b64)?;
        serde_json::from_slice(&payload_raw).map_err(|_| TokenError::Malformed)
    }

    fn mac(&self) -> Hmac<Sha256> {
        Hmac::<Sha256>::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(&b"unit-test-secret"[..], 3600)
    }

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@example.com").unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert_eq!(tokens.verify("not a token"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("a.b"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("a.b.c.d"), Err(TokenError::Malformed));
    }

    #[test]
    fn altered_claims_invalidate_the_signature() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@example.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        // Re-encode different claims while keeping the original signature.
        let forged_claims = Claims {
            sub: "user-2".to_string(),
            email: "a@example.com".to_string(),
            iat: now_ts(),
            exp: now_ts() + 3600,
        };
        let forged_b64 = b64url_encode(&serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_b64, parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn altered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@example.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        // Flip one character of the signature, staying inside the
        // base64url alphabet.
        let mut sig: Vec<u8> = parts[2].bytes().collect();
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!(
            "{}.{}.{}",
            parts[0],
            parts[1],
            String::from_utf8(sig).unwrap()
        );

        assert_eq!(tokens.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let tokens = service();
        let other = TokenService::new(&b"a different secret"[..], 3600);
        let token = tokens.issue("user-1", "a@example.com").unwrap();

        assert_eq!(other.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new(&b"unit-test-secret"[..], -60);
        let token = tokens.issue("user-1", "a@example.com").unwrap();

        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn unexpected_header_is_malformed() {
        let tokens = service();
        let token = tokens.issue("user-1", "a@example.com").unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let header = JwtHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let header_b64 = b64url_encode(&serde_json::to_vec(&header).unwrap());
        let forged = format!("{}.{}.{}", header_b64, parts[1], parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::Malformed));
    }
}
