use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{ConfigError, JwtConfig};
use crate::services::auth::claims::{Claims, TokenType};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("identity is not JSON serializable: {0}")]
    Identity(#[source] serde_json::Error),
    #[error("failed to sign JWT: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),
}

/// Result of checking a raw token's signature and validity window.
///
/// The token type is deliberately not judged here.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Valid(Claims),
    SignatureInvalid,
    Expired,
    NotYetValid,
}

/// Issues and verifies HS256 tokens with the process secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret_key: &str, config: JwtConfig) -> Result<Self, ConfigError> {
        if secret_key.is_empty() {
            return Err(ConfigError::MissingSecretKey);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret_key.as_bytes()),
            config,
        })
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn create_access_token<T>(&self, identity: &T) -> Result<String, TokenError>
    where
        T: Serialize + ?Sized,
    {
        self.issue(identity, TokenType::Access)
    }

    pub fn create_refresh_token<T>(&self, identity: &T) -> Result<String, TokenError>
    where
        T: Serialize + ?Sized,
    {
        self.issue(identity, TokenType::Refresh)
    }

    /// Build fresh claims for `identity` and sign them.
    pub fn issue<T>(&self, identity: &T, kind: TokenType) -> Result<String, TokenError>
    where
        T: Serialize + ?Sized,
    {
        let sub = serde_json::to_value(identity).map_err(TokenError::Identity)?;
        let ttl = match kind {
            TokenType::Access => self.config.access_token_expires(),
            TokenType::Refresh => self.config.refresh_token_expires(),
        };

        let claims = Claims::new(sub, kind, ttl, Utc::now());
        self.encode(&claims)
    }

    /// Sign an arbitrary claim set with the configured algorithm.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let mut header = Header::new(self.config.algorithm());
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            TokenError::Sign(e)
        })
    }

    /// Verify signature, `exp` and `nbf`, then decode the claims.
    ///
    /// Signature comparison is done by `jsonwebtoken::crypto` (HMAC verify), never by
    /// string equality. `sub` may be any JSON value, so the payload is decoded into
    /// `Claims` here rather than by `jsonwebtoken::decode`.
    pub fn verify(&self, token: &str) -> Verification {
        let claims = match self.decode(token) {
            Ok(claims) => claims,
            Err(reason) => {
                debug!(reason, "jwt decode failed");
                return Verification::SignatureInvalid;
            }
        };

        // leeway 0: valid while nbf <= now <= exp
        let now = Utc::now().timestamp();
        if claims.exp < now {
            Verification::Expired
        } else if claims.nbf > now {
            Verification::NotYetValid
        } else {
            Verification::Valid(claims)
        }
    }

    fn decode(&self, token: &str) -> Result<Claims, &'static str> {
        let (message, signature) = token.rsplit_once('.').ok_or("token has no signature")?;
        let (_, payload) = message.split_once('.').ok_or("token has no payload")?;

        let header = jsonwebtoken::decode_header(token).map_err(|_| "invalid header")?;
        if header.alg != self.config.algorithm() {
            return Err("unexpected algorithm");
        }

        let verified = jsonwebtoken::crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding_key,
            header.alg,
        )
        .map_err(|_| "invalid signature encoding")?;
        if !verified {
            return Err("signature mismatch");
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| "payload is not base64url")?;
        serde_json::from_slice(&payload).map_err(|_| "claims do not deserialize")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use serde_json::json;

    const SECRET: &str = "not very secret in tests";

    fn manager() -> JwtManager {
        JwtManager::new(SECRET, JwtConfig::default()).expect("manager")
    }

    fn claims_at(offset_iat: i64, offset_nbf: i64, offset_exp: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            iat: now + offset_iat,
            jti: "test-jti".to_string(),
            token_type: TokenType::Access,
            sub: json!("iml"),
            nbf: now + offset_nbf,
            exp: now + offset_exp,
        }
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        assert!(matches!(
            JwtManager::new("", JwtConfig::default()),
            Err(ConfigError::MissingSecretKey)
        ));
    }

    #[test]
    fn issued_tokens_round_trip_identity_and_type() {
        let jwt = manager();
        let identities = [
            json!("iml"),
            json!(7),
            json!(null),
            json!([1, 2]),
            json!({ "id": 1, "role": "admin" }),
        ];

        for identity in identities {
            for kind in [TokenType::Access, TokenType::Refresh] {
                let token = jwt.issue(&identity, kind).expect("issue");
                match jwt.verify(&token) {
                    Verification::Valid(claims) => {
                        assert_eq!(claims.sub, identity);
                        assert_eq!(claims.token_type, kind);
                        assert_eq!(claims.nbf, claims.iat);
                    }
                    other => panic!("expected valid token, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn expiry_follows_token_kind() {
        let config = JwtConfig::from_settings(&json!({
            "ACCESS_TOKEN_EXPIRES": 60,
            "REFRESH_TOKEN_EXPIRES": "1h",
        }))
        .unwrap();
        let jwt = JwtManager::new(SECRET, config).unwrap();

        let Verification::Valid(access) = jwt.verify(&jwt.create_access_token("iml").unwrap())
        else {
            panic!("access token should verify");
        };
        let Verification::Valid(refresh) = jwt.verify(&jwt.create_refresh_token("iml").unwrap())
        else {
            panic!("refresh token should verify");
        };

        assert_eq!(access.exp - access.iat, 60);
        assert_eq!(refresh.exp - refresh.iat, Duration::hours(1).num_seconds());
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let jwt = manager();
        let token = jwt.encode(&claims_at(-120, -120, -60)).unwrap();
        assert_eq!(jwt.verify(&token), Verification::Expired);
    }

    #[test]
    fn token_expiring_long_ago_is_reported_as_expired() {
        let jwt = manager();
        let mut claims = claims_at(0, 0, 0);
        claims.iat = 0;
        claims.nbf = 0;
        claims.exp = 1;
        let token = jwt.encode(&claims).unwrap();
        assert_eq!(jwt.verify(&token), Verification::Expired);
    }

    #[test]
    fn object_identity_survives_verification() {
        let jwt = manager();
        let identity = json!({ "id": 7, "scopes": ["read", "write"] });
        let token = jwt.create_refresh_token(&identity).unwrap();

        let Verification::Valid(claims) = jwt.verify(&token) else {
            panic!("object identity should verify");
        };
        assert_eq!(claims.identity(), &identity);
    }

    #[test]
    fn tampered_object_identity_never_verifies() {
        let jwt = manager();
        let token = jwt.create_access_token(&json!({ "id": 1 })).unwrap();
        let forged = jwt.create_access_token(&json!({ "id": 2 })).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();

        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert_eq!(jwt.verify(&spliced), Verification::SignatureInvalid);
    }

    #[test]
    fn token_used_before_nbf_is_not_yet_valid() {
        let jwt = manager();
        let token = jwt.encode(&claims_at(0, 3_600, 7_200)).unwrap();
        assert_eq!(jwt.verify(&token), Verification::NotYetValid);
    }

    #[test]
    fn tampered_signature_never_verifies() {
        let jwt = manager();
        let token = jwt.create_access_token("iml").unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for idx in sig_start..token.len() - 1 {
            let mut bytes = token.clone().into_bytes();
            bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            if tampered == token {
                continue;
            }
            assert_eq!(
                jwt.verify(&tampered),
                Verification::SignatureInvalid,
                "byte {idx} flipped"
            );
        }
    }

    #[test]
    fn tampered_payload_never_verifies() {
        let jwt = manager();
        let token = jwt.create_access_token("iml").unwrap();
        let forged = jwt.create_access_token("admin").unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();

        // Payload of one token with the signature of another.
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert_eq!(jwt.verify(&spliced), Verification::SignatureInvalid);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = JwtManager::new("invalid", JwtConfig::default()).unwrap();
        let token = other.create_access_token("invalid").unwrap();
        assert_eq!(manager().verify(&token), Verification::SignatureInvalid);
    }

    #[test]
    fn token_with_another_algorithm_is_rejected() {
        let claims = claims_at(0, 0, 60);
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(manager().verify(&token), Verification::SignatureInvalid);
    }

    #[test]
    fn garbage_is_rejected() {
        let jwt = manager();
        for token in ["", "invalid.token.here", "a.b", "Bearer x"] {
            assert_eq!(jwt.verify(token), Verification::SignatureInvalid, "{token}");
        }
    }

    #[test]
    fn valid_signature_without_type_claim_is_a_decode_error() {
        let jwt = manager();
        let now = Utc::now().timestamp();
        let token = jwt
            .encode(&json!({ "sub": "iml", "exp": now + 60, "nbf": now }))
            .unwrap();
        assert_eq!(jwt.verify(&token), Verification::SignatureInvalid);
    }

    #[test]
    fn debug_output_hides_key_material() {
        let out = format!("{:?}", manager());
        assert!(!out.contains(SECRET));
    }
}
