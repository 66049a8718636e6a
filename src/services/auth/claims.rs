use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed payload of every token issued by `JwtManager`.
///
/// - `sub` is whatever identity the application chose (any JSON value).
/// - `nbf == iat` and `exp == iat + ttl` at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iat: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub sub: Value,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(sub: Value, token_type: TokenType, ttl: Duration, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iat,
            jti: Uuid::new_v4().to_string(),
            token_type,
            sub,
            nbf: iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    pub fn identity(&self) -> &Value {
        &self.sub
    }
}
