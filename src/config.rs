/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, APP_ENV, SECRET_KEY, JWT_CONFIG)
 * - JWT ポリシー (JwtConfig) のバリデーションと正規化 (不正なら起動失敗)
 * - 起動時に一度だけ評価し、以降は immutable な値として共有する
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::HeaderName;
use chrono::Duration;
use jsonwebtoken::Algorithm;
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::error::Rejection;

pub const ALLOWED_ALGORITHMS: &[&str] = &["HS256"];
pub const ALLOWED_LOCATIONS: &[&str] = &["headers", "cookies"];

pub const DEFAULT_HEADER_NAME: &str = "Authorization";
pub const DEFAULT_ACCESS_COOKIE_NAME: &str = "access_token";
pub const DEFAULT_REFRESH_COOKIE_NAME: &str = "refresh_token";

const KNOWN_KEYS: &[&str] = &[
    "ALGORITHM",
    "LOCATION",
    "ACCESS_TOKEN_EXPIRES",
    "REFRESH_TOKEN_EXPIRES",
    "HEADER_NAME",
    "ACCESS_TOKEN_COOKIE_NAME",
    "REFRESH_TOKEN_COOKIE_NAME",
    "JWT_NOT_FOUND_MSG",
    "BEARER_ERROR_MSG",
    "DECODE_ERROR_MSG",
    "EXPIRED_TOKEN_MSG",
    "INVALID_TOKEN_TYPE_MSG",
    "INVALID_NBF_MSG",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("SECRET_KEY was not found in settings")]
    MissingSecretKey,
    #[error("JWT config must be a JSON object")]
    NotAMapping,
    #[error("JWT_CONFIG is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("invalid JWT algorithm {0}; ALGORITHM must be one of [\"HS256\"]")]
    InvalidAlgorithm(String),
    #[error("invalid location {0}; LOCATION must be a non-empty list drawn from [\"headers\", \"cookies\"]")]
    InvalidLocation(String),
    #[error("invalid {0}; expires must be a positive number of seconds or a duration like \"2d\"")]
    InvalidExpires(&'static str),
    #[error("invalid {0}; error messages must be a string or a JSON object")]
    InvalidMessage(&'static str),
    #[error("invalid {0}; expected a non-empty name")]
    InvalidName(&'static str),
    #[error("'{0}' must be a bool")]
    InvalidFlag(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where the guard looks for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenLocation {
    Headers,
    Cookies,
}

impl TokenLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Cookies => "cookies",
        }
    }
}

impl FromStr for TokenLocation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "headers" => Ok(Self::Headers),
            "cookies" => Ok(Self::Cookies),
            other => Err(ConfigError::InvalidLocation(format!("{other:?}"))),
        }
    }
}

impl fmt::Display for TokenLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON payloads returned for each rejection kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMessages {
    pub jwt_not_found: Value,
    pub bearer_error: Value,
    pub decode_error: Value,
    pub expired_token: Value,
    pub invalid_token_type: Value,
    pub invalid_nbf: Value,
}

impl ErrorMessages {
    fn defaults(header_name: &str) -> Self {
        Self {
            jwt_not_found: json!({ "msg": "JWT token not found" }),
            bearer_error: json!({
                "msg": format!(
                    "Missing 'Bearer' type in '{header_name}' header. \
                     Expected '{header_name}: Bearer <JWT>'"
                )
            }),
            decode_error: json!({ "msg": "Signature verification failed." }),
            expired_token: json!({ "msg": "JWT Token has expired" }),
            invalid_token_type: json!({ "msg": "Invalid JWT token type" }),
            invalid_nbf: json!({ "msg": "The token is not yet valid (nbf)" }),
        }
    }

    fn from_settings(map: &Map<String, Value>, header_name: &str) -> Result<Self, ConfigError> {
        let defaults = Self::defaults(header_name);
        Ok(Self {
            jwt_not_found: message(map, "JWT_NOT_FOUND_MSG", defaults.jwt_not_found)?,
            bearer_error: message(map, "BEARER_ERROR_MSG", defaults.bearer_error)?,
            decode_error: message(map, "DECODE_ERROR_MSG", defaults.decode_error)?,
            expired_token: message(map, "EXPIRED_TOKEN_MSG", defaults.expired_token)?,
            invalid_token_type: message(
                map,
                "INVALID_TOKEN_TYPE_MSG",
                defaults.invalid_token_type,
            )?,
            invalid_nbf: message(map, "INVALID_NBF_MSG", defaults.invalid_nbf)?,
        })
    }

    pub fn for_rejection(&self, rejection: Rejection) -> &Value {
        match rejection {
            Rejection::NotFound => &self.jwt_not_found,
            Rejection::BearerFormat => &self.bearer_error,
            Rejection::DecodeError => &self.decode_error,
            Rejection::Expired => &self.expired_token,
            Rejection::WrongType => &self.invalid_token_type,
            Rejection::NotYetValid => &self.invalid_nbf,
        }
    }
}

/// Validated JWT policy. Built once at start-up and never mutated.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    algorithm: Algorithm,
    locations: Vec<TokenLocation>,
    access_token_expires: Duration,
    refresh_token_expires: Duration,
    header_name: String,
    access_token_cookie_name: String,
    refresh_token_cookie_name: String,
    messages: ErrorMessages,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            locations: vec![TokenLocation::Headers, TokenLocation::Cookies],
            access_token_expires: Duration::days(2),
            refresh_token_expires: Duration::days(30),
            header_name: DEFAULT_HEADER_NAME.to_string(),
            access_token_cookie_name: DEFAULT_ACCESS_COOKIE_NAME.to_string(),
            refresh_token_cookie_name: DEFAULT_REFRESH_COOKIE_NAME.to_string(),
            messages: ErrorMessages::defaults(DEFAULT_HEADER_NAME),
        }
    }
}

impl JwtConfig {
    /// Validate a raw settings object (the `JWT_CONFIG` mapping).
    ///
    /// Every key is optional; absent keys fall back to the defaults.
    pub fn from_settings(settings: &Value) -> Result<Self, ConfigError> {
        let map = settings.as_object().ok_or(ConfigError::NotAMapping)?;

        for key in map.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "ignoring unknown JWT config key");
            }
        }

        let defaults = Self::default();

        let header_name = name(map, "HEADER_NAME", &defaults.header_name)?;
        HeaderName::from_bytes(header_name.as_bytes())
            .map_err(|_| ConfigError::InvalidName("HEADER_NAME"))?;

        let messages = ErrorMessages::from_settings(map, &header_name)?;

        Ok(Self {
            algorithm: algorithm(map)?,
            locations: locations(map, &defaults.locations)?,
            access_token_expires: expires(
                map,
                "ACCESS_TOKEN_EXPIRES",
                defaults.access_token_expires,
            )?,
            refresh_token_expires: expires(
                map,
                "REFRESH_TOKEN_EXPIRES",
                defaults.refresh_token_expires,
            )?,
            access_token_cookie_name: name(
                map,
                "ACCESS_TOKEN_COOKIE_NAME",
                &defaults.access_token_cookie_name,
            )?,
            refresh_token_cookie_name: name(
                map,
                "REFRESH_TOKEN_COOKIE_NAME",
                &defaults.refresh_token_cookie_name,
            )?,
            header_name,
            messages,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn locations(&self) -> &[TokenLocation] {
        &self.locations
    }

    pub fn access_token_expires(&self) -> Duration {
        self.access_token_expires
    }

    pub fn refresh_token_expires(&self) -> Duration {
        self.refresh_token_expires
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn access_token_cookie_name(&self) -> &str {
        &self.access_token_cookie_name
    }

    pub fn refresh_token_cookie_name(&self) -> &str {
        &self.refresh_token_cookie_name
    }

    pub fn messages(&self) -> &ErrorMessages {
        &self.messages
    }
}

fn algorithm(map: &Map<String, Value>) -> Result<Algorithm, ConfigError> {
    let Some(raw) = map.get("ALGORITHM") else {
        return Ok(Algorithm::HS256);
    };

    let name = raw
        .as_str()
        .filter(|s| ALLOWED_ALGORITHMS.contains(s))
        .ok_or_else(|| ConfigError::InvalidAlgorithm(raw.to_string()))?;

    Algorithm::from_str(name).map_err(|_| ConfigError::InvalidAlgorithm(raw.to_string()))
}

fn locations(
    map: &Map<String, Value>,
    default: &[TokenLocation],
) -> Result<Vec<TokenLocation>, ConfigError> {
    let Some(raw) = map.get("LOCATION") else {
        return Ok(default.to_vec());
    };

    let items = raw
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or_else(|| ConfigError::InvalidLocation(raw.to_string()))?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let location = item
            .as_str()
            .ok_or_else(|| ConfigError::InvalidLocation(raw.to_string()))?
            .parse::<TokenLocation>()?;
        if !out.contains(&location) {
            out.push(location);
        }
    }
    Ok(out)
}

fn expires(
    map: &Map<String, Value>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let seconds = match map.get(key) {
        None => return Ok(default),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => parse_duration(s),
        Some(_) => None,
    };

    seconds
        .filter(|s| *s > 0)
        .and_then(Duration::try_seconds)
        .ok_or(ConfigError::InvalidExpires(key))
}

/// Parse a duration string like "30s", "15m", "2h", "2d", "1w" into seconds.
fn parse_duration(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() || !s.is_char_boundary(s.len() - 1) {
        return None;
    }

    let (num, unit) = s.split_at(s.len() - 1);
    let num: i64 = num.trim().parse().ok()?;

    let factor = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return None,
    };

    num.checked_mul(factor)
}

fn message(
    map: &Map<String, Value>,
    key: &'static str,
    default: Value,
) -> Result<Value, ConfigError> {
    match map.get(key) {
        None => Ok(default),
        Some(Value::String(s)) => Ok(json!({ "msg": s })),
        Some(obj @ Value::Object(_)) => Ok(obj.clone()),
        Some(_) => Err(ConfigError::InvalidMessage(key)),
    }
}

fn name(map: &Map<String, Value>, key: &'static str, default: &str) -> Result<String, ConfigError> {
    match map.get(key) {
        None => Ok(default.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(_) => Err(ConfigError::InvalidName(key)),
    }
}

/// Process-level configuration read from the environment.
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub secret_key: String,
    pub jwt: JwtConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let secret_key = std::env::var("SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecretKey)?;

        let jwt = match std::env::var("JWT_CONFIG") {
            Ok(raw) if !raw.trim().is_empty() => {
                let settings: Value = serde_json::from_str(&raw)?;
                JwtConfig::from_settings(&settings)?
            }
            _ => JwtConfig::default(),
        };

        Ok(Self {
            addr,
            app_env,
            secret_key,
            jwt,
        })
    }
}
