use std::borrow::Cow;

use thiserror::Error;

use crate::config::{JwtConfig, TokenLocation};
use crate::services::auth::request::AuthRequest;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Raw value found at a token location, before the bearer prefix is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Carrier<'a> {
    pub value: Cow<'a, str>,
    pub location: TokenLocation,
}

/// A header carrier without the `Bearer ` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("header value is not in 'Bearer <JWT>' format")]
pub struct MalformedCarrier;

/// Look through the configured locations in order; first hit wins.
///
/// Cookies use the refresh-token cookie name when `want_refresh` is set.
pub fn locate<'r, R>(request: &'r R, config: &JwtConfig, want_refresh: bool) -> Option<Carrier<'r>>
where
    R: AuthRequest + ?Sized,
{
    config.locations().iter().find_map(|location| {
        let value = match location {
            TokenLocation::Headers => request.header(config.header_name()),
            TokenLocation::Cookies if want_refresh => {
                request.cookie(config.refresh_token_cookie_name())
            }
            TokenLocation::Cookies => request.cookie(config.access_token_cookie_name()),
        }?;

        Some(Carrier {
            value,
            location: *location,
        })
    })
}

/// Turn a carrier into the raw token string.
pub fn extract<'c>(carrier: &'c Carrier<'_>) -> Result<&'c str, MalformedCarrier> {
    match carrier.location {
        TokenLocation::Headers => carrier
            .value
            .strip_prefix(BEARER_PREFIX)
            .ok_or(MalformedCarrier),
        TokenLocation::Cookies => Ok(&carrier.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde_json::json;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/user");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    fn config(locations: &[&str]) -> JwtConfig {
        JwtConfig::from_settings(&json!({ "LOCATION": locations })).unwrap()
    }

    #[test]
    fn bearer_header_round_trip() {
        let req = request(&[("Authorization", "Bearer X")]);
        let carrier = locate(&req, &JwtConfig::default(), false).expect("carrier");

        assert_eq!(carrier.location, TokenLocation::Headers);
        assert_eq!(extract(&carrier), Ok("X"));
    }

    #[test]
    fn header_without_bearer_prefix_is_malformed() {
        for value in ["X", "bearer X", "BEARER X", "Bearer", "Token X"] {
            let req = request(&[("Authorization", value)]);
            let carrier = locate(&req, &JwtConfig::default(), false).expect("carrier");
            assert_eq!(extract(&carrier), Err(MalformedCarrier), "{value}");
        }
    }

    #[test]
    fn nothing_to_find_is_none() {
        let req = request(&[("X-Other", "Bearer X")]);
        assert!(locate(&req, &JwtConfig::default(), false).is_none());
    }

    #[test]
    fn cookie_is_used_when_header_is_absent() {
        let req = request(&[("Cookie", "access_token=abc.def.ghi")]);
        let carrier = locate(&req, &config(&["headers", "cookies"]), false).expect("carrier");

        assert_eq!(carrier.location, TokenLocation::Cookies);
        assert_eq!(extract(&carrier), Ok("abc.def.ghi"));
    }

    #[test]
    fn refresh_lookup_uses_refresh_cookie() {
        let req = request(&[("Cookie", "access_token=access; refresh_token=refresh")]);
        let cfg = config(&["cookies"]);

        let access = locate(&req, &cfg, false).unwrap();
        let refresh = locate(&req, &cfg, true).unwrap();
        assert_eq!(extract(&access), Ok("access"));
        assert_eq!(extract(&refresh), Ok("refresh"));
    }

    #[test]
    fn configured_order_decides_between_locations() {
        let req = request(&[
            ("Authorization", "Bearer from-header"),
            ("Cookie", "access_token=from-cookie"),
        ]);

        let first = locate(&req, &config(&["cookies", "headers"]), false).unwrap();
        assert_eq!(extract(&first), Ok("from-cookie"));

        let first = locate(&req, &config(&["headers", "cookies"]), false).unwrap();
        assert_eq!(extract(&first), Ok("from-header"));
    }

    #[test]
    fn locations_outside_config_are_ignored() {
        let req = request(&[("Cookie", "access_token=abc")]);
        assert!(locate(&req, &config(&["headers"]), false).is_none());

        let req = request(&[("Authorization", "Bearer abc")]);
        assert!(locate(&req, &config(&["cookies"]), false).is_none());
    }

    #[test]
    fn custom_names_are_honoured() {
        let cfg = JwtConfig::from_settings(&json!({
            "HEADER_NAME": "X-Access-Token",
            "ACCESS_TOKEN_COOKIE_NAME": "sid",
            "LOCATION": ["cookies", "headers"],
        }))
        .unwrap();

        let req = request(&[("x-access-token", "Bearer abc")]);
        assert_eq!(extract(&locate(&req, &cfg, false).unwrap()), Ok("abc"));

        let req = request(&[("Cookie", "sid=xyz")]);
        assert_eq!(extract(&locate(&req, &cfg, false).unwrap()), Ok("xyz"));
    }
}
