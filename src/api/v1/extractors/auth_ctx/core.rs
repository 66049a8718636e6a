use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use serde_json::Value;

use crate::error::{AuthRejection, Rejection};
use crate::services::auth::{AuthRequest, Claims, JwtManager};

use super::{Jwt, JwtIdentity};

/// Claims attached by the guard; `None` when the handler is not guarded or the
/// guard was optional and no token was sent.
pub fn get_jwt<R: AuthRequest + ?Sized>(request: &R) -> Option<&Claims> {
    request.claims()
}

pub fn get_jwt_identity<R: AuthRequest + ?Sized>(request: &R) -> Option<&Value> {
    get_jwt(request).map(Claims::identity)
}

fn not_found<S>(state: &S) -> AuthRejection
where
    Arc<JwtManager>: FromRef<S>,
{
    let jwt = Arc::<JwtManager>::from_ref(state);
    let body = jwt.config().messages().for_rejection(Rejection::NotFound);
    AuthRejection::new(Rejection::NotFound, body.clone())
}

/// Handler で Jwt を受け取るための extractor
/// middleware が Claims を request.extensions() に insert 済みである前提
/// 見つからない場合は JWT_NOT_FOUND_MSG 付きの 401 を返す（ミドルウェア未設定 / optional）
impl<S> FromRequestParts<S> for Jwt
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match get_jwt(&*parts) {
            Some(claims) => Ok(Jwt(claims.clone())),
            None => Err(not_found(state)),
        }
    }
}

impl<S> OptionalFromRequestParts<S> for Jwt
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(get_jwt(&*parts).cloned().map(Jwt))
    }
}

impl<S> FromRequestParts<S> for JwtIdentity
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match get_jwt_identity(&*parts) {
            Some(identity) => Ok(JwtIdentity(identity.clone())),
            None => Err(not_found(state)),
        }
    }
}

impl<S> OptionalFromRequestParts<S> for JwtIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(get_jwt_identity(&*parts).cloned().map(JwtIdentity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::auth::TokenType;
    use axum::http::Request;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn jwt() -> Arc<JwtManager> {
        let config = JwtConfig::from_settings(&json!({
            "JWT_NOT_FOUND_MSG": "can't find JWT token.",
        }))
        .unwrap();
        Arc::new(JwtManager::new("not very secret in tests", config).unwrap())
    }

    fn claims() -> Claims {
        Claims::new(json!("iml"), TokenType::Access, Duration::minutes(5), Utc::now())
    }

    #[test]
    fn accessors_read_what_the_guard_attached() {
        let mut req = Request::builder().body(()).unwrap();
        assert!(get_jwt(&req).is_none());
        assert!(get_jwt_identity(&req).is_none());

        let claims = claims();
        req.set_claims(claims.clone());

        assert_eq!(get_jwt(&req), Some(&claims));
        assert_eq!(get_jwt_identity(&req), Some(&json!("iml")));
    }

    #[tokio::test]
    async fn extractor_rejects_unauthenticated_parts_with_not_found_payload() {
        let state = jwt();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();

        let result =
            <Jwt as FromRequestParts<Arc<JwtManager>>>::from_request_parts(&mut parts, &state)
                .await;
        let Err(rejection) = result else {
            panic!("unauthenticated parts must be rejected");
        };
        assert_eq!(rejection.kind, Rejection::NotFound);
        assert_eq!(rejection.body, json!({ "msg": "can't find JWT token." }));

        let response = axum::response::IntoResponse::into_response(rejection);
        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);

        let optional =
            <Jwt as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(optional, Ok(None)));
    }

    #[tokio::test]
    async fn identity_extractor_projects_sub() {
        let state = jwt();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.set_claims(claims());

        let JwtIdentity(identity) =
            <JwtIdentity as FromRequestParts<Arc<JwtManager>>>::from_request_parts(
                &mut parts, &state,
            )
            .await
            .unwrap();
        assert_eq!(identity, json!("iml"));
    }
}
