//! access / refresh token 検証 → Claims を request extensions に入れる
//!
//! - `JwtRequired` は `JwtManager` と 2 つのフラグ (optional / refresh) を持つガード
//! - `apply()` で axum の Router に middleware として掛ける
//! - `wrap()` で任意の handler (関数) を包む
//!
//! optional はトークンが「無い」場合だけを許す。形式不正・署名不正などは常に 401。

use std::any::type_name;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ConfigError;
use crate::error::{AuthRejection, GuardError, Rejection};
use crate::services::auth::jwt::{JwtManager, Verification};
use crate::services::auth::locator;
use crate::services::auth::{AuthRequest, FindRequest, TokenType};

#[derive(Debug, Clone)]
pub struct JwtRequired {
    jwt: Arc<JwtManager>,
    optional: bool,
    refresh: bool,
}

impl JwtRequired {
    /// Guard requiring a valid access token.
    pub fn new(jwt: Arc<JwtManager>) -> Self {
        Self {
            jwt,
            optional: false,
            refresh: false,
        }
    }

    /// Build a guard from raw flags (`{"optional": bool, "refresh": bool}`).
    pub fn from_flags(jwt: Arc<JwtManager>, flags: &Value) -> Result<Self, ConfigError> {
        let map = flags.as_object().ok_or(ConfigError::NotAMapping)?;

        let flag = |key: &'static str| match map.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(ConfigError::InvalidFlag(key)),
        };

        Ok(Self::new(jwt)
            .optional(flag("optional")?)
            .refresh(flag("refresh")?))
    }

    /// Let requests without any token through (no claims attached).
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Require a refresh token instead of an access token.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_refresh(&self) -> bool {
        self.refresh
    }

    fn expected_type(&self) -> TokenType {
        if self.refresh {
            TokenType::Refresh
        } else {
            TokenType::Access
        }
    }

    fn reject(&self, kind: Rejection) -> AuthRejection {
        warn!(rejection = %kind, refresh = self.refresh, "jwt authentication failed");
        let body = self.jwt.config().messages().for_rejection(kind).clone();
        AuthRejection::new(kind, body)
    }

    /// Locate, verify and type-check the token of `request`.
    ///
    /// On success the claims are stored in the request (unless the token was
    /// absent and the guard is optional).
    pub fn authenticate(&self, request: &mut dyn AuthRequest) -> Result<(), AuthRejection> {
        let Some(carrier) = locator::locate(&*request, self.jwt.config(), self.refresh) else {
            if self.optional {
                debug!("no jwt found; optional guard lets the request through");
                return Ok(());
            }
            return Err(self.reject(Rejection::NotFound));
        };

        let location = carrier.location;
        let token = locator::extract(&carrier).map_err(|_| self.reject(Rejection::BearerFormat))?;

        let claims = match self.jwt.verify(token) {
            Verification::Valid(claims) => claims,
            Verification::SignatureInvalid => return Err(self.reject(Rejection::DecodeError)),
            Verification::NotYetValid => return Err(self.reject(Rejection::NotYetValid)),
            Verification::Expired => return Err(self.reject(Rejection::Expired)),
        };

        if claims.token_type != self.expected_type() {
            return Err(self.reject(Rejection::WrongType));
        }

        debug!(location = %location, jti = %claims.jti, "jwt authenticated");
        request.set_claims(claims);
        Ok(())
    }

    /// Wrap a handler so it only runs once `authenticate` succeeded.
    ///
    /// The handler result is returned unchanged inside `Ok`.
    pub fn wrap<A, R, F>(
        &self,
        handler: F,
    ) -> impl Fn(A) -> Result<R, GuardError> + use<A, R, F>
    where
        A: FindRequest,
        F: Fn(A) -> R,
    {
        let guard = self.clone();
        move |mut args: A| {
            let Some(request) = args.find_request() else {
                let handler = type_name::<F>();
                error!(handler, "guarded handler was called without a request");
                return Err(GuardError::RequestNotFound { handler });
            };

            guard.authenticate(request)?;
            Ok(handler(args))
        }
    }

    /// Apply the guard to every route of `router`.
    ///
    /// ```ignore
    /// let protected = Router::new().route("/user", get(user));
    /// let protected = JwtRequired::new(jwt.clone()).apply(protected);
    /// ```
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self, jwt_middleware))
    }
}

async fn jwt_middleware(
    State(guard): State<JwtRequired>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthRejection> {
    guard.authenticate(&mut req)?;

    // middleware → extractor への受け渡しは extensions 経由
    Ok(next.run(req).await)
}
