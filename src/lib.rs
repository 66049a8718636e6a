//! Signed session tokens (JWT, HS256) for axum handlers.
//!
//! - `JwtManager` issues access / refresh tokens and verifies them.
//! - `JwtRequired` guards handlers: it finds the token in a header or cookie,
//!   verifies it and stores the `Claims` in the request.
//! - `get_jwt` / `get_jwt_identity` (and the `Jwt` / `JwtIdentity` extractors)
//!   read the claims back inside the handler.
//!
//! ```ignore
//! let jwt = Arc::new(JwtManager::new(&secret, JwtConfig::from_settings(&settings)?)?);
//! let user = JwtRequired::new(jwt.clone()).apply(Router::new().route("/user", get(user)));
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;

pub use api::v1::extractors::{Jwt, JwtIdentity, get_jwt, get_jwt_identity};
pub use config::{ConfigError, JwtConfig, TokenLocation};
pub use error::{AuthRejection, GuardError, Rejection};
pub use middleware::auth::JwtRequired;
pub use services::auth::{
    AuthRequest, Claims, FindRequest, JwtManager, TokenError, TokenType, Verification,
};
