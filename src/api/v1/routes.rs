/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - ガード (JwtRequired) をどの範囲に掛けるかもここで決める
 *   - /health, /login : なし
 *   - /user           : access token 必須
 *   - /user_optional  : access token 任意
 *   - /refresh        : refresh token 必須
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    health::health,
    token::{login, refresh},
    users::{user, user_optional},
};
use crate::middleware::auth::JwtRequired;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/login", post(login));

    let guarded =
        JwtRequired::new(state.jwt.clone()).apply(Router::new().route("/user", get(user)));

    let anonymous_ok = JwtRequired::new(state.jwt.clone())
        .optional(true)
        .apply(Router::new().route("/user_optional", get(user_optional)));

    let refreshing = JwtRequired::new(state.jwt.clone())
        .refresh(true)
        .apply(Router::new().route("/refresh", post(refresh)));

    public
        .merge(guarded)
        .merge(anonymous_ok)
        .merge(refreshing)
}
