/*
 * Responsibility
 * - POST /login   : identity に対して access / refresh token を発行 (sample)
 * - POST /refresh : refresh token (ガード済み) の identity で token を再発行
 */
use axum::Json;
use axum::extract::State;

use crate::api::v1::dto::{token_request::LoginRequest, token_response::TokenResponse};
use crate::api::v1::extractors::JwtIdentity;
use crate::error::AppError;
use crate::services::auth::JwtManager;
use crate::state::AppState;

fn issue_pair<T>(jwt: &JwtManager, identity: &T) -> Result<TokenResponse, AppError>
where
    T: serde::Serialize + ?Sized,
{
    let access_token = jwt.create_access_token(identity).map_err(|e| {
        tracing::error!(error = %e, "failed to issue access token");
        AppError::Internal
    })?;
    let refresh_token = jwt.create_refresh_token(identity).map_err(|e| {
        tracing::error!(error = %e, "failed to issue refresh token");
        AppError::Internal
    })?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
    })
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(issue_pair(&state.jwt, &req.identity)?))
}

pub async fn refresh(
    State(state): State<AppState>,
    JwtIdentity(identity): JwtIdentity,
) -> Result<Json<TokenResponse>, AppError> {
    Ok(Json(issue_pair(&state.jwt, &identity)?))
}
