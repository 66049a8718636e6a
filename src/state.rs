/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc で cheap clone)
 */
use std::sync::Arc;

use axum::extract::FromRef;

use crate::services::auth::JwtManager;

#[derive(Clone, Debug)]
pub struct AppState {
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(jwt: Arc<JwtManager>) -> Self {
        Self { jwt }
    }
}

// extractor (Jwt / JwtIdentity) が JWT_NOT_FOUND_MSG を引くため
impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
