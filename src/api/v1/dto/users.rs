/*
 * Responsibility
 * - /user 系の response DTO
 */
use serde::Serialize;
use serde_json::Value;

use crate::services::auth::Claims;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// `sub` of the token, `null` when anonymous.
    pub id: Value,
    pub raw_jwt: Option<Claims>,
}

impl UserResponse {
    pub fn from_claims(claims: Option<Claims>) -> Self {
        Self {
            id: claims
                .as_ref()
                .map(|c| c.identity().clone())
                .unwrap_or(Value::Null),
            raw_jwt: claims,
        }
    }
}
