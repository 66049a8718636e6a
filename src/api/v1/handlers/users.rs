/*
 * Responsibility
 * - GET /user          : access token 必須。identity と claims を返す
 * - GET /user_optional : token があれば同じ内容、無ければ null
 */
use axum::Json;

use crate::api::v1::dto::users::UserResponse;
use crate::api::v1::extractors::Jwt;

pub async fn user(Jwt(claims): Jwt) -> Json<UserResponse> {
    Json(UserResponse::from_claims(Some(claims)))
}

pub async fn user_optional(jwt: Option<Jwt>) -> Json<UserResponse> {
    Json(UserResponse::from_claims(jwt.map(|Jwt(claims)| claims)))
}
