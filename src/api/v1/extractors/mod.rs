/*
 * Responsibility
 * - v1 handler 用の extractor を束ねる
 */
pub mod auth_ctx;

pub use auth_ctx::{Jwt, JwtIdentity, get_jwt, get_jwt_identity};
