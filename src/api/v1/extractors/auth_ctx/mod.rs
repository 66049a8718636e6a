/*!
 * Authentication context accessors
 *
 * Responsibility:
 * - ガードが request に付けた Claims を handler から読む
 * - 関数 (get_jwt / get_jwt_identity) と axum extractor (Jwt / JwtIdentity) の両方を提供する
 *
 * Public API:
 * - get_jwt, get_jwt_identity
 * - Jwt, JwtIdentity
 */

mod core;
mod types;

pub use core::{get_jwt, get_jwt_identity};
pub use types::{Jwt, JwtIdentity};
