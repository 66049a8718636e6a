/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware (JwtRequired) が検証して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - JWT の検証ロジックは middleware/services 側の責務
 * - `Option<Jwt>` で受ければ optional ガード配下でも 401 にならない
 */

use serde_json::Value;

use crate::services::auth::Claims;

/// Verified claims of the current request.
#[derive(Debug, Clone)]
pub struct Jwt(pub Claims);

/// `sub` of the verified claims.
#[derive(Debug, Clone)]
pub struct JwtIdentity(pub Value);
