/*
 * Responsibility
 * - middleware の公開インターフェース (re-export)
 * - JwtRequired (認証ガード), http (trace / request-id / limit / timeout)
 */
pub mod auth;
pub mod http;
