use serde::Deserialize;
use serde_json::Value;

/// Request body for `/login`.
///
/// Sample-only: no credentials are checked, the identity is taken as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Any JSON value the application uses as identity (`sub`).
    #[serde(default = "anonymous")]
    pub identity: Value,
}

fn anonymous() -> Value {
    Value::from("anonymous")
}
