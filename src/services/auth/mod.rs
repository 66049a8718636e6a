pub mod claims;
pub mod jwt;
pub mod locator;
pub mod request;

pub use claims::{Claims, TokenType};
pub use jwt::{JwtManager, TokenError, Verification};
pub use request::{AuthRequest, FindRequest};
