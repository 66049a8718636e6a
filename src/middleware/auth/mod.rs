pub mod access;

pub use access::JwtRequired;
