//! Authentication
//!
//! - [`JwtService`] - token issuing and validation
//! - [`CurrentAdmin`] - extractor that gates every mutation handler
//! - [`password`] - Argon2 hashing of admin passwords

pub mod extractor;
pub mod jwt;
pub mod password;

pub use jwt::{Claims, CurrentAdmin, JwtConfig, JwtError, JwtService};
