//! Inkwell auth primitives
//!
//! Password hashing (Argon2id, PHC strings) and the HS256 bearer token
//! service. Both are plain synchronous functions; callers on the async
//! runtime are expected to push hashing onto the blocking pool.

pub mod password;
pub mod token;

pub use password::{PasswordError, hash_password, verify_password};
pub use token::{DEFAULT_TTL_SECS, TokenError, TokenService};
