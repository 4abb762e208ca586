/// Warbler Crypto Library
///
/// One-way password hashing for stored credentials. Hashes are argon2id PHC
/// strings; callers treat them as opaque.
pub mod password;

pub use password::{PasswordError, hash_password, verify_dummy, verify_password};
