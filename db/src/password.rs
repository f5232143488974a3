//! Dashboard password hashing.
//!
//! bcrypt is deliberately slow; async callers should run these on a blocking
//! thread.

pub use bcrypt::BcryptError;

pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash_password_with_cost(password, bcrypt::DEFAULT_COST)
}

/// Lower costs are only meant for tests and fixtures.
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Checks `password` against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
