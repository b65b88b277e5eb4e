use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;

use crate::errors::{Error, Result};

pub fn password_hasher() -> Result<Argon2<'static>> {
    // Argon2id with moderate memory and a single iteration keeps login latency
    // low while retaining side-channel protections.
    const MEMORY_COST_KIB: u32 = 768;
    const ITERATIONS: u32 = 1;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .map_err(|err| Error::internal(format!("Invalid Argon2 parameters: {}", err)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password into a PHC-format digest with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = password_hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| Error::internal(format!("Failed to hash password: {}", err)))?;
    Ok(digest.to_string())
}

/// Check a password against a stored digest.
///
/// A mismatch is `Ok(false)`; only an unparsable digest is an error.
pub fn verify_password(password: &str, digest: &str) -> Result<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|err| Error::internal(format!("Stored password digest is malformed: {}", err)))?;

    match password_hasher()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(Error::internal(format!("Failed to verify password: {}", err))),
    }
}
