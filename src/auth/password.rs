use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;

/// Hashes a plaintext password into an Argon2id PHC string.
pub fn hash(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Returns `Ok(false)` on a mismatch; other errors mean the stored hash is unusable.
pub fn verify(password: &str, stored_hash: &str) -> Result<bool, password_hash::Error> {
    let stored_hash = PasswordHash::new(stored_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &stored_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted() {
        let first = hash("default").unwrap();
        let second = hash("default").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_accepts_only_the_hashed_password() {
        let stored = hash("default").unwrap();
        assert!(verify("default", &stored).unwrap());
        assert!(!verify("Default", &stored).unwrap());
        assert!(!verify("", &stored).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify("default", "not-a-phc-string").is_err());
    }
}
