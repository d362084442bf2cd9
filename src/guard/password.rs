//! Argon2id hashing for the admin credential.

use argon2::password_hash::rand_core::OsRng;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, SecretString};

/// Hash a plaintext password into a PHC string suitable for `--admin-password-hash`.
///
/// # Errors
/// Returns an error if Argon2 rejects the input.
pub fn hash_password(password: &SecretString) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.expose_secret().as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check that a string parses as a PHC hash.
///
/// # Errors
/// Returns the parser error when the string is not a PHC hash.
pub fn validate_hash(phc: &str) -> Result<(), argon2::password_hash::Error> {
    PasswordHash::new(phc).map(|_| ())
}

#[must_use]
pub fn verify_password(password: &str, phc: &SecretString) -> bool {
    let Ok(parsed) = PasswordHash::new(phc.expose_secret()) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Low-cost Argon2id hash so unit tests stay fast in debug builds.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_hash(password: &str) -> String {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(1024, 1, 1, None).unwrap();
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() -> Result<(), argon2::password_hash::Error> {
        let phc = hash_password(&SecretString::from("s3cret!"))?;
        assert!(phc.starts_with("$argon2id$"));
        validate_hash(&phc)?;

        let phc = SecretString::from(phc);
        assert!(verify_password("s3cret!", &phc));
        assert!(!verify_password("S3cret!", &phc));
        assert!(!verify_password("", &phc));
        Ok(())
    }

    #[test]
    fn salts_differ() -> Result<(), argon2::password_hash::Error> {
        let password = SecretString::from("same");
        assert_ne!(hash_password(&password)?, hash_password(&password)?);
        Ok(())
    }

    #[test]
    fn verify_uses_params_from_hash() {
        let phc = SecretString::from(test_hash("cheap"));
        assert!(verify_password("cheap", &phc));
        assert!(!verify_password("cheaper", &phc));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(validate_hash("plaintext").is_err());
        assert!(!verify_password("plaintext", &SecretString::from("plaintext")));
    }
}
