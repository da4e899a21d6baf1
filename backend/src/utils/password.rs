use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// One-way password hashing with verification.
///
/// Hashes are opaque PHC strings; callers never inspect them.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;
    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool>;
}

/// Argon2id credential store.
#[derive(Debug, Clone)]
pub struct Argon2Credentials {
    params: Params,
}

impl Default for Argon2Credentials {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2Credentials {
    /// Builds a store with explicit cost parameters (memory in KiB, passes,
    /// lanes). Verification always uses the parameters embedded in the hash.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> anyhow::Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialStore for Argon2Credentials {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String> {
        hash_with(&self.hasher(), plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool> {
        verify_with(&self.hasher(), plaintext, hash)
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    Ok(password_hash.to_string())
}

fn verify_with(argon2: &Argon2<'_>, password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Credentials {
        Argon2Credentials::with_params(8, 1, 1).expect("params")
    }

    #[test]
    fn hash_and_verify_roundtrip() {
        let store = Argon2Credentials::default();
        let pw = "S3cr3t!";
        let hash = store.hash(pw).expect("hash should succeed");
        assert!(store.verify(pw, &hash).unwrap());
        assert!(!store.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn store_hashes_are_salted() {
        let store = cheap();
        let first = store.hash("secret123").unwrap();
        let second = store.hash("secret123").unwrap();
        assert_ne!(first, second);
        assert!(store.verify("secret123", &first).unwrap());
        assert!(store.verify("secret123", &second).unwrap());
        assert!(!store.verify("secret124", &first).unwrap());
    }

    #[test]
    fn verify_accepts_hashes_made_with_other_params() {
        let hash = Argon2Credentials::default().hash("pw").unwrap();
        assert!(cheap().verify("pw", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        assert!(cheap().verify("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn rejects_impossible_params() {
        assert!(Argon2Credentials::with_params(0, 0, 0).is_err());
    }
}
