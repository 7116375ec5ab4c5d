//! Cryptographic logics.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use md5::{Digest, Md5};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::account::{AccountError, CredentialHasher, Result};
use crate::config::{Argon2 as ArgonConfig, PasswordAlgorithm};

const TOKEN_BYTES: usize = 32;
const LEGACY_DIGEST_LENGTH: usize = 32;

/// Build the [`CredentialHasher`] selected by configuration.
pub fn credential_hasher(
    algorithm: PasswordAlgorithm,
    config: Option<ArgonConfig>,
) -> Result<Box<dyn CredentialHasher>> {
    Ok(match algorithm {
        PasswordAlgorithm::Argon2 => Box::new(Argon2Hasher::new(config)?),
        PasswordAlgorithm::Md5 => {
            tracing::warn!(
                "passwords are hashed with unsalted MD5; switch `password.algorithm` to `argon2`"
            );
            Box::new(LegacyMd5Hasher)
        },
    })
}

/// Generate a new bearer token: 32 random bytes, hex encoded.
pub fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Password hasher that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a new [`Argon2Hasher`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| AccountError::OperationFailed(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AccountError::OperationFailed(err.to_string()))?;

        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        // Accounts created before the switch to Argon2 still carry MD5.
        if LegacyMd5Hasher::is_legacy(stored) {
            return LegacyMd5Hasher.verify(password, stored);
        }

        let parsed = PasswordHash::new(stored)
            .map_err(|err| AccountError::OperationFailed(err.to_string()))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AccountError::OperationFailed(err.to_string())),
        }
    }
}

/// Unsalted MD5 digest rendered as uppercase hexadecimal.
///
/// **Not a credential hash.** Only kept to check passwords created by the
/// previous storefront.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyMd5Hasher;

impl LegacyMd5Hasher {
    fn is_legacy(stored: &str) -> bool {
        stored.len() == LEGACY_DIGEST_LENGTH
            && stored
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }
}

impl CredentialHasher for LegacyMd5Hasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(hex::encode_upper(Md5::digest(password.as_bytes())))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        Ok(self.hash(password)?.as_bytes() == stored.as_bytes())
    }
}
