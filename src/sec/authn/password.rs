use argon2::Variant;
use rand::RngCore;

use crate::net::error::Error as NetError;

pub const SALT_LEN: usize = 32;

pub type Salt = [u8; SALT_LEN];

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error(transparent)]
    Rand(#[from] rand::Error),

    #[error(transparent)]
    Argon2(#[from] argon2::Error),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

impl From<PasswordError> for NetError {
    fn from(err: PasswordError) -> Self {
        NetError::new().source(err)
    }
}

pub fn gen_salt() -> Result<Salt, rand::Error> {
    let mut salt = [0u8; SALT_LEN];

    rand::thread_rng().try_fill_bytes(&mut salt)?;

    Ok(salt)
}

pub fn gen_hash(password: &str, salt: &[u8]) -> Result<String, argon2::Error> {
    let mut config = argon2::Config::default();
    config.mem_cost = 19456;
    config.variant = Variant::Argon2id;

    argon2::hash_encoded(
        password.as_bytes(),
        salt,
        &config
    )
}

/// hashes the password with a fresh salt on the blocking pool
pub async fn hash(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || {
        let salt = gen_salt()?;

        Ok::<_, PasswordError>(gen_hash(&password, &salt)?)
    }).await?
}

/// checks the given password against an encoded hash on the blocking pool
pub async fn verify(encoded: String, given: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || {
        Ok::<_, PasswordError>(argon2::verify_encoded(&encoded, given.as_bytes())?)
    }).await?
}
