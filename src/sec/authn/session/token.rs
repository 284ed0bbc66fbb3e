use rand::RngCore;

use crate::net::error;

use super::SessionCache;

pub const SESSION_ID_BYTES: usize = 48;

#[derive(Debug, thiserror::Error)]
pub enum UniqueError {
    #[error("ran out of token attempts")]
    Attempts,

    #[error(transparent)]
    Rand(#[from] rand::Error),
}

impl From<UniqueError> for error::Error {
    fn from(err: UniqueError) -> error::Error {
        match err {
            UniqueError::Attempts => error::Error::new().source(err),
            UniqueError::Rand(e) => e.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SessionToken([u8; SESSION_ID_BYTES]);

impl SessionToken {
    pub fn drain_vec(vec: &mut Vec<u8>) -> Option<Self> {
        if vec.len() < SESSION_ID_BYTES {
            return None;
        }

        let mut array = [0; SESSION_ID_BYTES];

        for (slot, v) in array.iter_mut().zip(vec.drain(0..SESSION_ID_BYTES)) {
            *slot = v;
        }

        Some(SessionToken(array))
    }

    /// random token that is not currently held by the cache
    pub fn unique(cache: &SessionCache, mut attempts: usize) -> Result<Self, UniqueError> {
        let mut rtn = [0; SESSION_ID_BYTES];

        while attempts > 0 {
            rand::thread_rng().try_fill_bytes(&mut rtn)?;

            let token = SessionToken(rtn);

            if !cache.contains_key(&token) {
                return Ok(token);
            }

            attempts -= 1;
        }

        Err(UniqueError::Attempts)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for SessionToken {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<[u8; SESSION_ID_BYTES]> for SessionToken {
    fn from(bytes: [u8; SESSION_ID_BYTES]) -> Self {
        SessionToken(bytes)
    }
}
