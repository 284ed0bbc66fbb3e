use std::time::Duration;

use crate::config;

use super::authn::session::SessionCache;

pub const SESSION_KEY_CONTEXT: &str = "merkaz 2024-01-01 session cookie keyed hash";

pub struct SessionInfo {
    key: [u8; blake3::KEY_LEN],
    cache: SessionCache,
    secure: bool,
}

impl std::fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInfo")
            .field("key", &"<redacted>")
            .field("cache", &self.cache)
            .field("secure", &self.secure)
            .finish()
    }
}

impl SessionInfo {
    pub fn key(&self) -> &[u8; blake3::KEY_LEN] {
        &self.key
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn secure(&self) -> &bool {
        &self.secure
    }
}

#[derive(Debug)]
pub struct Sec {
    session_info: SessionInfo,
}

impl Sec {
    pub fn new(master_key: &str, secure: bool, idle: Duration) -> Self {
        let cache = SessionCache::builder()
            .name("session_cache")
            .max_capacity(10_000)
            .time_to_idle(idle)
            .build();

        Sec {
            session_info: SessionInfo {
                key: blake3::derive_key(SESSION_KEY_CONTEXT, master_key.as_bytes()),
                cache,
                secure,
            }
        }
    }

    pub fn from_config(config: &config::Config) -> Sec {
        tracing::debug!("creating Sec state");

        let session = &config.settings.sec.session;

        Sec::new(
            &config.settings.master_key,
            session.secure,
            Duration::from_secs(session.idle)
        )
    }

    pub fn session_info(&self) -> &SessionInfo {
        &self.session_info
    }
}
