use chrono::{DateTime, Utc};
use base64::{Engine, engine::general_purpose::URL_SAFE};

use crate::sec::state;
use crate::net::cookie::{SameSite, SetCookie};

pub mod token;

pub const SESSION_COOKIE: &str = "session_id";

pub type SessionCache = moka::sync::Cache<token::SessionToken, Session>;

#[derive(Debug, Clone)]
pub struct Session {
    pub token: token::SessionToken,
    pub email: String,
    pub issued_on: DateTime<Utc>,
}

impl Session {
    /// creates a new session for the given user and stores it in the cache
    pub fn create(auth: &state::Sec, email: String) -> Result<Session, token::UniqueError> {
        let cache = auth.session_info().cache();
        let token = token::SessionToken::unique(cache, 10)?;

        let session = Session {
            token,
            email,
            issued_on: Utc::now(),
        };

        cache.insert(session.token.clone(), session.clone());

        Ok(session)
    }

    /// retrieving a session resets its idle timer
    pub fn retrieve_token(auth: &state::Sec, token: &token::SessionToken) -> Option<Session> {
        auth.session_info().cache().get(token)
    }

    pub fn delete(&self, auth: &state::Sec) {
        auth.session_info().cache().invalidate(&self.token);
    }
}

pub type Hash = blake3::Hash;

pub fn create_hash<T>(auth: &state::Sec, token: T) -> Hash
where
    T: AsRef<[u8]>
{
    blake3::keyed_hash(auth.session_info().key(), token.as_ref())
}

pub fn encode_base64<T>(token: T, hash: Hash) -> String
where
    T: AsRef<[u8]>
{
    let token_ref = token.as_ref();

    let slice = hash.as_bytes();

    let mut joined = Vec::with_capacity(token_ref.len() + slice.len());
    joined.extend_from_slice(token_ref);
    joined.extend_from_slice(slice);

    URL_SAFE.encode(joined)
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("session id is not valid base64")]
    InvalidString,

    #[error("session id has an invalid length")]
    InvalidLength,

    #[error("session id hash does not match")]
    InvalidHash,
}

pub fn decode_base64<S>(
    auth: &state::Sec,
    session_id: S
) -> Result<(token::SessionToken, Hash), DecodeError>
where
    S: AsRef<[u8]>
{
    let Ok(mut bytes) = URL_SAFE.decode(session_id) else {
        return Err(DecodeError::InvalidString);
    };

    if bytes.len() != token::SESSION_ID_BYTES + blake3::OUT_LEN {
        return Err(DecodeError::InvalidLength);
    };

    let Some(token) = token::SessionToken::drain_vec(&mut bytes) else {
        return Err(DecodeError::InvalidLength);
    };
    let Ok(hash): Result<[u8; blake3::OUT_LEN], _> = bytes.try_into() else {
        return Err(DecodeError::InvalidLength);
    };
    let given = blake3::Hash::from(hash);

    // blake3::Hash equality is constant time
    if given != create_hash(auth, &token) {
        return Err(DecodeError::InvalidHash);
    }

    Ok((token, given))
}

pub fn create_session_cookie(auth: &state::Sec, session: &Session) -> SetCookie {
    let hash = create_hash(auth, &session.token);
    let encoded_token = encode_base64(&session.token, hash);

    SetCookie::new(SESSION_COOKIE, encoded_token)
        .with_path("/")
        .with_http_only(true)
        .with_secure(*auth.session_info().secure())
        .with_same_site(SameSite::Strict)
}

pub fn expire_session_cookie(auth: &state::Sec) -> SetCookie {
    SetCookie::new(SESSION_COOKIE, "")
        .with_max_age(std::time::Duration::new(0, 0))
        .with_path("/")
        .with_http_only(true)
        .with_secure(*auth.session_info().secure())
        .with_same_site(SameSite::Strict)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    fn auth() -> state::Sec {
        state::Sec::new("test master key", true, Duration::from_secs(60))
    }

    #[test]
    fn encode_decode() {
        let auth = auth();
        let token = token::SessionToken::from([7; token::SESSION_ID_BYTES]);
        let hash = create_hash(&auth, &token);

        let encoded = encode_base64(&token, hash);
        let (decoded, decoded_hash) = decode_base64(&auth, &encoded).unwrap();

        assert_eq!(decoded, token);
        assert_eq!(decoded_hash, hash);
    }

    #[test]
    fn tampered_rejected() {
        let auth = auth();
        let token = token::SessionToken::from([7; token::SESSION_ID_BYTES]);

        let other = state::Sec::new("another key", true, Duration::from_secs(60));
        let forged = encode_base64(&token, create_hash(&other, &token));

        assert!(matches!(decode_base64(&auth, &forged), Err(DecodeError::InvalidHash)));
        assert!(matches!(decode_base64(&auth, "not base64!"), Err(DecodeError::InvalidString)));
        assert!(matches!(
            decode_base64(&auth, URL_SAFE.encode([1u8; 10])),
            Err(DecodeError::InvalidLength)
        ));
    }

    #[test]
    fn sessions_cached() {
        let auth = auth();
        let session = Session::create(&auth, String::from("user@example.com")).unwrap();

        let found = Session::retrieve_token(&auth, &session.token).unwrap();

        assert_eq!(found.email, "user@example.com");

        session.delete(&auth);

        assert!(Session::retrieve_token(&auth, &session.token).is_none());
    }

    #[test]
    fn cookie_flags() {
        let auth = auth();
        let session = Session::create(&auth, String::from("user@example.com")).unwrap();
        let cookie = create_session_cookie(&auth, &session).to_string();

        assert!(cookie.starts_with("session_id="));
        assert!(cookie.ends_with("; Path=/; Secure; HttpOnly; SameSite=Strict"));

        assert_eq!(
            expire_session_cookie(&auth).to_string(),
            "session_id=; Max-Age=0; Path=/; Secure; HttpOnly; SameSite=Strict"
        );
    }
}
