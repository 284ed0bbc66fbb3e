use std::ops::Deref;
use std::pin::Pin;
use std::future::Future;

use axum::http::header::HeaderMap;
use axum::http::request::Parts;
use axum::extract::FromRequestParts;
use merkaz_lib::users::{Role, Status};

use crate::net::cookie;
use crate::net::error;
use crate::sec::state;
use crate::user::{UserStore, UserRecord};

use super::session;

#[derive(Debug)]
pub struct Initiator {
    pub user: UserRecord,
    pub session: session::Session,
}

impl Initiator {
    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    pub fn require_admin(&self) -> error::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(error::Error::api(error::AuthKind::PermissionDenied))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("session was not found")]
    SessionNotFound,

    #[error("user was not found")]
    UserNotFound(session::Session),

    #[error("user is inactive")]
    UserInactive(session::Session),

    #[error("no authentication mechanism was found")]
    MechanismNotFound,

    #[error(transparent)]
    SessionDecode(#[from] session::DecodeError),

    #[error(transparent)]
    HeaderToStr(#[from] axum::http::header::ToStrError),
}

impl From<LookupError> for error::Error {
    fn from(e: LookupError) -> Self {
        match e {
            LookupError::SessionNotFound => error::Error::api(error::AuthKind::SessionNotFound),
            LookupError::UserNotFound(_session) |
            LookupError::UserInactive(_session) => error::Error::api(error::AuthKind::Unauthenticated),
            LookupError::MechanismNotFound => error::Error::api(error::AuthKind::MechanismNotFound),
            LookupError::SessionDecode(_err) => error::Error::api(error::AuthKind::InvalidSession),
            LookupError::HeaderToStr(e) => e.into(),
        }
    }
}

/// resolves the session to the current user record so role and status
/// changes apply on the next request
pub async fn lookup_session_id<S>(
    auth: &state::Sec,
    users: &UserStore,
    session_id: S
) -> Result<Initiator, LookupError>
where
    S: AsRef<[u8]>
{
    let (token, _hash) = session::decode_base64(auth, session_id)?;

    let Some(session) = session::Session::retrieve_token(auth, &token) else {
        return Err(LookupError::SessionNotFound);
    };

    let Some(user) = users.find(&session.email).await else {
        session.delete(auth);

        return Err(LookupError::UserNotFound(session));
    };

    if user.status == Status::Inactive {
        session.delete(auth);

        return Err(LookupError::UserInactive(session));
    }

    Ok(Initiator {
        user,
        session,
    })
}

pub async fn lookup_header_map(
    auth: &state::Sec,
    users: &UserStore,
    headers: &HeaderMap
) -> Result<Initiator, LookupError> {
    if let Some(found) = cookie::find_cookie(headers, session::SESSION_COOKIE)? {
        return lookup_session_id(auth, users, found.as_bytes()).await;
    }

    Err(LookupError::MechanismNotFound)
}

impl<A, S> FromRequestParts<A> for Initiator
where
    A: Deref<Target = S> + Sync,
    S: AsRef<state::Sec> + AsRef<UserStore> + Sync,
{
    type Rejection = error::Error;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 A,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait
    {
        Box::pin(async move {
            let state_deref = state.deref();

            let auth: &state::Sec = state_deref.as_ref();
            let users: &UserStore = state_deref.as_ref();

            Ok(lookup_header_map(auth, users, &parts.headers).await?)
        })
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use axum::http::HeaderValue;
    use axum::http::header::COOKIE;

    use super::*;

    async fn setup() -> (tempfile::TempDir, state::Sec, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let users = UserStore::load(dir.path().to_path_buf()).unwrap();
        let auth = state::Sec::new("key", false, Duration::from_secs(60));

        users.ensure_admin("admin@example.com", String::from("hash")).await.unwrap();

        (dir, auth, users)
    }

    fn headers(auth: &state::Sec, session: &session::Session) -> HeaderMap {
        let cookie = session::create_session_cookie(auth, session);
        let pair = cookie.to_string()
            .split(';')
            .next()
            .unwrap()
            .to_owned();

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::try_from(pair).unwrap());
        headers
    }

    #[tokio::test]
    async fn current_user_record() {
        let (_dir, auth, users) = setup().await;
        let session = session::Session::create(&auth, String::from("admin@example.com")).unwrap();
        let headers = headers(&auth, &session);

        let initiator = lookup_header_map(&auth, &users, &headers).await.unwrap();

        assert!(initiator.is_admin());

        users.toggle_role("admin@example.com").await.unwrap();

        let initiator = lookup_header_map(&auth, &users, &headers).await.unwrap();

        assert!(!initiator.is_admin());
        assert!(initiator.require_admin().is_err());
    }

    #[tokio::test]
    async fn inactive_or_missing_rejected() {
        let (_dir, auth, users) = setup().await;

        assert!(matches!(
            lookup_header_map(&auth, &users, &HeaderMap::new()).await,
            Err(LookupError::MechanismNotFound)
        ));

        let ghost = session::Session::create(&auth, String::from("ghost@example.com")).unwrap();

        assert!(matches!(
            lookup_header_map(&auth, &users, &headers(&auth, &ghost)).await,
            Err(LookupError::UserNotFound(_))
        ));

        let session = session::Session::create(&auth, String::from("admin@example.com")).unwrap();
        let headers = headers(&auth, &session);

        users.toggle_status("admin@example.com").await.unwrap();

        assert!(matches!(
            lookup_header_map(&auth, &users, &headers).await,
            Err(LookupError::UserInactive(_))
        ));
        assert!(matches!(
            lookup_header_map(&auth, &users, &headers).await,
            Err(LookupError::SessionNotFound)
        ));
    }
}
