use axum::debug_handler;
use axum::http::StatusCode;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::Payload;
use merkaz_api::auth::{Login, SessionInfo};
use merkaz_lib::users::{Role, Status};

use crate::events::SessionAction;
use crate::net::error;
use crate::sec::authn::{password, session};
use crate::state::ArcShared;
use crate::user::Registry;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    axum::Json(json): axum::Json<Login>,
) -> error::Result<impl IntoResponse> {
    let email = json.email.trim();

    if let Some(user) = state.users().find(email).await {
        let valid = match password::verify(user.password.clone(), json.password).await {
            Ok(valid) => valid,
            Err(err) => {
                tracing::warn!("failed to verify password for \"{email}\": {err}");

                false
            }
        };

        if valid {
            if user.status == Status::Inactive {
                state.events().session(email, SessionAction::LoginFail).await;

                return Err(error::Error::api((
                    error::AuthKind::AccountInactive,
                    "Your account is inactive. Please contact an administrator."
                )));
            }

            let session = session::Session::create(state.auth(), user.email.clone())?;
            let session_cookie = session::create_session_cookie(state.auth(), &session);

            state.events().session(email, SessionAction::LoginSuccess).await;

            tracing::info!("\"{email}\" logged in");

            return Ok((
                StatusCode::OK,
                session_cookie,
                Payload::new(SessionInfo {
                    email: user.email,
                    is_admin: user.role == Role::Admin,
                })
            ));
        }
    }

    state.events().session(email, SessionAction::LoginFail).await;

    Err(match state.users().registry_of(email).await {
        Some(Registry::Pending) => error::Error::api((
            error::AuthKind::AccountPending,
            "Your account is pending administrator approval."
        )),
        Some(Registry::Denied) => error::Error::api((
            error::AuthKind::AccountDenied,
            "Your registration has been denied."
        )),
        _ => error::Error::api((
            error::AuthKind::InvalidCredentials,
            "Invalid credentials. Please try again or register."
        ))
    })
}
