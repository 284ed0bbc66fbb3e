use axum::debug_handler;
use axum::http::StatusCode;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::Payload;

use crate::events::SessionAction;
use crate::net::error;
use crate::sec::authn::session;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    initiator.session.delete(state.auth());

    state.events().session(initiator.email(), SessionAction::Logout).await;

    Ok((
        StatusCode::OK,
        session::expire_session_cookie(state.auth()),
        Payload::empty().with_message("You have been logged out."),
    ))
}
