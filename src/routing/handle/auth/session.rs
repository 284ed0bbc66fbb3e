use axum::debug_handler;
use axum::response::IntoResponse;
use merkaz_api::Payload;
use merkaz_api::auth::SessionInfo;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler(state = ArcShared)]
pub async fn get(
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    Ok(Payload::new(SessionInfo {
        is_admin: initiator.is_admin(),
        email: initiator.user.email,
    }))
}
