use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::Payload;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    let history = state.uploads()
        .history(state.events(), initiator.email())
        .await?;

    Ok(Payload::new(history))
}
