use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::Payload;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

pub mod filename;

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    let pending = state.uploads().pending(state.events()).await?;

    Ok(Payload::new(pending))
}
