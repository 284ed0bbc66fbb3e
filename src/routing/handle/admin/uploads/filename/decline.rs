use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use merkaz_api::Payload;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

use super::PathParams;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(PathParams { filename }): Path<PathParams>,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    state.uploads().decline(state.events(), &filename).await?;

    Ok(Payload::empty()
        .with_message(format!("File \"{filename}\" has been declined and removed.")))
}
