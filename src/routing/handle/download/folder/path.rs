use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(path): Path<String>,
) -> error::Result<impl IntoResponse> {
    super::archive(&state, &initiator, &path).await
}
