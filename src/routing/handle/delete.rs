use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use merkaz_api::Payload;

use crate::events::{self, DownloadKind};
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(path): Path<String>,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    let trashed = state.share().delete(&path, events::now()).await?;

    state.events().download(initiator.email(), DownloadKind::Delete, &trashed.original).await;

    let message = format!("Moved \"{}\" to trash.", trashed.original);

    Ok(Payload::new(trashed).with_message(message))
}
