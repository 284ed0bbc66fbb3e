use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::events::DownloadKind;
use crate::net;
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(path): Path<String>,
) -> error::Result<impl IntoResponse> {
    let (relative, full) = state.share().resolve_download(&path).await?;

    let response = net::fs::download_file(&full).await?;

    state.events().download(initiator.email(), DownloadKind::File, &relative.to_string()).await;

    Ok(response)
}
