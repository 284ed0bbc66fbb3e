use std::ffi::OsStr;

use axum::debug_handler;
use axum::body::Body;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::events::DownloadKind;
use crate::net;
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

pub mod path;

pub(crate) async fn archive(
    state: &ArcShared,
    initiator: &Initiator,
    raw: &str,
) -> error::Result<Response<Body>> {
    let (relative, archive) = state.share().archive(raw).await?;

    let response = net::fs::file_response(
        archive.file,
        net::mime::mime_from_ext(Some(OsStr::new("zip"))),
        Some(&archive.name)
    ).await?;

    state.events().download(initiator.email(), DownloadKind::Folder, &relative.to_string()).await;

    Ok(response)
}

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    archive(&state, &initiator, "").await
}
