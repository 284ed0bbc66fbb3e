use std::ffi::OsStr;

use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use crate::events::{self, LogKind, workbook};
use crate::net;
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(kind): Path<String>,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    let Some((kind, metric)) = kind.parse::<LogKind>()
        .ok()
        .and_then(|kind| kind.metric().map(|metric| (kind, metric))) else {
        return Err(error::Error::api(error::GeneralKind::NotFound));
    };

    let Some(name) = kind.download_name(events::now()) else {
        return Err(error::Error::api(error::GeneralKind::NotFound));
    };

    let csv_path = state.events().path(kind);
    let tmp = state.share().tmp().to_path_buf();

    let file = tokio::task::spawn_blocking(move || workbook::build(&csv_path, metric.prefix, &tmp))
        .await
        .map_err(workbook::WorkbookError::from)
        .and_then(|result| result)
        .map_err(|err| error::Error::new()
            .context("failed to export log workbook")
            .source(err))?;

    net::fs::file_response(
        tokio::fs::File::from_std(file),
        net::mime::mime_from_ext(Some(OsStr::new("xlsx"))),
        Some(&name)
    ).await
}
