use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use merkaz_api::Payload;
use merkaz_api::uploads::{MoveUpload, Moved};

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

use super::PathParams;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(PathParams { filename }): Path<PathParams>,
    axum::Json(json): axum::Json<MoveUpload>,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    if json.target_path.trim().is_empty() {
        return Err(error::Error::api((
            error::GeneralKind::MissingData,
            error::Detail::with_key("target_path"),
            "Target path cannot be empty."
        )));
    }

    let moved = state.uploads()
        .move_to(state.share(), &filename, &json.target_path)
        .await?
        .to_string();

    let message = format!("File \"{filename}\" has been successfully moved to \"{moved}\".");

    Ok(Payload::new(Moved {
        path: moved,
    }).with_message(message))
}
