use axum::debug_handler;
use axum::body::Body;
use axum::http::StatusCode;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use merkaz_api::{Payload, Validator};
use merkaz_api::uploads::{UploadQuery, Uploaded};

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::share::RelativePath;
use crate::state::ArcShared;

pub mod mine;

#[debug_handler]
pub async fn put(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Query(query): Query<UploadQuery>,
    stream: Body,
) -> error::Result<impl IntoResponse> {
    query.validate()?;

    let subpath = match query.subpath.as_deref() {
        Some(raw) => RelativePath::parse(raw)?.to_string(),
        None => String::new(),
    };

    let size = state.uploads().save(&query.name, stream.into_data_stream()).await?;

    state.events().upload(initiator.email(), &query.name, &subpath).await;

    tracing::info!("\"{}\" uploaded \"{}\" ({size} bytes)", initiator.email(), query.name);

    let message = format!(
        "File \"{}\" successfully uploaded and is pending review.",
        query.name
    );

    Ok((
        StatusCode::CREATED,
        Payload::new(Uploaded {
            filename: query.name,
            size,
        }).with_message(message)
    ))
}
