use axum::debug_handler;
use axum::http::StatusCode;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::{Payload, Validator};
use merkaz_api::auth::Register;

use crate::net::error;
use crate::sec::authn::password;
use crate::state::ArcShared;
use crate::user::StoreError;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    axum::Json(mut json): axum::Json<Register>,
) -> error::Result<impl IntoResponse> {
    json.email = json.email.trim().to_owned();

    if state.users().registry_of(&json.email).await.is_some() {
        return Err(StoreError::AlreadyExists.into());
    }

    json.validate()?;

    let hash = password::hash(json.password).await?;

    state.users().register(&json.email, hash).await?;

    tracing::info!("new registration \"{}\"", json.email);

    state.notifier().new_registration(state.users().admin_emails().await, &json.email);

    Ok((
        StatusCode::CREATED,
        Payload::empty()
            .with_message("Registration successful. Your account is pending administrator approval.")
    ))
}
