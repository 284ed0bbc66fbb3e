use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::Payload;
use merkaz_api::users::UserView;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;
use crate::user::{Registry, UserRecord};

pub mod email;

fn view(record: UserRecord) -> UserView {
    UserView {
        email: record.email,
        role: record.role,
        status: record.status,
    }
}

async fn list(
    state: &ArcShared,
    initiator: &Initiator,
    registry: Registry
) -> error::Result<Payload<Vec<UserView>>> {
    initiator.require_admin()?;

    let users = state.users()
        .list(registry)
        .await
        .into_iter()
        .map(view)
        .collect();

    Ok(Payload::new(users))
}

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    list(&state, &initiator, Registry::Authorized).await
}

#[debug_handler]
pub async fn pending(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    list(&state, &initiator, Registry::Pending).await
}

#[debug_handler]
pub async fn denied(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    list(&state, &initiator, Registry::Denied).await
}
