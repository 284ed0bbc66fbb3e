use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::Payload;
use merkaz_api::share::Listing;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

pub mod path;

pub(crate) async fn listing(
    state: &ArcShared,
    initiator: &Initiator,
    raw: &str,
) -> error::Result<Payload<Listing>> {
    let listing = state.share().list(raw).await?;

    Ok(Payload::new(Listing {
        current_path: listing.current.to_string(),
        back_path: listing.current.parent().map(|v| v.to_string()),
        items: listing.entries,
        cooldown_level: state.feedback().level(initiator.email()),
        is_admin: initiator.is_admin(),
    }))
}

#[debug_handler]
pub async fn get(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    listing(&state, &initiator, "").await
}
