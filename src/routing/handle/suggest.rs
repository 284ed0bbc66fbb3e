use axum::debug_handler;
use axum::extract::State;
use axum::response::IntoResponse;
use merkaz_api::{Payload, Validator};
use merkaz_api::feedback::{Suggestion, SuggestionAccepted};

use crate::events;
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    initiator: Initiator,
    axum::Json(json): axum::Json<Suggestion>,
) -> error::Result<impl IntoResponse> {
    json.validate()?;

    let now = events::now();
    let decision = state.feedback().submit(initiator.email(), now);

    if !decision.allowed {
        let minutes = decision.wait_minutes();

        return Err(error::Error::api((
            error::FeedbackKind::CooldownActive,
            error::Detail::wait(decision.wait_seconds, minutes),
            format!("You must wait another {minutes} minute(s) before submitting again.")
        )));
    }

    state.events().suggestion(now, initiator.email(), &json.suggestion).await;

    Ok(Payload::new(SuggestionAccepted {
        cooldown_level: decision.next.level(),
    }).with_message("Thank you, your suggestion has been submitted!"))
}
