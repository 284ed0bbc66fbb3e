use axum::debug_handler;
use axum::response::IntoResponse;
use merkaz_api::Payload;
use merkaz_api::metrics::LogInfo;

use crate::events::LogKind;
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

pub mod kind;

#[debug_handler(state = ArcShared)]
pub async fn get(
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    let logs: Vec<LogInfo> = LogKind::METRICS.iter()
        .filter_map(|kind| kind.metric().map(|metric| LogInfo {
            kind: kind.as_str().to_owned(),
            name: metric.title.to_owned(),
            description: metric.description.to_owned(),
        }))
        .collect();

    Ok(Payload::new(logs))
}
