use std::str::FromStr;

use axum::debug_handler;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use merkaz_api::Payload;
use serde::Deserialize;

use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::state::ArcShared;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Approve,
    Deny,
    RePend,
    ToggleRole,
    ToggleStatus,
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Action::Approve),
            "deny" => Ok(Action::Deny),
            "re_pend" => Ok(Action::RePend),
            "toggle_role" => Ok(Action::ToggleRole),
            "toggle_status" => Ok(Action::ToggleStatus),
            _ => Err(())
        }
    }
}

#[derive(Deserialize)]
pub struct PathParams {
    email: String,
    action: String,
}

#[debug_handler]
pub async fn post(
    State(state): State<ArcShared>,
    initiator: Initiator,
    Path(PathParams { email, action }): Path<PathParams>,
) -> error::Result<impl IntoResponse> {
    initiator.require_admin()?;

    let Ok(action) = Action::from_str(&action) else {
        return Err(error::Error::api(error::GeneralKind::NotFound));
    };

    let users = state.users();

    let record = match action {
        Action::Approve => {
            let record = users.approve(&email).await?;

            state.notifier().approved(&email);

            record
        }
        Action::Deny => {
            let record = users.deny(&email).await?;

            state.notifier().denied(&email);

            record
        }
        Action::RePend => users.re_pend(&email).await?,
        Action::ToggleRole => {
            if email == initiator.email() {
                return Err(error::Error::api((
                    error::AuthKind::CannotModifySelf,
                    "For security, you cannot change your own admin status."
                )));
            }

            users.toggle_role(&email).await?
        }
        Action::ToggleStatus => {
            if email == initiator.email() {
                return Err(error::Error::api((
                    error::AuthKind::CannotModifySelf,
                    "You cannot change your own status."
                )));
            }

            users.toggle_status(&email).await?
        }
    };

    tracing::info!("\"{}\" applied {action:?} to \"{email}\"", initiator.email());

    Ok(Payload::new(super::view(record)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!("re_pend".parse::<Action>(), Ok(Action::RePend));
        assert_eq!("toggle_status".parse::<Action>(), Ok(Action::ToggleStatus));
        assert!("delete".parse::<Action>().is_err());
    }
}
