use serde::{Serialize, Deserialize};

use crate::{Validator, ApiError, Detail};
use crate::error::GeneralKind;

#[derive(Debug, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion: String,
}

impl Validator for Suggestion {
    fn validate(&self) -> Result<(), ApiError> {
        if !merkaz_lib::validation::suggestion_valid(&self.suggestion) {
            Err(ApiError::from((
                GeneralKind::ValidationFailed,
                Detail::with_key("suggestion"),
                "Suggestion cannot be empty."
            )))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionAccepted {
    pub cooldown_level: usize,
}
