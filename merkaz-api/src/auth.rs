use serde::{Serialize, Deserialize};

use crate::{Validator, ApiError, Detail};
use crate::error::GeneralKind;

#[derive(Debug, Serialize, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Register {
    pub email: String,
    pub password: String,
}

impl Validator for Register {
    fn validate(&self) -> Result<(), ApiError> {
        if !merkaz_lib::users::email_valid(&self.email) {
            return Err(ApiError::from((
                GeneralKind::ValidationFailed,
                Detail::with_key("email"),
                "Invalid email address."
            )));
        }

        if let Some(issue) = merkaz_lib::sec::password_issue(&self.password) {
            return Err(ApiError::from((
                GeneralKind::ValidationFailed,
                Detail::mult_keys(["password", issue.key()]),
                issue.to_string()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub email: String,
    pub is_admin: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ApiErrorKind;

    #[test]
    fn register_reports_first_issue() {
        let ok = Register {
            email: "user@example.com".into(),
            password: "Sharper-Snowboard0".into(),
        };

        assert!(ok.validate().is_ok());

        let bad_email = Register {
            email: "not an email".into(),
            password: "Sharper-Snowboard0".into(),
        };
        let err = bad_email.validate().unwrap_err();

        assert_eq!(err.kind(), &ApiErrorKind::General(GeneralKind::ValidationFailed));
        assert_eq!(err.message(), Some("Invalid email address."));

        let weak = Register {
            email: "user@example.com".into(),
            password: "sharper-snowboard0".into(),
        };
        let err = weak.validate().unwrap_err();

        assert_eq!(err.message(), Some("Password must contain an uppercase letter."));
    }
}
