use http::StatusCode;
use axum_core::response::{Response, IntoResponse};
use serde::{Serialize, Deserialize};
use strum::{AsRefStr as StrumAsRefStr};

use crate::response::{serialize_json, error_json};

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum AuthKind {
    PermissionDenied,
    Unauthenticated,

    InvalidCredentials,
    AccountInactive,
    AccountPending,
    AccountDenied,

    InvalidSession,
    SessionNotFound,
    MechanismNotFound,

    CannotModifySelf,
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&AuthKind> for StatusCode {
    fn from(kind: &AuthKind) -> Self {
        match kind {
            AuthKind::PermissionDenied |
            AuthKind::InvalidCredentials |
            AuthKind::AccountInactive |
            AuthKind::AccountPending |
            AuthKind::AccountDenied => StatusCode::FORBIDDEN,
            AuthKind::Unauthenticated |
            AuthKind::InvalidSession |
            AuthKind::SessionNotFound |
            AuthKind::MechanismNotFound => StatusCode::UNAUTHORIZED,
            AuthKind::CannotModifySelf => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum ShareKind {
    PathViolation,
    NotFound,
    ArchiveFailure,
    MoveFailure,
}

impl std::fmt::Display for ShareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&ShareKind> for StatusCode {
    fn from(kind: &ShareKind) -> Self {
        match kind {
            ShareKind::PathViolation => StatusCode::FORBIDDEN,
            ShareKind::NotFound => StatusCode::NOT_FOUND,
            ShareKind::ArchiveFailure |
            ShareKind::MoveFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum UserKind {
    NotFound,
    PendingNotFound,
    DeniedNotFound,
    AlreadyExists,
}

impl std::fmt::Display for UserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&UserKind> for StatusCode {
    fn from(kind: &UserKind) -> Self {
        match kind {
            UserKind::NotFound |
            UserKind::PendingNotFound |
            UserKind::DeniedNotFound => StatusCode::NOT_FOUND,
            UserKind::AlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum UploadKind {
    NotFound,
    InvalidName,
    ExtensionNotAllowed,
    MaxSize,
    AlreadyExists,
}

impl std::fmt::Display for UploadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&UploadKind> for StatusCode {
    fn from(kind: &UploadKind) -> Self {
        match kind {
            UploadKind::NotFound => StatusCode::NOT_FOUND,
            UploadKind::InvalidName |
            UploadKind::ExtensionNotAllowed => StatusCode::BAD_REQUEST,
            UploadKind::MaxSize => StatusCode::PAYLOAD_TOO_LARGE,
            UploadKind::AlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum FeedbackKind {
    CooldownActive,
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&FeedbackKind> for StatusCode {
    fn from(kind: &FeedbackKind) -> Self {
        match kind {
            FeedbackKind::CooldownActive => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum GeneralKind {
    InternalFailure,
    Timeout,

    NotFound,

    NoWork,

    ValidationFailed,
    InvalidData,
    MissingData,

    InvalidUri,
    InvalidHeaderValue,
    InvalidMimeType,
    InvalidMethod,
    InvalidRequest,
}

impl std::fmt::Display for GeneralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&GeneralKind> for StatusCode {
    fn from(kind: &GeneralKind) -> StatusCode {
        match kind {
            GeneralKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
            GeneralKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            GeneralKind::NotFound => StatusCode::NOT_FOUND,
            GeneralKind::NoWork |
            GeneralKind::ValidationFailed |
            GeneralKind::InvalidData |
            GeneralKind::MissingData |
            GeneralKind::InvalidUri |
            GeneralKind::InvalidHeaderValue |
            GeneralKind::InvalidMimeType |
            GeneralKind::InvalidRequest => StatusCode::BAD_REQUEST,
            GeneralKind::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    Serialize, Deserialize
)]
pub enum ApiErrorKind {
    General(GeneralKind),
    Auth(AuthKind),
    Share(ShareKind),
    User(UserKind),
    Upload(UploadKind),
    Feedback(FeedbackKind),
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::General(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Auth(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Share(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::User(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Upload(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Feedback(v) => std::fmt::Display::fmt(v, f),
        }
    }
}

impl From<GeneralKind> for ApiErrorKind {
    fn from(v: GeneralKind) -> Self {
        ApiErrorKind::General(v)
    }
}

impl From<AuthKind> for ApiErrorKind {
    fn from(v: AuthKind) -> Self {
        ApiErrorKind::Auth(v)
    }
}

impl From<ShareKind> for ApiErrorKind {
    fn from(v: ShareKind) -> Self {
        ApiErrorKind::Share(v)
    }
}

impl From<UserKind> for ApiErrorKind {
    fn from(v: UserKind) -> Self {
        ApiErrorKind::User(v)
    }
}

impl From<UploadKind> for ApiErrorKind {
    fn from(v: UploadKind) -> Self {
        ApiErrorKind::Upload(v)
    }
}

impl From<FeedbackKind> for ApiErrorKind {
    fn from(v: FeedbackKind) -> Self {
        ApiErrorKind::Feedback(v)
    }
}

impl From<&ApiErrorKind> for StatusCode {
    fn from(kind: &ApiErrorKind) -> Self {
        match kind {
            ApiErrorKind::General(v) => v.into(),
            ApiErrorKind::Auth(v) => v.into(),
            ApiErrorKind::Share(v) => v.into(),
            ApiErrorKind::User(v) => v.into(),
            ApiErrorKind::Upload(v) => v.into(),
            ApiErrorKind::Feedback(v) => v.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Detail {
    Keys(Vec<String>),
    Wait {
        seconds: u64,
        minutes: u64,
    },
}

impl Detail {
    pub fn with_key(key: impl Into<String>) -> Self {
        Detail::Keys(vec![key.into()])
    }

    pub fn mult_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>
    {
        Detail::Keys(keys.into_iter().map(Into::into).collect())
    }

    pub fn wait(seconds: u64, minutes: u64) -> Self {
        Detail::Wait { seconds, minutes }
    }
}

impl std::fmt::Display for Detail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Keys(list) => {
                let mut iter = list.iter();

                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;

                    while let Some(key) = iter.next() {
                        write!(f, ",{}", key)?;
                    }
                }
            },
            Detail::Wait { seconds, .. } => {
                write!(f, "wait {seconds}s")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    kind: ApiErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<Detail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    msg: Option<String>,
}

impl ApiError {
    pub fn new() -> Self {
        ApiError {
            kind: ApiErrorKind::General(GeneralKind::InternalFailure),
            detail: None,
            msg: None
        }
    }

    pub fn with_kind<K>(mut self, kind: K) -> Self
    where
        K: Into<ApiErrorKind>
    {
        self.kind = kind.into();
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from(&self.kind)
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_ref().map(|v| v.as_str())
    }
}

impl std::default::Default for ApiError {
    fn default() -> Self {
        ApiError::new()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        if let Some(msg) = &self.msg {
            write!(f, ": {}", msg)?;
        }

        Ok(())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match serialize_json(self.status(), &self) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("ApiError serialization error {:?}", err);
                error_json()
            }
        }
    }
}

impl<K> From<K> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from(kind: K) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: None
        }
    }
}

impl<K,M> From<(K, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>,
{
    fn from((kind, msg): (K, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: Some(msg.into())
        }
    }
}

impl<K> From<(K, Detail)> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from((kind, detail): (K, Detail)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: None
        }
    }
}

impl<K,M> From<(K, Detail, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>
{
    fn from((kind, detail, msg): (K, Detail, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: Some(msg.into())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn path_violations_are_forbidden() {
        let err = ApiError::from(ShareKind::PathViolation);

        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(ShareKind::NotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn serialized_shape() {
        let err = ApiError::from((
            UserKind::AlreadyExists,
            Detail::with_key("email"),
            "This email is already registered."
        ));

        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["kind"]["User"], "AlreadyExists");
        assert_eq!(json["detail"]["Keys"][0], "email");
        assert_eq!(json["msg"], "This email is already registered.");
    }

    #[test]
    fn display_joins_parts() {
        let err = ApiError::from((FeedbackKind::CooldownActive, "wait"));

        assert_eq!(err.to_string(), "CooldownActive: wait");
    }
}
