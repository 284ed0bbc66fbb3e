mod response;

pub mod error;
pub use error::{ApiError, ApiErrorKind, Detail};

pub mod traits;
pub use traits::Validator;

pub mod auth;
pub mod share;
pub mod uploads;
pub mod users;
pub mod feedback;
pub mod metrics;

mod payload;
pub use payload::Payload;
