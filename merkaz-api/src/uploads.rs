use serde::{Serialize, Deserialize};

use crate::{Validator, ApiError, Detail};
use crate::error::UploadKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    Pending,
    Approved,
    Declined,
}

/// a single row of the caller's upload history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub timestamp: String,
    pub filename: String,
    pub path: String,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingUpload {
    pub timestamp: String,
    pub email: String,
    pub filename: String,
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadQuery {
    pub name: String,
    #[serde(default)]
    pub subpath: Option<String>,
}

impl Validator for UploadQuery {
    fn validate(&self) -> Result<(), ApiError> {
        if !merkaz_lib::fs::basename_valid(&self.name) {
            Err(ApiError::from((
                UploadKind::InvalidName,
                Detail::with_key("name"),
                "Invalid file name."
            )))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Uploaded {
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveUpload {
    pub target_path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Moved {
    pub path: String,
}
