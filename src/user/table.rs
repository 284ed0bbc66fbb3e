use std::io::ErrorKind;
use std::path::Path;

use merkaz_lib::users::{Role, Status};
use serde::{Serialize, Deserialize};

use super::StoreError;

pub const HEADER: [&str; 4] = ["email", "password", "role", "status"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_status")]
    pub status: Status,
}

fn default_status() -> Status {
    Status::Active
}

/// reads a table, a missing file is created with only the header
pub fn load(path: &Path) -> Result<Vec<UserRecord>, StoreError> {
    let mut reader = match csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path) {
        Ok(reader) => reader,
        Err(err) => {
            let missing = matches!(
                err.kind(),
                csv::ErrorKind::Io(io) if io.kind() == ErrorKind::NotFound
            );

            if !missing {
                return Err(err.into());
            }

            std::fs::write(path, serialize(&[])?)?;

            tracing::info!("created user table \"{}\"", path.display());

            return Ok(Vec::new());
        }
    };

    let mut rtn = Vec::new();

    for result in reader.deserialize() {
        match result {
            Ok(record) => rtn.push(record),
            Err(err) => {
                tracing::warn!("skipping malformed user row in \"{}\": {err}", path.display());
            }
        }
    }

    Ok(rtn)
}

pub fn serialize(records: &[UserRecord]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;

    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|err| StoreError::Io(err.into_error()))
}

/// replaces the table by writing a sibling file and renaming it over the
/// original
pub async fn persist(path: &Path, records: &[UserRecord]) -> Result<(), StoreError> {
    let bytes = serialize(records)?;
    let mut tmp_name = path.file_name()
        .map(|v| v.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");

    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await?;

    if let Err(err) = tokio::fs::rename(&tmp_path, path).await {
        if let Err(err) = tokio::fs::remove_file(&tmp_path).await {
            tracing::warn!("failed to remove temp user table \"{}\": {err}", tmp_path.display());
        }

        return Err(err.into());
    }

    Ok(())
}
