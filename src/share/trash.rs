use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::path;

pub const TRASH_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const MAX_NAME_ATTEMPTS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum TrashError {
    #[error("no free name in trash for \"{0}\"")]
    NoFreeName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

async fn exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(err) => if path::is_missing(&err) {
            Ok(false)
        } else {
            Err(err)
        }
    }
}

/// first free `<timestamp>_<name>` or `<timestamp>-<n>_<name>` in trash
pub async fn trash_destination(
    trash: &Path,
    basename: &str,
    now: NaiveDateTime,
) -> Result<(String, PathBuf), TrashError> {
    let stamp = now.format(TRASH_TIMESTAMP_FORMAT).to_string();
    let name = format!("{stamp}_{basename}");
    let dest = trash.join(&name);

    if !exists(&dest).await? {
        return Ok((name, dest));
    }

    for count in 1..=MAX_NAME_ATTEMPTS {
        let name = format!("{stamp}-{count}_{basename}");
        let dest = trash.join(&name);

        if !exists(&dest).await? {
            return Ok((name, dest));
        }
    }

    Err(TrashError::NoFreeName(basename.to_owned()))
}

/// moves the item into trash with a single rename. the item is left in place
/// when the rename fails. callers hold [`super::Share::lock_moves`] so the
/// picked name is still free when the rename happens
pub async fn relocate(
    item: &Path,
    basename: &str,
    trash: &Path,
    now: NaiveDateTime,
) -> Result<String, TrashError> {
    let (name, dest) = trash_destination(trash, basename, now).await?;

    tokio::fs::rename(item, &dest).await?;

    Ok(name)
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
            .and_hms_opt(14, 3, 9).unwrap()
    }

    #[tokio::test]
    async fn moves_with_timestamp() {
        let share = tempfile::tempdir().unwrap();
        let trash = tempfile::tempdir().unwrap();
        let item = share.path().join("report.pdf");

        std::fs::write(&item, b"report contents").unwrap();

        let name = relocate(&item, "report.pdf", trash.path(), now()).await.unwrap();

        assert_eq!(name, "20240502_140309_report.pdf");
        assert!(!item.exists());
        assert_eq!(std::fs::read(trash.path().join(&name)).unwrap(), b"report contents");
    }

    #[tokio::test]
    async fn collisions_get_counter() {
        let trash = tempfile::tempdir().unwrap();

        std::fs::write(trash.path().join("20240502_140309_a.txt"), b"").unwrap();
        std::fs::write(trash.path().join("20240502_140309-1_a.txt"), b"").unwrap();

        let (name, dest) = trash_destination(trash.path(), "a.txt", now()).await.unwrap();

        assert_eq!(name, "20240502_140309-2_a.txt");
        assert_eq!(dest, trash.path().join("20240502_140309-2_a.txt"));
    }

    #[tokio::test]
    async fn failed_rename_leaves_item() {
        let share = tempfile::tempdir().unwrap();
        let item = share.path().join("keep.txt");

        std::fs::write(&item, b"keep").unwrap();

        let missing_trash = share.path().join("no_trash_here");
        let result = relocate(&item, "keep.txt", &missing_trash, now()).await;

        assert!(result.is_err());
        assert!(item.exists());
    }
}
