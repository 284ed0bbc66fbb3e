//! Holding area for user uploads waiting on an administrator.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use merkaz_api::uploads::{UploadRecord, UploadStatus, PendingUpload};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::events::{EventLog, EventError, LogKind, UploadRow, DeclinedRow};
use crate::net::error;
use crate::path;
use crate::share::{Share, ShareError, RelativePath};

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid upload name")]
    InvalidName,

    #[error("file extension is not allowed")]
    ExtensionNotAllowed,

    #[error("upload exceeds the maximum size")]
    MaxSize,

    #[error("upload was not found")]
    NotFound,

    #[error("destination already exists")]
    AlreadyExists,

    #[error("failed reading upload body")]
    Body(#[source] BoxDynError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Events(#[from] EventError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for error::Error {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidName => error::Error::api((
                error::UploadKind::InvalidName,
                error::Detail::with_key("name"),
                "Invalid file name."
            )),
            UploadError::ExtensionNotAllowed => error::Error::api((
                error::UploadKind::ExtensionNotAllowed,
                error::Detail::with_key("name"),
                "File type not allowed."
            )),
            UploadError::MaxSize => error::Error::api(error::UploadKind::MaxSize),
            UploadError::NotFound => error::Error::api(error::UploadKind::NotFound),
            UploadError::AlreadyExists => error::Error::api(error::UploadKind::AlreadyExists),
            UploadError::Body(err) => error::Error::api(error::GeneralKind::InvalidRequest)
                .source(err),
            UploadError::Share(err) => err.into(),
            UploadError::Events(err) => error::Error::new().source(err),
            UploadError::Io(err) => err.into(),
        }
    }
}

async fn exists(path: &Path) -> Result<bool, std::io::Error> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(err) => if path::is_missing(&err) {
            Ok(false)
        } else {
            Err(err)
        }
    }
}

async fn stream_to_writer<S, E, W>(
    mut stream: S,
    writer: &mut W,
    max_size: Option<u64>,
) -> Result<u64, UploadError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxDynError>,
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut written: u64 = 0;

    while let Some(result) = stream.next().await {
        let bytes = result.map_err(|err| UploadError::Body(err.into()))?;

        let Some(total) = written.checked_add(bytes.len() as u64) else {
            return Err(UploadError::MaxSize);
        };

        if let Some(max) = max_size {
            if total > max {
                return Err(UploadError::MaxSize);
            }
        }

        writer.write_all(&bytes).await?;

        written = total;
    }

    writer.flush().await?;

    Ok(written)
}

#[derive(Debug)]
pub struct Uploads {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_size: Option<u64>,
}

impl Uploads {
    pub fn new(dir: PathBuf, allowed_extensions: Vec<String>, max_size: Option<u64>) -> Self {
        Uploads {
            dir,
            allowed_extensions,
            max_size,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn pending_path(&self, filename: &str) -> Result<PathBuf, UploadError> {
        if !merkaz_lib::fs::basename_valid(filename) {
            return Err(UploadError::InvalidName);
        }

        Ok(self.dir.join(filename))
    }

    /// writes the body into a hidden partial file that is renamed once the
    /// stream finishes. returns the number of bytes written
    pub async fn save<S, E>(&self, filename: &str, stream: S) -> Result<u64, UploadError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Into<BoxDynError>,
    {
        let path = self.pending_path(filename)?;

        if !merkaz_lib::fs::extension_allowed(filename, &self.allowed_extensions) {
            return Err(UploadError::ExtensionNotAllowed);
        }

        if exists(&path).await? {
            return Err(UploadError::AlreadyExists);
        }

        let partial = self.dir.join(format!(".{filename}.partial"));

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial)
            .await {
            Ok(file) => file,
            Err(err) => return match err.kind() {
                // another upload with the same name is in progress
                ErrorKind::AlreadyExists => Err(UploadError::AlreadyExists),
                _ => Err(err.into())
            }
        };

        let mut writer = BufWriter::new(file);

        let result = match stream_to_writer(stream, &mut writer, self.max_size).await {
            Ok(size) => match exists(&path).await {
                Ok(true) => Err(UploadError::AlreadyExists),
                Ok(false) => tokio::fs::rename(&partial, &path).await
                    .map(|_| size)
                    .map_err(Into::into),
                Err(err) => Err(err.into()),
            },
            Err(err) => Err(err),
        };

        if result.is_err() {
            drop(writer);

            if let Err(err) = tokio::fs::remove_file(&partial).await {
                tracing::warn!("failed to remove partial upload \"{}\": {err}", partial.display());
            }
        }

        result
    }

    /// the given user's uploads, newest first
    pub async fn history(&self, events: &EventLog, email: &str) -> Result<Vec<UploadRecord>, UploadError> {
        let declined: HashSet<String> = events.read::<DeclinedRow>(LogKind::Declined)
            .await?
            .into_iter()
            .filter(|row| row.email == email)
            .map(|row| row.filename)
            .collect();

        let rows: Vec<UploadRow> = events.read(LogKind::Upload).await?;
        let mut rtn = Vec::new();

        for row in rows.into_iter().filter(|row| row.email == email) {
            let status = if declined.contains(&row.filename) {
                UploadStatus::Declined
            } else if merkaz_lib::fs::basename_valid(&row.filename)
                && exists(&self.dir.join(&row.filename)).await? {
                UploadStatus::Pending
            } else {
                UploadStatus::Approved
            };

            rtn.push(UploadRecord {
                timestamp: row.timestamp,
                filename: row.filename,
                path: row.path,
                status,
            });
        }

        rtn.reverse();

        Ok(rtn)
    }

    /// latest log row for each file still waiting in the holding area, in log
    /// order
    pub async fn pending(&self, events: &EventLog) -> Result<Vec<PendingUpload>, UploadError> {
        let rows: Vec<UploadRow> = events.read(LogKind::Upload).await?;
        let mut seen = HashSet::new();
        let mut latest = Vec::new();

        for row in rows.into_iter().rev() {
            if seen.insert(row.filename.clone()) {
                latest.push(row);
            }
        }

        latest.reverse();

        let mut rtn = Vec::with_capacity(latest.len());

        for row in latest {
            if !merkaz_lib::fs::basename_valid(&row.filename) {
                continue;
            }

            if exists(&self.dir.join(&row.filename)).await? {
                rtn.push(PendingUpload {
                    timestamp: row.timestamp,
                    email: row.email,
                    filename: row.filename,
                    path: row.path,
                });
            }
        }

        Ok(rtn)
    }

    /// email of the most recent uploader of the given file
    pub async fn uploader(&self, events: &EventLog, filename: &str) -> Result<Option<String>, UploadError> {
        let rows: Vec<UploadRow> = events.read(LogKind::Upload).await?;

        Ok(rows.into_iter()
            .rev()
            .find(|row| row.filename == filename)
            .map(|row| row.email))
    }

    /// moves a pending file into the share. when the target is an existing
    /// folder the file keeps its name inside of it, otherwise the target is
    /// the full destination
    pub async fn move_to(
        &self,
        share: &Share,
        filename: &str,
        target: &str,
    ) -> Result<RelativePath, UploadError> {
        let source = self.pending_path(filename)?;
        let (mut relative, mut destination) = share.resolve(target).await?;

        let _guard = share.lock_moves().await;

        if !exists(&source).await? {
            return Err(UploadError::NotFound);
        }

        let is_dir = match tokio::fs::metadata(&destination).await {
            Ok(meta) => meta.is_dir(),
            Err(err) => if path::is_missing(&err) {
                false
            } else {
                return Err(err.into());
            }
        };

        if is_dir {
            relative = relative.join(filename)
                .ok_or(UploadError::InvalidName)?;
            destination = crate::share::resolve::resolve(share.root(), &relative).await?;
        } else if relative.is_root() {
            return Err(ShareError::PathViolation.into());
        }

        if exists(&destination).await? {
            return Err(UploadError::AlreadyExists);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::rename(&source, &destination).await?;

        tracing::info!("moved upload \"{filename}\" to \"{relative}\"");

        Ok(relative)
    }

    /// records the decline and removes the pending file
    pub async fn decline(&self, events: &EventLog, filename: &str) -> Result<String, UploadError> {
        let path = self.pending_path(filename)?;

        if !exists(&path).await? {
            return Err(UploadError::NotFound);
        }

        let email = self.uploader(events, filename)
            .await?
            .unwrap_or_else(|| String::from("unknown"));

        events.declined(&email, filename).await;

        tokio::fs::remove_file(&path).await?;

        tracing::info!("declined upload \"{filename}\" from \"{email}\"");

        Ok(email)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Scratch {
        _dir: tempfile::TempDir,
        share: Share,
        uploads: Uploads,
        events: EventLog,
    }

    fn scratch(max_size: Option<u64>) -> Scratch {
        let dir = tempfile::tempdir().unwrap();
        let base = std::fs::canonicalize(dir.path()).unwrap();

        for name in ["share", "trash", "tmp", "uploads", "logs"] {
            std::fs::create_dir(base.join(name)).unwrap();
        }

        Scratch {
            share: Share::new(base.join("share"), base.join("trash"), base.join("tmp")),
            uploads: Uploads::new(
                base.join("uploads"),
                vec![String::from("pdf"), String::from("txt")],
                max_size
            ),
            events: EventLog::open(base.join("logs")).unwrap(),
            _dir: dir,
        }
    }

    fn body(chunks: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        futures::stream::iter(
            chunks.iter()
                .map(|v| Ok(Bytes::from_static(*v)))
                .collect::<Vec<_>>()
        )
    }

    #[tokio::test]
    async fn save_checks_name_and_size() {
        let scratch = scratch(Some(8));
        let uploads = &scratch.uploads;

        let size = uploads.save("notes.txt", body(&[b"abc", b"def"])).await.unwrap();

        assert_eq!(size, 6);
        assert_eq!(std::fs::read(uploads.dir().join("notes.txt")).unwrap(), b"abcdef");

        assert!(matches!(
            uploads.save("notes.txt", body(&[b"x"])).await,
            Err(UploadError::AlreadyExists)
        ));
        assert!(matches!(
            uploads.save("script.sh", body(&[b"x"])).await,
            Err(UploadError::ExtensionNotAllowed)
        ));
        assert!(matches!(
            uploads.save("../escape.txt", body(&[b"x"])).await,
            Err(UploadError::InvalidName)
        ));
        assert!(matches!(
            uploads.save("big.pdf", body(&[b"12345", b"67890"])).await,
            Err(UploadError::MaxSize)
        ));

        let names: Vec<_> = std::fs::read_dir(uploads.dir()).unwrap()
            .map(|v| v.unwrap().file_name())
            .collect();

        assert_eq!(names, vec![std::ffi::OsString::from("notes.txt")]);
    }

    #[tokio::test]
    async fn history_statuses() {
        let scratch = scratch(None);
        let uploads = &scratch.uploads;
        let events = &scratch.events;

        for name in ["a.pdf", "b.pdf", "c.pdf"] {
            uploads.save(name, body(&[b"data"])).await.unwrap();
            events.upload("user@example.com", name, "").await;
        }

        events.upload("other@example.com", "d.pdf", "").await;

        uploads.move_to(&scratch.share, "a.pdf", "a.pdf").await.unwrap();
        uploads.decline(events, "b.pdf").await.unwrap();

        let history = uploads.history(events, "user@example.com").await.unwrap();
        let view: Vec<(&str, UploadStatus)> = history.iter()
            .map(|v| (v.filename.as_str(), v.status))
            .collect();

        assert_eq!(view, vec![
            ("c.pdf", UploadStatus::Pending),
            ("b.pdf", UploadStatus::Declined),
            ("a.pdf", UploadStatus::Approved),
        ]);
    }

    #[tokio::test]
    async fn pending_latest_existing() {
        let scratch = scratch(None);
        let uploads = &scratch.uploads;
        let events = &scratch.events;

        uploads.save("report.pdf", body(&[b"v1"])).await.unwrap();
        events.upload("first@example.com", "report.pdf", "").await;
        events.upload("second@example.com", "report.pdf", "docs").await;
        events.upload("gone@example.com", "gone.pdf", "").await;

        let pending = uploads.pending(events).await.unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "second@example.com");
        assert_eq!(pending[0].path, "docs");

        let email = uploads.decline(events, "report.pdf").await.unwrap();

        assert_eq!(email, "second@example.com");
        assert!(uploads.pending(events).await.unwrap().is_empty());
        assert!(matches!(
            uploads.decline(events, "report.pdf").await,
            Err(UploadError::NotFound)
        ));
    }

    #[tokio::test]
    async fn move_into_folder_or_path() {
        let scratch = scratch(None);
        let uploads = &scratch.uploads;
        let share = &scratch.share;

        std::fs::create_dir(share.root().join("docs")).unwrap();

        uploads.save("a.pdf", body(&[b"a"])).await.unwrap();
        uploads.save("b.pdf", body(&[b"b"])).await.unwrap();
        uploads.save("c.pdf", body(&[b"c"])).await.unwrap();

        let moved = uploads.move_to(share, "a.pdf", "docs").await.unwrap();

        assert_eq!(moved.to_string(), "docs/a.pdf");
        assert_eq!(std::fs::read(share.root().join("docs/a.pdf")).unwrap(), b"a");

        let moved = uploads.move_to(share, "b.pdf", "new/deeper/renamed.pdf").await.unwrap();

        assert_eq!(moved.to_string(), "new/deeper/renamed.pdf");
        assert!(share.root().join("new/deeper/renamed.pdf").is_file());

        std::fs::write(share.root().join("taken.pdf"), b"taken").unwrap();

        assert!(matches!(
            uploads.move_to(share, "c.pdf", "taken.pdf").await,
            Err(UploadError::AlreadyExists)
        ));
        assert!(matches!(
            uploads.move_to(share, "c.pdf", "../outside.pdf").await,
            Err(UploadError::Share(ShareError::PathViolation))
        ));
        assert!(matches!(
            uploads.move_to(share, "missing.pdf", "docs").await,
            Err(UploadError::NotFound)
        ));
        assert!(uploads.dir().join("c.pdf").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn move_through_symlink_rejected() {
        let scratch = scratch(None);
        let uploads = &scratch.uploads;
        let share = &scratch.share;
        let outside = share.root().parent().unwrap().join("outside");

        std::fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, share.root().join("link")).unwrap();

        uploads.save("evil.txt", body(&[b"evil"])).await.unwrap();

        for target in ["link/evil.txt", "link/nested/evil.txt", "link"] {
            assert!(matches!(
                uploads.move_to(share, "evil.txt", target).await,
                Err(UploadError::Share(ShareError::PathViolation))
            ), "moved through {target}");
        }

        assert_eq!(std::fs::read_dir(&outside).unwrap().count(), 0);
        assert!(uploads.dir().join("evil.txt").exists());
    }

    #[tokio::test]
    async fn concurrent_moves_never_overwrite() {
        let scratch = scratch(None);
        let uploads = &scratch.uploads;
        let share = &scratch.share;

        uploads.save("a.pdf", body(&[b"a"])).await.unwrap();
        uploads.save("b.pdf", body(&[b"b"])).await.unwrap();

        let (first, second) = tokio::join!(
            uploads.move_to(share, "a.pdf", "same.pdf"),
            uploads.move_to(share, "b.pdf", "same.pdf"),
        );

        let results = [first, second];
        let moved = results.iter().filter(|v| v.is_ok()).count();
        let refused = results.iter()
            .filter(|v| matches!(v, Err(UploadError::AlreadyExists)))
            .count();

        assert_eq!(moved, 1);
        assert_eq!(refused, 1);

        let kept = std::fs::read(share.root().join("same.pdf")).unwrap();
        let left = if kept == b"a" { "b.pdf" } else { "a.pdf" };

        assert!(uploads.dir().join(left).exists());
    }
}
