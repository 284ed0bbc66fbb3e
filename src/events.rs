//! Append only csv event logs.
//!
//! Appending never fails the caller, errors are reported through tracing.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{self, Context};

pub mod workbook;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub fn timestamp(now: NaiveDateTime) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKind {
    Session,
    Download,
    Suggestion,
    Upload,
    Declined,
}

impl LogKind {
    pub const ALL: [LogKind; 5] = [
        LogKind::Session,
        LogKind::Download,
        LogKind::Suggestion,
        LogKind::Upload,
        LogKind::Declined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Session => "session",
            LogKind::Download => "download",
            LogKind::Suggestion => "suggestion",
            LogKind::Upload => "upload",
            LogKind::Declined => "declined",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Session => "session_log.csv",
            LogKind::Download => "download_log.csv",
            LogKind::Suggestion => "suggestion_log.csv",
            LogKind::Upload => "upload_log.csv",
            LogKind::Declined => "declined_log.csv",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            LogKind::Session => &["timestamp", "email", "action"],
            LogKind::Download => &["timestamp", "email", "kind", "path"],
            LogKind::Suggestion => &["timestamp", "email", "suggestion"],
            LogKind::Upload => &["timestamp", "email", "filename", "path"],
            LogKind::Declined => &["timestamp", "email", "filename"],
        }
    }
}

/// logs that administrators can download
#[derive(Debug, Clone, Copy)]
pub struct Metric {
    pub title: &'static str,
    pub description: &'static str,
    pub prefix: &'static str,
}

impl LogKind {
    pub const METRICS: [LogKind; 3] = [
        LogKind::Session,
        LogKind::Download,
        LogKind::Suggestion,
    ];

    pub fn metric(&self) -> Option<Metric> {
        match self {
            LogKind::Session => Some(Metric {
                title: "Session Log (Login/Logout)",
                description: "Track user login and failure events.",
                prefix: "Session_Log",
            }),
            LogKind::Download => Some(Metric {
                title: "Download Log (File/Folder/Delete)",
                description: "Track all file, folder, and delete events.",
                prefix: "Download_Log",
            }),
            LogKind::Suggestion => Some(Metric {
                title: "Suggestion Log (User Feedback)",
                description: "Records all user suggestions.",
                prefix: "Suggestion_Log",
            }),
            LogKind::Upload |
            LogKind::Declined => None,
        }
    }

    /// name of the downloaded copy of the log
    pub fn download_name(&self, now: NaiveDateTime) -> Option<String> {
        self.metric()
            .map(|metric| format!("{}_{}.xlsx", metric.prefix, now.format("%Y%m%d_%H%M%S")))
    }
}

impl FromStr for LogKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogKind::ALL.into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    LoginSuccess,
    LoginFail,
    Logout,
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::LoginSuccess => "LOGIN_SUCCESS",
            SessionAction::LoginFail => "LOGIN_FAIL",
            SessionAction::Logout => "LOGOUT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    File,
    Folder,
    Delete,
}

impl DownloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadKind::File => "FILE",
            DownloadKind::Folder => "FOLDER",
            DownloadKind::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadRow {
    pub timestamp: String,
    pub email: String,
    pub filename: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeclinedRow {
    pub timestamp: String,
    pub email: String,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn serialize_record(record: &[&str]) -> Result<Vec<u8>, EventError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(record)?;

    writer.into_inner().map_err(|err| EventError::Io(err.into_error()))
}

#[derive(Debug)]
pub struct EventLog {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl EventLog {
    /// creates any missing log file with its header
    pub fn open(dir: PathBuf) -> error::Result<Self> {
        for kind in LogKind::ALL {
            let path = dir.join(kind.file_name());

            if path.try_exists().context(format!(
                "failed to check for log file \"{}\"", path.display()
            ))? {
                continue;
            }

            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(kind.header())?;
            writer.flush()?;

            tracing::info!("created log file \"{}\"", path.display());
        }

        Ok(EventLog {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self, kind: LogKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn try_append(&self, kind: LogKind, record: &[&str]) -> Result<(), EventError> {
        let bytes = serialize_record(record)?;
        let _guard = self.lock.lock().await;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(kind))
            .await?;

        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(())
    }

    pub async fn append(&self, kind: LogKind, record: &[&str]) {
        if let Err(err) = self.try_append(kind, record).await {
            tracing::error!("failed to append to {} log: {err}", kind.as_str());
        }
    }

    pub async fn session(&self, email: &str, action: SessionAction) {
        let ts = timestamp(now());

        self.append(LogKind::Session, &[&ts, email, action.as_str()]).await
    }

    pub async fn download(&self, email: &str, kind: DownloadKind, path: &str) {
        let ts = timestamp(now());

        self.append(LogKind::Download, &[&ts, email, kind.as_str(), path]).await
    }

    pub async fn suggestion(&self, at: NaiveDateTime, email: &str, suggestion: &str) {
        let ts = timestamp(at);

        self.append(LogKind::Suggestion, &[&ts, email, suggestion]).await
    }

    pub async fn upload(&self, email: &str, filename: &str, path: &str) {
        let ts = timestamp(now());

        self.append(LogKind::Upload, &[&ts, email, filename, path]).await
    }

    pub async fn declined(&self, email: &str, filename: &str) {
        let ts = timestamp(now());

        self.append(LogKind::Declined, &[&ts, email, filename]).await
    }

    /// all rows of the log in file order. rows that cannot be read are
    /// skipped and a missing file is empty
    pub async fn read<T>(&self, kind: LogKind) -> Result<Vec<T>, EventError>
    where
        T: DeserializeOwned
    {
        let bytes = {
            let _guard = self.lock.lock().await;

            match tokio::fs::read(self.path(kind)).await {
                Ok(bytes) => bytes,
                Err(err) => return match err.kind() {
                    ErrorKind::NotFound => Ok(Vec::new()),
                    _ => Err(err.into())
                }
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes.as_slice());
        let mut rtn = Vec::new();

        for result in reader.deserialize() {
            match result {
                Ok(row) => rtn.push(row),
                Err(err) => {
                    tracing::warn!("skipping malformed row in {} log: {err}", kind.as_str());
                }
            }
        }

        Ok(rtn)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn creates_headers_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path().to_path_buf()).unwrap();

        for kind in LogKind::ALL {
            let contents = std::fs::read_to_string(log.path(kind)).unwrap();

            assert_eq!(contents.trim_end(), kind.header().join(","));
        }

        log.download("user@example.com", DownloadKind::Folder, "docs/2024").await;
        log.suggestion(now(), "user@example.com", "more \"quotes\", please").await;

        let contents = std::fs::read_to_string(log.path(LogKind::Download)).unwrap();
        let last = contents.lines().last().unwrap();

        assert!(last.ends_with(",user@example.com,FOLDER,docs/2024"));

        let contents = std::fs::read_to_string(log.path(LogKind::Suggestion)).unwrap();

        assert!(contents.contains("\"more \"\"quotes\"\", please\""));
    }

    #[tokio::test]
    async fn existing_logs_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(LogKind::Session.file_name());

        std::fs::write(&path, "timestamp,email,action\n2024-01-01 00:00:00,a@b.co,LOGOUT\n").unwrap();

        let log = EventLog::open(dir.path().to_path_buf()).unwrap();
        log.session("a@b.co", SessionAction::LoginFail).await;

        let contents = std::fs::read_to_string(path).unwrap();

        assert_eq!(contents.lines().count(), 3);
        assert!(contents.lines().nth(1).unwrap().ends_with("LOGOUT"));
    }

    #[tokio::test]
    async fn reads_typed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::open(dir.path().to_path_buf()).unwrap();

        log.upload("a@b.co", "first.pdf", "").await;
        log.upload("c@d.co", "second.pdf", "docs").await;

        let rows: Vec<UploadRow> = log.read(LogKind::Upload).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].filename, "first.pdf");
        assert_eq!(rows[1].email, "c@d.co");
        assert_eq!(rows[1].path, "docs");
    }

    #[test]
    fn metric_downloads() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 2, 3).unwrap()
            .and_hms_opt(4, 5, 6).unwrap();

        assert_eq!(
            LogKind::Download.download_name(at).unwrap(),
            "Download_Log_20240203_040506.xlsx"
        );
        assert!(LogKind::Upload.download_name(at).is_none());
        assert!(LogKind::METRICS.iter().all(|kind| kind.metric().is_some()));
    }

    #[test]
    fn kinds_from_str() {
        assert_eq!("session".parse::<LogKind>(), Ok(LogKind::Session));
        assert!("unknown".parse::<LogKind>().is_err());
    }
}
