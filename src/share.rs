//! Confined view of the share root.
//!
//! Every operation takes a raw relative path from the request, validates it
//! with [`RelativePath::parse`] and then [`resolve::resolve`] before anything
//! touches the filesystem. Validation failures are always
//! [`ShareError::PathViolation`], [`ShareError::NotFound`] is only reported for
//! paths that passed validation.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use merkaz_api::share::{DirectoryEntry, Trashed};
use tokio::sync::{Mutex, MutexGuard};

use crate::net::error;
use crate::path;

pub mod resolve;
pub mod listing;
pub mod archive;
pub mod trash;

pub use resolve::RelativePath;
pub use archive::{Archive, ArchiveError};
pub use trash::TrashError;

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("path is not confined to the share root")]
    PathViolation,

    #[error("item was not found")]
    NotFound,

    #[error("failed to build archive")]
    ArchiveFailure(#[source] ArchiveError),

    #[error("failed to move item")]
    MoveFailure(#[source] TrashError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ShareError> for error::Error {
    fn from(err: ShareError) -> Self {
        match err {
            ShareError::PathViolation => error::Error::api(error::ShareKind::PathViolation),
            ShareError::NotFound => error::Error::api(error::ShareKind::NotFound),
            ShareError::ArchiveFailure(err) => error::Error::api(error::ShareKind::ArchiveFailure)
                .source(err),
            ShareError::MoveFailure(err) => error::Error::api(error::ShareKind::MoveFailure)
                .source(err),
            ShareError::Io(err) => err.into(),
        }
    }
}

#[derive(Debug)]
pub struct Listing {
    pub current: RelativePath,
    pub entries: Vec<DirectoryEntry>,
}

#[derive(Debug)]
pub struct Share {
    root: PathBuf,
    trash: PathBuf,
    tmp: PathBuf,
    moves: Mutex<()>,
}

impl Share {
    /// all paths are expected to be canonical
    pub fn new(root: PathBuf, trash: PathBuf, tmp: PathBuf) -> Self {
        Share {
            root,
            trash,
            tmp,
            moves: Mutex::new(()),
        }
    }

    /// held while a destination name is picked and the rename happens so
    /// two moves never claim the same name
    pub async fn lock_moves(&self) -> MutexGuard<'_, ()> {
        self.moves.lock().await
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trash(&self) -> &Path {
        &self.trash
    }

    pub fn tmp(&self) -> &Path {
        &self.tmp
    }

    /// parses and resolves the raw path, returning both forms
    pub async fn resolve(&self, raw: &str) -> Result<(RelativePath, PathBuf), ShareError> {
        let relative = RelativePath::parse(raw)?;
        let full = resolve::resolve(&self.root, &relative).await?;

        Ok((relative, full))
    }

    pub async fn list(&self, raw: &str) -> Result<Listing, ShareError> {
        let (current, full) = self.resolve(raw).await?;
        let entries = listing::list_dir(&full, &current).await?;

        Ok(Listing {
            current,
            entries,
        })
    }

    pub async fn resolve_download(&self, raw: &str) -> Result<(RelativePath, PathBuf), ShareError> {
        let (relative, full) = self.resolve(raw).await?;

        match tokio::fs::metadata(&full).await {
            Ok(meta) => if !meta.is_file() {
                return Err(ShareError::NotFound);
            },
            Err(err) => return if path::is_missing(&err) {
                Err(ShareError::NotFound)
            } else {
                Err(err.into())
            }
        }

        Ok((relative, full))
    }

    pub async fn archive(&self, raw: &str) -> Result<(RelativePath, Archive), ShareError> {
        let (relative, full) = self.resolve(raw).await?;

        match tokio::fs::metadata(&full).await {
            Ok(meta) => if !meta.is_dir() {
                return Err(ShareError::NotFound);
            },
            Err(err) => return if path::is_missing(&err) {
                Err(ShareError::NotFound)
            } else {
                Err(err.into())
            }
        }

        let tmp = self.tmp.clone();

        let file = tokio::task::spawn_blocking(move || archive::build(&full, &tmp))
            .await
            .map_err(|err| ShareError::ArchiveFailure(err.into()))?
            .map_err(ShareError::ArchiveFailure)?;

        let name = archive::archive_name(relative.name());

        Ok((relative, Archive {
            file: tokio::fs::File::from_std(file),
            name,
        }))
    }

    pub async fn delete(&self, raw: &str, now: NaiveDateTime) -> Result<Trashed, ShareError> {
        let (relative, full) = self.resolve(raw).await?;

        let Some(basename) = relative.name() else {
            return Err(ShareError::PathViolation);
        };

        let _guard = self.lock_moves().await;

        if let Err(err) = tokio::fs::symlink_metadata(&full).await {
            return if path::is_missing(&err) {
                Err(ShareError::NotFound)
            } else {
                Err(err.into())
            };
        }

        let name = trash::relocate(&full, basename, &self.trash, now)
            .await
            .map_err(ShareError::MoveFailure)?;

        tracing::info!("moved \"{relative}\" to trash as \"{name}\"");

        Ok(Trashed {
            name,
            original: relative.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use tokio::io::AsyncReadExt;

    use super::*;

    struct Scratch {
        _dir: tempfile::TempDir,
        share: Share,
    }

    fn scratch() -> Scratch {
        let dir = tempfile::tempdir().unwrap();
        let base = std::fs::canonicalize(dir.path()).unwrap();

        let root = base.join("share");
        let trash = base.join("trash");
        let tmp = base.join("tmp");

        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&trash).unwrap();
        std::fs::create_dir(&tmp).unwrap();

        Scratch {
            _dir: dir,
            share: Share::new(root, trash, tmp),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
            .and_hms_opt(8, 15, 0).unwrap()
    }

    const ESCAPES: [&str; 5] = [
        "../outside.txt",
        "docs/../../outside.txt",
        "/etc/passwd",
        ".secret",
        "docs/.hidden/file.txt",
    ];

    #[tokio::test]
    async fn escapes_rejected_everywhere() {
        let scratch = scratch();
        let share = &scratch.share;
        let outside = share.root().parent().unwrap().join("outside.txt");

        std::fs::write(&outside, b"outside").unwrap();

        for raw in ESCAPES {
            assert!(matches!(share.list(raw).await, Err(ShareError::PathViolation)), "list {raw}");
            assert!(matches!(share.resolve_download(raw).await, Err(ShareError::PathViolation)), "download {raw}");
            assert!(matches!(share.archive(raw).await, Err(ShareError::PathViolation)), "archive {raw}");
            assert!(matches!(share.delete(raw, now()).await, Err(ShareError::PathViolation)), "delete {raw}");
        }

        assert!(outside.exists());
        assert_eq!(std::fs::read_dir(share.trash()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn listing_order_and_missing() {
        let scratch = scratch();
        let share = &scratch.share;

        std::fs::write(share.root().join("b.txt"), b"b").unwrap();
        std::fs::create_dir(share.root().join("A")).unwrap();
        std::fs::write(share.root().join("a.txt"), b"a").unwrap();

        let listing = share.list("").await.unwrap();
        let names: Vec<&str> = listing.entries.iter().map(|v| v.name.as_str()).collect();

        assert!(listing.current.is_root());
        assert_eq!(names, vec!["A", "a.txt", "b.txt"]);

        let missing = share.list("does/not/exist").await.unwrap();

        assert!(missing.entries.is_empty());
    }

    #[tokio::test]
    async fn download_requires_file() {
        let scratch = scratch();
        let share = &scratch.share;

        std::fs::create_dir(share.root().join("docs")).unwrap();
        std::fs::write(share.root().join("docs/report.pdf"), b"pdf").unwrap();

        let (relative, full) = share.resolve_download("docs/report.pdf").await.unwrap();

        assert_eq!(relative.to_string(), "docs/report.pdf");
        assert_eq!(full, share.root().join("docs/report.pdf"));

        assert!(matches!(share.resolve_download("docs").await, Err(ShareError::NotFound)));
        assert!(matches!(share.resolve_download("docs/missing.pdf").await, Err(ShareError::NotFound)));
    }

    #[tokio::test]
    async fn archive_nested_folder() {
        let scratch = scratch();
        let share = &scratch.share;

        std::fs::create_dir_all(share.root().join("projects/sub")).unwrap();
        std::fs::write(share.root().join("projects/sub/inner.txt"), b"inner").unwrap();

        let (_relative, mut archive) = share.archive("projects").await.unwrap();

        assert_eq!(archive.name, "projects.zip");

        let mut bytes = Vec::new();
        archive.file.read_to_end(&mut bytes).await.unwrap();

        let zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let names: Vec<&str> = zip.file_names().collect();

        assert!(names.contains(&"sub/inner.txt"));
        assert!(names.iter().all(|v| !v.starts_with("projects")));

        let (_relative, root_archive) = share.archive("").await.unwrap();

        assert_eq!(root_archive.name, "share.zip");
        assert!(matches!(share.archive("projects/sub/inner.txt").await, Err(ShareError::NotFound)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletes_keep_every_item() {
        let Scratch { _dir: _scratch_dir, share } = scratch();
        let share = std::sync::Arc::new(share);
        let mut handles = Vec::new();

        for i in 0..8 {
            let dir = share.root().join(format!("d{i}"));

            std::fs::create_dir(&dir).unwrap();
            std::fs::write(dir.join("x.txt"), format!("item {i}")).unwrap();
        }

        for i in 0..8 {
            let share = share.clone();

            handles.push(tokio::spawn(async move {
                share.delete(&format!("d{i}/x.txt"), now()).await
            }));
        }

        let mut names = std::collections::HashSet::new();

        for handle in handles {
            let trashed = handle.await.unwrap().unwrap();

            names.insert(trashed.name);
        }

        assert_eq!(names.len(), 8);
        assert!(names.contains("20240131_081500_x.txt"));

        let mut contents: Vec<String> = std::fs::read_dir(share.trash()).unwrap()
            .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
            .collect();
        contents.sort();

        let expected: Vec<String> = (0..8).map(|i| format!("item {i}")).collect();

        assert_eq!(contents, expected);
    }

    #[tokio::test]
    async fn below_file_is_missing() {
        let scratch = scratch();
        let share = &scratch.share;

        std::fs::write(share.root().join("report.pdf"), b"pdf").unwrap();

        let listing = share.list("report.pdf/sub").await.unwrap();

        assert!(listing.entries.is_empty());
        assert!(matches!(share.resolve_download("report.pdf/sub").await, Err(ShareError::NotFound)));
        assert!(matches!(share.archive("report.pdf/sub").await, Err(ShareError::NotFound)));
        assert!(matches!(share.delete("report.pdf/sub", now()).await, Err(ShareError::NotFound)));
    }

    #[tokio::test]
    async fn delete_moves_to_trash() {
        let scratch = scratch();
        let share = &scratch.share;
        let source = share.root().join("docs/report.pdf");

        std::fs::create_dir(share.root().join("docs")).unwrap();
        std::fs::write(&source, b"quarterly numbers").unwrap();

        let trashed = share.delete("docs/report.pdf", now()).await.unwrap();

        assert_eq!(trashed.name, "20240131_081500_report.pdf");
        assert_eq!(trashed.original, "docs/report.pdf");
        assert!(!source.exists());
        assert_eq!(
            std::fs::read(share.trash().join(&trashed.name)).unwrap(),
            b"quarterly numbers"
        );

        assert!(matches!(share.delete("docs/report.pdf", now()).await, Err(ShareError::NotFound)));
        assert!(matches!(share.delete("", now()).await, Err(ShareError::PathViolation)));
    }
}
