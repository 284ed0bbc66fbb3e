use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf, Component};

use merkaz_lib::fs::is_hidden;

use crate::path;

use super::ShareError;

/// a validated path relative to the share root. every segment is a single
/// plain component that is not hidden
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelativePath {
    segments: Vec<String>,
}

fn plain_segment(segment: &str) -> bool {
    if segment.contains('\0') || is_hidden(segment) {
        return false;
    }

    let mut components = Path::new(segment).components();

    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl RelativePath {
    pub fn root() -> Self {
        RelativePath::default()
    }

    pub fn parse(raw: &str) -> Result<Self, ShareError> {
        let normalized = raw.replace('\\', "/");

        if normalized.starts_with('/') {
            return Err(ShareError::PathViolation);
        }

        let mut segments = Vec::new();

        for segment in normalized.split('/') {
            if segment.is_empty() || segment == "." {
                continue;
            }

            if !plain_segment(segment) {
                return Err(ShareError::PathViolation);
            }

            segments.push(segment.to_owned());
        }

        Ok(RelativePath { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|v| v.as_str())
    }

    pub fn parent(&self) -> Option<RelativePath> {
        if self.segments.is_empty() {
            None
        } else {
            Some(RelativePath {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// appends a name read from the filesystem. the name must already be a
    /// valid segment
    pub fn join(&self, name: &str) -> Option<RelativePath> {
        if !plain_segment(name) {
            return None;
        }

        let mut segments = self.segments.clone();
        segments.push(name.to_owned());

        Some(RelativePath { segments })
    }

    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut rtn = root.to_path_buf();

        for segment in &self.segments {
            rtn.push(segment);
        }

        rtn
    }
}

impl Display for RelativePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut iter = self.segments.iter();

        if let Some(first) = iter.next() {
            f.write_str(first)?;

            for segment in iter {
                write!(f, "/{segment}")?;
            }
        }

        Ok(())
    }
}

/// component wise check so "/share" never admits "/share2"
pub fn confined(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

/// joins the relative path onto root and verifies that the result stays
/// inside of root. the deepest part of the path that exists is canonicalized
/// so a symlink anywhere along the way cannot lead outside, even when the
/// rest of the path is yet to be created
pub async fn resolve(root: &Path, relative: &RelativePath) -> Result<PathBuf, ShareError> {
    let joined = relative.to_path(root);

    if !confined(root, &joined) {
        return Err(ShareError::PathViolation);
    }

    let mut existing = root.to_path_buf();

    for segment in &relative.segments {
        let next = existing.join(segment);

        match tokio::fs::symlink_metadata(&next).await {
            Ok(_) => existing = next,
            Err(err) => if path::is_missing(&err) {
                break;
            } else {
                return Err(err.into());
            }
        }
    }

    if existing.as_path() != root {
        match tokio::fs::canonicalize(&existing).await {
            Ok(canonical) => if !confined(root, &canonical) {
                tracing::warn!("path \"{relative}\" resolves outside of share root");

                return Err(ShareError::PathViolation);
            },
            Err(err) => if path::is_missing(&err) {
                tracing::warn!("path \"{relative}\" passes through a dangling link");

                return Err(ShareError::PathViolation);
            } else {
                return Err(err.into());
            }
        }
    }

    Ok(joined)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_normalizes() {
        let valid = [
            ("", ""),
            ("docs", "docs"),
            ("docs/", "docs"),
            ("docs//reports/./2024", "docs/reports/2024"),
            ("docs\\reports", "docs/reports"),
            ("a b/c.txt", "a b/c.txt"),
        ];

        for (given, expected) in valid {
            let parsed = RelativePath::parse(given)
                .unwrap_or_else(|_| panic!("valid path rejected {:?}", given));

            assert_eq!(parsed.to_string(), expected);
        }
    }

    #[test]
    fn parse_rejects_escapes() {
        let invalid = [
            "..",
            "../etc/passwd",
            "docs/../../etc",
            "docs/..",
            "/etc/passwd",
            "\\etc\\passwd",
            ".hidden",
            "docs/.git/config",
            "null\0byte",
            "docs\\..\\..",
        ];

        for given in invalid {
            assert!(
                matches!(RelativePath::parse(given), Err(ShareError::PathViolation)),
                "invalid path accepted {:?}", given
            );
        }
    }

    #[test]
    fn parent_and_name() {
        let path = RelativePath::parse("docs/reports/q1.pdf").unwrap();

        assert_eq!(path.name(), Some("q1.pdf"));
        assert_eq!(path.parent().unwrap().to_string(), "docs/reports");
        assert_eq!(RelativePath::parse("docs").unwrap().parent(), Some(RelativePath::root()));
        assert_eq!(RelativePath::root().parent(), None);
        assert!(RelativePath::root().join("..").is_none());
        assert!(RelativePath::root().join(".env").is_none());
    }

    #[test]
    fn sibling_prefix_not_confined() {
        assert!(confined(Path::new("/share"), Path::new("/share")));
        assert!(confined(Path::new("/share"), Path::new("/share/docs")));
        assert!(!confined(Path::new("/share"), Path::new("/share2")));
        assert!(!confined(Path::new("/share"), Path::new("/share2/docs")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escape_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let share = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(share.path()).unwrap();

        std::fs::write(outside.path().join("secret.txt"), b"secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();

        let relative = RelativePath::parse("link/secret.txt").unwrap();

        assert!(matches!(
            resolve(&root, &relative).await,
            Err(ShareError::PathViolation)
        ));

        let missing = RelativePath::parse("missing/file.txt").unwrap();

        assert_eq!(resolve(&root, &missing).await.unwrap(), root.join("missing/file.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_escape_rejected_for_new_paths() {
        let outside = tempfile::tempdir().unwrap();
        let share = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(share.path()).unwrap();

        std::fs::create_dir(root.join("docs")).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("link")).unwrap();
        std::os::unix::fs::symlink(root.join("docs"), root.join("inner")).unwrap();
        std::os::unix::fs::symlink(outside.path().join("gone"), root.join("dangling")).unwrap();

        for raw in ["link/evil.txt", "link/new/dir/evil.txt", "dangling/evil.txt", "dangling"] {
            let relative = RelativePath::parse(raw).unwrap();

            assert!(
                matches!(resolve(&root, &relative).await, Err(ShareError::PathViolation)),
                "escape accepted {raw}"
            );
        }

        let inner = RelativePath::parse("inner/new/file.txt").unwrap();

        assert_eq!(resolve(&root, &inner).await.unwrap(), root.join("inner/new/file.txt"));
    }

    #[tokio::test]
    async fn below_file_is_not_an_error() {
        let share = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(share.path()).unwrap();

        std::fs::write(root.join("report.pdf"), b"pdf").unwrap();

        let relative = RelativePath::parse("report.pdf/sub").unwrap();

        assert_eq!(resolve(&root, &relative).await.unwrap(), root.join("report.pdf/sub"));
    }
}
