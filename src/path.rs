use std::path::{PathBuf, Path, Component};
use std::fs::Metadata;
use std::io::ErrorKind;

/// the path, or one of its parents, does not exist as a directory
pub fn is_missing(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

pub fn metadata<P>(path: P) -> Result<Option<Metadata>, std::io::Error>
where
    P: AsRef<Path>
{
    match path.as_ref().metadata() {
        Ok(m) => Ok(Some(m)),
        Err(err) => if is_missing(&err) {
            Ok(None)
        } else {
            Err(err)
        }
    }
}

pub fn normalize<P>(path: P) -> PathBuf
where
    P: AsRef<Path>
{
    let components = path.as_ref().components();
    let mut rtn = PathBuf::new();

    for comp in components {
        match comp {
            Component::Prefix(prefix) => {
                rtn.push(prefix.as_os_str());
            }
            Component::ParentDir => {
                rtn.pop();
            }
            Component::Normal(c) => {
                rtn.push(c);
            }
            Component::RootDir => {
                rtn.push(comp.as_os_str());
            }
            Component::CurDir => {}
        }
    }

    rtn
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_below_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.pdf");

        std::fs::write(&file, b"pdf").unwrap();

        assert!(metadata(dir.path().join("missing")).unwrap().is_none());
        assert!(metadata(file.join("sub")).unwrap().is_none());
        assert!(metadata(&file).unwrap().is_some());
    }

    #[test]
    fn normalize_drops_parents() {
        assert_eq!(normalize("/srv/merkaz/../share/./docs"), PathBuf::from("/srv/share/docs"));
    }
}
