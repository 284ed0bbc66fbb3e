use std::cmp::Ordering;
use std::path::Path;

use merkaz_api::share::DirectoryEntry;
use merkaz_lib::fs::is_hidden;

use crate::path;

use super::RelativePath;

/// folders first, then case-insensitive by name with the exact name
/// breaking ties
pub fn entry_order(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    b.is_folder.cmp(&a.is_folder)
        .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        .then_with(|| a.name.cmp(&b.name))
}

/// immediate children of the given directory. a directory that is missing or
/// is not a directory produces an empty list
pub async fn list_dir(dir: &Path, relative: &RelativePath) -> std::io::Result<Vec<DirectoryEntry>> {
    let mut rtn = Vec::new();

    match tokio::fs::metadata(dir).await {
        Ok(meta) => if !meta.is_dir() {
            return Ok(rtn);
        },
        Err(err) => return if path::is_missing(&err) {
            Ok(rtn)
        } else {
            Err(err)
        }
    }

    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(err) => return if path::is_missing(&err) {
            Ok(rtn)
        } else {
            Err(err)
        }
    };

    while let Some(entry) = read_dir.next_entry().await? {
        let file_name = entry.file_name();

        let Some(name) = file_name.to_str() else {
            tracing::debug!("skipping non utf-8 entry in \"{}\"", dir.display());
            continue;
        };

        if is_hidden(name) {
            continue;
        }

        let Some(path) = relative.join(name) else {
            continue;
        };

        // follows symlinks, dangling ones are skipped
        let Ok(meta) = tokio::fs::metadata(entry.path()).await else {
            continue;
        };

        rtn.push(DirectoryEntry {
            name: name.to_owned(),
            is_folder: meta.is_dir(),
            path: path.to_string(),
        });
    }

    rtn.sort_by(entry_order);

    Ok(rtn)
}
