use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::{ZipWriter, CompressionMethod};
use zip::write::FileOptions;

/// name used when the share root itself is archived
pub const ROOT_ARCHIVE_NAME: &str = "share.zip";

const LARGE_FILE_BYTES: u64 = u32::MAX as u64;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("entry \"{0}\" is not inside of the archived folder")]
    OutsideFolder(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// a finished archive spooled to an anonymous temporary file. the file is
/// removed by the os once the handle is dropped
pub struct Archive {
    pub file: tokio::fs::File,
    pub name: String,
}

pub fn archive_name(folder_name: Option<&str>) -> String {
    match folder_name {
        Some(name) => format!("{name}.zip"),
        None => ROOT_ARCHIVE_NAME.to_owned(),
    }
}

fn entry_name(folder: &Path, path: &Path) -> Result<String, ArchiveError> {
    let stripped = path.strip_prefix(folder)
        .map_err(|_| ArchiveError::OutsideFolder(path.to_path_buf()))?;

    let mut name = String::new();

    for comp in stripped.components() {
        if !name.is_empty() {
            name.push('/');
        }

        name.push_str(&comp.as_os_str().to_string_lossy());
    }

    Ok(name)
}

/// writes every regular file under folder into the writer. symlinks are not
/// followed and not archived. directory entries are written so empty
/// folders are kept
pub fn write_archive<W>(folder: &Path, writer: W) -> Result<W, ArchiveError>
where
    W: Write + Seek
{
    let mut zip = ZipWriter::new(writer);
    let dir_options = FileOptions::default();

    for entry in WalkDir::new(folder)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let file_type = entry.file_type();
        let name = entry_name(folder, entry.path())?;

        if file_type.is_dir() {
            zip.add_directory(name, dir_options)?;
        } else if file_type.is_file() {
            let mut file = File::open(entry.path())?;
            let size = file.metadata()?.len();

            let options = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .large_file(size >= LARGE_FILE_BYTES);

            zip.start_file(name, options)?;

            std::io::copy(&mut file, &mut zip)?;
        } else {
            tracing::debug!("skipping non regular entry \"{}\"", entry.path().display());
        }
    }

    Ok(zip.finish()?)
}

/// builds the archive into a temporary file created in tmp and rewinds it
pub fn build(folder: &Path, tmp: &Path) -> Result<File, ArchiveError> {
    let spool = tempfile::tempfile_in(tmp)?;
    let mut file = write_archive(folder, spool)?;

    file.flush()?;
    file.seek(SeekFrom::Start(0))?;

    Ok(file)
}
