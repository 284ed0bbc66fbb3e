use std::fs::File;
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::Path;

use rust_xlsxwriter::{Workbook, XlsxError};

/// xlsx rows are limited to this many
const MAX_ROWS: u32 = 1_048_576;

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("log has more rows than a worksheet can hold")]
    TooManyRows,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// copies every row of the csv log, header included, into a single sheet
pub fn write_workbook<W>(csv_path: &Path, sheet: &str, writer: &mut W) -> Result<(), WorkbookError>
where
    W: Write + Seek + Send
{
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.set_name(sheet)?;

    match csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
    {
        Ok(mut reader) => {
            for (index, record) in reader.records().enumerate() {
                let record = record?;
                let row = u32::try_from(index)
                    .ok()
                    .filter(|row| *row < MAX_ROWS)
                    .ok_or(WorkbookError::TooManyRows)?;

                for (col, value) in record.iter().enumerate() {
                    let col = u16::try_from(col)
                        .map_err(|_| WorkbookError::TooManyRows)?;

                    worksheet.write_string(row, col, value)?;
                }
            }
        },
        Err(err) => match err.kind() {
            csv::ErrorKind::Io(io_err) if io_err.kind() == ErrorKind::NotFound => {
                worksheet.write_string(0, 0, "Error")?;
                worksheet.write_string(0, 1, "File Not Found")?;
            },
            _ => return Err(err.into()),
        }
    }

    workbook.save_to_writer(writer)?;

    Ok(())
}

/// builds the workbook into a temporary file created in tmp and rewinds it
pub fn build(csv_path: &Path, sheet: &str, tmp: &Path) -> Result<File, WorkbookError> {
    let mut file = tempfile::tempfile_in(tmp)?;

    write_workbook(csv_path, sheet, &mut file)?;

    file.flush()?;
    file.seek(SeekFrom::Start(0))?;

    Ok(file)
}

#[cfg(test)]
mod test {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    fn archive_text(file: File, name: &str) -> String {
        let mut archive = ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut contents = String::new();

        entry.read_to_string(&mut contents).unwrap();

        contents
    }

    #[test]
    fn rows_copied_into_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("session_log.csv");

        std::fs::write(&csv_path, concat!(
            "timestamp,email,action\n",
            "2024-05-02 09:00:00,a@example.com,LOGIN_SUCCESS\n",
            "2024-05-02 09:05:00,a@example.com,LOGOUT\n",
        )).unwrap();

        let file = build(&csv_path, "Session_Log", dir.path()).unwrap();

        let mut archive = ZipArchive::new(file.try_clone().unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(|v| v.to_owned()).collect();

        assert!(names.iter().any(|v| v == "xl/worksheets/sheet1.xml"));
        assert!(archive.by_name("xl/workbook.xml").is_ok());

        let workbook = archive_text(file.try_clone().unwrap(), "xl/workbook.xml");
        assert!(workbook.contains("name=\"Session_Log\""));

        let strings = archive_text(file.try_clone().unwrap(), "xl/sharedStrings.xml");
        assert!(strings.contains("timestamp"));
        assert!(strings.contains("LOGIN_SUCCESS"));
        assert!(strings.contains("LOGOUT"));

        let sheet = archive_text(file, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("r=\"C3\""));
        assert!(!sheet.contains("r=\"A4\""));
    }

    #[test]
    fn missing_log_reports_error_row() {
        let dir = tempfile::tempdir().unwrap();
        let file = build(&dir.path().join("gone.csv"), "Gone", dir.path()).unwrap();

        let strings = archive_text(file, "xl/sharedStrings.xml");

        assert!(strings.contains("File Not Found"));
    }
}
