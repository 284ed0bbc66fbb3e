use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio_util::io::ReaderStream;
use axum::http::{StatusCode, HeaderValue};
use axum::http::header::{CONTENT_TYPE, CONTENT_LENGTH, CONTENT_DISPOSITION};
use axum::body::Body;
use axum::response::Response;
use mime::Mime;

use crate::net;
use crate::net::error;

fn attr_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(
        byte,
        b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
    )
}

/// `attachment` disposition carrying an ascii fallback and the utf-8 name
pub fn attachment(name: &str) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
    let mut fallback = String::with_capacity(name.len());
    let mut encoded = String::with_capacity(name.len());

    for ch in name.chars() {
        if ch.is_ascii() && !ch.is_ascii_control() && ch != '"' && ch != '\\' {
            fallback.push(ch);
        } else {
            fallback.push('_');
        }
    }

    for byte in name.bytes() {
        if attr_char(byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    HeaderValue::try_from(format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
}

/// streams an already opened file from its current position
pub async fn file_response(
    file: File,
    mime: Mime,
    download_name: Option<&str>,
) -> error::Result<Response<Body>> {
    let metadata = file.metadata().await?;
    let stream = ReaderStream::new(file);

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::try_from(mime.to_string())?);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(metadata.len()));

    if let Some(name) = download_name {
        headers.insert(CONTENT_DISPOSITION, attachment(name)?);
    }

    Ok(response)
}

pub async fn stream_file<P>(path: P) -> error::Result<Response<Body>>
where
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    let mime = net::mime::mime_from_ext(path_ref.extension());

    let file = OpenOptions::new()
        .read(true)
        .open(path_ref)
        .await?;

    file_response(file, mime, None).await
}

/// streams the file as an attachment named after its final component
pub async fn download_file<P>(path: P) -> error::Result<Response<Body>>
where
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    let mime = net::mime::mime_from_ext(path_ref.extension());
    let name = path_ref.file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("download"));

    let file = OpenOptions::new()
        .read(true)
        .open(path_ref)
        .await?;

    file_response(file, mime, Some(&name)).await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn attachment_encodes_names() {
        let value = attachment("report 2024.pdf").unwrap();

        assert_eq!(
            value,
            "attachment; filename=\"report 2024.pdf\"; filename*=UTF-8''report%202024.pdf"
        );

        let value = attachment("דוח.pdf").unwrap();

        assert_eq!(
            value,
            "attachment; filename=\"___.pdf\"; filename*=UTF-8''%D7%93%D7%95%D7%97.pdf"
        );
    }

    #[tokio::test]
    async fn download_sets_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");

        std::fs::write(&path, b"hello").unwrap();

        let response = download_file(&path).await.unwrap();
        let headers = response.headers();

        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "5");
        assert!(headers.get(CONTENT_DISPOSITION).unwrap()
            .to_str().unwrap()
            .starts_with("attachment; filename=\"notes.txt\""));
    }
}
