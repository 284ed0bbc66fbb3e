use std::ffi::OsStr;
use std::collections::HashMap;

use mime::Mime;
use lazy_static::lazy_static;

lazy_static! {
    static ref EXT_MIME_MAP: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // image mime types
        m.insert("jpg", "image/jpeg");
        m.insert("jpeg", "image/jpeg");
        m.insert("png", "image/png");
        m.insert("gif", "image/gif");
        m.insert("svg", "image/svg+xml");
        m.insert("webp","image/webp");
        m.insert("ico", "image/x-icon");

        // text mime types
        m.insert("css", "text/css");
        m.insert("html", "text/html");
        m.insert("txt", "text/plain");
        m.insert("csv", "text/csv");

        // application mime types
        m.insert("js", "application/javascript");
        m.insert("json", "application/json");
        m.insert("pdf", "application/pdf");
        m.insert("zip", "application/zip");
        m.insert("rar", "application/vnd.rar");
        m.insert("7z", "application/x-7z-compressed");
        m.insert("doc", "application/msword");
        m.insert("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document");
        m.insert("xls", "application/vnd.ms-excel");
        m.insert("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet");
        m.insert("ppt", "application/vnd.ms-powerpoint");
        m.insert("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation");
        m
    };
}

pub fn mime_from_ext(ext: Option<&OsStr>) -> Mime {
    let Some(ext) = ext.and_then(|v| v.to_str()) else {
        return mime::APPLICATION_OCTET_STREAM;
    };

    EXT_MIME_MAP.get(ext.to_ascii_lowercase().as_str())
        .and_then(|mime_str| mime_str.parse().ok())
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_and_unknown() {
        assert_eq!(mime_from_ext(Some(OsStr::new("PDF"))).essence_str(), "application/pdf");
        assert_eq!(mime_from_ext(Some(OsStr::new("zip"))).essence_str(), "application/zip");
        assert_eq!(mime_from_ext(Some(OsStr::new("exe"))), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(mime_from_ext(None), mime::APPLICATION_OCTET_STREAM);
    }
}
