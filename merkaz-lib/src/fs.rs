pub const MAX_BASENAME_CHARS: usize = 255;
pub const MIN_BASENAME_CHARS: usize = 1;

pub const HIDDEN_MARKER: char = '.';

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 15] = [
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "zip", "rar", "7z",
    "doc", "docx", "xls", "xlsx", "ppt", "pptx",
];

fn valid_pathname_char(ch: &char) -> bool {
    (match ch {
        '/' | '\\' => false,
        _ => true
    }) && !ch.is_control()
}

fn valid_pathname(given: &str, min_chars: usize, max_chars: usize) -> bool {
    let mut count = 0;
    let mut iter = given.chars();

    if let Some(ch) = iter.next() {
        if ch.is_whitespace() || !valid_pathname_char(&ch) {
            return false;
        }

        count += 1;
    }

    if let Some(ch) = iter.next_back() {
        if ch.is_whitespace() || !valid_pathname_char(&ch) {
            return false;
        }

        count += 1;
    }

    for ch in iter {
        if !valid_pathname_char(&ch) {
            return false;
        }

        count += 1;

        if count > max_chars {
            return false;
        }
    }

    count >= min_chars && count <= max_chars
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

/// a single path segment that can be stored as is. no separators, no
/// control characters and nothing that starts with the hidden marker
/// (which also rules out "." and "..")
pub fn basename_valid(given: &str) -> bool {
    !is_hidden(given) && valid_pathname(given, MIN_BASENAME_CHARS, MAX_BASENAME_CHARS)
}

/// lowercase extension of the given name, if it has one
pub fn extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;

    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

pub fn extension_allowed<I, S>(name: &str, allowed: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Some(ext) = extension(name) else {
        return false;
    };

    allowed.into_iter().any(|check| check.as_ref().eq_ignore_ascii_case(&ext))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basename_validation() {
        let valid = [
            "file_name.txt",
            "a",
            "report 2024.pdf",
        ];

        for test in valid {
            assert!(basename_valid(&test), "valid string failed {:?}", test);
        }

        let max_len = crate::string_to_len(MAX_BASENAME_CHARS + 1);

        let invalid = [
            "",
            ".",
            "..",
            ".hidden",
            " leading_space",
            "trailing_space ",
            "/leading_slash",
            "trailing_slash/",
            "middle/slash",
            "\\leading_back_slash",
            "trailing_back_slash\\",
            "middle\\back_slask",
            "null\u{0000}byte",
            max_len.as_str()
        ];

        for test in invalid {
            assert!(!basename_valid(&test), "invalid string failed {:?}", test);
        }
    }

    #[test]
    fn extension_checks() {
        assert_eq!(extension("report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension("no_extension"), None);
        assert_eq!(extension("trailing."), None);

        assert!(extension_allowed("notes.TXT", DEFAULT_ALLOWED_EXTENSIONS));
        assert!(!extension_allowed("script.sh", DEFAULT_ALLOWED_EXTENSIONS));
        assert!(!extension_allowed("README", DEFAULT_ALLOWED_EXTENSIONS));
    }
}
