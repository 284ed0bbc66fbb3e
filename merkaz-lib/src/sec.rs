use std::fmt::{Display, Formatter};

pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MAX_PASSWORD_CHARS: usize = 512;

pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// the first rule a registration password breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordIssue {
    TooShort,
    TooLong,
    ControlCharacter,
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    MissingSpecial,
}

impl PasswordIssue {
    pub fn key(&self) -> &'static str {
        match self {
            PasswordIssue::TooShort => "TooShort",
            PasswordIssue::TooLong => "TooLong",
            PasswordIssue::ControlCharacter => "ControlCharacter",
            PasswordIssue::MissingLowercase => "MissingLowercase",
            PasswordIssue::MissingUppercase => "MissingUppercase",
            PasswordIssue::MissingDigit => "MissingDigit",
            PasswordIssue::MissingSpecial => "MissingSpecial",
        }
    }
}

impl Display for PasswordIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordIssue::TooShort => write!(f, "Password must be at least {MIN_PASSWORD_CHARS} characters long."),
            PasswordIssue::TooLong => write!(f, "Password must be at most {MAX_PASSWORD_CHARS} characters long."),
            PasswordIssue::ControlCharacter => f.write_str("Password must not contain control characters."),
            PasswordIssue::MissingLowercase => f.write_str("Password must contain a lowercase letter."),
            PasswordIssue::MissingUppercase => f.write_str("Password must contain an uppercase letter."),
            PasswordIssue::MissingDigit => f.write_str("Password must contain a number."),
            PasswordIssue::MissingSpecial => f.write_str("Password must contain a special character."),
        }
    }
}

pub fn password_issue(given: &str) -> Option<PasswordIssue> {
    let mut char_count = 0;
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut special = false;

    for ch in given.chars() {
        if ch.is_control() {
            return Some(PasswordIssue::ControlCharacter);
        }

        char_count += 1;

        lower |= ch.is_ascii_lowercase();
        upper |= ch.is_ascii_uppercase();
        digit |= ch.is_ascii_digit();
        special |= PASSWORD_SPECIAL_CHARS.contains(ch);
    }

    if char_count < MIN_PASSWORD_CHARS {
        Some(PasswordIssue::TooShort)
    } else if char_count > MAX_PASSWORD_CHARS {
        Some(PasswordIssue::TooLong)
    } else if !lower {
        Some(PasswordIssue::MissingLowercase)
    } else if !upper {
        Some(PasswordIssue::MissingUppercase)
    } else if !digit {
        Some(PasswordIssue::MissingDigit)
    } else if !special {
        Some(PasswordIssue::MissingSpecial)
    } else {
        None
    }
}
