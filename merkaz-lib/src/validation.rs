pub const MAX_SUGGESTION_CHARS: usize = 4096;

fn is_line_break(ch: &char) -> bool {
    matches!(ch, '\n' | '\r' | '\t')
}

/// checks that the string does not start or end with whitespace / control
/// characters and that no control characters appear in between. line breaks
/// and tabs are allowed in the middle when `multiline` is set
pub fn check_control_leading_trailing<G>(
    given: G,
    max_chars: Option<usize>,
    multiline: bool,
) -> bool
where
    G: AsRef<str>
{
    let given_ref = given.as_ref();
    let mut iter = given_ref.chars();
    let mut char_count = 0;

    if let Some(ch) = iter.next() {
        char_count += 1;

        if ch.is_control() || ch.is_whitespace() {
            return false
        }
    }

    // check for trailing whitespace/control
    if let Some(ch) = iter.next_back() {
        char_count += 1;

        if ch.is_control() || ch.is_whitespace() {
            return false
        }
    }

    for ch in iter {
        if ch.is_control() && !(multiline && is_line_break(&ch)) {
            return false;
        }

        char_count += 1;

        if let Some(max_chars) = max_chars {
            if char_count > max_chars {
                return false;
            }
        }
    }

    true
}

pub fn suggestion_valid(given: &str) -> bool {
    !given.is_empty() && check_control_leading_trailing(given, Some(MAX_SUGGESTION_CHARS), true)
}
