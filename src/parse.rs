//! Content tokenization and raw header-block scanning.

/// A member separator recognized by [`split_content()`].
///
/// Header contents are only ever split on one of these three characters, so
/// the set is closed by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `;`, the canonical member separator.
    SemiColon,
    /// `,`, the list and multi-entry separator.
    Comma,
    /// A single space, used inside adjectives such as auth schemes.
    Space,
}

impl Delimiter {
    /// The character this delimiter splits on.
    pub const fn as_char(self) -> char {
        match self {
            Delimiter::SemiColon => ';',
            Delimiter::Comma => ',',
            Delimiter::Space => ' ',
        }
    }
}

/// Splits `string` at `delimiter`, ignoring occurrences that fall inside a
/// double-quoted span, a parenthesized comment, or an unterminated `=` value,
/// as well as the comma directly following a weekday abbreviation (so an
/// RFC 1123 date never splits as a list).
///
/// Every produced token is trimmed. Empty input yields one empty token, and
/// consecutive delimiters yield empty tokens in between. The scan is a single
/// left-to-right pass.
///
/// ```rust
/// use headway::parse::{split_content, Delimiter};
///
/// assert_eq!(split_content("text/html; charset=UTF-8", Delimiter::SemiColon),
///            ["text/html", "charset=UTF-8"]);
///
/// let dates = "Wed, 15-Apr-2020 21:27:31 GMT, Fri, 01-Jan-2038 00:00:00 GMT";
/// assert_eq!(split_content(dates, Delimiter::Comma),
///            ["Wed, 15-Apr-2020 21:27:31 GMT", "Fri, 01-Jan-2038 00:00:00 GMT"]);
/// ```
pub fn split_content(string: &str, delimiter: Delimiter) -> Vec<String> {
    let delim = delimiter.as_char();

    let mut in_double_quote = false;
    let mut in_parenthesis = false;
    let mut in_value = false;
    let mut is_on_a_day = false;

    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();

    for (index, letter) in string.char_indices() {
        if letter == '"' {
            in_double_quote = !in_double_quote;

            if in_value && !in_double_quote {
                in_value = false;
            }
        } else if letter == '(' && !in_parenthesis {
            in_parenthesis = true;
        } else if letter == ')' && in_parenthesis {
            in_parenthesis = false;
        } else {
            // The day guard is deliberately sticky across quote and
            // parenthesis characters.
            is_on_a_day = index >= 3
                && matches!(
                    string.get(index - 3..index),
                    Some("Mon" | "Tue" | "Wed" | "Thu" | "Fri" | "Sat" | "Sun")
                );
        }

        if !in_double_quote {
            if !in_value && letter == '=' {
                in_value = true;
            } else if letter == ';' && in_value {
                in_value = false;
            }

            // A value may contain the delimiter being split on, unless the
            // delimiter is the member separator itself.
            if in_value && letter == delim && !is_on_a_day {
                in_value = false;
            }
        }

        if letter == delim && !(in_value || in_double_quote || in_parenthesis || is_on_a_day) {
            tokens.push(current.trim().to_string());
            current.clear();
            continue;
        }

        current.push(letter);
    }

    tokens.push(current.trim().to_string());
    tokens
}

/// Returns `true` if `content` looks like a JSON object or array literal.
pub fn is_json_object(content: &str) -> bool {
    let content = content.trim();

    (content.starts_with('{') && content.ends_with('}'))
        || (content.starts_with('[') && content.ends_with(']'))
}

/// Scans a raw header block into `(name, value)` pairs.
///
/// Folded continuation lines (leading space or tab) are unfolded into the
/// preceding value with a single space. Scanning stops at the first blank
/// line; lines without a colon are ignored.
pub(crate) fn split_block(text: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            break;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = pairs.last_mut() {
                value.push(' ');
                value.push_str(line.trim_start());
            }

            continue;
        }

        if let Some(colon) = line.find(':') {
            let name = line[..colon].trim();
            let value = line[colon + 1..].trim_start();
            pairs.push((name.to_string(), value.to_string()));
        }
    }

    pairs
}
