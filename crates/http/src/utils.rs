//! Utility macros and stateless string helpers shared by the parsers.
//!
//! Every helper here works on already-extracted text; none of them touches the
//! connection buffer. Failures are reported as `None` and the calling parser
//! decides which [`ParseError`](crate::protocol::ParseError) that becomes.

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(!name.is_empty(), ParseError::bad_request("Missing header name"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Percent-decodes `value`.
///
/// `%XX` becomes the byte `0xXX` and `+` becomes a space. A `%` that is not followed by two
/// hex digits fails, and so does a decoded byte sequence that is not valid UTF-8.
pub fn percent_decode(value: &str) -> Option<String> {
    if !value.contains(['%', '+']) {
        return Some(value.to_owned());
    }

    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let high = hex_value(*bytes.get(i + 1)?)?;
                let low = hex_value(*bytes.get(i + 2)?)?;
                decoded.push((high << 4) | low);
                i += 3;
            }
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).ok()
}

/// Extracts the content of a double-quoted string.
///
/// A value without any `"` is returned unchanged. Otherwise the value must start and end
/// with a quote, and the text between them is backslash-unescaped.
pub fn unquote(value: &str) -> Option<String> {
    if !value.contains('"') {
        return Some(value.to_owned());
    }

    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    unescape(inner)
}

/// Replaces every `\c` escape with `c`. A trailing lone backslash fails.
pub fn unescape(value: &str) -> Option<String> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            result.push(chars.next()?);
        } else {
            result.push(c);
        }
    }
    Some(result)
}

/// ASCII case folding used for every case-insensitive protocol element.
#[inline]
pub fn fold_case(value: &str) -> String {
    value.to_ascii_lowercase()
}

/// Lower-case hexadecimal rendering without prefix, as used in chunk-size lines.
#[inline]
pub fn to_hex(value: usize) -> String {
    format!("{value:x}")
}

/// Parses a non-empty run of hex digits, rejecting signs, whitespace and overflow.
pub fn from_hex(value: &str) -> Option<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    usize::from_str_radix(value, 16).ok()
}

/// Replaces every occurrence of `from` in `target` with `to`, in place.
pub fn replace_all(target: &mut String, from: &str, to: &str) {
    if from.is_empty() || !target.contains(from) {
        return;
    }
    *target = target.replace(from, to);
}

/// Escapes the characters that are significant in HTML text content.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = text.to_owned();
    replace_all(&mut escaped, "&", "&amp;");
    replace_all(&mut escaped, "<", "&lt;");
    replace_all(&mut escaped, ">", "&gt;");
    replace_all(&mut escaped, "\"", "&quot;");
    escaped
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
