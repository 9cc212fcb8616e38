//! Single header field parsing (RFC 7230 §3.2).

use http::{HeaderName, HeaderValue};

use crate::protocol::ParseError;
use crate::utils::ensure;

#[inline]
const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Splits `Name: value` into a validated name and a trimmed value.
///
/// Obsolete line folding is rejected through the leading whitespace rule.
pub fn parse_header_line(line: &str) -> Result<(HeaderName, HeaderValue), ParseError> {
    ensure!(
        !line.bytes().next().is_some_and(is_whitespace),
        ParseError::bad_request("Invalid whitespace at start of header line (RFC7230 [3.2.4])")
    );

    let Some((name, value)) = line.split_once(':') else {
        return Err(ParseError::bad_request("No divider between header field name and value"));
    };
    ensure!(
        !name.bytes().any(is_whitespace),
        ParseError::bad_request("Invalid whitespace between header field name and colon (RFC7230 [3.2.4])")
    );

    let value = value.trim_matches(|c: char| c.is_ascii() && is_whitespace(c as u8));
    ensure!(!value.is_empty(), ParseError::bad_request("Missing value for header field"));

    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_e| ParseError::bad_request("Invalid header field name"))?;
    let value = HeaderValue::from_str(value).map_err(|_e| ParseError::bad_request("Invalid header field value"))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(line: &str) -> String {
        match parse_header_line(line) {
            Err(ParseError::BadRequest { reason }) => reason,
            other => panic!("expected bad request for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_trimmed_value() {
        let (name, value) = parse_header_line("Content-Type: \t text/plain  ").unwrap();
        assert_eq!(name, http::header::CONTENT_TYPE);
        assert_eq!(value, "text/plain");
    }

    #[test]
    fn test_value_with_colons() {
        let (name, value) = parse_header_line("Host:localhost:8080").unwrap();
        assert_eq!(name, http::header::HOST);
        assert_eq!(value, "localhost:8080");
    }

    #[test]
    fn test_errors() {
        assert_eq!(reason(" Host: a"), "Invalid whitespace at start of header line (RFC7230 [3.2.4])");
        assert_eq!(reason("\tfolded value"), "Invalid whitespace at start of header line (RFC7230 [3.2.4])");
        assert_eq!(reason("Host a"), "No divider between header field name and value");
        assert_eq!(reason("Host : a"), "Invalid whitespace between header field name and colon (RFC7230 [3.2.4])");
        assert_eq!(reason("Host:   "), "Missing value for header field");
        assert_eq!(reason("Host:"), "Missing value for header field");
        assert_eq!(reason(": a"), "Invalid header field name");
        assert_eq!(reason("Ho(st: a"), "Invalid header field name");
    }
}
