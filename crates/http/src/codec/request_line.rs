//! Request-line parsing (RFC 7230 §3.1.1).
//!
//! `method SP request-target SP HTTP/major.minor`. Exactly one whitespace character must
//! separate the three parts; any stray whitespace is a 400, an unknown method a 501.

use crate::codec::uri::parse_request_target;
use crate::protocol::{HttpVersion, Method, ParseError, Protocol, Uri};
use crate::utils::ensure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub uri: Uri,
    pub protocol: Protocol,
    pub version: HttpVersion,
}

#[inline]
const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn find_whitespace(s: &str) -> Option<usize> {
    s.bytes().position(is_whitespace)
}

pub fn parse_request_line(line: &str) -> Result<RequestLine, ParseError> {
    // method
    let Some(method_end) = find_whitespace(line) else {
        return Err(ParseError::bad_request("Missing request target in request line"));
    };
    ensure!(method_end != 0, ParseError::bad_request("Invalid whitespace at start of request line (RFC7230 [3.1.1])"));
    let method = line[..method_end].parse::<Method>()?;
    let rest = &line[method_end + 1..];

    // request-target
    let Some(target_end) = find_whitespace(rest) else {
        return Err(ParseError::bad_request("Missing protocol in request line"));
    };
    ensure!(
        target_end != 0,
        ParseError::bad_request("Invalid whitespace between Method and Request Target (RFC7230 [3.1.1])")
    );
    let target = &rest[..target_end];
    let rest = &rest[target_end + 1..];

    // protocol
    let Some(slash) = rest.find('/') else {
        return Err(ParseError::bad_request("Missing HTTP version in request line"));
    };
    ensure!(
        find_whitespace(&rest[..slash]).is_none(),
        ParseError::bad_request("Invalid whitespace between Request Target and Protocol (RFC7230 [3.1.1])")
    );
    ensure!(slash != 0, ParseError::bad_request("Missing protocol name in request line"));
    let Some(protocol) = Protocol::from_token(rest[..slash].as_bytes()) else {
        return Err(ParseError::bad_request("Unrecognized protocol in request line"));
    };
    let rest = &rest[slash + 1..];

    // version
    ensure!(
        find_whitespace(rest).is_none(),
        ParseError::bad_request("Invalid whitespace in HTTP version (RFC7230 [3.1.1])")
    );
    let Some((major, minor)) = rest.split_once('.') else {
        return Err(ParseError::bad_request("Missing minor HTTP version"));
    };
    let version = HttpVersion::new(parse_version_number(major)?, parse_version_number(minor)?);

    let uri = parse_request_target(target)?;

    Ok(RequestLine { method, uri, protocol, version })
}

fn parse_version_number(digits: &str) -> Result<u32, ParseError> {
    ensure!(
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        ParseError::bad_request("Invalid HTTP version number")
    );
    digits.parse::<u32>().map_err(|_e| ParseError::bad_request("Invalid HTTP version number"))
}
