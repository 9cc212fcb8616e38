//! Request methods, the protocol name and the version pair of a request line.

use std::fmt;
use std::str::FromStr;

use crate::protocol::ParseError;

/// The request methods this server understands (RFC 7231 §4 and RFC 5789).
///
/// Variants are declared alphabetically so that ordered collections list them the way
/// an `Allow` header does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    Connect,
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Connect,
        Method::Delete,
        Method::Get,
        Method::Head,
        Method::Options,
        Method::Patch,
        Method::Post,
        Method::Put,
        Method::Trace,
    ];

    /// Case-sensitive lookup of a method token.
    pub const fn from_token(token: &[u8]) -> Option<Method> {
        match token {
            b"CONNECT" => Some(Method::Connect),
            b"DELETE" => Some(Method::Delete),
            b"GET" => Some(Method::Get),
            b"HEAD" => Some(Method::Head),
            b"OPTIONS" => Some(Method::Options),
            b"PATCH" => Some(Method::Patch),
            b"POST" => Some(Method::Post),
            b"PUT" => Some(Method::Put),
            b"TRACE" => Some(Method::Trace),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Connect => "CONNECT",
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Trace => "TRACE",
        }
    }
}

impl FromStr for Method {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::from_token(s.as_bytes())
            .ok_or_else(|| ParseError::not_implemented("Unknown HTTP method requested (RFC7231 [4.1])"))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The protocol name of a request line. Only `HTTP` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Http,
}

impl Protocol {
    pub const fn from_token(token: &[u8]) -> Option<Protocol> {
        match token {
            b"HTTP" => Some(Protocol::Http),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "HTTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `major.minor` as written after `HTTP/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HttpVersion {
    pub major: u32,
    pub minor: u32,
}

impl HttpVersion {
    pub const HTTP_10: HttpVersion = HttpVersion { major: 1, minor: 0 };
    pub const HTTP_11: HttpVersion = HttpVersion { major: 1, minor: 1 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for HttpVersion {
    fn default() -> Self {
        Self::HTTP_11
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_table() {
        for method in Method::ALL {
            assert_eq!(Method::from_token(method.as_str().as_bytes()), Some(method));
        }
        assert_eq!(Method::from_token(b"get"), None);
        assert_eq!(Method::from_token(b"BREW"), None);
    }

    #[test]
    fn test_unknown_method_is_not_implemented() {
        let err = "BREW".parse::<Method>().unwrap_err();
        assert!(matches!(err, ParseError::NotImplemented { .. }));
    }

    #[test]
    fn test_method_order() {
        let mut methods = vec![Method::Post, Method::Get, Method::Delete];
        methods.sort();
        assert_eq!(methods, vec![Method::Delete, Method::Get, Method::Post]);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(HttpVersion::HTTP_11.to_string(), "1.1");
        assert_eq!(HttpVersion::new(2, 0).to_string(), "2.0");
    }
}
