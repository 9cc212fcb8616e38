//! Decoded form of a request-target.
//!
//! A [`Uri`] is produced by [`parse_request_target`](crate::codec::parse_request_target). All of
//! its components are already percent-decoded and, except for the password, case-folded; the
//! original encoded strings are kept for diagnostics.

use std::collections::HashMap;
use std::fmt;

/// Name of the sentinel segment that starts every path. Decoded path segments are lower-case,
/// so no request can produce a real segment with this name.
pub const ROOT_SEGMENT: &str = "RESOURCE_ROOT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated host, classified by its syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Host {
    Ipv4(String),
    /// Kept with its surrounding brackets.
    Ipv6(String),
    RegName(String),
}

impl Host {
    pub fn as_str(&self) -> &str {
        match self {
            Host::Ipv4(s) | Host::Ipv6(s) | Host::RegName(s) => s,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInfo {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    pub(crate) raw: String,
    pub(crate) scheme: Option<Scheme>,
    pub(crate) user_info: Option<UserInfo>,
    pub(crate) host: Option<Host>,
    pub(crate) port: Option<u16>,
    pub(crate) segments: Vec<String>,
    pub(crate) query: HashMap<String, String>,
    pub(crate) fragments: Vec<String>,
    pub(crate) raw_path: String,
    pub(crate) raw_query: Option<String>,
    pub(crate) raw_fragment: Option<String>,
}

impl Uri {
    /// The request-target exactly as it appeared on the request line.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// All path segments, starting with [`ROOT_SEGMENT`].
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path segments without the root sentinel.
    pub fn path_segments(&self) -> &[String] {
        &self.segments[1..]
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn raw_fragment(&self) -> Option<&str> {
        self.raw_fragment.as_deref()
    }
}

impl Default for Uri {
    fn default() -> Self {
        Self {
            raw: String::from("/"),
            scheme: None,
            user_info: None,
            host: None,
            port: None,
            segments: vec![ROOT_SEGMENT.to_owned()],
            query: HashMap::new(),
            fragments: Vec::new(),
            raw_path: String::from("/"),
            raw_query: None,
            raw_fragment: None,
        }
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
