use http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Failure while turning buffered bytes into a [`Request`](crate::protocol::Request).
///
/// Every protocol variant maps onto the status code the client is answered with, see
/// [`ParseError::status`]. The transport variants (`ConnectionClosed`, `Io`) have no status:
/// nothing can be written back to a peer that is gone.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{reason}")]
    BadRequest { reason: String },

    #[error("{reason}")]
    NotImplemented { reason: String },

    #[error("{reason}")]
    Timeout { reason: String },

    #[error("line exceeds the limit of {max_size} bytes")]
    TooLongLine { max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("payload size {size} exceed the limit {max_size}")]
    TooLargePayload { size: usize, max_size: usize },

    #[error("HTTP version {major}.{minor} is not supported, expected 1.1")]
    UpgradeRequired { major: u32, minor: u32 },

    #[error("{reason}")]
    Internal { reason: String },

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn bad_request<S: ToString>(str: S) -> Self {
        Self::BadRequest { reason: str.to_string() }
    }

    pub fn not_implemented<S: ToString>(str: S) -> Self {
        Self::NotImplemented { reason: str.to_string() }
    }

    pub fn timeout<S: ToString>(str: S) -> Self {
        Self::Timeout { reason: str.to_string() }
    }

    pub fn too_long_line(max_size: usize) -> Self {
        Self::TooLongLine { max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn too_large_payload(size: usize, max_size: usize) -> Self {
        Self::TooLargePayload { size, max_size }
    }

    pub fn upgrade_required(major: u32, minor: u32) -> Self {
        Self::UpgradeRequired { major, minor }
    }

    pub fn internal<S: ToString>(str: S) -> Self {
        Self::Internal { reason: str.to_string() }
    }

    /// The status code a client receives for this failure, `None` for transport failures.
    pub fn status(&self) -> Option<StatusCode> {
        let status = match self {
            Self::BadRequest { .. } | Self::TooLongLine { .. } => StatusCode::BAD_REQUEST,
            Self::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            Self::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::TooManyHeaders { .. } => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Self::TooLargePayload { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UpgradeRequired { .. } => StatusCode::UPGRADE_REQUIRED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConnectionClosed | Self::Io { .. } => return None,
        };
        Some(status)
    }

    /// Whether the underlying stream failed, as opposed to the request being malformed.
    #[inline]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ConnectionClosed | Self::Io { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_response<S: ToString>(str: S) -> Self {
        Self::InvalidResponse { reason: str.to_string() }
    }
}
