//! Protocol types shared by the parsers, the connection and handlers.
//!
//! - **Request line elements** (`method`): [`Method`], [`Protocol`], [`HttpVersion`]
//! - **Targets** (`uri`): [`Uri`], [`Host`], [`Scheme`], [`UserInfo`]
//! - **Messages**: [`Request`], built from a receive buffer, and [`Response`], filled by
//!   handlers
//! - **Framing** (`message`): [`PayloadSize`], [`PayloadItem`]
//! - **Errors** (`error`): [`ParseError`] for requests, [`SendError`] for responses,
//!   [`HttpError`] for the connection

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

mod limits;
pub use limits::Limits;

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod method;
pub use method::HttpVersion;
pub use method::Method;
pub use method::Protocol;

mod uri;
pub use uri::{Host, ROOT_SEGMENT, Scheme, Uri, UserInfo};

mod request;
pub use request::Request;

mod response;
pub use response::CHUNK_SIZE;
pub use response::Response;
