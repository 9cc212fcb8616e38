//! Walks the resource tree along a request's path segments.

use frederick_http::protocol::{ROOT_SEGMENT, Request};
use http::StatusCode;
use thiserror::Error;
use tracing::{debug, trace};

use crate::resource::{Resource, ResourceKind};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    #[error("Target Resource Not Found")]
    NotFound,

    #[error("Invalid file path segment")]
    InvalidFileSegment,
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidFileSegment => StatusCode::BAD_REQUEST,
        }
    }
}

/// Finds the resource addressed by `request`, starting from `root`.
///
/// Dynamic nodes bind their segment as a path parameter on the request. Once a filesystem
/// node is reached, every remaining segment is appended to the request's file path instead
/// of being matched. Segments that are `.` or `..`, or that decode to something containing
/// `/`, are refused there so the file path stays below the filesystem node.
pub fn locate<'a>(root: &'a Resource, request: &mut Request) -> Result<&'a Resource, RouteError> {
    let segments = request.uri().segments().to_vec();
    let Some((first, rest)) = segments.split_first() else {
        debug!("request has no path segments");
        return Err(RouteError::NotFound);
    };
    if first != ROOT_SEGMENT {
        debug!(segment = %first, "request path does not start at the root resource");
        return Err(RouteError::NotFound);
    }

    let mut node = root;
    for segment in rest {
        if node.kind() == ResourceKind::Filesystem {
            if segment == "." || segment == ".." || segment.contains('/') {
                debug!(segment = %segment, resource = %node.name(), "refused relative file path segment");
                return Err(RouteError::InvalidFileSegment);
            }
            request.append_file_segment(segment);
            continue;
        }

        let Some(child) = node.get_child(segment) else {
            debug!(segment = %segment, resource = %node.name(), "no resource for path segment");
            return Err(RouteError::NotFound);
        };
        if child.kind() == ResourceKind::Dynamic {
            request.add_path_param(child.param_name(), segment.as_str());
        }
        node = child;
    }

    trace!(resource = %node.name(), kind = ?node.kind(), "located resource");
    Ok(node)
}
