//! The resource tree: one node per path segment, each node holding the handlers for the
//! methods it supports.
//!
//! ```
//! use frederick_server::{Resource, ResourceKind};
//! use frederick_http::protocol::{Method, Request, Response};
//!
//! let mut root = Resource::root();
//! let users = root.add_child("users", ResourceKind::Static).unwrap();
//! let user = users.add_child(":id", ResourceKind::Dynamic).unwrap();
//! user.add_handler(Method::Get, |request: &Request, response: &mut Response| {
//!     response.set_content(format!("user {}", request.path_param("id").unwrap_or_default()));
//! });
//!
//! assert!(root.get_child("users").and_then(|users| users.get_child("42")).is_some());
//! ```

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use frederick_http::fold_case;
use frederick_http::protocol::{Method, Request, Response};
use thiserror::Error;

/// Key under which a node keeps its dynamic child. Segments are lower-case after decoding,
/// so no static name can collide with it.
pub const DYNAMIC_KEY: &str = "@@DYNAMIC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Matches one segment by name.
    Static,
    /// Matches any one segment and binds it as a path parameter.
    Dynamic,
    /// Matches every remaining segment, collecting them as a file path.
    Filesystem,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResourceError {
    #[error("resource {parent} is a filesystem resource and cannot have children")]
    FilesystemParent { parent: String },

    #[error("resource {parent} already has a dynamic child")]
    DuplicateDynamic { parent: String },

    #[error("resource {parent} already has a filesystem child")]
    DuplicateFilesystem { parent: String },
}

/// Answers requests routed to a resource.
///
/// Only called once routing succeeded and the resource has a handler for the request's
/// method. The response starts as an empty `200 OK`.
pub trait RequestHandler: Send + Sync {
    fn invoke(&self, request: &Request, response: &mut Response);
}

impl<F> RequestHandler for F
where
    F: Fn(&Request, &mut Response) + Send + Sync,
{
    fn invoke(&self, request: &Request, response: &mut Response) {
        (self)(request, response);
    }
}

pub struct Resource {
    name: String,
    kind: ResourceKind,
    children: HashMap<String, Resource>,
    handlers: BTreeMap<Method, Box<dyn RequestHandler>>,
}

impl Resource {
    /// A node named `name`. Static and filesystem names are case-folded to match decoded
    /// request segments.
    pub fn new(name: &str, kind: ResourceKind) -> Self {
        let name = match kind {
            ResourceKind::Dynamic => name.to_owned(),
            ResourceKind::Static | ResourceKind::Filesystem => fold_case(name),
        };
        Self { name, kind, children: HashMap::new(), handlers: BTreeMap::new() }
    }

    /// The node matching `/`.
    pub fn root() -> Self {
        Self::new("", ResourceKind::Static)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Name a dynamic node binds its segment under: the declared name without a leading `:`.
    pub fn param_name(&self) -> &str {
        self.name.strip_prefix(':').unwrap_or(&self.name)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn has_kind(&self, kind: ResourceKind) -> bool {
        self.children.values().any(|child| child.kind == kind)
    }

    /// Adds a child and returns it.
    ///
    /// Fails on a filesystem node, and when a second dynamic or filesystem child is added.
    /// A static child replaces any child with the same name.
    pub fn add_child(&mut self, name: &str, kind: ResourceKind) -> Result<&mut Resource, ResourceError> {
        if self.kind == ResourceKind::Filesystem {
            return Err(ResourceError::FilesystemParent { parent: self.name.clone() });
        }

        let child = Resource::new(name, kind);
        let key = match kind {
            ResourceKind::Dynamic if self.children.contains_key(DYNAMIC_KEY) => {
                return Err(ResourceError::DuplicateDynamic { parent: self.name.clone() });
            }
            ResourceKind::Filesystem if self.has_kind(ResourceKind::Filesystem) => {
                return Err(ResourceError::DuplicateFilesystem { parent: self.name.clone() });
            }
            ResourceKind::Dynamic => DYNAMIC_KEY.to_owned(),
            ResourceKind::Static | ResourceKind::Filesystem => child.name.clone(),
        };

        match self.children.entry(key) {
            Entry::Occupied(mut entry) => {
                entry.insert(child);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => Ok(entry.insert(child)),
        }
    }

    /// The child matching `segment`: an exact name first, then the dynamic child.
    pub fn get_child(&self, segment: &str) -> Option<&Resource> {
        self.children.get(segment).or_else(|| self.children.get(DYNAMIC_KEY))
    }

    /// The child declared as `name`, dynamic children included.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Resource> {
        let key = self.child_key(name)?;
        self.children.get_mut(&key)
    }

    /// Removes the child declared as `name`, which may be the dynamic child's declared name.
    pub fn remove_child(&mut self, name: &str) -> Option<Resource> {
        let key = self.child_key(name)?;
        self.children.remove(&key)
    }

    fn child_key(&self, name: &str) -> Option<String> {
        let folded = fold_case(name);
        if self.children.contains_key(&folded) {
            return Some(folded);
        }
        self.children
            .get(DYNAMIC_KEY)
            .filter(|dynamic| dynamic.name == name)
            .map(|_dynamic| DYNAMIC_KEY.to_owned())
    }

    /// Registers `handler` for `method`, replacing any previous one.
    pub fn add_handler(&mut self, method: Method, handler: impl RequestHandler + 'static) -> &mut Self {
        self.handlers.insert(method, Box::new(handler));
        self
    }

    pub fn handler(&self, method: Method) -> Option<&dyn RequestHandler> {
        self.handlers.get(&method).map(Box::as_ref)
    }

    /// The registered methods, alphabetically, as used in an `Allow` header.
    pub fn method_list(&self) -> String {
        self.handlers.keys().map(Method::as_str).collect::<Vec<_>>().join(", ")
    }

    /// Creates, or reuses, the nodes along `route` and returns the last one.
    ///
    /// Segments are separated by `/`. A segment starting with `:` is dynamic and one starting
    /// with `*` is a filesystem node named by the rest of the segment:
    ///
    /// ```
    /// use frederick_server::{Resource, ResourceKind};
    ///
    /// let mut root = Resource::root();
    /// let files = root.add_route("/static/*files").unwrap();
    /// assert_eq!(files.kind(), ResourceKind::Filesystem);
    /// assert_eq!(files.name(), "files");
    /// ```
    pub fn add_route(&mut self, route: &str) -> Result<&mut Resource, ResourceError> {
        let mut node = self;
        for segment in route.split('/').filter(|segment| !segment.is_empty()) {
            node = match segment.strip_prefix('*') {
                Some(name) => node.route_child(name, ResourceKind::Filesystem)?,
                None if segment.starts_with(':') => node.route_child(segment, ResourceKind::Dynamic)?,
                None => node.route_child(segment, ResourceKind::Static)?,
            };
        }
        Ok(node)
    }

    fn route_child(&mut self, name: &str, kind: ResourceKind) -> Result<&mut Resource, ResourceError> {
        match self.child_key(name) {
            Some(key) if self.children.get(&key).is_some_and(|child| child.kind == kind) => {
                Ok(self.children.entry(key).or_insert_with(|| Resource::new(name, kind)))
            }
            _ => self.add_child(name, kind),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("methods", &self.method_list())
            .field("children", &self.children)
            .finish()
    }
}
