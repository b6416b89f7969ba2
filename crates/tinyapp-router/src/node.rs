//! Radix tree node implementation.
//!
//! Each node stands for one path segment. Matching prefers static children,
//! then the parameter child, then the wildcard child, backtracking when a
//! more specific branch fails deeper in the tree.

use crate::method_router::MethodRouter;
use crate::params::Params;

/// Type of path segment in the radix tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Static path segment (e.g., "users", "api")
    Static,
    /// Named parameter (e.g., "{id}", "{userId}")
    Param(String),
    /// Catch-all wildcard (e.g., "*path")
    Wildcard(String),
}

impl SegmentKind {
    /// Classifies a single pattern segment.
    #[must_use]
    pub fn of(segment: &str) -> Self {
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Self::Param(name.to_string())
        } else if let Some(name) = segment.strip_prefix('*') {
            Self::Wildcard(name.to_string())
        } else {
            Self::Static
        }
    }
}

/// A node in the radix tree.
///
/// Route boundaries carry a [`MethodRouter`] holding the entries for that
/// path.
#[derive(Debug, Clone)]
pub struct Node<T> {
    /// The path segment this node represents
    pub segment: String,

    /// The kind of segment (static, param, or wildcard)
    pub kind: SegmentKind,

    /// Entries for this node (if it's a route endpoint)
    pub methods: Option<MethodRouter<T>>,

    /// Static children, sorted by segment for binary search
    pub static_children: Vec<Node<T>>,

    /// Parameter child (at most one per node)
    pub param_child: Option<Box<Node<T>>>,

    /// Wildcard child (at most one per node, must be leaf)
    pub wildcard_child: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    fn with_kind(segment: String, kind: SegmentKind) -> Self {
        Self {
            segment,
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a new static node.
    #[must_use]
    pub fn new_static(segment: impl Into<String>) -> Self {
        Self::with_kind(segment.into(), SegmentKind::Static)
    }

    /// Creates a new parameter node.
    #[must_use]
    pub fn new_param(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("{{{name}}}"), SegmentKind::Param(name))
    }

    /// Creates a new wildcard node.
    #[must_use]
    pub fn new_wildcard(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::with_kind(format!("*{name}"), SegmentKind::Wildcard(name))
    }

    /// Creates a root node for the tree.
    #[must_use]
    pub fn root() -> Self {
        Self::new_static("")
    }

    /// Inserts a route into the tree, merging with entries already
    /// registered on the same path.
    ///
    /// # Panics
    ///
    /// Panics if a wildcard segment is not the last segment of `path`.
    pub fn insert(&mut self, path: &str, methods: MethodRouter<T>) {
        let segments = parse_path(path);
        self.insert_segments(&segments, methods);
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], methods: MethodRouter<T>) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            self.merge_methods(methods);
            return;
        };

        match kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    Ok(index) => self.static_children[index].insert_segments(remaining, methods),
                    Err(index) => {
                        let mut child = Node::new_static(segment.clone());
                        child.insert_segments(remaining, methods);
                        self.static_children.insert(index, child);
                    }
                }
            }
            SegmentKind::Param(name) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Node::new_param(name.clone())));
                child.insert_segments(remaining, methods);
            }
            SegmentKind::Wildcard(name) => {
                assert!(
                    remaining.is_empty(),
                    "Wildcard must be the last segment in path"
                );
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Node::new_wildcard(name.clone())));
                child.merge_methods(methods);
            }
        }
    }

    fn merge_methods(&mut self, methods: MethodRouter<T>) {
        match &mut self.methods {
            Some(existing) => existing.merge(methods),
            None => self.methods = Some(methods),
        }
    }

    /// Matches a path against the tree.
    ///
    /// Returns the entries and extracted parameters if the path exists.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = Params::new();
        let methods = self.match_segments(&segments, &mut params)?;
        Some((methods, params))
    }

    fn match_segments<'a>(
        &'a self,
        segments: &[&str],
        params: &mut Params,
    ) -> Option<&'a MethodRouter<T>> {
        let Some((segment, remaining)) = segments.split_first() else {
            return self.methods.as_ref();
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), *segment);
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                let found = child.methods.as_ref()?;
                params.push(name.clone(), segments.join("/"));
                return Some(found);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Node<T>> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

/// Splits a route pattern into classified segments.
pub(crate) fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| (s.to_string(), SegmentKind::of(s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_node_new_param() {
        let node: Node<()> = Node::new_param("id");
        assert_eq!(node.segment, "{id}");
        assert_eq!(node.kind, SegmentKind::Param("id".to_string()));
    }

    #[test]
    fn test_node_new_wildcard() {
        let node: Node<()> = Node::new_wildcard("path");
        assert_eq!(node.segment, "*path");
        assert_eq!(node.kind, SegmentKind::Wildcard("path".to_string()));
    }

    #[test]
    fn test_parse_path() {
        let segments = parse_path("/files/{id}/*rest");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], ("files".to_string(), SegmentKind::Static));
        assert_eq!(segments[1].1, SegmentKind::Param("id".to_string()));
        assert_eq!(segments[2].1, SegmentKind::Wildcard("rest".to_string()));
    }

    #[test]
    fn test_insert_and_match_param() {
        let mut root = Node::root();
        root.insert("/users/{id}", MethodRouter::new().get("getUser"));

        let (methods, params) = root.match_path("/users/123").unwrap();
        assert_eq!(methods.get_route(&Method::GET), Some(&"getUser"));
        assert_eq!(params.get("id"), Some("123"));
    }

    #[test]
    fn test_insert_and_match_wildcard() {
        let mut root = Node::root();
        root.insert("/files/*path", MethodRouter::new().get("serveFile"));

        let (_, params) = root.match_path("/files/images/logo.png").unwrap();
        assert_eq!(params.get("path"), Some("images/logo.png"));
    }

    #[test]
    fn test_static_priority_over_param() {
        let mut root = Node::root();
        root.insert("/users/{id}", MethodRouter::new().get("getUser"));
        root.insert("/users/me", MethodRouter::new().get("getCurrentUser"));

        let (methods, params) = root.match_path("/users/me").unwrap();
        assert_eq!(methods.get_route(&Method::GET), Some(&"getCurrentUser"));
        assert!(params.is_empty());

        let (methods, params) = root.match_path("/users/123").unwrap();
        assert_eq!(methods.get_route(&Method::GET), Some(&"getUser"));
        assert_eq!(params.get("id"), Some("123"));
    }

    #[test]
    fn test_param_backtracking_drops_stale_params() {
        let mut root = Node::root();
        root.insert("/a/{x}/b", MethodRouter::new().get("param-branch"));
        root.insert("/a/*rest", MethodRouter::new().get("wildcard-branch"));

        let (methods, params) = root.match_path("/a/1/c").unwrap();
        assert_eq!(methods.get_route(&Method::GET), Some(&"wildcard-branch"));
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("1/c"));
    }

    #[test]
    fn test_root_route() {
        let mut root = Node::root();
        root.insert("/", MethodRouter::new().get("home"));

        let (methods, _) = root.match_path("/").unwrap();
        assert_eq!(methods.get_route(&Method::GET), Some(&"home"));
    }

    #[test]
    fn test_no_match() {
        let mut root = Node::root();
        root.insert("/users", MethodRouter::new().get("listUsers"));

        assert!(root.match_path("/posts").is_none());
        assert!(root.match_path("/users/1").is_none());
    }

    #[test]
    #[should_panic(expected = "Wildcard must be the last segment")]
    fn test_wildcard_must_be_last() {
        let mut root = Node::root();
        root.insert("/files/*path/edit", MethodRouter::new().get("bad"));
    }
}
