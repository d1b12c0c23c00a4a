//! Tree of URL path segments built from the description's paths.
//!
//! Filtering by include/exclude patterns happens here so every later pass
//! only sees the operations that will be generated.

// Internal imports (std, crate)
use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::{Diagnostic, DiagnosticsCollector};
use crate::document::{escape_pointer, ApiDocument, HttpMethod, Operation, PathItem};
use crate::naming::is_single_parameter_segment;
use crate::{Error, Result};

// External imports (alphabetized)
use glob::{MatchOptions, Pattern};

pub const MERGED_INDEXERS: &str = "MergedIndexers";

/// A path pattern with an optional verb restriction (`/users/**#GET,PATCH`)
#[derive(Debug, Clone)]
pub struct PathPattern {
    pattern: Pattern,
    verbs: BTreeSet<HttpMethod>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self> {
        let (path, verbs) = match raw.split_once('#') {
            Some((path, verbs)) => (path, verbs),
            None => (raw, ""),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let pattern = Pattern::new(&path)
            .map_err(|e| Error::config(format!("invalid path pattern '{}': {}", raw, e)))?;
        let verbs = verbs
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.parse::<HttpMethod>().map_err(Error::config))
            .collect::<Result<BTreeSet<_>>>()?;
        Ok(Self { pattern, verbs })
    }

    pub fn matches(&self, path: &str, method: HttpMethod) -> bool {
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };
        (self.verbs.is_empty() || self.verbs.contains(&method))
            && self.pattern.matches_with(path, options)
    }
}

/// Include and exclude patterns applied to each operation
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<PathPattern>,
    exclude: Vec<PathPattern>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: include.iter().map(|p| PathPattern::parse(p)).collect::<Result<_>>()?,
            exclude: exclude.iter().map(|p| PathPattern::parse(p)).collect::<Result<_>>()?,
        })
    }

    pub fn keeps(&self, path: &str, method: HttpMethod) -> bool {
        (self.include.is_empty() || self.include.iter().any(|p| p.matches(path, method)))
            && !self.exclude.iter().any(|p| p.matches(path, method))
    }
}

/// An operation kept in the tree, with the path item it was declared in
#[derive(Debug, Clone, Copy)]
pub struct NodeOperation<'a> {
    pub method: HttpMethod,
    pub path: &'a str,
    pub path_item: &'a PathItem,
    pub operation: &'a Operation,
}

impl<'a> NodeOperation<'a> {
    /// JSON pointer of the operation object
    pub fn pointer(&self) -> String {
        format!(
            "#/paths/{}/{}",
            escape_pointer(self.path),
            self.method.as_str().to_lowercase()
        )
    }
}

/// One path segment
#[derive(Debug, Clone, Default)]
pub struct UrlNode<'a> {
    pub segment: String,
    /// Operations in verb order
    pub operations: Vec<NodeOperation<'a>>,
    pub children: BTreeMap<String, UrlNode<'a>>,
}

impl<'a> UrlNode<'a> {
    fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            ..Self::default()
        }
    }

    pub fn is_parameter(&self) -> bool {
        is_single_parameter_segment(&self.segment)
    }

    pub fn has_operations(&self) -> bool {
        !self.operations.is_empty()
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&NodeOperation<'a>> {
        self.operations.iter().find(|op| op.method == method)
    }

    fn is_empty(&self) -> bool {
        !self.has_operations() && self.children.is_empty()
    }

    fn prune(&mut self) {
        for child in self.children.values_mut() {
            child.prune();
        }
        self.children.retain(|_, child| !child.is_empty());
    }

    fn add_operation(&mut self, operation: NodeOperation<'a>, diagnostics: &mut dyn DiagnosticsCollector) {
        if let Some(kept) = self.operation(operation.method) {
            diagnostics.report(
                Diagnostic::warning(
                    MERGED_INDEXERS,
                    format!(
                        "{} {} clashes with {} {} and was dropped",
                        operation.method, operation.path, kept.method, kept.path
                    ),
                )
                .with_pointer(operation.pointer()),
            );
            return;
        }
        self.operations.push(operation);
        self.operations.sort_by_key(|op| op.method);
    }

    /// Move every operation and child of `other` into this node
    fn absorb(&mut self, other: UrlNode<'a>, diagnostics: &mut dyn DiagnosticsCollector) {
        for operation in other.operations {
            self.add_operation(operation, diagnostics);
        }
        for (key, child) in other.children {
            match self.children.get_mut(&key) {
                Some(existing) => existing.absorb(child, diagnostics),
                None => {
                    self.children.insert(key, child);
                }
            }
        }
    }

    /// Fold sibling `{variable}` segments into the first one
    fn merge_parameter_siblings(&mut self, diagnostics: &mut dyn DiagnosticsCollector) {
        let parameter_keys: Vec<String> = self
            .children
            .iter()
            .filter(|(_, child)| child.is_parameter())
            .map(|(key, _)| key.clone())
            .collect();
        if let Some((first, rest)) = parameter_keys.split_first() {
            for key in rest {
                if let Some(other) = self.children.remove(key) {
                    log::debug!("merging path segment {} into {}", key, first);
                    diagnostics.report(Diagnostic::warning(
                        MERGED_INDEXERS,
                        format!("path segment '{}' was merged into '{}'", key, first),
                    ));
                    if let Some(target) = self.children.get_mut(first) {
                        target.absorb(other, diagnostics);
                    }
                }
            }
        }
        for child in self.children.values_mut() {
            child.merge_parameter_siblings(diagnostics);
        }
    }

    fn render(&self, prefix: &str, last: bool, out: &mut String) {
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        self.render_label(out);
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        let count = self.children.len();
        for (index, child) in self.children.values().enumerate() {
            child.render(&child_prefix, index + 1 == count, out);
        }
    }

    fn render_label(&self, out: &mut String) {
        out.push_str(&self.segment);
        if self.has_operations() {
            let verbs: Vec<&str> = self.operations.iter().map(|op| op.method.as_str()).collect();
            out.push_str(&format!(" ({})", verbs.join(", ")));
        }
        out.push('\n');
    }
}

/// Filtered and merged view of the description's paths
#[derive(Debug, Clone)]
pub struct UrlTree<'a> {
    root: UrlNode<'a>,
}

impl<'a> UrlTree<'a> {
    /// Build the tree, dropping operations the filter excludes
    pub fn build(
        document: &'a ApiDocument,
        filter: &PathFilter,
        diagnostics: &mut dyn DiagnosticsCollector,
    ) -> Self {
        let mut root = UrlNode::new("/");
        for (path, item) in &document.paths {
            let kept: Vec<NodeOperation<'a>> = item
                .operations()
                .filter(|(method, _)| {
                    let keep = filter.keeps(path, *method);
                    if !keep {
                        log::trace!("filtered out {} {}", method, path);
                    }
                    keep
                })
                .map(|(method, operation)| NodeOperation {
                    method,
                    path: path.as_str(),
                    path_item: item,
                    operation,
                })
                .collect();
            if kept.is_empty() {
                continue;
            }
            let mut node = &mut root;
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                node = node
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(|| UrlNode::new(segment));
            }
            for operation in kept {
                node.add_operation(operation, diagnostics);
            }
        }
        root.merge_parameter_siblings(diagnostics);
        root.prune();
        Self { root }
    }

    pub fn root(&self) -> &UrlNode<'a> {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Node for a `/`-separated path
    pub fn find(&self, path: &str) -> Option<&UrlNode<'a>> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }

    /// Box-drawing rendering of the tree
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.root.render_label(&mut out);
        let count = self.root.children.len();
        for (index, child) in self.root.children.values().enumerate() {
            child.render("", index + 1 == count, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use serde_json::json;

    fn document() -> ApiDocument {
        ApiDocument::from_json_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/users": {"get": {"responses": {}}, "post": {"responses": {}}},
                "/users/{id}": {"get": {"responses": {}}, "patch": {"responses": {}}},
                "/users/{user-id}/messages": {"get": {"responses": {}}},
                "/admin/reports": {"delete": {"responses": {}}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parameter_siblings_are_merged() {
        let mut diagnostics = Diagnostics::new();
        let document = document();
        let tree = UrlTree::build(&document, &PathFilter::default(), &mut diagnostics);
        let users = tree.find("/users").unwrap();
        assert_eq!(users.children.len(), 1);
        let item = tree.find("/users/{id}").unwrap();
        assert!(item.children.contains_key("messages"));
        assert!(diagnostics.contains_code(MERGED_INDEXERS));
    }

    #[test]
    fn test_filters_apply_per_verb() {
        let filter = PathFilter::new(
            &["/users/**".to_string(), "/users".to_string()],
            &["/users/{id}#PATCH".to_string()],
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new();
        let document = document();
        let tree = UrlTree::build(&document, &filter, &mut diagnostics);
        assert!(tree.find("/admin").is_none());
        let item = tree.find("/users/{id}").unwrap();
        assert!(item.operation(HttpMethod::Get).is_some());
        assert!(item.operation(HttpMethod::Patch).is_none());
    }

    #[test]
    fn test_single_star_stays_within_a_segment() {
        let pattern = PathPattern::parse("users/*").unwrap();
        assert!(pattern.matches("/users/{id}", HttpMethod::Get));
        assert!(!pattern.matches("/users/{id}/messages", HttpMethod::Get));
        assert!(PathPattern::parse("/users#FETCH").is_err());
    }

    #[test]
    fn test_clashing_verbs_keep_the_first() {
        let document = ApiDocument::from_json_value(json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {
                "/items/{a}": {"get": {"operationId": "first", "responses": {}}},
                "/items/{b}": {"get": {"operationId": "second", "responses": {}}}
            }
        }))
        .unwrap();
        let mut diagnostics = Diagnostics::new();
        let tree = UrlTree::build(&document, &PathFilter::default(), &mut diagnostics);
        let node = tree.find("/items/{a}").unwrap();
        assert_eq!(node.operations.len(), 1);
        assert_eq!(node.operations[0].operation.operation_id.as_deref(), Some("first"));
        assert_eq!(diagnostics.warnings().count(), 2);
    }

    #[test]
    fn test_render_tree() {
        let mut diagnostics = Diagnostics::new();
        let document = document();
        let tree = UrlTree::build(&document, &PathFilter::default(), &mut diagnostics);
        let rendered = tree.render_tree();
        assert!(rendered.starts_with("/\n"));
        assert!(rendered.contains("├── admin"));
        assert!(rendered.contains("└── users (GET, POST)"));
        assert!(rendered.contains("{id} (GET, PATCH)"));
    }
}
