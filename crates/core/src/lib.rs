//! Krex core types: resource type descriptors and field trees.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// One row of the `api-resources` listing report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceTypeDescriptor {
    /// Plural resource identifier; unique within one listing.
    pub name: String,
    /// Short alias; empty when the tool prints none.
    pub short_name: String,
    /// API group/version string disambiguating same-named kinds.
    pub api_version: String,
    pub namespaced: bool,
    /// Schema type name.
    pub kind: String,
}

impl ResourceTypeDescriptor {
    /// Name to hand back to the tool on follow-up calls: the short alias
    /// when one exists, the plural name otherwise.
    pub fn invoke_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.name
        } else {
            &self.short_name
        }
    }
}

/// Parsed listing, ordered by the full normalized report line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceListing {
    pub resources: Vec<ResourceTypeDescriptor>,
}

impl ResourceListing {
    pub fn new(resources: Vec<ResourceTypeDescriptor>) -> Self {
        Self { resources }
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources that live inside a namespace.
    pub fn namespaced(&self) -> impl Iterator<Item = &ResourceTypeDescriptor> {
        self.resources.iter().filter(|r| r.namespaced)
    }

    /// Cluster-scoped resources; together with [`namespaced`](Self::namespaced)
    /// this is a strict partition of the listing.
    pub fn cluster_scoped(&self) -> impl Iterator<Item = &ResourceTypeDescriptor> {
        self.resources.iter().filter(|r| !r.namespaced)
    }
}

/// One node of the recursive field tree.
///
/// The container/leaf decision is fixed when the report is parsed and
/// carried by the variant tag; it is never re-derived from value shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FieldNode {
    /// A field whose reported type was an object or an array of objects.
    /// Children keep declaration order from the source report.
    Container {
        path: String,
        name: String,
        children: Vec<FieldNode>,
    },
    /// A scalar-typed field terminating the tree.
    Leaf {
        path: String,
        name: String,
        /// Opaque trailing type annotation, e.g. `<string>` or `<integer>`.
        type_token: String,
    },
}

impl FieldNode {
    pub fn container(path: impl Into<String>, name: impl Into<String>) -> Self {
        FieldNode::Container {
            path: path.into(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn leaf(
        path: impl Into<String>,
        name: impl Into<String>,
        type_token: impl Into<String>,
    ) -> Self {
        FieldNode::Leaf {
            path: path.into(),
            name: name.into(),
            type_token: type_token.into(),
        }
    }

    /// Dotted path from the resource type name down to this node.
    pub fn path(&self) -> &str {
        match self {
            FieldNode::Container { path, .. } | FieldNode::Leaf { path, .. } => path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FieldNode::Container { name, .. } | FieldNode::Leaf { name, .. } => name,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, FieldNode::Container { .. })
    }

    /// Children in declaration order; empty for leaves.
    pub fn children(&self) -> &[FieldNode] {
        match self {
            FieldNode::Container { children, .. } => children,
            FieldNode::Leaf { .. } => &[],
        }
    }

    /// Mapping-style lookup by field name.
    pub fn child(&self, name: &str) -> Option<&FieldNode> {
        self.children().iter().find(|c| c.name() == name)
    }

    /// Type annotation for leaves; `None` for containers.
    pub fn type_token(&self) -> Option<&str> {
        match self {
            FieldNode::Leaf { type_token, .. } => Some(type_token),
            FieldNode::Container { .. } => None,
        }
    }
}

/// Result of parsing one explain-style report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExplainReport {
    /// Free-text lines between the DESCRIPTION: and FIELDS: markers.
    pub description: String,
    /// Root container; its single subtree is keyed by the resource type name.
    pub root: FieldNode,
}

impl ExplainReport {
    /// Empty report for unparseable input: a childless root container.
    pub fn empty(root_name: &str) -> Self {
        Self {
            description: String::new(),
            root: FieldNode::container(root_name, root_name),
        }
    }
}
