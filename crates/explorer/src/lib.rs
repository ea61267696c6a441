//! Krex explorer – composes parsed reports into a browsable node
//! hierarchy.
//!
//! The node set is closed: a resource type expands into its top-level
//! fields, an object-typed field expands into its already-parsed subtree,
//! a scalar field terminates. Expansion never re-runs a parser below the
//! resource-type level, and every expansion returns an independent owned
//! graph, so concurrent expansions need no coordination.

#![forbid(unsafe_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use krex_core::{ExplainReport, FieldNode, ResourceListing, ResourceTypeDescriptor};
use krex_kubectl::{self as kubectl, CommandRunner, GetOutput};
use krex_parse::{parse_field_tree, parse_listing};

/// One browse node. The variant tag decides expansion; it is assigned
/// when the backing report is parsed and never re-inferred.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Node {
    /// A resource type from the listing; expands into its top-level fields.
    ResourceType { descriptor: ResourceTypeDescriptor },
    /// An object or array-of-objects field; expands into its subtree.
    FieldContainer {
        resource: ResourceTypeDescriptor,
        path: String,
        name: String,
        children: Vec<FieldNode>,
    },
    /// A scalar-typed field; terminates.
    FieldLeaf {
        resource: ResourceTypeDescriptor,
        path: String,
        name: String,
        type_token: String,
    },
}

impl Node {
    pub fn resource_type(descriptor: ResourceTypeDescriptor) -> Self {
        Node::ResourceType { descriptor }
    }

    /// Display label: the resource or field name, with the type appended
    /// for leaves.
    pub fn label(&self) -> String {
        match self {
            Node::ResourceType { descriptor } => descriptor.name.clone(),
            Node::FieldContainer { name, .. } => name.clone(),
            Node::FieldLeaf { name, type_token, .. } => format!("{}: {}", name, type_token),
        }
    }

    /// Dotted path from the resource type name down to this node.
    pub fn path(&self) -> &str {
        match self {
            Node::ResourceType { descriptor } => &descriptor.name,
            Node::FieldContainer { path, .. } | Node::FieldLeaf { path, .. } => path,
        }
    }

    /// The resource type this node belongs to.
    pub fn resource(&self) -> &ResourceTypeDescriptor {
        match self {
            Node::ResourceType { descriptor } => descriptor,
            Node::FieldContainer { resource, .. } | Node::FieldLeaf { resource, .. } => resource,
        }
    }

    pub fn is_expandable(&self) -> bool {
        !matches!(self, Node::FieldLeaf { .. })
    }
}

/// Facade over the command-execution collaborator.
///
/// Cheap to clone; hold one per process and share it across concurrent
/// browse operations. Command failures and malformed output degrade to
/// empty results, never to errors, so one broken expansion cannot take
/// down a browse front-end.
#[derive(Clone)]
pub struct Explorer {
    runner: Arc<dyn CommandRunner>,
}

impl Explorer {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Fetch and parse the resource listing.
    pub async fn resources(&self) -> ResourceListing {
        match self.fetch(&kubectl::api_resources_command()).await {
            Some(stdout) => parse_listing(&stdout),
            None => ResourceListing::default(),
        }
    }

    /// Fetch and parse the recursive field report for one resource type.
    /// One tool call per invocation; the returned tree is parsed once and
    /// owned by the caller.
    pub async fn field_tree(&self, resource: &ResourceTypeDescriptor) -> ExplainReport {
        match self.fetch(&kubectl::explain_tree_command(resource)).await {
            Some(stdout) => parse_field_tree(&stdout, &resource.name),
            None => ExplainReport::empty(&resource.name),
        }
    }

    /// Children of a node. Expanding a resource type issues one explain
    /// call; expanding a container reuses its embedded subtree; leaves
    /// have no children.
    pub async fn expand(&self, node: &Node) -> Vec<Node> {
        match node {
            Node::ResourceType { descriptor } => {
                let report = self.field_tree(descriptor).await;
                nodes_from_children(descriptor, report.root.children())
            }
            Node::FieldContainer {
                resource, children, ..
            } => nodes_from_children(resource, children),
            Node::FieldLeaf { .. } => Vec::new(),
        }
    }

    /// Prose documentation for one field path (non-recursive explain).
    pub async fn explain_path(
        &self,
        resource: &ResourceTypeDescriptor,
        path: &str,
    ) -> Option<String> {
        self.fetch(&kubectl::explain_path_command(resource, path))
            .await
    }

    /// Raw object listing passthrough.
    pub async fn get_raw(
        &self,
        resource: &ResourceTypeDescriptor,
        output: GetOutput,
        all_namespaces: bool,
    ) -> Option<String> {
        self.fetch(&kubectl::get_command(resource, output, all_namespaces))
            .await
    }

    /// Raw describe passthrough.
    pub async fn describe_raw(
        &self,
        resource: &ResourceTypeDescriptor,
        all_namespaces: bool,
    ) -> Option<String> {
        self.fetch(&kubectl::describe_command(resource, all_namespaces))
            .await
    }

    /// Run one command line; absorb invocation failures and non-zero
    /// exits into `None`.
    async fn fetch(&self, command_line: &str) -> Option<String> {
        match self.runner.invoke(command_line).await {
            Ok(res) if res.succeeded() => Some(res.stdout),
            Ok(res) => {
                warn!(command = %command_line, code = res.code, "command exited non-zero");
                None
            }
            Err(e) => {
                warn!(command = %command_line, error = ?e, "command invocation failed");
                None
            }
        }
    }
}

fn nodes_from_children(resource: &ResourceTypeDescriptor, children: &[FieldNode]) -> Vec<Node> {
    children
        .iter()
        .map(|child| match child {
            FieldNode::Container {
                path,
                name,
                children,
            } => Node::FieldContainer {
                resource: resource.clone(),
                path: path.clone(),
                name: name.clone(),
                children: children.clone(),
            },
            FieldNode::Leaf {
                path,
                name,
                type_token,
            } => Node::FieldLeaf {
                resource: resource.clone(),
                path: path.clone(),
                name: name.clone(),
                type_token: type_token.clone(),
            },
        })
        .collect()
}
