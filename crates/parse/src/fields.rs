//! Explain-style report parser.
//!
//! The report is scanned with a three-state machine whose only
//! transitions are the two marker lines; everything after the FIELDS:
//! marker is normalized into a block-structured key/value text and loaded
//! with the generic YAML reader, then converted into the tagged tree.

use std::time::Instant;

use krex_core::{ExplainReport, FieldNode};
use metrics::histogram;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

const DESCRIPTION_MARKER: &str = "DESCRIPTION:";
const FIELDS_MARKER: &str = "FIELDS:";

/// Where the scan currently is. Preamble lines are dropped, description
/// lines are collected for callers, field lines feed the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Description,
    Fields,
}

/// `name<TAB>type` pair on a field line.
static FIELD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-zA-Z0-9]+)\t(\S+)").unwrap());

/// Inline object/array-of-objects annotation; stripping it turns the key
/// into a nesting point for the loader.
static OBJECT_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r#":\s+"<(\[\])?Object>""#).unwrap());

/// Parse a recursive explain report into a field tree rooted at
/// `root_name`.
///
/// Input without the DESCRIPTION:/FIELDS: markers, and input whose fields
/// block the loader rejects, degrade to an empty root container. The free
/// text between the markers is returned verbatim on the report.
pub fn parse_field_tree(raw: &str, root_name: &str) -> ExplainReport {
    let started = Instant::now();
    let mut state = Section::Preamble;
    let mut description: Vec<&str> = Vec::new();
    let mut fields: Vec<&str> = Vec::new();

    for line in raw.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)) {
        match state {
            Section::Preamble => {
                if line.trim() == DESCRIPTION_MARKER {
                    state = Section::Description;
                }
            }
            Section::Description => {
                if line.trim() == FIELDS_MARKER {
                    state = Section::Fields;
                } else {
                    description.push(line);
                }
            }
            Section::Fields => fields.push(line),
        }
    }

    if state != Section::Fields {
        return ExplainReport::empty(root_name);
    }

    let description = description.join("\n");
    let block = normalize_fields_block(&fields.join("\n"), root_name);
    let root = match load_tree(&block, root_name) {
        Some(root) => root,
        None => {
            warn!(root = %root_name, "fields block did not load as a tree");
            FieldNode::container(root_name, root_name)
        }
    };

    histogram!("krex_parse_fields_ms", started.elapsed().as_secs_f64() * 1000.0);
    ExplainReport { description, root }
}

/// Rewrite the raw fields block into loader-compatible form, in order:
/// collapse the 3-space nesting unit to 2, quote each `name<TAB>type`
/// pair as `name: "type"`, hang everything under a synthetic root line,
/// and strip `<Object>`/`<[]Object>` values so those keys nest instead of
/// terminating.
fn normalize_fields_block(block: &str, root_name: &str) -> String {
    let collapsed = block.replace("   ", "  ");
    let quoted = FIELD_LINE.replace_all(&collapsed, "$1: \"$2\"");
    let rooted = format!("{}: \"<Object>\"\n{}", root_name, quoted);
    OBJECT_VALUE.replace_all(&rooted, ":").into_owned()
}

/// Load the normalized block and pull out the single top-level entry.
fn load_tree(block: &str, root_name: &str) -> Option<FieldNode> {
    let doc: serde_yaml::Value = serde_yaml::from_str(block).ok()?;
    let subtree = doc.get(root_name)?;
    Some(convert(root_name.to_string(), root_name, subtree))
}

/// Map loader values onto the tagged node set. The tag is decided here,
/// once: mappings and nulls (object-typed fields with and without nested
/// blocks) are containers, scalars are leaves.
fn convert(path: String, name: &str, value: &serde_yaml::Value) -> FieldNode {
    match value {
        serde_yaml::Value::Mapping(entries) => {
            let mut children = Vec::with_capacity(entries.len());
            for (key, child) in entries {
                let Some(key) = key.as_str() else { continue };
                let child_path = format!("{}.{}", path, key);
                children.push(convert(child_path, key, child));
            }
            FieldNode::Container {
                path,
                name: name.to_string(),
                children,
            }
        }
        serde_yaml::Value::Null => FieldNode::Container {
            path,
            name: name.to_string(),
            children: Vec::new(),
        },
        other => FieldNode::Leaf {
            path,
            name: name.to_string(),
            type_token: scalar_token(other),
        },
    }
}

fn scalar_token(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
