//! Tabular listing parser.
//!
//! Column boundaries are not fixed: they are inferred from the header
//! line's own label+padding run lengths, and every data row is sliced by
//! that offset map. Rows are then re-padded to the column grid and sliced
//! again, so trailing-whitespace irregularities in the raw tool output
//! cannot shift a field.

use std::ops::Range;
use std::time::Instant;

use krex_core::{ResourceListing, ResourceTypeDescriptor};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Five labeled columns in fixed order, each label owning its trailing
/// padding run.
static HEADER_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(NAME\s+)(SHORTNAMES\s+)(APIVERSION\s+|APIGROUP\s+)(NAMESPACED\s+)(KIND\s+)$")
        .unwrap()
});

/// Slack appended to the header before the shape match. The KIND column
/// ends flush with its label on the header line but must still cover rows
/// whose kind is wider than the header.
const KIND_SLACK: usize = 32;

/// Parse the whitespace-column listing report into descriptors.
///
/// A header that does not match the five-column shape yields an empty
/// listing; it is never an error. The trailing blank line of the report is
/// discarded. Output order is the lexicographic order of the whole
/// normalized row, which is total and stable across calls.
pub fn parse_listing(raw: &str) -> ResourceListing {
    let started = Instant::now();
    let mut lines = raw.split('\n').map(trim_cr);
    let header = match lines.next() {
        Some(h) => h,
        None => return ResourceListing::default(),
    };
    let padded = format!("{}{}", header, " ".repeat(KIND_SLACK));
    let columns = match column_ranges(&padded) {
        Some(c) => c,
        None => {
            warn!(header = %header, "listing header does not match the five-column shape");
            return ResourceListing::default();
        }
    };

    let mut rows: Vec<&str> = lines.collect();
    while rows.last().is_some_and(|l| l.trim().is_empty()) {
        rows.pop();
    }

    let mut normalized: Vec<String> = rows.iter().map(|row| renormalize(row, &columns)).collect();
    normalized.sort();

    let resources: Vec<ResourceTypeDescriptor> = normalized
        .iter()
        .map(|line| {
            let cols = slice_columns(line, &columns);
            ResourceTypeDescriptor {
                name: cols[0].clone(),
                short_name: cols[1].clone(),
                api_version: cols[2].clone(),
                namespaced: cols[3] == "true",
                kind: cols[4].clone(),
            }
        })
        .collect();

    counter!("krex_listing_rows", resources.len() as u64);
    histogram!("krex_parse_listing_ms", started.elapsed().as_secs_f64() * 1000.0);
    ResourceListing::new(resources)
}

fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// `[start, end)` char offsets of the five label+padding runs; together
/// they tile the (padded) header line with no gaps.
fn column_ranges(header: &str) -> Option<Vec<Range<usize>>> {
    let caps = HEADER_SHAPE.captures(header)?;
    let mut ranges = Vec::with_capacity(5);
    let mut from = 0usize;
    for i in 1..=5 {
        let width = caps.get(i)?.as_str().chars().count();
        ranges.push(from..from + width);
        from += width;
    }
    Some(ranges)
}

/// Slice a row by the offset map and trim each field. Offsets are char
/// based and clamped, so short rows simply yield empty fields.
fn slice_columns(line: &str, columns: &[Range<usize>]) -> Vec<String> {
    columns
        .iter()
        .map(|col| {
            line.chars()
                .skip(col.start)
                .take(col.end - col.start)
                .collect::<String>()
                .trim()
                .to_string()
        })
        .collect()
}

/// Re-render a row on the column grid: the first three fields are
/// left-justified to the column width, NAMESPACED is right-justified to
/// match the tool's alignment, KIND is appended as-is.
fn renormalize(row: &str, columns: &[Range<usize>]) -> String {
    let cols = slice_columns(row, columns);
    let widths: Vec<usize> = columns.iter().map(|c| c.end - c.start).collect();
    format!(
        "{:<nw$}{:<sw$}{:<aw$}{:>pw$}{}",
        cols[0],
        cols[1],
        cols[2],
        cols[3],
        cols[4],
        nw = widths[0],
        sw = widths[1],
        aw = widths[2],
        pw = widths[3],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
NAME     SHORTNAMES   APIVERSION   NAMESPACED   KIND
pods     po           v1           true         Pod
nodes                 v1           false        Node

";

    #[test]
    fn round_trip_two_rows() {
        let listing = parse_listing(LISTING);
        assert_eq!(listing.len(), 2);
        let nodes = &listing.resources[0];
        assert_eq!(nodes.name, "nodes");
        assert_eq!(nodes.short_name, "");
        assert_eq!(nodes.api_version, "v1");
        assert!(!nodes.namespaced);
        assert_eq!(nodes.kind, "Node");
        let pods = &listing.resources[1];
        assert_eq!(pods.name, "pods");
        assert_eq!(pods.short_name, "po");
        assert!(pods.namespaced);
        assert_eq!(pods.kind, "Pod");

        let ns: Vec<_> = listing.namespaced().map(|r| r.name.as_str()).collect();
        let cluster: Vec<_> = listing.cluster_scoped().map(|r| r.name.as_str()).collect();
        assert_eq!(ns, vec!["pods"]);
        assert_eq!(cluster, vec!["nodes"]);
    }

    #[test]
    fn malformed_header_yields_empty_listing() {
        let raw = "NAME   KIND\npods   Pod\n";
        assert!(parse_listing(raw).is_empty());
        assert!(parse_listing("").is_empty());
    }

    #[test]
    fn apigroup_header_variant_is_accepted() {
        let raw = "\
NAME          SHORTNAMES   APIGROUP   NAMESPACED   KIND
deployments   deploy       apps       true         Deployment

";
        let listing = parse_listing(raw);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.resources[0].api_version, "apps");
    }

    #[test]
    fn trailing_spaces_do_not_shift_fields() {
        let raw = "\
NAME     SHORTNAMES   APIVERSION   NAMESPACED   KIND
pods     po           v1           true         Pod     \n";
        let listing = parse_listing(raw);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.resources[0].kind, "Pod");
    }

    #[test]
    fn kind_wider_than_header_survives() {
        let raw = "\
NAME                        SHORTNAMES   APIVERSION                     NAMESPACED   KIND
customresourcedefinitions   crd,crds     apiextensions.k8s.io/v1        false        CustomResourceDefinition

";
        let listing = parse_listing(raw);
        assert_eq!(listing.len(), 1);
        assert_eq!(listing.resources[0].kind, "CustomResourceDefinition");
        assert_eq!(listing.resources[0].short_name, "crd,crds");
    }

    #[test]
    fn shuffled_rows_sort_identically() {
        let a = "\
NAME     SHORTNAMES   APIVERSION   NAMESPACED   KIND
pods     po           v1           true         Pod
nodes                 v1           false        Node

";
        let b = "\
NAME     SHORTNAMES   APIVERSION   NAMESPACED   KIND
nodes                 v1           false        Node
pods     po           v1           true         Pod

";
        let la = parse_listing(a);
        let lb = parse_listing(b);
        assert_eq!(la.resources, lb.resources);
    }

    #[test]
    fn names_are_unique_and_count_matches_rows() {
        let listing = parse_listing(LISTING);
        let mut names: Vec<_> = listing.resources.iter().map(|r| r.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), listing.len());
    }
}
