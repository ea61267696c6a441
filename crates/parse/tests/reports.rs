#![forbid(unsafe_code)]

use krex_parse::{parse_field_tree, parse_listing};

// Trimmed-down capture of a real `api-resources` report, APIVERSION form.
const LISTING: &str = "\
NAME                        SHORTNAMES   APIVERSION                     NAMESPACED   KIND
bindings                                 v1                             true         Binding
componentstatuses           cs           v1                             false        ComponentStatus
configmaps                  cm           v1                             true         ConfigMap
customresourcedefinitions   crd,crds     apiextensions.k8s.io/v1        false        CustomResourceDefinition
deployments                 deploy       apps/v1                        true         Deployment
events                      ev           v1                             true         Event
events                      ev           events.k8s.io/v1               true         Event
namespaces                  ns           v1                             false        Namespace
nodes                       no           v1                             false        Node
pods                        po           v1                             true         Pod

";

// Recursive explain report for a deployment, heavily trimmed.
const EXPLAIN: &str = "\
KIND:     Deployment
VERSION:  apps/v1

DESCRIPTION:
    Deployment enables declarative updates for Pods and ReplicaSets.

FIELDS:
   apiVersion\t<string>
   kind\t<string>
   metadata\t<Object>
      labels\t<map[string]string>
      name\t<string>
      namespace\t<string>
   spec\t<Object>
      minReadySeconds\t<integer>
      replicas\t<integer>
      selector\t<Object>
         matchLabels\t<map[string]string>
      template\t<Object>
         spec\t<Object>
            containers\t<[]Object>
               image\t<string>
               name\t<string>
               ports\t<[]Object>
                  containerPort\t<integer>
                  protocol\t<string>
   status\t<Object>
      readyReplicas\t<integer>
";

#[test]
fn listing_count_and_uniqueness_of_full_rows() {
    let listing = parse_listing(LISTING);
    // 10 data rows, trailing blank discarded
    assert_eq!(listing.len(), 10);
    // `events` appears under two API groups; full rows stay distinct
    let events: Vec<_> = listing
        .resources
        .iter()
        .filter(|r| r.name == "events")
        .collect();
    assert_eq!(events.len(), 2);
    assert_ne!(events[0].api_version, events[1].api_version);
}

#[test]
fn listing_partition_is_exhaustive_and_disjoint() {
    let listing = parse_listing(LISTING);
    let ns = listing.namespaced().count();
    let cluster = listing.cluster_scoped().count();
    assert_eq!(ns + cluster, listing.len());
    assert!(listing.namespaced().all(|r| r.namespaced));
    assert!(listing.cluster_scoped().all(|r| !r.namespaced));
}

#[test]
fn listing_order_is_independent_of_input_order() {
    let mut lines: Vec<&str> = LISTING.lines().collect();
    let header = lines.remove(0);
    // keep the data rows, drop the trailing blank
    let mut rows: Vec<&str> = lines.into_iter().filter(|l| !l.trim().is_empty()).collect();
    rows.reverse();
    let shuffled = format!("{}\n{}\n\n", header, rows.join("\n"));

    let a = parse_listing(LISTING);
    let b = parse_listing(&shuffled);
    assert_eq!(a.resources, b.resources);
}

#[test]
fn explain_paths_join_ancestors_with_dots() {
    let report = parse_field_tree(EXPLAIN, "deployments");
    let image = report
        .root
        .child("spec")
        .and_then(|n| n.child("template"))
        .and_then(|n| n.child("spec"))
        .and_then(|n| n.child("containers"))
        .and_then(|n| n.child("image"))
        .unwrap();
    assert_eq!(image.path(), "deployments.spec.template.spec.containers.image");
    assert_eq!(image.type_token(), Some("<string>"));
}

#[test]
fn explain_object_and_array_fields_are_containers() {
    let report = parse_field_tree(EXPLAIN, "deployments");
    let spec = report.root.child("spec").unwrap();
    assert!(spec.is_container());
    let containers = spec
        .child("template")
        .and_then(|n| n.child("spec"))
        .and_then(|n| n.child("containers"))
        .unwrap();
    assert!(containers.is_container());
    assert!(!containers.children().is_empty());
}

#[test]
fn explain_sibling_order_is_declaration_order() {
    let report = parse_field_tree(EXPLAIN, "deployments");
    let top: Vec<_> = report.root.children().iter().map(|c| c.name()).collect();
    assert_eq!(top, vec!["apiVersion", "kind", "metadata", "spec", "status"]);
    let meta: Vec<_> = report
        .root
        .child("metadata")
        .unwrap()
        .children()
        .iter()
        .map(|c| c.name())
        .collect();
    assert_eq!(meta, vec!["labels", "name", "namespace"]);
}

#[test]
fn explain_description_is_available_to_callers() {
    let report = parse_field_tree(EXPLAIN, "deployments");
    assert!(report
        .description
        .contains("declarative updates for Pods and ReplicaSets"));
}

#[test]
fn explain_without_markers_is_empty_not_an_error() {
    let report = parse_field_tree("error: the server doesn't have a resource type \"foo\"", "foo");
    assert!(report.root.children().is_empty());
    assert_eq!(report.root.name(), "foo");
}
