//! Krex parsers – the two report formats emitted by the command-line tool.
//!
//! `listing` turns the tabular `api-resources` report into descriptors;
//! `fields` turns a recursive `explain` report into a tagged field tree.
//! Both absorb malformed input into empty results instead of erroring,
//! so a browse front-end stays responsive on unexpected output.

#![forbid(unsafe_code)]

mod fields;
mod listing;

pub use fields::parse_field_tree;
pub use listing::parse_listing;
