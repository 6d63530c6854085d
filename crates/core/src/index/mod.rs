//! Namespace prefix map: construction and longest-prefix lookup.

pub mod builder;
pub mod query;

pub use builder::{build_namespace_map, build_snapshot};

/// Every dotted prefix of `name`: `A.B.C` yields `A`, `A.B`, `A.B.C`.
pub fn prefixes(name: &str) -> impl Iterator<Item = &str> {
    name.match_indices('.')
        .map(move |(i, _)| &name[..i])
        .chain(std::iter::once(name))
        .filter(|p| !p.is_empty())
}
