//! `using` directive discovery in C# source text.
//!
//! A host uses this to turn the directives of an open file into index queries.
//! Matching is line based: one directive per line, comments and string
//! contents removed first so commented-out directives are not reported.

use crate::project::namespaces::strip_comments_and_literals;
use regex::Regex;
use std::sync::LazyLock;

static USING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:global\s+)?using\s+(?:(static)\s+)?(?:(@?[A-Za-z_][A-Za-z0-9_]*)\s*=\s*)?((?:global::)?@?[A-Za-z_][A-Za-z0-9_.@]*)\s*;",
    )
    .expect("using directive regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    /// Zero-based line number.
    pub line: usize,
    /// Namespace (or type, for `using static`) being imported.
    pub namespace: String,
    pub alias: Option<String>,
    pub is_static: bool,
}

/// All `using` directives in `source`, in line order.
pub fn find_using_directives(source: &str) -> Vec<UsingDirective> {
    let stripped = strip_comments_and_literals(source);

    stripped
        .lines()
        .enumerate()
        .filter_map(|(line, text)| {
            let caps = USING_RE.captures(text)?;
            let target = caps.get(3)?.as_str();
            let target = target.strip_prefix("global::").unwrap_or(target);
            Some(UsingDirective {
                line,
                namespace: target.replace('@', ""),
                alias: caps.get(2).map(|m| m.as_str().trim_start_matches('@').to_string()),
                is_static: caps.get(1).is_some(),
            })
        })
        .collect()
}
