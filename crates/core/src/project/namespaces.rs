//! Lightweight syntactic scan for C# namespace declarations.
//!
//! Comments and literals are blanked out first so that text such as
//! `// namespace Old.Name;` or `"namespace X {"` is not mistaken for a
//! declaration. Both the block form `namespace A.B { }` and the file-scoped
//! form `namespace A.B;` are recognised, including nested blocks.

use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

static NAMESPACE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bnamespace\s+(@?[\p{L}_]\w*(?:\s*\.\s*@?[\p{L}_]\w*)*)\s*[{;]")
        .expect("namespace regex is valid")
});

pub fn scan_source_file(path: &Path) -> std::io::Result<BTreeSet<String>> {
    let bytes = std::fs::read(path)?;
    Ok(extract_namespaces(&decode_source(&bytes)))
}

/// Source text from raw file bytes.
///
/// A byte order mark selects UTF-16 (either endianness); everything else is
/// read as UTF-8 with invalid sequences replaced.
pub fn decode_source(bytes: &[u8]) -> Cow<'_, str> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest),
        [0xFF, 0xFE, rest @ ..] => Cow::Owned(decode_utf16(rest, u16::from_le_bytes)),
        [0xFE, 0xFF, rest @ ..] => Cow::Owned(decode_utf16(rest, u16::from_be_bytes)),
        _ => String::from_utf8_lossy(bytes),
    }
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units: Vec<u16> = body.chunks_exact(2).map(|c| unit([c[0], c[1]])).collect();
    String::from_utf16_lossy(&units)
}

pub fn extract_namespaces(source: &str) -> BTreeSet<String> {
    let code = strip_comments_and_literals(source);
    NAMESPACE_DECL
        .captures_iter(&code)
        .map(|caps| normalize_name(&caps[1]))
        .filter(|name| !name.is_empty())
        .collect()
}

fn normalize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '@')
        .collect()
}

/// Replace comments, string and char literals with spaces, keeping newlines
/// so offsets and line numbers are unchanged.
pub(crate) fn strip_comments_and_literals(source: &str) -> String {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut out = Vec::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match b {
            b'/' if next == Some(b'/') => {
                while i < len && bytes[i] != b'\n' {
                    out.push(b' ');
                    i += 1;
                }
            }
            b'/' if next == Some(b'*') => {
                out.extend_from_slice(b"  ");
                i += 2;
                while i < len && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    out.push(blank(bytes[i]));
                    i += 1;
                }
                if i < len {
                    out.extend_from_slice(b"  ");
                    i += 2;
                }
            }
            b'$' | b'@' => {
                let mut j = i;
                while j < len && matches!(bytes[j], b'$' | b'@') {
                    j += 1;
                }
                if j < len && bytes[j] == b'"' {
                    let verbatim = bytes[i..j].contains(&b'@');
                    out.extend(std::iter::repeat_n(b' ', j - i));
                    i = skip_string(bytes, j, verbatim, &mut out);
                } else {
                    out.extend_from_slice(&bytes[i..j]);
                    i = j;
                }
            }
            b'"' => i = skip_string(bytes, i, false, &mut out),
            b'\'' => {
                out.push(b' ');
                i += 1;
                while i < len && bytes[i] != b'\'' && bytes[i] != b'\n' {
                    if bytes[i] == b'\\' && i + 1 < len {
                        out.push(b' ');
                        i += 1;
                    }
                    out.push(blank(bytes[i]));
                    i += 1;
                }
                if i < len && bytes[i] == b'\'' {
                    out.push(b' ');
                    i += 1;
                }
            }
            _ => {
                out.push(b);
                i += 1;
            }
        }
    }

    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Skip a string literal whose opening quote is at `start`; returns the index after it.
fn skip_string(bytes: &[u8], start: usize, verbatim: bool, out: &mut Vec<u8>) -> usize {
    let len = bytes.len();
    let mut quotes = 0;
    while start + quotes < len && bytes[start + quotes] == b'"' {
        quotes += 1;
    }

    // Raw string literal: """ ... """ (three or more quotes).
    if quotes >= 3 {
        out.extend(std::iter::repeat_n(b' ', quotes));
        let mut i = start + quotes;
        while i < len {
            let mut run = 0;
            while i + run < len && bytes[i + run] == b'"' {
                run += 1;
            }
            if run >= quotes {
                out.extend(std::iter::repeat_n(b' ', run));
                return i + run;
            }
            if run > 0 {
                out.extend(std::iter::repeat_n(b' ', run));
                i += run;
            } else {
                out.push(blank(bytes[i]));
                i += 1;
            }
        }
        return len;
    }

    out.push(b' ');
    let mut i = start + 1;
    while i < len {
        match bytes[i] {
            b'\\' if !verbatim => {
                out.push(b' ');
                i += 1;
                if i < len {
                    out.push(blank(bytes[i]));
                    i += 1;
                }
            }
            b'"' if verbatim && bytes.get(i + 1) == Some(&b'"') => {
                out.extend_from_slice(b"  ");
                i += 2;
            }
            b'"' => {
                out.push(b' ');
                return i + 1;
            }
            // Regular strings cannot span lines; stop at the newline.
            b'\n' if !verbatim => return i,
            b => {
                out.push(blank(b));
                i += 1;
            }
        }
    }
    len
}

fn blank(b: u8) -> u8 {
    if b == b'\n' { b'\n' } else { b' ' }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(src: &str) -> Vec<String> {
        extract_namespaces(src).into_iter().collect()
    }

    #[test]
    fn block_and_file_scoped_forms() {
        assert_eq!(names("namespace Acme.Widgets.Internal { class A {} }"), vec![
            "Acme.Widgets.Internal"
        ]);
        assert_eq!(names("using System;\n\nnamespace Acme.Tools;\n\npublic class T {}"), vec![
            "Acme.Tools"
        ]);
    }

    #[test]
    fn nested_blocks_are_reported_as_written() {
        let src = "namespace Outer\n{\n    namespace Inner\n    {\n    }\n}\n";
        assert_eq!(names(src), vec!["Inner", "Outer"]);
    }

    #[test]
    fn whitespace_inside_dotted_names_is_removed() {
        assert_eq!(names("namespace Acme . Core\n{\n}"), vec!["Acme.Core"]);
    }

    #[test]
    fn comments_and_strings_are_ignored() {
        let src = r#"
// namespace Commented.Out;
/* namespace Block.Commented { } */
class C {
    string a = "namespace InString {";
    string b = @"namespace ""Verbatim"" {";
    string c = $"namespace {x};";
    string d = """
        namespace Raw.Literal;
        """;
    char e = '"';
}
namespace Real.One { }
"#;
        assert_eq!(names(src), vec!["Real.One"]);
    }

    #[test]
    fn identifiers_containing_keyword_do_not_match() {
        assert!(names("var mynamespace = 1; var namespaces = 2;").is_empty());
    }

    #[test]
    fn verbatim_identifier_prefix_is_dropped() {
        assert_eq!(names("namespace Acme.@class { }"), vec!["Acme.class"]);
    }

    #[test]
    fn stripping_keeps_line_structure() {
        let src = "a /* x\ny */ b // z\n\"s\ntr\"";
        let stripped = strip_comments_and_literals(src);
        assert_eq!(stripped.len(), src.len());
        assert_eq!(stripped.lines().count(), src.lines().count());
    }

    fn utf16_bytes(text: &str, big_endian: bool) -> Vec<u8> {
        let mut bytes = if big_endian { vec![0xFE, 0xFF] } else { vec![0xFF, 0xFE] };
        for unit in text.encode_utf16() {
            let pair = if big_endian { unit.to_be_bytes() } else { unit.to_le_bytes() };
            bytes.extend_from_slice(&pair);
        }
        bytes
    }

    #[test]
    fn byte_order_marks_select_the_encoding() {
        let source = "namespace Acme.Ünicode;\n";
        assert_eq!(decode_source(&utf16_bytes(source, false)), source);
        assert_eq!(decode_source(&utf16_bytes(source, true)), source);

        let mut utf8 = vec![0xEF, 0xBB, 0xBF];
        utf8.extend_from_slice(source.as_bytes());
        assert_eq!(decode_source(&utf8), source);
        assert_eq!(decode_source(source.as_bytes()), source);
    }

    #[test]
    fn utf16_source_files_yield_their_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Legacy.cs");
        std::fs::write(&path, utf16_bytes("namespace Acme.Legacy\r\n{\r\n}\r\n", false)).unwrap();

        let found: Vec<_> = scan_source_file(&path).unwrap().into_iter().collect();
        assert_eq!(found, vec!["Acme.Legacy"]);
    }
}
