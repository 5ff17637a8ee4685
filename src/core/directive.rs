// nextboot - core/directive.rs
//
// In-memory replacement of the `default_selection` directive.
// Core layer: pure byte-level logic, no I/O. The file path is passed in only
// to give errors context.
//
// The configuration is handled as raw bytes so comments or titles in a
// non-UTF-8 encoding survive the rewrite untouched.

use crate::core::model::{BootTarget, RewriteMode};
use crate::util::constants::DEFAULT_SELECTION_KEYWORD;
use crate::util::error::RewriteError;
use regex::bytes::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Result of rewriting the directive in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveEdit {
    /// Full rewritten file content.
    pub content: Vec<u8>,

    /// Value the directive held before the rewrite (lossy UTF-8).
    pub previous_value: String,

    /// 1-based line number of the replaced directive (line mode only).
    pub line_number: Option<usize>,
}

/// UTF-8 byte order mark some Windows editors put at the start of a file.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// An active directive line: optional indentation, the keyword, whitespace,
/// a value, then an optional trailing `#` comment. Applied to a single line
/// with its terminator already stripped, so `^`/`$` anchor to the line.
/// A `#` always starts a comment, so values cannot contain one.
fn directive_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i-u)^([ \t]*)default_selection[ \t]+([^\s#][^\r\n#]*?)[ \t]*(#[^\r\n]*)?$",
        )
        .expect("directive_line_regex: invalid regex")
    })
}

/// Everything from the start of the file, non-greedily, through the first
/// directive keyword, its whitespace, and one value token.
fn directive_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s-u)\A.*?default_selection\s+(\S+)")
            .expect("directive_prefix_regex: invalid regex")
    })
}

/// Rewrite the `default_selection` directive of `content` to `target`.
///
/// # Errors
/// `DirectiveNotFound` when no directive is present (a rewrite would be a
/// silent no-op). In line mode, `MultipleDirectives` when more than one
/// active directive exists.
pub fn rewrite_default_selection(
    content: &[u8],
    target: &BootTarget,
    mode: RewriteMode,
    path: &Path,
) -> Result<DirectiveEdit, RewriteError> {
    match mode {
        RewriteMode::Line => rewrite_line(content, target, path),
        RewriteMode::Prefix => rewrite_prefix(content, target, path),
    }
}

fn directive_bytes(indent: &[u8], target: &BootTarget) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        indent.len() + DEFAULT_SELECTION_KEYWORD.len() + 1 + target.as_str().len(),
    );
    out.extend_from_slice(indent);
    out.extend_from_slice(DEFAULT_SELECTION_KEYWORD.as_bytes());
    out.push(b' ');
    out.extend_from_slice(target.as_str().as_bytes());
    out
}

/// Split a leading byte order mark off the first line.
fn split_bom(idx: usize, body: &[u8]) -> (&[u8], &[u8]) {
    if idx == 0 && body.starts_with(UTF8_BOM) {
        body.split_at(UTF8_BOM.len())
    } else {
        body.split_at(0)
    }
}

/// One active directive found by the line scan.
struct DirectiveHit<'a> {
    idx: usize,
    bom: &'a [u8],
    indent: &'a [u8],
    value: &'a [u8],
    comment: Option<&'a [u8]>,
}

/// Split a line into its body and terminator (`\n`, `\r\n`, or nothing on
/// the last line).
fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let body_len = if line.ends_with(b"\r\n") {
        line.len() - 2
    } else if line.ends_with(b"\n") {
        line.len() - 1
    } else {
        line.len()
    };
    line.split_at(body_len)
}

fn rewrite_line(
    content: &[u8],
    target: &BootTarget,
    path: &Path,
) -> Result<DirectiveEdit, RewriteError> {
    let re = directive_line_regex();

    let mut hits: Vec<DirectiveHit<'_>> = Vec::new();
    for (idx, line) in content.split_inclusive(|&b| b == b'\n').enumerate() {
        let (body, _) = split_terminator(line);
        let (bom, body) = split_bom(idx, body);
        if let Some(caps) = re.captures(body) {
            hits.push(DirectiveHit {
                idx,
                bom,
                indent: caps.get(1).map_or(&body[..0], |m| m.as_bytes()),
                value: caps.get(2).map_or(&body[..0], |m| m.as_bytes()),
                comment: caps.get(3).map(|m| m.as_bytes()),
            });
        }
    }

    let hit = match hits.as_slice() {
        [] => {
            return Err(RewriteError::DirectiveNotFound {
                path: path.to_path_buf(),
            })
        }
        [only] => only,
        many => {
            return Err(RewriteError::MultipleDirectives {
                path: path.to_path_buf(),
                lines: many.iter().map(|h| h.idx + 1).collect(),
            })
        }
    };
    let hit_idx = hit.idx;
    let previous = hit.value;

    let mut replacement = hit.bom.to_vec();
    replacement.extend_from_slice(&directive_bytes(hit.indent, target));
    if let Some(comment) = hit.comment {
        replacement.push(b' ');
        replacement.extend_from_slice(comment);
    }

    let mut out = Vec::with_capacity(content.len() + replacement.len());
    for (idx, line) in content.split_inclusive(|&b| b == b'\n').enumerate() {
        if idx == hit_idx {
            let (_, terminator) = split_terminator(line);
            out.extend_from_slice(&replacement);
            out.extend_from_slice(terminator);
        } else {
            out.extend_from_slice(line);
        }
    }

    tracing::debug!(
        line = hit_idx + 1,
        previous = %String::from_utf8_lossy(previous),
        new = %target,
        "Directive line replaced"
    );

    Ok(DirectiveEdit {
        content: out,
        previous_value: String::from_utf8_lossy(previous).into_owned(),
        line_number: Some(hit_idx + 1),
    })
}

fn rewrite_prefix(
    content: &[u8],
    target: &BootTarget,
    path: &Path,
) -> Result<DirectiveEdit, RewriteError> {
    let caps = directive_prefix_regex()
        .captures(content)
        .ok_or_else(|| RewriteError::DirectiveNotFound {
            path: path.to_path_buf(),
        })?;

    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let previous = caps.get(1).map_or(&content[..0], |m| m.as_bytes());

    let mut out = directive_bytes(b"", target);
    out.extend_from_slice(&content[whole.end..]);

    tracing::debug!(
        replaced_bytes = whole.len(),
        previous = %String::from_utf8_lossy(previous),
        new = %target,
        "Directive prefix replaced"
    );

    Ok(DirectiveEdit {
        content: out,
        previous_value: String::from_utf8_lossy(previous).into_owned(),
        line_number: None,
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn target(s: &str) -> BootTarget {
        BootTarget::parse(s).unwrap()
    }

    fn line(content: &str, to: &str) -> Result<DirectiveEdit, RewriteError> {
        rewrite_default_selection(
            content.as_bytes(),
            &target(to),
            RewriteMode::Line,
            Path::new("refind.conf"),
        )
    }

    fn prefix(content: &str, to: &str) -> Result<DirectiveEdit, RewriteError> {
        rewrite_default_selection(
            content.as_bytes(),
            &target(to),
            RewriteMode::Prefix,
            Path::new("refind.conf"),
        )
    }

    #[test]
    fn test_line_mode_replaces_only_directive_line() {
        let conf = "# rEFInd\ntimeout 20\ndefault_selection 2\nscanfor internal,external\n";
        let edit = line(conf, "7").unwrap();
        assert_eq!(
            String::from_utf8(edit.content).unwrap(),
            "# rEFInd\ntimeout 20\ndefault_selection 7\nscanfor internal,external\n"
        );
        assert_eq!(edit.previous_value, "2");
        assert_eq!(edit.line_number, Some(3));
    }

    #[test]
    fn test_line_mode_ignores_commented_directives() {
        let conf = "#default_selection 1\n# default_selection \"Microsoft\"\ndefault_selection 3\n";
        let edit = line(conf, "1").unwrap();
        assert_eq!(
            String::from_utf8(edit.content).unwrap(),
            "#default_selection 1\n# default_selection \"Microsoft\"\ndefault_selection 1\n"
        );
        assert_eq!(edit.line_number, Some(3));
    }

    #[test]
    fn test_line_mode_keeps_crlf_and_indent() {
        let conf = "timeout 5\r\n  default_selection\t\"Ubuntu\"  \r\nshowtools shell\r\n";
        let edit = line(conf, "+").unwrap();
        assert_eq!(
            String::from_utf8(edit.content).unwrap(),
            "timeout 5\r\n  default_selection +\r\nshowtools shell\r\n"
        );
        assert_eq!(edit.previous_value, "\"Ubuntu\"");
    }

    #[test]
    fn test_line_mode_last_line_without_newline() {
        let edit = line("timeout 5\ndefault_selection 2", "7").unwrap();
        assert_eq!(edit.content, b"timeout 5\ndefault_selection 7");
    }

    #[test]
    fn test_line_mode_multi_digit_value_fully_replaced() {
        let edit = line("default_selection 12\n", "3").unwrap();
        assert_eq!(edit.content, b"default_selection 3\n");
        assert_eq!(edit.previous_value, "12");
    }

    #[test]
    fn test_line_mode_preserves_non_utf8_bytes() {
        let mut conf = b"# caf\xe9 menu\n".to_vec();
        conf.extend_from_slice(b"default_selection 1\n");
        let edit = rewrite_default_selection(
            &conf,
            &target("2"),
            RewriteMode::Line,
            Path::new("refind.conf"),
        )
        .unwrap();
        assert_eq!(edit.content, b"# caf\xe9 menu\ndefault_selection 2\n");
    }

    #[test]
    fn test_line_mode_directive_after_bom() {
        let edit = line("\u{feff}default_selection 2\ntimeout 5\n", "7").unwrap();
        assert_eq!(edit.content, b"\xEF\xBB\xBFdefault_selection 7\ntimeout 5\n");
        assert_eq!(edit.previous_value, "2");
        assert_eq!(edit.line_number, Some(1));
    }

    #[test]
    fn test_line_mode_keeps_trailing_comment() {
        let edit = line("default_selection 2 # windows\n", "7").unwrap();
        assert_eq!(edit.content, b"default_selection 7 # windows\n");
        assert_eq!(edit.previous_value, "2");

        let edit = line("default_selection \"Ubuntu\"\t#linux\r\n", "1").unwrap();
        assert_eq!(edit.content, b"default_selection 1 #linux\r\n");
        assert_eq!(edit.previous_value, "\"Ubuntu\"");
    }

    #[test]
    fn test_line_mode_missing_directive_is_an_error() {
        let result = line("timeout 20\nscanfor manual\n", "7");
        assert!(
            matches!(result, Err(RewriteError::DirectiveNotFound { .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn test_line_mode_keyword_without_value_is_not_a_directive() {
        let result = line("default_selection\n", "7");
        assert!(matches!(result, Err(RewriteError::DirectiveNotFound { .. })));
    }

    #[test]
    fn test_line_mode_rejects_multiple_directives() {
        let result = line("default_selection 1\ntimeout 5\ndefault_selection 2\n", "3");
        match result {
            Err(RewriteError::MultipleDirectives { lines, .. }) => assert_eq!(lines, vec![1, 3]),
            other => panic!("expected MultipleDirectives, got {other:?}"),
        }
    }

    #[test]
    fn test_prefix_mode_replaces_everything_through_directive() {
        let edit = prefix("...garbage... default_selection 3 ...trailing...", "7").unwrap();
        assert_eq!(
            String::from_utf8(edit.content).unwrap(),
            "default_selection 7 ...trailing..."
        );
        assert_eq!(edit.previous_value, "3");
        assert_eq!(edit.line_number, None);
    }

    #[test]
    fn test_prefix_mode_is_non_greedy() {
        let edit = prefix("timeout 5\ndefault_selection 1\ndefault_selection 2\n", "4").unwrap();
        assert_eq!(
            String::from_utf8(edit.content).unwrap(),
            "default_selection 4\ndefault_selection 2\n"
        );
    }

    #[test]
    fn test_prefix_mode_missing_directive_is_an_error() {
        let result = prefix("timeout 20\n", "7");
        assert!(matches!(result, Err(RewriteError::DirectiveNotFound { .. })));
    }

    #[test]
    fn test_target_with_dollar_is_literal() {
        let edit = line("default_selection 1\n", "$1").unwrap();
        assert_eq!(edit.content, b"default_selection $1\n");
        let edit = prefix("default_selection 1\n", "$1").unwrap();
        assert_eq!(edit.content, b"default_selection $1\n");
    }
}
