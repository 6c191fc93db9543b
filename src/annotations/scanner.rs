//! Line-level tokenizer for Go sources.
//!
//! Finds top-level `func Name(` declarations and, for each, the contiguous
//! comment block directly above it. The block is collected by walking upward
//! from the declaration through three states:
//!
//! - `ScanningUp`: nothing collected yet; the first line above must be a
//!   comment or the block is empty.
//! - `InBlock`: collecting comment lines.
//! - `Stopped`: hit a blank or non-comment line; nothing further up belongs
//!   to this declaration.

use once_cell::sync::Lazy;
use regex::Regex;

static FUNC_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^func\s+([A-Za-z_][A-Za-z0-9_]*)\s*[\[(]").expect("func regex should be valid")
});

static PACKAGE_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^package\s+([A-Za-z_][A-Za-z0-9_]*)").expect("package regex should be valid")
});

/// A comment line with its markers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// 1-based source line.
    pub line: usize,
    pub text: String,
}

/// A top-level function declaration and the comment block attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// 1-based source line of the `func` keyword.
    pub line: usize,
    /// Attached comments, top to bottom.
    pub comments: Vec<CommentLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    ScanningUp,
    InBlock,
    Stopped,
}

/// Returns the package name from the first `package` clause, if any.
pub fn package_name(source: &str) -> Option<&str> {
    source
        .lines()
        .find_map(|l| PACKAGE_CLAUSE.captures(l))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Every top-level function declaration in `source`, in file order.
///
/// Methods (`func (r *T) Name(`) never match.
pub fn declarations(source: &str) -> Vec<Declaration> {
    let lines: Vec<&str> = source.lines().collect();
    lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| {
            let caps = FUNC_DECL.captures(line)?;
            let name = caps.get(1)?.as_str().to_string();
            Some(Declaration {
                name,
                line: idx + 1,
                comments: comment_block_above(&lines, idx),
            })
        })
        .collect()
}

/// Contiguous comment block ending on the line just above `decl_idx`.
pub(crate) fn comment_block_above(lines: &[&str], decl_idx: usize) -> Vec<CommentLine> {
    let mut state = ScanState::ScanningUp;
    let mut block = Vec::new();
    let mut idx = decl_idx;

    while state != ScanState::Stopped && idx > 0 {
        idx -= 1;
        match strip_comment(lines[idx]) {
            Some(text) => {
                state = ScanState::InBlock;
                block.push(CommentLine {
                    line: idx + 1,
                    text,
                });
            }
            None => state = ScanState::Stopped,
        }
    }

    block.reverse();
    block
}

/// Strip comment markers from a line, or `None` if it is not a comment.
///
/// Accepts `// ...`, `/* ...`, ` * ...` and `*/`. A trailing `*/` is removed
/// as well.
pub fn strip_comment(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("//") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("/*") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("*/") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix('*') {
        rest
    } else {
        return None;
    };
    let body = body.trim();
    let body = body.strip_suffix("*/").unwrap_or(body);
    Some(body.trim().to_string())
}
