//! Auto-indentation policy.
//!
//! Indentation for a freshly inserted newline is a pure function of the
//! enclosing syntactic context in the latest token map: one level deeper
//! than the line of the innermost unclosed opener (an open tag or an open
//! brace in `<style>`/`<script>` content), or a copy of the previous
//! line's indentation when nothing encloses the cursor.

use super::kinds::{is_void_element, TokenKind};
use super::scanner::TokenMap;

/// Compute the indentation to insert at `at`, the offset just after a
/// newly inserted newline. `map` must be a scan of `source`.
pub fn indent_for_newline(source: &str, map: &TokenMap, at: usize, unit: &str) -> String {
    // Offsets of unclosed openers before the cursor, innermost last.
    let mut stack: Vec<usize> = Vec::new();
    // An open tag whose `>` has not been seen yet: (offset, is_void).
    let mut pending_open: Option<(usize, bool)> = None;

    for token in map.tokens() {
        if token.end > at {
            break;
        }
        let text = &source[token.range()];
        match token.kind {
            TokenKind::Tag => {
                if text.starts_with("</") {
                    pending_open = None;
                    stack.pop();
                } else if text == ">" {
                    if let Some((offset, is_void)) = pending_open.take() {
                        if !is_void {
                            stack.push(offset);
                        }
                    }
                } else if text == "/>" {
                    pending_open = None;
                } else if let Some(name) = text.strip_prefix('<') {
                    pending_open = Some((token.start, is_void_element(name)));
                }
            }
            TokenKind::Punct => match text {
                "{" => stack.push(token.start),
                "}" => {
                    stack.pop();
                }
                _ => {}
            },
            _ => {}
        }
    }

    match stack.last() {
        Some(&opener) => {
            let mut indent = line_indent_at(source, opener).to_string();
            indent.push_str(unit);
            indent
        }
        None if at == 0 => String::new(),
        None => line_indent_at(source, at - 1).to_string(),
    }
}

/// Leading whitespace of the line containing `offset`.
fn line_indent_at(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = source[line_start..]
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| line_start + i)
        .unwrap_or(source.len());
    &source[line_start..end]
}
