//! Token kinds and static name tables for the scanner.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Classification of a scanned token.
///
/// Markup kinds come from the outer HTML mode; `Selector`/`Property` from
/// the CSS sub-mode; `Keyword`/`Ident`/`String`/`Number` are shared by the
/// CSS and script sub-modes. `Unknown` marks a degraded region (an
/// unterminated construct) and is a highlighting state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Text,
    Tag,
    AttrName,
    AttrValue,
    Entity,
    Comment,
    Doctype,
    Selector,
    Property,
    Keyword,
    Ident,
    String,
    Number,
    Punct,
    Unknown,
}

impl TokenKind {
    /// CSS class used when rendering this token to static markup.
    pub fn css_class(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Tag => "tag",
            TokenKind::AttrName => "attr-name",
            TokenKind::AttrValue => "attr-value",
            TokenKind::Entity => "entity",
            TokenKind::Comment => "comment",
            TokenKind::Doctype => "doctype",
            TokenKind::Selector => "selector",
            TokenKind::Property => "property",
            TokenKind::Keyword => "keyword",
            TokenKind::Ident => "ident",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::Punct => "punct",
            TokenKind::Unknown => "unknown",
        }
    }
}

/// HTML void elements: no content, no closing tag, render self-closing.
static VOID_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ])
});

/// Reserved words highlighted as keywords in the script sub-mode.
static SCRIPT_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "async", "await", "break", "case", "catch", "class", "const", "continue", "debugger",
        "default", "delete", "do", "else", "export", "extends", "false", "finally", "for",
        "function", "if", "import", "in", "instanceof", "let", "new", "null", "of", "return",
        "static", "super", "switch", "this", "throw", "true", "try", "typeof", "undefined",
        "var", "void", "while", "with", "yield",
    ])
});

/// Whether `name` is an HTML void element (case-insensitive).
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(name.to_ascii_lowercase().as_str())
}

/// Whether `word` is a script keyword.
pub fn is_script_keyword(word: &str) -> bool {
    SCRIPT_KEYWORDS.contains(word)
}
