//! Single-pass HTML scanner with CSS and script sub-modes.
//!
//! The scanner walks a buffer snapshot and emits contiguous,
//! non-overlapping tokens covering the whole snapshot. HTML is the outer
//! mode; the content of `<style>` and `<script>` elements is scanned with
//! the CSS and script sub-scanners until the matching close tag (the open
//! and close tags themselves are markup tokens).
//!
//! Unterminated constructs (an unclosed tag, a comment or string without
//! its terminator) degrade to a single `Unknown` token spanning to the end
//! of the buffer. Scanning never fails.
//!
//! [`TokenMap::rescan`] re-derives only the tokens affected by a single
//! edit: tokens before the edited region are reused as-is, and tokens
//! after it are reused with shifted offsets once the scan re-synchronizes
//! on a previous token boundary with the same scanner state.

use std::ops::Range;

use super::kinds::{is_script_keyword, TokenKind};

/// A classified span over a buffer snapshot. Byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// A single splice applied to the text: `removed` bytes at `at` were
/// replaced by `inserted` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub at: usize,
    pub removed: usize,
    pub inserted: usize,
}

/// What an incremental re-scan actually did, for locality checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanStats {
    /// Tokens reused unchanged before the edited region.
    pub reused_prefix: usize,
    /// Tokens reused (offset-shifted) after re-synchronization.
    pub reused_suffix: usize,
    /// The byte range of the new text that was actually re-lexed.
    pub relexed: Range<usize>,
}

/// Raw-text content entered once the current tag is closed with `>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawContent {
    None,
    Style,
    Script,
}

/// Scanner state at a token boundary.
///
/// Tokens never start inside a string or comment (each is a single
/// token), so these four states capture everything needed to resume a
/// scan at any token start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Markup text content.
    Text,
    /// Inside a tag, after its `<name`.
    Tag { raw: RawContent },
    /// CSS content of a `<style>` element.
    Css,
    /// Script content of a `<script>` element.
    Js,
}

/// Tokens of a scanned snapshot plus the scanner state at each token
/// start, enabling incremental restarts.
#[derive(Debug, Clone)]
pub struct TokenMap {
    tokens: Vec<Token>,
    states: Vec<ScanState>,
    len: usize,
}

impl TokenMap {
    /// Scan a full snapshot.
    pub fn scan(text: &str) -> Self {
        let mut scanner = Scanner::new(text, 0, ScanState::Text);
        while scanner.scan_token() {}
        Self {
            tokens: scanner.tokens,
            states: scanner.states,
            len: text.len(),
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Length of the snapshot this map was scanned from.
    pub fn text_len(&self) -> usize {
        self.len
    }

    /// The token containing the given byte offset.
    pub fn token_at(&self, offset: usize) -> Option<&Token> {
        let idx = self.tokens.partition_point(|t| t.end <= offset);
        self.tokens.get(idx).filter(|t| t.start <= offset)
    }

    /// Re-scan after a single edit, reusing tokens outside the affected
    /// region.
    ///
    /// `new_text` must be the result of applying `edit` to the snapshot
    /// this map was scanned from.
    pub fn rescan(&self, edit: &Edit, new_text: &str) -> (TokenMap, RescanStats) {
        debug_assert_eq!(self.len + edit.inserted, new_text.len() + edit.removed);

        // Restart one token before the first affected one: a token's
        // classification may look one non-whitespace character ahead, so
        // the edit can retroactively change its immediate predecessor.
        let first_affected = self.tokens.partition_point(|t| t.end < edit.at);
        let restart = first_affected.saturating_sub(1);

        let (scan_from, scan_state) = match self.tokens.get(restart) {
            Some(token) => (token.start, self.states[restart]),
            None => (0, ScanState::Text),
        };
        let reused_prefix = restart.min(self.tokens.len());

        let mut scanner = Scanner::new(new_text, scan_from, scan_state);

        // Once past the inserted region, try to re-synchronize with a
        // previous token boundary carrying the same scanner state; from
        // there on, the old suffix is valid modulo an offset shift.
        let new_edit_end = edit.at + edit.inserted;
        let mut suffix_from = self.tokens.len();
        let mut relexed_end = new_text.len();

        loop {
            let pos = scanner.pos;
            if pos >= new_edit_end {
                let old_pos = pos - edit.inserted + edit.removed;
                if let Ok(j) = self.tokens.binary_search_by_key(&old_pos, |t| t.start) {
                    if self.states[j] == scanner.state {
                        suffix_from = j;
                        relexed_end = pos;
                        break;
                    }
                }
            }
            if !scanner.scan_token() {
                relexed_end = new_text.len();
                break;
            }
        }

        let suffix_len = self.tokens.len() - suffix_from;
        let mut tokens = Vec::with_capacity(reused_prefix + scanner.tokens.len() + suffix_len);
        let mut states = Vec::with_capacity(tokens.capacity());

        tokens.extend_from_slice(&self.tokens[..reused_prefix]);
        states.extend_from_slice(&self.states[..reused_prefix]);
        tokens.append(&mut scanner.tokens);
        states.append(&mut scanner.states);
        for k in suffix_from..self.tokens.len() {
            let t = self.tokens[k];
            tokens.push(Token {
                kind: t.kind,
                start: t.start - edit.removed + edit.inserted,
                end: t.end - edit.removed + edit.inserted,
            });
            states.push(self.states[k]);
        }

        let stats = RescanStats {
            reused_prefix,
            reused_suffix: suffix_len,
            relexed: scan_from..relexed_end,
        };

        (
            TokenMap {
                tokens,
                states,
                len: new_text.len(),
            },
            stats,
        )
    }
}

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    state: ScanState,
    tokens: Vec<Token>,
    states: Vec<ScanState>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, pos: usize, state: ScanState) -> Self {
        Self {
            src,
            pos,
            state,
            tokens: Vec::new(),
            states: Vec::new(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn push(&mut self, kind: TokenKind, end: usize, state_at_start: ScanState) {
        debug_assert!(end > self.pos && end <= self.src.len());
        self.tokens.push(Token {
            kind,
            start: self.pos,
            end,
        });
        self.states.push(state_at_start);
        self.pos = end;
    }

    /// Lex exactly one token at the current position. Returns `false` at
    /// end of input.
    fn scan_token(&mut self) -> bool {
        if self.pos >= self.src.len() {
            return false;
        }
        match self.state {
            ScanState::Text => self.lex_markup(),
            ScanState::Tag { raw } => self.lex_in_tag(raw),
            ScanState::Css => self.lex_css(),
            ScanState::Js => self.lex_js(),
        }
        true
    }

    fn lex_markup(&mut self) {
        let state = self.state;
        let start = self.pos;
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(i) => self.push(TokenKind::Comment, start + 4 + i + 3, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if rest.starts_with("<!") {
            match rest.find('>') {
                Some(i) => self.push(TokenKind::Doctype, start + i + 1, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if rest.starts_with("</") && bytes.get(2).is_some_and(u8::is_ascii_alphabetic) {
            match rest.find('>') {
                Some(i) => self.push(TokenKind::Tag, start + i + 1, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if bytes[0] == b'<' && bytes.get(1).is_some_and(u8::is_ascii_alphabetic) {
            if !rest.contains('>') {
                // Unclosed tag: degrade to the end of the buffer.
                self.push(TokenKind::Unknown, self.src.len(), state);
                return;
            }
            let name_len = rest[1..]
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-')
                .count();
            let name = &rest[1..1 + name_len];
            let raw = if name.eq_ignore_ascii_case("style") {
                RawContent::Style
            } else if name.eq_ignore_ascii_case("script") {
                RawContent::Script
            } else {
                RawContent::None
            };
            self.push(TokenKind::Tag, start + 1 + name_len, state);
            self.state = ScanState::Tag { raw };
            return;
        }

        if bytes[0] == b'&' {
            if let Some(len) = entity_len(rest) {
                self.push(TokenKind::Entity, start + len, state);
                return;
            }
        }

        // Plain text run up to the next markup-significant character.
        let mut end = self.src.len();
        for (i, c) in rest.char_indices() {
            if i > 0 && (c == '<' || c == '&') {
                end = start + i;
                break;
            }
        }
        self.push(TokenKind::Text, end, state);
    }

    fn lex_in_tag(&mut self, raw: RawContent) {
        let state = self.state;
        let start = self.pos;
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if !rest.contains('>') {
            // The tag never closes: degrade to the end of the buffer.
            self.push(TokenKind::Unknown, self.src.len(), state);
            return;
        }

        if rest.starts_with("/>") {
            self.push(TokenKind::Tag, start + 2, state);
            self.state = ScanState::Text;
            return;
        }

        match bytes[0] {
            b'>' => {
                self.push(TokenKind::Tag, start + 1, state);
                self.state = match raw {
                    RawContent::None => ScanState::Text,
                    RawContent::Style => ScanState::Css,
                    RawContent::Script => ScanState::Js,
                };
            }
            b'=' | b'/' => {
                self.push(TokenKind::Punct, start + 1, state);
            }
            b'"' | b'\'' => match quoted_len(rest, bytes[0]) {
                Some(len) => self.push(TokenKind::AttrValue, start + len, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            },
            b if (b as char).is_whitespace() || b >= 0x80 => {
                let c = rest.chars().next().unwrap_or(' ');
                if c.is_whitespace() {
                    self.push(TokenKind::Text, start + whitespace_len(rest), state);
                } else {
                    self.push(TokenKind::Punct, start + c.len_utf8(), state);
                }
            }
            _ => {
                let len = rest
                    .bytes()
                    .take_while(|b| {
                        !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'')
                            && *b < 0x80
                    })
                    .count();
                self.push(TokenKind::AttrName, start + len.max(1), state);
            }
        }
    }

    fn lex_css(&mut self) {
        let state = self.state;
        let start = self.pos;
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if close_tag_ahead(rest, "</style") {
            match rest.find('>') {
                Some(i) => {
                    self.push(TokenKind::Tag, start + i + 1, state);
                    self.state = ScanState::Text;
                }
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        let first = rest.chars().next().unwrap_or(' ');

        if first.is_whitespace() {
            self.push(TokenKind::Text, start + whitespace_len(rest), state);
            return;
        }

        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(i) => self.push(TokenKind::Comment, start + 2 + i + 2, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if first == '"' || first == '\'' {
            match quoted_len(rest, bytes[0]) {
                Some(len) => self.push(TokenKind::String, start + len, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if first.is_ascii_digit()
            || (matches!(first, '.' | '-' | '+') && bytes.get(1).is_some_and(u8::is_ascii_digit))
        {
            let digits = rest
                .bytes()
                .take_while(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+'))
                .count();
            let unit = rest[digits..]
                .bytes()
                .take_while(|b| b.is_ascii_alphabetic() || *b == b'%')
                .count();
            self.push(TokenKind::Number, start + digits + unit, state);
            return;
        }

        if first.is_ascii_alphabetic() || first == '_' || first == '-' {
            let len = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
                .count();
            let kind = match next_significant_byte(&rest[len..]) {
                Some(b':') => TokenKind::Property,
                Some(b'{') | Some(b',') => TokenKind::Selector,
                _ => TokenKind::Ident,
            };
            self.push(kind, start + len, state);
            return;
        }

        self.push(TokenKind::Punct, start + first.len_utf8(), state);
    }

    fn lex_js(&mut self) {
        let state = self.state;
        let start = self.pos;
        let rest = self.rest();
        let bytes = rest.as_bytes();

        if close_tag_ahead(rest, "</script") {
            match rest.find('>') {
                Some(i) => {
                    self.push(TokenKind::Tag, start + i + 1, state);
                    self.state = ScanState::Text;
                }
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        let first = rest.chars().next().unwrap_or(' ');

        if first.is_whitespace() {
            self.push(TokenKind::Text, start + whitespace_len(rest), state);
            return;
        }

        if rest.starts_with("//") {
            let end = rest.find('\n').map(|i| start + i).unwrap_or(self.src.len());
            self.push(TokenKind::Comment, end, state);
            return;
        }

        if rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(i) => self.push(TokenKind::Comment, start + 2 + i + 2, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if matches!(first, '"' | '\'' | '`') {
            match quoted_len(rest, bytes[0]) {
                Some(len) => self.push(TokenKind::String, start + len, state),
                None => self.push(TokenKind::Unknown, self.src.len(), state),
            }
            return;
        }

        if first.is_ascii_digit() {
            let len = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_'))
                .count();
            self.push(TokenKind::Number, start + len, state);
            return;
        }

        if first.is_ascii_alphabetic() || first == '_' || first == '$' {
            let len = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$'))
                .count();
            let kind = if is_script_keyword(&rest[..len]) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            };
            self.push(kind, start + len, state);
            return;
        }

        self.push(TokenKind::Punct, start + first.len_utf8(), state);
    }
}

/// Length of a `&name;` or `&#nnn;` entity at the start of `rest`, if one
/// is terminated within a reasonable distance.
fn entity_len(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    if bytes.get(i) == Some(&b'#') {
        i += 1;
    }
    let body_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() && i - body_start < 32 {
        i += 1;
    }
    if i > body_start && bytes.get(i) == Some(&b';') {
        Some(i + 1)
    } else {
        None
    }
}

/// Length of the quoted run starting at `rest[0]` (which is the quote),
/// honoring backslash escapes. `None` if unterminated.
fn quoted_len(rest: &str, quote: u8) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Length of the leading whitespace run.
fn whitespace_len(rest: &str) -> usize {
    rest.char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(rest.len())
}

/// Whether `rest` begins with the given close tag, case-insensitively.
fn close_tag_ahead(rest: &str, tag: &str) -> bool {
    rest.get(..tag.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(tag))
}

/// First non-whitespace byte of `rest`, for one-character lookahead
/// classification.
fn next_significant_byte(rest: &str) -> Option<u8> {
    rest.bytes().find(|b| !b.is_ascii_whitespace())
}
