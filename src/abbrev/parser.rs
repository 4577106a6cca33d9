//! Abbreviation grammar parser.
//!
//! The grammar is the widely recognized core of Emmet abbreviations:
//! element names joined by `>` (child) and `+` (sibling), `*n` repetition
//! binding to the preceding element, and `.class`/`#id` shorthand.
//! Anything outside this subset is rejected with
//! [`AbbreviationError::InvalidAbbreviation`]; parsing never mutates any
//! editor state, so rejection leaves the caller's buffer untouched.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Rejection of an abbreviation; nothing was expanded or inserted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbbreviationError {
    #[error("invalid abbreviation at byte {position}: {reason}")]
    InvalidAbbreviation { position: usize, reason: String },
}

/// One element of a parsed abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// How many consecutive copies to render. Always at least 1.
    pub repeat: usize,
    pub children: Vec<Element>,
}

/// A parsed abbreviation: a list of sibling roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub roots: Vec<Element>,
}

/// Element, class, and id names.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*").unwrap());

/// Repetition counts above this are rejected rather than expanded.
const MAX_REPEAT: usize = 1000;

/// Parse an abbreviation into a [`Fragment`].
pub fn parse(input: &str) -> Result<Fragment, AbbreviationError> {
    Parser { src: input, pos: 0 }.parse()
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn parse(mut self) -> Result<Fragment, AbbreviationError> {
        if self.src.is_empty() {
            return Err(self.err("empty abbreviation"));
        }
        let roots = self.parse_siblings()?;
        Ok(Fragment { roots })
    }

    /// Parse a `+`-joined sibling list; a `>` hands the rest of the input
    /// to the preceding element as its children.
    fn parse_siblings(&mut self) -> Result<Vec<Element>, AbbreviationError> {
        let mut siblings = Vec::new();
        loop {
            let mut element = self.parse_element()?;
            if self.peek() == Some('*') {
                self.pos += 1;
                element.repeat = self.parse_count()?;
            }
            match self.peek() {
                None => {
                    siblings.push(element);
                    break;
                }
                Some('+') => {
                    self.pos += 1;
                    siblings.push(element);
                }
                Some('>') => {
                    self.pos += 1;
                    element.children = self.parse_siblings()?;
                    siblings.push(element);
                    break;
                }
                Some(c) => return Err(self.err(format!("unexpected character '{c}'"))),
            }
        }
        Ok(siblings)
    }

    fn parse_element(&mut self) -> Result<Element, AbbreviationError> {
        let name = self.parse_name("element name")?;
        let mut element = Element {
            name,
            id: None,
            classes: Vec::new(),
            repeat: 1,
            children: Vec::new(),
        };
        loop {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    element.classes.push(self.parse_name("class name")?);
                }
                Some('#') => {
                    self.pos += 1;
                    if element.id.is_some() {
                        return Err(self.err("an element can only carry one id"));
                    }
                    element.id = Some(self.parse_name("id")?);
                }
                _ => break,
            }
        }
        Ok(element)
    }

    fn parse_name(&mut self, what: &str) -> Result<String, AbbreviationError> {
        match NAME_PATTERN.find(&self.src[self.pos..]) {
            Some(m) => {
                self.pos += m.end();
                Ok(m.as_str().to_string())
            }
            None => Err(self.err(format!("expected {what}"))),
        }
    }

    fn parse_count(&mut self) -> Result<usize, AbbreviationError> {
        let digits = self.src[self.pos..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Err(self.err("expected a repeat count after '*'"));
        }
        let count: usize = self.src[self.pos..self.pos + digits]
            .parse()
            .map_err(|_| self.err("repeat count is too large"))?;
        if count == 0 {
            return Err(self.err("repeat count must be at least 1"));
        }
        if count > MAX_REPEAT {
            return Err(self.err("repeat count is too large"));
        }
        self.pos += digits;
        Ok(count)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn err(&self, reason: impl Into<String>) -> AbbreviationError {
        AbbreviationError::InvalidAbbreviation {
            position: self.pos,
            reason: reason.into(),
        }
    }
}
