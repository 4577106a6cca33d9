//! Syntax-aware scanning and indentation.
//!
//! This module provides:
//! - `TokenKind` and the static name tables for classification
//! - `TokenMap` for full and incremental scans of a buffer snapshot
//! - `indent_for_newline` for the auto-indent policy

mod indent;
mod kinds;
mod scanner;

pub use indent::indent_for_newline;
pub use kinds::{is_void_element, TokenKind};
pub use scanner::{Edit, RescanStats, Token, TokenMap};
