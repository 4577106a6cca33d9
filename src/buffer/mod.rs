//! Buffer state, commands, and session management.
//!
//! This module provides:
//! - `LineIndex` and `Position` for offset <-> line/column conversion
//! - `EditCommand` and the undo/redo history types
//! - `EditorSession` and `SessionStore` for session lifecycle management

mod command;
mod state;
mod text;

pub use command::{CommandError, EditCommand, UndoStep};
pub use state::{EditorBuffer, EditorSession, SessionStore};
pub use text::{LineIndex, Position};
