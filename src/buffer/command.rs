//! Edit commands and undo history.
//!
//! All buffer mutation flows through [`EditCommand`]. Applying a command
//! computes its exact inverse from the buffer state at apply time, so an
//! undo step can restore the prior text bit-for-bit.

use std::ops::Range;

use thiserror::Error;

use crate::syntax::Edit;

/// A single buffer mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Insert `text` at byte offset `at`.
    Insert { at: usize, text: String },
    /// Delete the byte range.
    Delete { range: Range<usize> },
    /// Replace the byte range with `text`.
    Replace { range: Range<usize>, text: String },
}

/// Rejection of a command; the buffer is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("range {start}..{end} is outside the buffer (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("offset {offset} is not a character boundary")]
    NotCharBoundary { offset: usize },
}

/// Result of applying a command: its inverse, the splice it performed,
/// and the caret position after it.
#[derive(Debug, Clone)]
pub(crate) struct Applied {
    pub inverse: EditCommand,
    pub edit: Edit,
    pub caret: usize,
}

impl EditCommand {
    fn span(&self) -> Range<usize> {
        match self {
            EditCommand::Insert { at, .. } => *at..*at,
            EditCommand::Delete { range } | EditCommand::Replace { range, .. } => range.clone(),
        }
    }

    /// Check bounds and character-boundary alignment against `text`.
    pub(crate) fn validate(&self, text: &str) -> Result<(), CommandError> {
        let span = self.span();
        if span.start > span.end || span.end > text.len() {
            return Err(CommandError::OutOfBounds {
                start: span.start,
                end: span.end,
                len: text.len(),
            });
        }
        for offset in [span.start, span.end] {
            if !text.is_char_boundary(offset) {
                return Err(CommandError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    /// Apply this command to `text`, returning the inverse command and the
    /// splice performed. The inverse is computed from the removed content,
    /// so applying it restores the exact prior text.
    pub(crate) fn apply(&self, text: &mut String) -> Result<Applied, CommandError> {
        self.validate(text)?;

        let applied = match self {
            EditCommand::Insert { at, text: inserted } => {
                text.insert_str(*at, inserted);
                Applied {
                    inverse: EditCommand::Delete {
                        range: *at..*at + inserted.len(),
                    },
                    edit: Edit {
                        at: *at,
                        removed: 0,
                        inserted: inserted.len(),
                    },
                    caret: *at + inserted.len(),
                }
            }
            EditCommand::Delete { range } => {
                let removed: String = text.drain(range.clone()).collect();
                Applied {
                    inverse: EditCommand::Insert {
                        at: range.start,
                        text: removed,
                    },
                    edit: Edit {
                        at: range.start,
                        removed: range.end - range.start,
                        inserted: 0,
                    },
                    caret: range.start,
                }
            }
            EditCommand::Replace {
                range,
                text: replacement,
            } => {
                let removed: String = text.drain(range.clone()).collect();
                text.insert_str(range.start, replacement);
                Applied {
                    inverse: EditCommand::Replace {
                        range: range.start..range.start + replacement.len(),
                        text: removed,
                    },
                    edit: Edit {
                        at: range.start,
                        removed: range.end - range.start,
                        inserted: replacement.len(),
                    },
                    caret: range.start + replacement.len(),
                }
            }
        };

        Ok(applied)
    }

    /// The text this command inserts, if any.
    pub(crate) fn inserted_text(&self) -> Option<&str> {
        match self {
            EditCommand::Insert { text, .. } | EditCommand::Replace { text, .. } => Some(text),
            EditCommand::Delete { .. } => None,
        }
    }
}

/// One undoable unit: the commands applied (in order), their inverses, and
/// the cursor position on either side.
///
/// An auto-indent follow-up insert joins the step of the newline that
/// triggered it, so the pair undoes as one.
#[derive(Debug, Clone)]
pub struct UndoStep {
    pub(crate) forward: Vec<EditCommand>,
    pub(crate) inverse: Vec<EditCommand>,
    pub(crate) cursor_before: usize,
    pub(crate) cursor_after: usize,
}

impl UndoStep {
    pub(crate) fn new(cursor_before: usize) -> Self {
        Self {
            forward: Vec::new(),
            inverse: Vec::new(),
            cursor_before,
            cursor_after: cursor_before,
        }
    }

    pub(crate) fn record(&mut self, command: EditCommand, applied: &Applied) {
        self.forward.push(command);
        self.inverse.push(applied.inverse.clone());
        self.cursor_after = applied.caret;
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Bounded undo/redo stacks.
///
/// Overflow evicts the oldest step; eviction drops reachability of that
/// history point but never touches the current buffer state.
#[derive(Debug, Clone)]
pub(crate) struct History {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    depth: usize,
}

impl History {
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Record a completed step. New edits invalidate the redo stack.
    pub(crate) fn push(&mut self, step: UndoStep) {
        if step.is_empty() {
            return;
        }
        self.undo_stack.push(step);
        if self.undo_stack.len() > self.depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Pop the most recent step for undoing; it becomes redoable.
    pub(crate) fn pop_undo(&mut self) -> Option<UndoStep> {
        let step = self.undo_stack.pop()?;
        self.redo_stack.push(step.clone());
        Some(step)
    }

    /// Pop the most recent undone step for redoing; it becomes undoable again.
    pub(crate) fn pop_redo(&mut self) -> Option<UndoStep> {
        let step = self.redo_stack.pop()?;
        self.undo_stack.push(step.clone());
        Some(step)
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_inverse_restores_text() {
        let mut text = "hello world".to_string();
        let cmd = EditCommand::Insert {
            at: 5,
            text: " big".to_string(),
        };
        let applied = cmd.apply(&mut text).unwrap();
        assert_eq!(text, "hello big world");

        applied.inverse.apply(&mut text).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn delete_inverse_restores_text() {
        let mut text = "hello big world".to_string();
        let cmd = EditCommand::Delete { range: 5..9 };
        let applied = cmd.apply(&mut text).unwrap();
        assert_eq!(text, "hello world");

        applied.inverse.apply(&mut text).unwrap();
        assert_eq!(text, "hello big world");
    }

    #[test]
    fn replace_inverse_restores_text() {
        let mut text = "hello world".to_string();
        let cmd = EditCommand::Replace {
            range: 6..11,
            text: "there".to_string(),
        };
        let applied = cmd.apply(&mut text).unwrap();
        assert_eq!(text, "hello there");

        applied.inverse.apply(&mut text).unwrap();
        assert_eq!(text, "hello world");
    }

    #[test]
    fn rejects_out_of_bounds() {
        let mut text = "abc".to_string();
        let cmd = EditCommand::Delete { range: 1..9 };
        let err = cmd.apply(&mut text).unwrap_err();
        assert_eq!(
            err,
            CommandError::OutOfBounds {
                start: 1,
                end: 9,
                len: 3
            }
        );
        assert_eq!(text, "abc");
    }

    #[test]
    fn rejects_split_char_boundary() {
        let mut text = "aé".to_string();
        let cmd = EditCommand::Insert {
            at: 2, // inside 'é'
            text: "x".to_string(),
        };
        let err = cmd.apply(&mut text).unwrap_err();
        assert_eq!(err, CommandError::NotCharBoundary { offset: 2 });
        assert_eq!(text, "aé");
    }

    #[test]
    fn history_evicts_oldest_on_overflow() {
        let mut history = History::new(2);
        for i in 0..3 {
            let mut step = UndoStep::new(0);
            step.forward.push(EditCommand::Insert {
                at: i,
                text: "x".to_string(),
            });
            step.inverse.push(EditCommand::Delete { range: i..i + 1 });
            history.push(step);
        }

        assert!(history.pop_undo().is_some());
        assert!(history.pop_undo().is_some());
        // The first step was evicted
        assert!(history.pop_undo().is_none());
    }

    #[test]
    fn push_clears_redo() {
        let mut history = History::new(10);
        let mut step = UndoStep::new(0);
        step.forward.push(EditCommand::Insert {
            at: 0,
            text: "x".to_string(),
        });
        step.inverse.push(EditCommand::Delete { range: 0..1 });
        history.push(step.clone());

        history.pop_undo();
        assert!(history.can_redo());

        history.push(step);
        assert!(!history.can_redo());
    }
}
