//! Editor session state and the session store.

use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tracing::debug;

use crate::abbrev::{self, AbbreviationError};
use crate::rescan::CompletedScan;
use crate::settings::{IndentSettings, Settings};
use crate::syntax::{indent_for_newline, TokenMap};

use super::command::{CommandError, EditCommand, History, UndoStep};
use super::text::{LineIndex, Position};

/// Characters that can form the abbreviation immediately before the
/// cursor.
const ABBREVIATION_CHARS: &str = ".#*+>-_";

/// The authoritative text with its cursor and selection.
///
/// The text is always valid UTF-8 and the cursor and selection stay
/// within `[0, len]` on character boundaries. Mutation happens only
/// through [`EditorSession::apply`].
#[derive(Debug, Clone)]
pub struct EditorBuffer {
    text: String,
    cursor: usize,
    selection: Option<Range<usize>>,
}

impl EditorBuffer {
    fn new(text: String) -> Self {
        Self {
            text,
            cursor: 0,
            selection: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// A fresh line index over the current text.
    pub fn line_index(&self) -> LineIndex {
        LineIndex::new(self.text.clone())
    }

    /// Clamp an offset into `[0, len]` on a character boundary.
    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

/// One editing session over a block's value.
///
/// Every [`apply`](Self::apply) refreshes the token map incrementally,
/// runs the auto-indent follow-up, and records one undo step before
/// returning; there is no interleaving of two commands.
#[derive(Debug)]
pub struct EditorSession {
    buffer: EditorBuffer,
    tokens: TokenMap,
    history: History,
    indent: IndentSettings,
    generation: Arc<AtomicU64>,
}

impl EditorSession {
    /// Load a session from the host's stored field value.
    ///
    /// Any input is accepted verbatim as literal text; this never fails,
    /// however malformed the markup.
    pub fn load(raw: &str) -> Self {
        Self::with_settings(raw, &Settings::default())
    }

    /// Load a session with explicit settings.
    pub fn with_settings(raw: &str, settings: &Settings) -> Self {
        Self {
            buffer: EditorBuffer::new(raw.to_string()),
            tokens: TokenMap::scan(raw),
            history: History::new(settings.undo_depth()),
            indent: settings.indent(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The value to hand back to the host. Always succeeds and returns
    /// the exact current text.
    pub fn save(&self) -> String {
        self.buffer.text.clone()
    }

    pub fn buffer(&self) -> &EditorBuffer {
        &self.buffer
    }

    pub fn tokens(&self) -> &TokenMap {
        &self.tokens
    }

    pub fn indent_settings(&self) -> IndentSettings {
        self.indent
    }

    /// Move the cursor, clamped to the buffer.
    pub fn set_cursor(&mut self, offset: usize) {
        self.buffer.cursor = self.buffer.clamp(offset);
    }

    /// The cursor as a line/column position, for the host's status line.
    pub fn cursor_position(&self) -> Position {
        self.buffer
            .line_index()
            .offset_to_position(self.buffer.cursor)
    }

    /// Select a range, clamped to the buffer.
    pub fn select(&mut self, range: Range<usize>) {
        let start = self.buffer.clamp(range.start);
        let end = self.buffer.clamp(range.end).max(start);
        self.buffer.selection = Some(start..end);
        self.buffer.cursor = end;
    }

    pub fn clear_selection(&mut self) {
        self.buffer.selection = None;
    }

    /// Apply a command as one undo step.
    ///
    /// A command whose inserted text ends in a newline triggers the
    /// auto-indent policy: the computed indentation is applied as an
    /// additional insert joined to the same step, so the pair undoes as
    /// one. On error the buffer is unchanged.
    pub fn apply(&mut self, command: EditCommand) -> Result<(), CommandError> {
        let needs_indent = command
            .inserted_text()
            .is_some_and(|text| text.ends_with('\n'));

        let mut step = UndoStep::new(self.buffer.cursor);
        self.apply_into_step(command, &mut step)?;

        if needs_indent {
            let at = self.buffer.cursor;
            let unit = self.indent.unit();
            let indent = indent_for_newline(&self.buffer.text, &self.tokens, at, &unit);
            if !indent.is_empty() {
                self.apply_into_step(EditCommand::Insert { at, text: indent }, &mut step)?;
            }
        }

        self.history.push(step);
        Ok(())
    }

    /// Undo the most recent step. Returns `false` when the stack is
    /// exhausted (a disabled-action state, not an error).
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.history.pop_undo() else {
            return false;
        };
        for command in step.inverse.iter().rev() {
            self.replay(command);
        }
        self.buffer.cursor = self.buffer.clamp(step.cursor_before);
        self.buffer.selection = None;
        true
    }

    /// Redo the most recently undone step. Returns `false` when the
    /// stack is exhausted.
    pub fn redo(&mut self) -> bool {
        let Some(step) = self.history.pop_redo() else {
            return false;
        };
        for command in &step.forward {
            self.replay(command);
        }
        self.buffer.cursor = self.buffer.clamp(step.cursor_after);
        self.buffer.selection = None;
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Expand the abbreviation ending at the cursor and replace it with
    /// the rendered fragment as one undo step.
    ///
    /// On rejection the buffer is untouched; the caller surfaces the
    /// error as a transient hint.
    pub fn expand_at_cursor(&mut self) -> Result<(), AbbreviationError> {
        let cursor = self.buffer.cursor;
        let start = abbreviation_start(&self.buffer.text, cursor);
        let fragment = abbrev::parse(&self.buffer.text[start..cursor])?;

        let unit = self.indent.unit();
        let mut markup = abbrev::render(&fragment, &unit);

        // Continuation lines align with the abbreviation's own line.
        let line_indent = line_indent_before(&self.buffer.text, start);
        if !line_indent.is_empty() {
            markup = markup.replace('\n', &format!("\n{line_indent}"));
        }

        let mut step = UndoStep::new(cursor);
        let command = EditCommand::Replace {
            range: start..cursor,
            text: markup,
        };
        if self.apply_into_step(command, &mut step).is_ok() {
            self.history.push(step);
        }
        Ok(())
    }

    /// Current edit generation; bumped on every mutation. A background
    /// scan stamped with an older generation is stale.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn generation_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.generation)
    }

    /// Install a completed background scan, unless an edit arrived after
    /// it was stamped (last-edit-wins; stale results are discarded).
    pub fn try_install_scan(&mut self, scan: CompletedScan) -> bool {
        if scan.generation != self.generation() {
            debug!("discarding superseded background scan");
            return false;
        }
        self.tokens = scan.map;
        true
    }

    fn apply_into_step(
        &mut self,
        command: EditCommand,
        step: &mut UndoStep,
    ) -> Result<(), CommandError> {
        let applied = command.apply(&mut self.buffer.text)?;
        let (tokens, _) = self.tokens.rescan(&applied.edit, &self.buffer.text);
        self.tokens = tokens;
        self.buffer.cursor = applied.caret;
        self.buffer.selection = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
        step.record(command, &applied);
        Ok(())
    }

    /// Re-apply a recorded command during undo/redo. Recorded commands
    /// were valid when captured and replay against the same text, so a
    /// rejection cannot occur; a rejected replay leaves the buffer as-is.
    fn replay(&mut self, command: &EditCommand) {
        if let Ok(applied) = command.apply(&mut self.buffer.text) {
            let (tokens, _) = self.tokens.rescan(&applied.edit, &self.buffer.text);
            self.tokens = tokens;
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Start of the abbreviation run ending at `cursor`: the maximal run of
/// characters from the abbreviation alphabet.
fn abbreviation_start(text: &str, cursor: usize) -> usize {
    let mut start = cursor;
    for (i, c) in text[..cursor].char_indices().rev() {
        if c.is_ascii_alphanumeric() || ABBREVIATION_CHARS.contains(c) {
            start = i;
        } else {
            break;
        }
    }
    start
}

/// Leading whitespace of the line containing `offset`.
fn line_indent_before(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = text[line_start..]
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| line_start + i)
        .unwrap_or(text.len());
    &text[line_start..end]
}

/// Thread-safe storage for the sessions of mounted block instances.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<EditorSession>>>,
}

impl SessionStore {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Open (or replace) the session for a block instance.
    pub fn open(&self, id: &str, raw: &str, settings: &Settings) -> Arc<Mutex<EditorSession>> {
        let session = Arc::new(Mutex::new(EditorSession::with_settings(raw, settings)));
        self.sessions.insert(id.to_string(), Arc::clone(&session));
        debug!("opened session {id:?}");
        session
    }

    /// Get a block instance's session.
    pub fn get(&self, id: &str) -> Option<Arc<Mutex<EditorSession>>> {
        self.sessions.get(id).map(|s| Arc::clone(&s))
    }

    /// Close a block instance's session.
    pub fn close(&self, id: &str) {
        self.sessions.remove(id);
        debug!("closed session {id:?}");
    }
}
