//! Embeddable HTML source-editing core for CMS content blocks.
//!
//! The crate implements the engine behind a raw-HTML content block:
//! syntax-aware tokenization, Emmet-style abbreviation expansion, a
//! command-mediated buffer with undo/redo and auto-indentation, theming,
//! and lossless persistence of the block's single string field.
//!
//! The host CMS constructs an [`HtmlBlock`] explicitly at startup (there
//! is no global registry) and drives it through the lifecycle hooks
//! [`on_mount`](HtmlBlock::on_mount),
//! [`on_serialize`](HtmlBlock::on_serialize), and
//! [`on_unmount`](HtmlBlock::on_unmount). All host I/O (database,
//! admin UI) stays on the host's side of that boundary.

use std::sync::PoisonError;

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

mod abbrev;
mod buffer;
mod rescan;
pub(crate) mod settings;
mod shell;
mod syntax;

pub use abbrev::{expand, parse, AbbreviationError, Element, Fragment};
pub use buffer::{
    CommandError, EditCommand, EditorBuffer, EditorSession, LineIndex, Position, SessionStore,
    UndoStep,
};
pub use rescan::{spawn_rescan, CompletedScan, ScanTask, BACKGROUND_SCAN_THRESHOLD};
pub use settings::{discover_settings, load_settings, IndentSettings, Settings};
pub use shell::{render_static, HostThemePreference, Palette, ShellState, Theme};
pub use syntax::{Edit, RescanStats, Token, TokenKind, TokenMap};

/// Capability surface a content block exposes to the host's block
/// registry.
pub trait ContentBlock {
    /// Icon identifier shown in the host's block picker.
    fn icon(&self) -> &str;
    /// Display label shown in the host's block picker.
    fn label(&self) -> &str;
    /// Field value for a freshly inserted block.
    fn default_value(&self) -> String;
    /// Render a stored value for read-only contexts.
    fn render(&self, value: &str) -> String;
}

/// Failure of a block-surface operation.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("no mounted block instance with id {0:?}")]
    UnknownInstance(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Abbreviation(#[from] AbbreviationError),
}

/// The HTML editing block.
///
/// Holds one [`EditorSession`] and one [`ShellState`] per mounted block
/// instance, keyed by the instance id the host assigns.
#[derive(Debug, Default)]
pub struct HtmlBlock {
    sessions: SessionStore,
    shells: DashMap<String, ShellState>,
    settings: Settings,
}

impl HtmlBlock {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            sessions: SessionStore::new(),
            shells: DashMap::new(),
            settings,
        }
    }

    /// Build the named theme with any configured palette overrides,
    /// falling back to the default theme for unknown names.
    fn theme(&self, name: &str) -> Theme {
        let mut theme = Theme::by_name(name).unwrap_or_else(Theme::light);
        if let Some(overrides) = self.settings.theme_overrides(theme.name) {
            theme.apply_overrides(overrides);
        }
        theme
    }

    // ------------------------------------------------------------------
    // Lifecycle hooks
    // ------------------------------------------------------------------

    /// Mount a block instance around its stored field value.
    ///
    /// The value is read exactly once here; it is accepted verbatim,
    /// however malformed as markup.
    pub fn on_mount(&self, id: &str, initial_value: &str) {
        self.sessions.open(id, initial_value, &self.settings);
        let theme = self.theme(self.settings.theme_name());
        self.shells.insert(id.to_string(), ShellState::new(theme));
        debug!("mounted block instance {id:?}");
    }

    /// Serialize the instance's current value for the host to store.
    ///
    /// Always succeeds for a mounted instance; the returned string is
    /// the exact buffer text.
    pub fn on_serialize(&self, id: &str) -> Option<String> {
        let session = self.sessions.get(id)?;
        let guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        Some(guard.save())
    }

    /// Drop the instance's session and shell state.
    pub fn on_unmount(&self, id: &str) {
        self.sessions.close(id);
        self.shells.remove(id);
        debug!("unmounted block instance {id:?}");
    }

    // ------------------------------------------------------------------
    // Editing surface
    // ------------------------------------------------------------------

    fn with_session<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> Result<R, BlockError> {
        let session = self
            .sessions
            .get(id)
            .ok_or_else(|| BlockError::UnknownInstance(id.to_string()))?;
        let mut guard = session.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut guard))
    }

    /// Apply an edit command to the instance's buffer.
    pub fn apply(&self, id: &str, command: EditCommand) -> Result<(), BlockError> {
        self.with_session(id, |session| session.apply(command))?
            .map_err(Into::into)
    }

    /// Undo one step. `Ok(false)` means the stack was exhausted.
    pub fn undo(&self, id: &str) -> Result<bool, BlockError> {
        self.with_session(id, |session| session.undo())
    }

    /// Redo one step. `Ok(false)` means the stack was exhausted.
    pub fn redo(&self, id: &str) -> Result<bool, BlockError> {
        self.with_session(id, |session| session.redo())
    }

    /// Move the instance's cursor.
    pub fn set_cursor(&self, id: &str, offset: usize) -> Result<(), BlockError> {
        self.with_session(id, |session| session.set_cursor(offset))
    }

    /// The instance's cursor as a line/column position.
    pub fn cursor_position(&self, id: &str) -> Result<Position, BlockError> {
        self.with_session(id, |session| session.cursor_position())
    }

    /// Expand the abbreviation ending at the cursor.
    pub fn expand_at_cursor(&self, id: &str) -> Result<(), BlockError> {
        self.with_session(id, |session| session.expand_at_cursor())?
            .map_err(Into::into)
    }

    /// Snapshot of the instance's current token sequence.
    pub fn tokens(&self, id: &str) -> Result<Vec<Token>, BlockError> {
        self.with_session(id, |session| session.tokens().tokens().to_vec())
    }

    // ------------------------------------------------------------------
    // Presentation surface
    // ------------------------------------------------------------------

    /// Switch the instance's theme. Unknown names fall back to the
    /// default theme; no error is surfaced.
    pub fn set_theme(&self, id: &str, name: &str) -> Result<(), BlockError> {
        let mut shell = self
            .shells
            .get_mut(id)
            .ok_or_else(|| BlockError::UnknownInstance(id.to_string()))?;
        shell.set_theme(name);
        if let Some(overrides) = self.settings.theme_overrides(shell.theme().name) {
            shell.apply_theme_overrides(overrides);
        }
        Ok(())
    }

    /// Toggle fullscreen and return the new state.
    pub fn toggle_fullscreen(&self, id: &str) -> Result<bool, BlockError> {
        let mut shell = self
            .shells
            .get_mut(id)
            .ok_or_else(|| BlockError::UnknownInstance(id.to_string()))?;
        Ok(shell.toggle_fullscreen())
    }

    /// The instance's current theme.
    pub fn theme_of(&self, id: &str) -> Result<Theme, BlockError> {
        let shell = self
            .shells
            .get(id)
            .ok_or_else(|| BlockError::UnknownInstance(id.to_string()))?;
        Ok(shell.theme().clone())
    }
}

impl ContentBlock for HtmlBlock {
    fn icon(&self) -> &str {
        "code"
    }

    fn label(&self) -> &str {
        "HTML"
    }

    fn default_value(&self) -> String {
        String::new()
    }

    fn render(&self, value: &str) -> String {
        render_static(value, &self.theme(self.settings.theme_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_metadata() {
        let block = HtmlBlock::new();
        assert_eq!(block.icon(), "code");
        assert_eq!(block.label(), "HTML");
        assert_eq!(block.default_value(), "");
    }

    #[test]
    fn mount_serialize_unmount() {
        let block = HtmlBlock::new();
        block.on_mount("b1", "<p>hi</p>");
        assert_eq!(block.on_serialize("b1").as_deref(), Some("<p>hi</p>"));

        block.on_unmount("b1");
        assert!(block.on_serialize("b1").is_none());
    }

    #[test]
    fn operations_on_unmounted_instance_fail() {
        let block = HtmlBlock::new();
        let err = block.undo("missing").unwrap_err();
        assert!(matches!(err, BlockError::UnknownInstance(_)));
    }
}
