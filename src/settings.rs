//! Settings infrastructure for the editor core.
//!
//! This module provides support for loading and parsing settings.toml
//! files to configure indentation, undo history depth, and theming.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Root settings structure loaded from settings.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Editor configuration.
    pub editor: Option<EditorSettings>,

    /// Palette overrides keyed by theme name, then palette field.
    /// Color values are `#rrggbb` strings; invalid entries are ignored.
    pub themes: Option<HashMap<String, HashMap<String, String>>>,
}

/// Editor settings for the buffer and command layer.
#[derive(Debug, Default, Deserialize)]
pub struct EditorSettings {
    /// Spaces per indent level (default: 2). Ignored when `use_tabs` is set.
    pub indent_width: Option<usize>,

    /// Indent with tabs instead of spaces (default: false).
    pub use_tabs: Option<bool>,

    /// Maximum number of undo steps kept per session (default: 100).
    pub undo_depth: Option<usize>,

    /// Name of the theme selected at mount time (default: "light").
    pub theme: Option<String>,
}

/// Resolved indentation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndentSettings {
    pub width: usize,
    pub use_tabs: bool,
}

impl Default for IndentSettings {
    fn default() -> Self {
        Self {
            width: 2,
            use_tabs: false,
        }
    }
}

impl IndentSettings {
    /// One level of indentation.
    pub fn unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.width)
        }
    }
}

impl Settings {
    /// Resolved indentation configuration.
    pub fn indent(&self) -> IndentSettings {
        let defaults = IndentSettings::default();
        match &self.editor {
            Some(editor) => IndentSettings {
                width: editor.indent_width.unwrap_or(defaults.width).max(1),
                use_tabs: editor.use_tabs.unwrap_or(defaults.use_tabs),
            },
            None => defaults,
        }
    }

    /// Resolved undo depth.
    pub fn undo_depth(&self) -> usize {
        self.editor
            .as_ref()
            .and_then(|e| e.undo_depth)
            .unwrap_or(100)
            .max(1)
    }

    /// Name of the theme selected at mount time.
    pub fn theme_name(&self) -> &str {
        self.editor
            .as_ref()
            .and_then(|e| e.theme.as_deref())
            .unwrap_or("light")
    }

    /// Palette overrides for the given theme name.
    pub fn theme_overrides(&self, name: &str) -> Option<&HashMap<String, String>> {
        self.themes.as_ref()?.get(name)
    }
}

/// Load settings from a settings.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to parse {}: {}", path.display(), e);
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// Discover settings.toml by searching up the directory tree from
/// `start_dir`.
///
/// Returns `(settings, settings_dir)` where `settings_dir` is the
/// directory containing the found settings.toml. If not found, returns
/// `(Settings::default(), start_dir)`.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        let candidate = dir.join("settings.toml");
        if candidate.is_file() {
            return (load_settings(&candidate), dir.to_path_buf());
        }
        current = dir.parent();
    }

    (Settings::default(), start_dir.to_path_buf())
}
