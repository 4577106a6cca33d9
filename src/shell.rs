//! Presentation shell: theming, fullscreen state, and read-only rendering.
//!
//! The shell is a pure view over {current theme, fullscreen flag, buffer
//! snapshot, token sequence}. It never mutates buffer state; its setters
//! touch only shell-local state.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::syntax::{TokenKind, TokenMap};

/// Color palette of a theme. All values are `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Palette {
    pub background: String,
    pub foreground: String,
    pub selection: String,
    pub cursor: String,
    pub line_highlight: String,
    pub gutter_background: String,
    pub gutter_foreground: String,
    pub keyword: String,
    pub string: String,
    pub number: String,
    pub comment: String,
    pub tag: String,
    pub attribute: String,
    pub value: String,
    pub bracket: String,
    pub operator: String,
}

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

impl Palette {
    fn light() -> Self {
        Self {
            background: "#ffffff".into(),
            foreground: "#1a1a1a".into(),
            selection: "#d9e4f5".into(),
            cursor: "#1a1a1a".into(),
            line_highlight: "#f5f5f5".into(),
            gutter_background: "#f8f8f8".into(),
            gutter_foreground: "#999999".into(),
            keyword: "#7928a1".into(),
            string: "#2e7d32".into(),
            number: "#1565c0".into(),
            comment: "#757575".into(),
            tag: "#d32f2f".into(),
            attribute: "#ff6f00".into(),
            value: "#2e7d32".into(),
            bracket: "#1a1a1a".into(),
            operator: "#1a1a1a".into(),
        }
    }

    fn dark() -> Self {
        Self {
            background: "#1a1a1a".into(),
            foreground: "#e0e0e0".into(),
            selection: "#3d5a80".into(),
            cursor: "#e0e0e0".into(),
            line_highlight: "#2a2a2a".into(),
            gutter_background: "#1a1a1a".into(),
            gutter_foreground: "#666666".into(),
            keyword: "#c792ea".into(),
            string: "#c3e88d".into(),
            number: "#82aaff".into(),
            comment: "#757575".into(),
            tag: "#f07178".into(),
            attribute: "#ffcb6b".into(),
            value: "#c3e88d".into(),
            bracket: "#e0e0e0".into(),
            operator: "#89ddff".into(),
        }
    }

    /// Set a palette field by its settings name. Returns `false` for an
    /// unknown field.
    fn set(&mut self, field: &str, value: &str) -> bool {
        let slot = match field {
            "background" => &mut self.background,
            "foreground" => &mut self.foreground,
            "selection" => &mut self.selection,
            "cursor" => &mut self.cursor,
            "line_highlight" => &mut self.line_highlight,
            "gutter_background" => &mut self.gutter_background,
            "gutter_foreground" => &mut self.gutter_foreground,
            "keyword" => &mut self.keyword,
            "string" => &mut self.string,
            "number" => &mut self.number,
            "comment" => &mut self.comment,
            "tag" => &mut self.tag,
            "attribute" => &mut self.attribute,
            "value" => &mut self.value,
            "bracket" => &mut self.bracket,
            "operator" => &mut self.operator,
            _ => return false,
        };
        *slot = value.to_string();
        true
    }

    /// Color used for a token kind when generating a stylesheet.
    fn color_for(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Tag => &self.tag,
            TokenKind::AttrName | TokenKind::Property => &self.attribute,
            TokenKind::AttrValue => &self.value,
            TokenKind::String => &self.string,
            TokenKind::Number | TokenKind::Entity => &self.number,
            TokenKind::Comment | TokenKind::Doctype => &self.comment,
            TokenKind::Keyword => &self.keyword,
            TokenKind::Selector => &self.tag,
            TokenKind::Punct => &self.operator,
            TokenKind::Text | TokenKind::Ident | TokenKind::Unknown => &self.foreground,
        }
    }
}

/// Host theme preference, as reported by the embedding admin UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostThemePreference {
    Light,
    Dark,
    /// Defer to the system preference.
    System,
}

/// A named theme with its palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub dark: bool,
    pub palette: Palette,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "light",
            dark: false,
            palette: Palette::light(),
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "dark",
            dark: true,
            palette: Palette::dark(),
        }
    }

    /// Look up a theme by name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    /// Resolve the host's preference to a theme. `System` defers to
    /// `system_dark`.
    pub fn resolve(preference: HostThemePreference, system_dark: bool) -> Self {
        match preference {
            HostThemePreference::Light => Self::light(),
            HostThemePreference::Dark => Self::dark(),
            HostThemePreference::System => {
                if system_dark {
                    Self::dark()
                } else {
                    Self::light()
                }
            }
        }
    }

    /// Apply palette overrides from settings. Invalid colors and unknown
    /// fields are ignored.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) {
        for (field, color) in overrides {
            if !HEX_COLOR.is_match(color) {
                warn!("ignoring invalid color {color:?} for theme field {field:?}");
                continue;
            }
            if !self.palette.set(field, color) {
                warn!("ignoring unknown theme field {field:?}");
            }
        }
    }

    /// Generate the stylesheet for this theme's rendered markup.
    pub fn stylesheet(&self) -> String {
        let scope = format!(".htmledit--{}", self.name);
        let palette = &self.palette;
        let mut css = format!(
            "{scope} {{ background: {}; color: {}; }}\n",
            palette.background, palette.foreground
        );
        for kind in [
            TokenKind::Tag,
            TokenKind::AttrName,
            TokenKind::AttrValue,
            TokenKind::Entity,
            TokenKind::Comment,
            TokenKind::Doctype,
            TokenKind::Selector,
            TokenKind::Property,
            TokenKind::Keyword,
            TokenKind::String,
            TokenKind::Number,
            TokenKind::Punct,
        ] {
            css.push_str(&format!(
                "{scope} .tok-{} {{ color: {}; }}\n",
                kind.css_class(),
                palette.color_for(kind)
            ));
        }
        css.push_str(&format!("{scope} .tok-comment {{ font-style: italic; }}\n"));
        css
    }
}

/// Shell-local presentation state.
#[derive(Debug, Clone)]
pub struct ShellState {
    theme: Theme,
    fullscreen: bool,
}

impl ShellState {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            fullscreen: false,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Switch to the named theme. An unrecognized name falls back to the
    /// default theme; no error is surfaced.
    pub fn set_theme(&mut self, name: &str) {
        self.theme = Theme::by_name(name).unwrap_or_else(|| {
            warn!("unknown theme {name:?}, falling back to the default");
            Theme::light()
        });
    }

    /// Apply palette overrides to the current theme.
    pub fn apply_theme_overrides(&mut self, overrides: &HashMap<String, String>) {
        self.theme.apply_overrides(overrides);
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Toggle fullscreen and return the new state.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }
}

/// Render a buffer snapshot to static, read-only markup.
///
/// Each token becomes a `<span>` carrying its kind's class; the content
/// is HTML-escaped and wrapped in a `<pre>` scoped to the theme.
pub fn render_static(text: &str, theme: &Theme) -> String {
    let map = TokenMap::scan(text);
    let mut out = format!("<pre class=\"htmledit htmledit--{}\">", theme.name);
    for token in map.tokens() {
        out.push_str(&format!(
            "<span class=\"tok-{}\">{}</span>",
            token.kind.css_class(),
            escape(&text[token.range()])
        ));
    }
    out.push_str("</pre>");
    out
}

/// Escape text for embedding in markup.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
