//! Fragment rendering.
//!
//! Expansion output is deterministic: one element per line, children one
//! indent level deeper, void elements self-closing.

use crate::syntax::is_void_element;

use super::parser::{parse, AbbreviationError, Element, Fragment};

/// Expand an abbreviation into a markup fragment.
///
/// `indent_unit` is one level of indentation (spaces or a tab). The
/// result has no trailing newline.
pub fn expand(abbreviation: &str, indent_unit: &str) -> Result<String, AbbreviationError> {
    let fragment = parse(abbreviation)?;
    Ok(render(&fragment, indent_unit))
}

/// Render a parsed fragment to markup text.
pub fn render(fragment: &Fragment, indent_unit: &str) -> String {
    let mut lines = Vec::new();
    for root in &fragment.roots {
        render_element(root, 0, indent_unit, &mut lines);
    }
    lines.join("\n")
}

fn render_element(element: &Element, depth: usize, unit: &str, lines: &mut Vec<String>) {
    let indent = unit.repeat(depth);
    let attrs = render_attrs(element);

    for _ in 0..element.repeat {
        if is_void_element(&element.name) {
            lines.push(format!("{indent}<{}{attrs} />", element.name));
        } else if element.children.is_empty() {
            lines.push(format!("{indent}<{0}{attrs}></{0}>", element.name));
        } else {
            lines.push(format!("{indent}<{}{attrs}>", element.name));
            for child in &element.children {
                render_element(child, depth + 1, unit, lines);
            }
            lines.push(format!("{indent}</{}>", element.name));
        }
    }
}

fn render_attrs(element: &Element) -> String {
    let mut attrs = String::new();
    if let Some(id) = &element.id {
        attrs.push_str(&format!(" id=\"{id}\""));
    }
    if !element.classes.is_empty() {
        attrs.push_str(&format!(" class=\"{}\"", element.classes.join(" ")));
    }
    attrs
}
