use expect_test::expect;
use htmledit::{
    BlockError, ContentBlock, EditCommand, Edit, HtmlBlock, Token, TokenMap,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format tokens into a deterministic, human-readable string.
///
/// Each token becomes one line:
///   <start>..<end> <kind> <lexeme>
fn format_tokens(text: &str, tokens: &[Token]) -> String {
    if tokens.is_empty() {
        return "(no tokens)".to_string();
    }
    tokens
        .iter()
        .map(|t| format!("{}..{} {:?} {:?}", t.start, t.end, t.kind, &text[t.range()]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Mount a block instance `"b"` around the given value.
fn mounted(value: &str) -> HtmlBlock {
    let block = HtmlBlock::new();
    block.on_mount("b", value);
    block
}

/// Assert the token sequence is contiguous, non-overlapping, and covers
/// the whole text.
fn assert_covers(tokens: &[Token], text: &str) {
    let mut expected_start = 0;
    for token in tokens {
        assert_eq!(token.start, expected_start, "gap or overlap in {text:?}");
        assert!(token.end > token.start, "empty token in {text:?}");
        expected_start = token.end;
    }
    assert_eq!(expected_start, text.len(), "tokens do not cover {text:?}");
}

// ---------------------------------------------------------------------------
// Persistence round trip
// ---------------------------------------------------------------------------

#[test]
fn round_trip_is_lossless() {
    let cases = [
        "",
        "<p>Hello, World!</p>",
        "plain text, no markup",
        "a & b < c > d \" e ' f",
        "<div class=\"broken",
        "line one\nline two\r\nline three\n",
        "emoji 😀 café ünïcode",
        "<script>if (a < b) { alert('x'); }</script>",
    ];
    for raw in cases {
        let block = mounted(raw);
        assert_eq!(block.on_serialize("b").as_deref(), Some(raw));
    }
}

#[test]
fn malformed_markup_is_accepted_verbatim() {
    // This block edits raw markup, it does not validate it.
    let raw = "<<<not <html// &&&";
    let block = mounted(raw);
    assert_eq!(block.on_serialize("b").as_deref(), Some(raw));
}

// ---------------------------------------------------------------------------
// Block metadata and read-only rendering
// ---------------------------------------------------------------------------

#[test]
fn block_capability_surface() {
    let block = HtmlBlock::new();
    assert_eq!(block.icon(), "code");
    assert_eq!(block.label(), "HTML");
    assert_eq!(block.default_value(), "");
}

#[test]
fn render_produces_escaped_static_markup() {
    let block = HtmlBlock::new();
    let html = block.render("<p>a & b</p>");
    assert!(html.starts_with("<pre class=\"htmledit htmledit--light\">"));
    assert!(html.ends_with("</pre>"));
    assert!(html.contains("&lt;p&gt;"));
    assert!(html.contains("a &amp; b"));
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

#[test]
fn undo_redo_inverse_law() {
    let block = mounted("<p>one</p>");
    block
        .apply(
            "b",
            EditCommand::Replace {
                range: 3..6,
                text: "two".to_string(),
            },
        )
        .unwrap();
    assert_eq!(block.on_serialize("b").as_deref(), Some("<p>two</p>"));

    assert!(block.undo("b").unwrap());
    assert_eq!(block.on_serialize("b").as_deref(), Some("<p>one</p>"));

    assert!(block.redo("b").unwrap());
    assert_eq!(block.on_serialize("b").as_deref(), Some("<p>two</p>"));
}

#[test]
fn exhausted_stacks_report_disabled_state() {
    let block = mounted("<p>x</p>");
    assert!(!block.undo("b").unwrap());
    assert!(!block.redo("b").unwrap());
    assert_eq!(block.on_serialize("b").as_deref(), Some("<p>x</p>"));
}

#[test]
fn rejected_command_changes_nothing() {
    let block = mounted("abc");
    let err = block
        .apply(
            "b",
            EditCommand::Delete { range: 0..99 },
        )
        .unwrap_err();
    assert!(matches!(err, BlockError::Command(_)));
    assert_eq!(block.on_serialize("b").as_deref(), Some("abc"));
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[test]
fn tokens_cover_every_document() {
    let cases = [
        "",
        "x",
        "<p>hi</p>",
        "<!DOCTYPE html><html><body><p>a&amp;b</p></body></html>",
        "<style>p { color: #fff; }</style>",
        "<script>let x = `tpl`;</script>",
        "<div class=\"unterminated",
        "<!-- unterminated",
        "just text & more",
    ];
    for text in cases {
        let block = mounted(text);
        assert_covers(&block.tokens("b").unwrap(), text);
    }
}

#[test]
fn token_snapshot_of_a_small_document() {
    let text = "<p class=\"a\">x &amp; y</p>";
    let block = mounted(text);
    let actual = format_tokens(text, &block.tokens("b").unwrap());
    let expected = expect![[r#"
        0..2 Tag "<p"
        2..3 Text " "
        3..8 AttrName "class"
        8..9 Punct "="
        9..12 AttrValue "\"a\""
        12..13 Tag ">"
        13..15 Text "x "
        15..20 Entity "&amp;"
        20..22 Text " y"
        22..26 Tag "</p>""#]];
    expected.assert_eq(&actual);
}

#[test]
fn unterminated_tag_degrades_instead_of_failing() {
    let text = "<p>ok</p><div class=\"half";
    let block = mounted(text);
    let tokens = block.tokens("b").unwrap();
    assert_covers(&tokens, text);
    let last = tokens.last().unwrap();
    assert_eq!(format!("{:?}", last.kind), "Unknown");
    assert_eq!(last.end, text.len());
}

#[test]
fn incremental_rescan_stays_local() {
    let mut text = String::from("<ol>\n");
    for i in 0..150 {
        text.push_str(&format!("  <li>row {i}</li>\n"));
    }
    text.push_str("</ol>\n");
    let map = TokenMap::scan(&text);

    let at = text.find("row 75").unwrap();
    let edit = Edit {
        at,
        removed: 3,
        inserted: 3,
    };
    let new_text = {
        let mut s = text.clone();
        s.replace_range(at..at + 3, "col");
        s
    };
    let (rescanned, stats) = map.rescan(&edit, &new_text);

    // Identical to a from-scratch scan, but built almost entirely from
    // reused tokens.
    assert_eq!(rescanned.tokens(), TokenMap::scan(&new_text).tokens());
    assert!(stats.reused_prefix > 300, "prefix {}", stats.reused_prefix);
    assert!(stats.reused_suffix > 300, "suffix {}", stats.reused_suffix);
    assert!(stats.relexed.end - stats.relexed.start < 60);

    // Token arrays outside the edit are identical to the originals.
    assert_eq!(
        &rescanned.tokens()[..stats.reused_prefix],
        &map.tokens()[..stats.reused_prefix]
    );
}

// ---------------------------------------------------------------------------
// Abbreviation expansion
// ---------------------------------------------------------------------------

#[test]
fn abbreviation_expands_to_structured_fragment() {
    let block = mounted("div.card>h1+p*2");
    block.set_cursor("b", 15).unwrap();
    block.expand_at_cursor("b").unwrap();

    let actual = block.on_serialize("b").unwrap();
    let expected = expect![[r#"
        <div class="card">
          <h1></h1>
          <p></p>
          <p></p>
        </div>"#]];
    expected.assert_eq(&actual);
}

#[test]
fn abbreviation_expansion_is_one_undo_step() {
    let block = mounted("ul>li*3");
    block.set_cursor("b", 7).unwrap();
    block.expand_at_cursor("b").unwrap();
    assert!(block.on_serialize("b").unwrap().contains("<li></li>"));

    assert!(block.undo("b").unwrap());
    assert_eq!(block.on_serialize("b").as_deref(), Some("ul>li*3"));
}

#[test]
fn invalid_abbreviation_is_rejected_with_buffer_untouched() {
    let block = mounted("div>>bad");
    block.set_cursor("b", 8).unwrap();
    let err = block.expand_at_cursor("b").unwrap_err();
    assert!(matches!(err, BlockError::Abbreviation(_)));
    assert_eq!(block.on_serialize("b").as_deref(), Some("div>>bad"));
    // Nothing to undo: no partial insertion happened.
    assert!(!block.undo("b").unwrap());
}

// ---------------------------------------------------------------------------
// Auto-indentation
// ---------------------------------------------------------------------------

#[test]
fn newline_indents_one_level_deeper_than_open_construct() {
    let value = "<ul>\n  <li>x</li>\n";
    let block = mounted(value);
    block
        .apply(
            "b",
            EditCommand::Insert {
                at: value.len(),
                text: "\n".to_string(),
            },
        )
        .unwrap();

    // `<li>` is closed again, so `<ul>` is the enclosing construct: the
    // new line sits one level deeper than `<ul>`'s indentation.
    assert_eq!(
        block.on_serialize("b").as_deref(),
        Some("<ul>\n  <li>x</li>\n\n  ")
    );

    // The newline and its indentation undo as a single step.
    assert!(block.undo("b").unwrap());
    assert_eq!(block.on_serialize("b").as_deref(), Some(value));
}

// ---------------------------------------------------------------------------
// Presentation shell
// ---------------------------------------------------------------------------

#[test]
fn theme_switching_and_fallback() {
    let block = mounted("<p>x</p>");
    assert_eq!(block.theme_of("b").unwrap().name, "light");

    block.set_theme("b", "dark").unwrap();
    assert_eq!(block.theme_of("b").unwrap().name, "dark");

    // Unrecognized names fall back to the default theme, silently.
    block.set_theme("b", "hotdog-stand").unwrap();
    assert_eq!(block.theme_of("b").unwrap().name, "light");

    // Shell state never touches the buffer.
    assert_eq!(block.on_serialize("b").as_deref(), Some("<p>x</p>"));
}

#[test]
fn fullscreen_is_shell_local() {
    let block = mounted("<p>x</p>");
    assert!(block.toggle_fullscreen("b").unwrap());
    assert!(!block.toggle_fullscreen("b").unwrap());
    assert_eq!(block.on_serialize("b").as_deref(), Some("<p>x</p>"));
}

#[test]
fn settings_theme_overrides_reach_the_palette() {
    let fixture = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/themed/settings.toml");
    let settings = htmledit::load_settings(&fixture);

    let block = HtmlBlock::with_settings(settings);
    block.on_mount("b", "");
    let theme = block.theme_of("b").unwrap();
    assert_eq!(theme.name, "dark");
    assert_eq!(theme.palette.background, "#101010");
}

#[test]
fn settings_control_indentation() {
    let fixture = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/themed/settings.toml");
    let settings = htmledit::load_settings(&fixture);

    let block = HtmlBlock::with_settings(settings);
    let value = "<div>\n";
    block.on_mount("b", value);
    block
        .apply(
            "b",
            EditCommand::Insert {
                at: value.len(),
                text: "\n".to_string(),
            },
        )
        .unwrap();
    // indent_width = 4 in the fixture.
    assert_eq!(block.on_serialize("b").as_deref(), Some("<div>\n\n    "));
}

// ---------------------------------------------------------------------------
// Instance isolation
// ---------------------------------------------------------------------------

#[test]
fn instances_do_not_share_state() {
    let block = HtmlBlock::new();
    block.on_mount("first", "<p>a</p>");
    block.on_mount("second", "<p>b</p>");

    block
        .apply(
            "first",
            EditCommand::Insert {
                at: 3,
                text: "!".to_string(),
            },
        )
        .unwrap();
    block.set_theme("second", "dark").unwrap();

    assert_eq!(block.on_serialize("first").as_deref(), Some("<p>!a</p>"));
    assert_eq!(block.on_serialize("second").as_deref(), Some("<p>b</p>"));
    assert_eq!(block.theme_of("first").unwrap().name, "light");
    assert_eq!(block.theme_of("second").unwrap().name, "dark");
}

#[test]
fn unmounted_instances_reject_operations() {
    let block = HtmlBlock::new();
    let err = block.tokens("ghost").unwrap_err();
    assert!(matches!(err, BlockError::UnknownInstance(_)));
}
