//! Deck builder: source text to an immutable [`Deck`].

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use stardeck_core::{AnimationDefaults, Deck, DeckConfig, DeckError, DeckSource, Diagnostic, Slide};
use tracing::{debug, warn};

use crate::click::parse_clicks;
use crate::emit::{emit, RenderMode};
use crate::frontmatter::{extract_notes, parse_frontmatter};
use crate::renderer::{CmarkRenderer, MarkdownRenderer};
use crate::resolve::resolve;
use crate::split::{split_slides, RawSlide};
use crate::transform::{cls_to_class, transform_regions};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>").unwrap());
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Knobs for building a deck.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub mode: RenderMode,
}

/// Parse a whole deck with the default renderer.
pub fn parse_deck_str(content: &str, options: ParseOptions) -> Result<Deck, DeckError> {
    parse_deck(content, None, options, &CmarkRenderer)
}

/// Parse deck source into a [`Deck`]. Authoring problems become per-slide
/// diagnostics; this only fails if the resulting deck violates its own
/// invariants.
pub fn parse_deck(
    content: &str,
    path: Option<PathBuf>,
    options: ParseOptions,
    renderer: &dyn MarkdownRenderer,
) -> Result<Deck, DeckError> {
    let raw_slides = split_slides(content);

    let first_fm = raw_slides
        .first()
        .map(|raw| parse_frontmatter(&raw.content).frontmatter)
        .unwrap_or_default();
    let config = DeckConfig::from_frontmatter(&first_fm);
    let deck_layer = config.animation.over(&AnimationDefaults::builtin());

    let slides: Vec<Slide> = raw_slides
        .iter()
        .enumerate()
        .map(|(index, raw)| build_slide(index, raw, &deck_layer, options, renderer))
        .collect();

    for d in slides.iter().flat_map(|s| s.diagnostics.iter()) {
        warn!(slide = d.slide, line = d.line, kind = %d.kind, "{}", d.message);
    }
    debug!(slides = slides.len(), title = %config.title, "Parsed deck");

    Deck::new(slides, config, DeckSource::from_content(path, content))
}

/// Read and parse a deck file.
pub fn load_deck(path: &Path, options: ParseOptions) -> Result<Deck, DeckError> {
    let content = std::fs::read_to_string(path).map_err(|source| DeckError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_deck(&content, Some(path.to_path_buf()), options, &CmarkRenderer)
}

fn build_slide(
    index: usize,
    raw: &RawSlide,
    deck_layer: &AnimationDefaults,
    options: ParseOptions,
    renderer: &dyn MarkdownRenderer,
) -> Slide {
    let parsed = parse_frontmatter(&raw.content);
    let body_offset = raw.start_line + parsed.body_line;

    let (body, notes) = extract_notes(&parsed.body);
    let body = cls_to_class(&transform_regions(&body));

    let clicks = parse_clicks(&body);
    let resolution = resolve(&clicks.nodes);

    let slide_layer = parsed.frontmatter.animation_layer();
    let base = slide_layer.over(deck_layer);
    let markup = emit(&clicks.nodes, &resolution.reveals, &base, options.mode);
    let mut html = renderer.render(&markup);

    let mut diagnostics: Vec<Diagnostic> = parsed
        .diagnostics
        .into_iter()
        .map(|d| d.placed(index, raw.start_line))
        .collect();
    let mut body_diagnostics: Vec<Diagnostic> = clicks
        .diagnostics
        .into_iter()
        .chain(resolution.diagnostics)
        .map(|d| d.placed(index, body_offset))
        .collect();
    body_diagnostics.sort_by_key(|d| d.line);
    diagnostics.extend(body_diagnostics);

    if !diagnostics.is_empty() {
        html.insert_str(0, &warning_block(&diagnostics));
    }

    Slide {
        index,
        start_line: raw.start_line,
        end_line: raw.end_line,
        raw: raw.content.clone(),
        title: first_heading(&html),
        html,
        frontmatter: parsed.frontmatter,
        notes,
        reveals: resolution.reveals,
        max_step: resolution.max_step,
        diagnostics,
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Visible inline warning listing a slide's authoring problems.
fn warning_block(diagnostics: &[Diagnostic]) -> String {
    let items: String = diagnostics
        .iter()
        .map(|d| format!("<li>line {}: {}</li>", d.line + 1, escape_html(&d.message)))
        .collect();
    format!("<div class=\"stardeck-warning\" role=\"alert\"><strong>Click markup problems</strong><ul>{items}</ul></div>\n")
}

/// Text of the first heading in rendered HTML.
fn first_heading(html: &str) -> Option<String> {
    HEADING.captures_iter(html).find_map(|caps| {
        let text = unescape_html(HTML_TAG.replace_all(&caps[1], "").trim());
        (!text.is_empty()).then_some(text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_core::{DiagnosticKind, RevealKind};
    use std::io::Write;

    fn parse(src: &str) -> Deck {
        parse_deck_str(src, ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_basic_deck() {
        let deck = parse("# Slide 1\n---\n# Slide 2\n---\n# Slide 3");
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.slide(1).unwrap().title.as_deref(), Some("Slide 2"));
        assert!(deck.slide(0).unwrap().html.contains("<h1>Slide 1</h1>"));
        assert!(deck.slides().iter().all(|s| s.max_step == 0));
    }

    #[test]
    fn test_empty_source_is_one_slide() {
        let deck = parse("");
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.slide(0).unwrap().max_step, 0);
    }

    #[test]
    fn test_deck_config_from_first_slide() {
        let deck = parse("---\ntitle: My Talk\ntransition: slide-up\n---\n# Intro\n---\n# Next");
        assert_eq!(deck.config.title, "My Talk");
        assert_eq!(deck.config.transition, "slide-up");
        assert_eq!(deck.slide(0).unwrap().title.as_deref(), Some("Intro"));
    }

    #[test]
    fn test_default_deck_config() {
        let deck = parse("# Hello");
        assert_eq!(deck.config.title, "Untitled");
        assert_eq!(deck.config.transition, "fade");
    }

    #[test]
    fn test_notes_and_frontmatter_per_slide() {
        let deck = parse("# One\n<!-- notes\nSay hi\n-->\n---\nlayout: cover\n---\n# Two");
        assert_eq!(deck.slide(0).unwrap().notes.as_deref(), Some("Say hi"));
        assert!(!deck.slide(0).unwrap().html.contains("Say hi"));
        assert_eq!(deck.slide(1).unwrap().layout(), "cover");
    }

    #[test]
    fn test_clicks_scenario_collision() {
        let deck = parse(r#"<click>A</click><click at="1">B</click>"#);
        let slide = deck.slide(0).unwrap();
        assert_eq!(slide.max_step, 1);
        assert_eq!(slide.visible_at(0), Vec::<usize>::new());
        assert_eq!(slide.visible_at(1), vec![0, 1]);
    }

    #[test]
    fn test_swap_renders_in_container() {
        let deck = parse("# Swap\n\n<click hide>Before</click>\n<after>After</after>");
        let slide = deck.slide(0).unwrap();
        assert_eq!(slide.max_step, 1);
        assert_eq!(slide.reveals[0].kind, RevealKind::Hide);
        assert!(slide.html.contains(r#"<div class="click-swap">"#));
        assert!(slide.html.contains("<p>Before</p>"));
        assert!(slide.html.contains("<p>After</p>"));
    }

    #[test]
    fn test_reveal_content_is_markdown() {
        let deck = parse("<click>\n\n- **one**\n\n</click>");
        let html = &deck.slide(0).unwrap().html;
        assert!(html.contains("<strong>one</strong>"));
        assert!(html.contains(r#"data-click="1""#));
    }

    #[test]
    fn test_code_is_not_click_markup() {
        let deck = parse("# Code\n\n```html\n<click>Example</click>\n```\n\nUse `<after>` too");
        let slide = deck.slide(0).unwrap();
        assert_eq!(slide.max_step, 0);
        assert!(slide.diagnostics.is_empty());
        assert!(slide.html.contains("&lt;click&gt;Example"));
    }

    #[test]
    fn test_bad_slide_does_not_break_others() {
        let deck = parse("# Good\n<click>A</click>\n---\n# Bad\n<click>never closed\n---\n# Also good");
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.slide(0).unwrap().max_step, 1);
        let bad = deck.slide(1).unwrap();
        assert_eq!(bad.diagnostics.len(), 1);
        assert_eq!(bad.diagnostics[0].kind, DiagnosticKind::UnterminatedTag);
        assert_eq!(bad.diagnostics[0].slide, Some(1));
        assert_eq!(bad.diagnostics[0].line, 4);
        assert!(bad.html.starts_with(r#"<div class="stardeck-warning" role="alert">"#));
        assert!(bad.html.contains("&lt;click&gt;never closed"));
        assert_eq!(bad.title.as_deref(), Some("Bad"));
        assert!(deck.slide(2).unwrap().diagnostics.is_empty());
        assert_eq!(deck.diagnostics().count(), 1);
    }

    #[test]
    fn test_diagnostic_lines_account_for_frontmatter() {
        let deck = parse("# One\n---\nlayout: center\n---\n\n<after>x</after>");
        let d = &deck.slide(1).unwrap().diagnostics[0];
        assert_eq!(d.kind, DiagnosticKind::OrphanAfter);
        assert_eq!(d.line, 5);
    }

    #[test]
    fn test_slide_animation_cascade() {
        let src = "---\nclick-animation: slide-up\nclick-duration: 500\n---\n<click>A</click>\n---\nclick-duration: 900\n---\n<click ease=\"linear\">B</click>";
        let deck = parse_deck_str(src, ParseOptions { mode: RenderMode::Motion }).unwrap();
        let first = &deck.slide(0).unwrap().html;
        assert!(first.contains("enter_preset:slide-up, enter_duration:500"));
        let second = &deck.slide(1).unwrap().html;
        assert!(second.contains("enter_preset:slide-up, enter_duration:900, enter_ease:linear"));
    }

    #[test]
    fn test_regions_and_cls() {
        let deck = parse("<left>\n\n## Left\n\n</left>\n<div cls=\"note\">\n\nhi\n\n</div>");
        let html = &deck.slide(0).unwrap().html;
        assert!(html.contains(r#"data-region="left""#));
        assert!(html.contains(r#"<div class="note">"#));
    }

    #[test]
    fn test_line_spans_and_source_hash() {
        let deck = parse("# One\n---\n# Two");
        assert_eq!(deck.slide(1).unwrap().start_line, 2);
        assert_eq!(deck.source, DeckSource::from_content(None, "# One\n---\n# Two"));
    }

    #[test]
    fn test_load_deck_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "# From disk\n---\n<click>x</click>").unwrap();
        let deck = load_deck(file.path(), ParseOptions::default()).unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.source.path.as_deref(), Some(file.path()));
        assert_eq!(deck.max_step(1), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_deck(Path::new("/definitely/not/here.md"), ParseOptions::default()).unwrap_err();
        assert!(matches!(err, DeckError::Io { .. }));
    }
}
