//! Click Markup Parser
//!
//! Recognizes `<click>`, `<after>` and the bulk `<clicks>` wrapper in a slide
//! body and produces a flat [`Node`] list. Only the outermost tag of a nested
//! group becomes a reveal element; inner tags are reduced to their content.
//!
//! Malformed markup never fails the parse. Each problem is reported as a
//! [`Diagnostic`] and the offending tag text is kept as escaped literal text.

use once_cell::sync::Lazy;
use regex::Regex;
use stardeck_core::{Diagnostic, DiagnosticKind, StepSpec};

use crate::code_block::segments;
use crate::ir::{Node, RevealAttrs, RevealNode};

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(/?)(clicks|click|after)((?:\s[^>]*?)?)(/?)>").unwrap());
static ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z][\w-]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#).unwrap()
});
static TRANSFORM_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+(\.\d*)?|\.\d+)(px|%|deg|rem|em)?$").unwrap());
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Output of [`parse_clicks`].
#[derive(Debug, Clone, Default)]
pub struct ParsedClicks {
    pub nodes: Vec<Node>,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Lexing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagName {
    Click,
    Clicks,
    After,
}

impl TagName {
    fn from_str(s: &str) -> Self {
        match s {
            "clicks" => TagName::Clicks,
            "after" => TagName::After,
            _ => TagName::Click,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TagName::Click => "click",
            TagName::Clicks => "clicks",
            TagName::After => "after",
        }
    }
}

#[derive(Debug, Clone)]
struct Tag<'a> {
    name: TagName,
    closing: bool,
    self_closing: bool,
    attrs: &'a str,
    raw: &'a str,
    line: usize,
    /// Non-blank text precedes the tag on its line.
    inline: bool,
}

#[derive(Debug, Clone)]
enum Token<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
}

fn tokenize(body: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    for seg in segments(body) {
        if seg.code {
            tokens.push(Token::Text(seg.text));
            continue;
        }
        let mut last = 0;
        for caps in TAG.captures_iter(seg.text) {
            let Some(m) = caps.get(0) else { continue };
            if m.start() > last {
                tokens.push(Token::Text(&seg.text[last..m.start()]));
            }
            let before = &body[..seg.offset + m.start()];
            let line_head = before.rsplit('\n').next().unwrap_or("");
            tokens.push(Token::Tag(Tag {
                name: TagName::from_str(&caps[2]),
                closing: !caps[1].is_empty(),
                self_closing: !caps[4].is_empty(),
                attrs: caps.get(3).map_or("", |a| a.as_str()),
                raw: m.as_str(),
                line: before.matches('\n').count(),
                inline: !line_head.trim().is_empty(),
            }));
            last = m.end();
        }
        if last < seg.text.len() {
            tokens.push(Token::Text(&seg.text[last..]));
        }
    }
    tokens
}

fn escape_tag(raw: &str) -> String {
    raw.replace('<', "&lt;").replace('>', "&gt;")
}

// ---------------------------------------------------------------------------
// Tree building
// ---------------------------------------------------------------------------

struct Frame<'a> {
    tag: Tag<'a>,
    content: String,
}

#[derive(Default)]
struct Builder {
    nodes: Vec<Node>,
    diagnostics: Vec<Diagnostic>,
}

impl Builder {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.nodes.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(text),
            _ => self.nodes.push(Node::Text(text.to_string())),
        }
    }

    fn diagnose(&mut self, line: usize, kind: DiagnosticKind, message: String) {
        self.diagnostics.push(Diagnostic::new(line, kind, message));
    }
}

/// Parse click markup in one slide body.
pub fn parse_clicks(body: &str) -> ParsedClicks {
    let mut b = Builder::default();
    let mut stack: Vec<Frame<'_>> = Vec::new();

    for token in tokenize(body) {
        match token {
            Token::Text(text) => match stack.last_mut() {
                Some(frame) => frame.content.push_str(text),
                None => b.push_text(text),
            },
            Token::Tag(tag) if tag.closing => {
                let Some(open) = stack.iter().rposition(|f| f.tag.name == tag.name) else {
                    b.diagnose(
                        tag.line,
                        DiagnosticKind::StrayClosingTag,
                        format!("closing </{}> has no matching opening tag", tag.name.as_str()),
                    );
                    let literal = escape_tag(tag.raw);
                    match stack.last_mut() {
                        Some(frame) => frame.content.push_str(&literal),
                        None => b.push_text(&literal),
                    }
                    continue;
                };
                while stack.len() > open + 1 {
                    if let Some(frame) = stack.pop() {
                        let literal = unterminated(&mut b, frame);
                        if let Some(parent) = stack.last_mut() {
                            parent.content.push_str(&literal);
                        }
                    }
                }
                if let Some(frame) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.content.push_str(&frame.content),
                        None => finish(&mut b, frame),
                    }
                }
            }
            Token::Tag(tag) if tag.self_closing => match stack.last_mut() {
                Some(frame) => frame.content.push_str(&escape_tag(tag.raw)),
                None => finish(
                    &mut b,
                    Frame {
                        tag,
                        content: String::new(),
                    },
                ),
            },
            Token::Tag(tag) => stack.push(Frame {
                tag,
                content: String::new(),
            }),
        }
    }

    while let Some(frame) = stack.pop() {
        let literal = unterminated(&mut b, frame);
        match stack.last_mut() {
            Some(parent) => parent.content.push_str(&literal),
            None => b.push_text(&literal),
        }
    }

    ParsedClicks {
        nodes: b.nodes,
        diagnostics: b.diagnostics,
    }
}

fn unterminated(b: &mut Builder, frame: Frame<'_>) -> String {
    b.diagnose(
        frame.tag.line,
        DiagnosticKind::UnterminatedTag,
        format!("<{}> is never closed", frame.tag.name.as_str()),
    );
    format!("{}{}", escape_tag(frame.tag.raw), frame.content)
}

/// Turn a closed outermost frame into reveal nodes.
fn finish(b: &mut Builder, frame: Frame<'_>) {
    let tag = frame.tag;
    let attrs = parse_attrs(tag.attrs, tag.line, &mut b.diagnostics);

    match tag.name {
        TagName::Click => {
            let spec = match attrs.at.as_deref() {
                Some(at) => parse_at(at, attrs.hide, tag.line, &mut b.diagnostics),
                None => StepSpec::Sequential,
            };
            let hide = attrs.hide && !matches!(spec, StepSpec::Range { .. });
            b.nodes.push(Node::Reveal(RevealNode {
                spec,
                hide,
                after: false,
                inline: tag.inline,
                attrs: attrs.reveal,
                content: frame.content,
                line: tag.line,
            }));
        }
        TagName::After => {
            if attrs.at.is_some() {
                b.diagnose(
                    tag.line,
                    DiagnosticKind::InvalidAttribute,
                    "`at` is ignored on <after>".to_string(),
                );
            }
            b.nodes.push(Node::Reveal(RevealNode {
                spec: StepSpec::Sequential,
                hide: attrs.hide,
                after: true,
                inline: tag.inline,
                attrs: attrs.reveal,
                content: frame.content,
                line: tag.line,
            }));
        }
        TagName::Clicks => {
            if attrs.at.is_some() {
                b.diagnose(
                    tag.line,
                    DiagnosticKind::InvalidAttribute,
                    "`at` is ignored on <clicks>; each paragraph takes the next step".to_string(),
                );
            }
            let mut first = true;
            for (offset, paragraph) in paragraphs(&frame.content) {
                if !first {
                    b.push_text("\n\n");
                }
                first = false;
                b.nodes.push(Node::Reveal(RevealNode {
                    spec: StepSpec::Sequential,
                    hide: attrs.hide,
                    after: false,
                    inline: false,
                    attrs: attrs.reveal.clone(),
                    content: paragraph.to_string(),
                    line: tag.line + frame.content[..offset].matches('\n').count(),
                }));
            }
        }
    }
}

/// Non-empty paragraphs of `content` with their byte offsets.
fn paragraphs(content: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut push = |from: usize, to: usize| {
        let piece = &content[from..to];
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            let lead = piece.len() - piece.trim_start().len();
            out.push((from + lead, trimmed));
        }
    };
    for m in PARAGRAPH_BREAK.find_iter(content) {
        push(start, m.start());
        start = m.end();
    }
    push(start, content.len());
    out
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

struct TagAttrs {
    at: Option<String>,
    hide: bool,
    reveal: RevealAttrs,
}

fn parse_attrs(raw: &str, line: usize, diagnostics: &mut Vec<Diagnostic>) -> TagAttrs {
    let mut out = TagAttrs {
        at: None,
        hide: false,
        reveal: RevealAttrs::default(),
    };
    let mut invalid = |message: String| {
        diagnostics.push(Diagnostic::new(line, DiagnosticKind::InvalidAttribute, message));
    };

    for caps in ATTR.captures_iter(raw) {
        let name = caps[1].to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|v| v.as_str().trim().to_string());

        match name.as_str() {
            "hide" => out.hide = true,
            "at" => match value {
                Some(v) => out.at = Some(v),
                None => invalid("`at` needs a value".to_string()),
            },
            "class" | "cls" => out.reveal.class = value.filter(|v| !v.is_empty()),
            _ => {
                let (motion, key) = match name.strip_prefix("exit-") {
                    Some(key) => (&mut out.reveal.exit, key),
                    None => (&mut out.reveal.enter, name.as_str()),
                };
                let Some(value) = value.filter(|v| !v.is_empty()) else {
                    invalid(format!("attribute `{name}` needs a value"));
                    continue;
                };
                match key {
                    "animation" => motion.layer.animation = Some(value),
                    "ease" => motion.layer.ease = Some(value),
                    "spring" => motion.layer.spring = Some(value),
                    "duration" | "delay" => match value.parse::<u32>() {
                        Ok(ms) if key == "duration" => motion.layer.duration = Some(ms),
                        Ok(ms) => motion.layer.delay = Some(ms),
                        Err(_) => invalid(format!("`{name}` must be a whole number of milliseconds, got `{value}`")),
                    },
                    _ => match motion.transform.slot(key) {
                        Some(slot) if TRANSFORM_VALUE.is_match(&value) => *slot = Some(value),
                        Some(_) => invalid(format!("`{name}` must be a number, got `{value}`")),
                        None => invalid(format!("unknown attribute `{name}` ignored")),
                    },
                }
            }
        }
    }
    out
}

/// Interpret an `at` value. Malformed values are reported and fall back to
/// the closest usable spec.
fn parse_at(at: &str, hide: bool, line: usize, diagnostics: &mut Vec<Diagnostic>) -> StepSpec {
    let mut malformed = |message: String| {
        diagnostics.push(Diagnostic::new(line, DiagnosticKind::MalformedRange, message));
    };
    let number = |s: &str| -> Option<usize> {
        let s = s.trim();
        (!s.is_empty() && s.bytes().all(|c| c.is_ascii_digit()))
            .then(|| s.parse().ok())
            .flatten()
    };

    if let Some(step) = number(at) {
        return StepSpec::Explicit { step };
    }
    let Some((from, until)) = at.split_once('-') else {
        malformed(format!("`at=\"{at}\"` is not a step number or range"));
        return StepSpec::Sequential;
    };
    let (Some(from), Some(until)) = (number(from), number(until)) else {
        malformed(format!("`at=\"{at}\"` is not a step number or range"));
        return StepSpec::Sequential;
    };
    if until <= from {
        malformed(format!("range `{at}` must end after it starts; using step {from}"));
        return StepSpec::Explicit { step: from };
    }
    if hide {
        diagnostics.push(Diagnostic::new(
            line,
            DiagnosticKind::InvalidAttribute,
            "`hide` has no effect on a range".to_string(),
        ));
    }
    StepSpec::Range { from, until }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::reveals;

    fn only_reveals(body: &str) -> Vec<RevealNode> {
        reveals(&parse_clicks(body).nodes).cloned().collect()
    }

    #[test]
    fn test_sequential_and_explicit() {
        let r = only_reveals("<click>A</click>\n<click at=\"3\">B</click>");
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].spec, StepSpec::Sequential);
        assert_eq!(r[0].content, "A");
        assert_eq!(r[1].spec, StepSpec::Explicit { step: 3 });
        assert_eq!(r[1].line, 1);
    }

    #[test]
    fn test_range_and_hide() {
        let r = only_reveals("<click at=\"2-4\">R</click><click hide>H</click>");
        assert_eq!(r[0].spec, StepSpec::Range { from: 2, until: 4 });
        assert!(!r[0].hide);
        assert!(r[1].hide);
    }

    #[test]
    fn test_after_and_single_quotes() {
        let r = only_reveals("<click hide>old</click>\n<after animation='slide-up'>new</after>");
        assert!(r[1].after);
        assert_eq!(r[1].attrs.enter.layer.animation.as_deref(), Some("slide-up"));
    }

    #[test]
    fn test_animation_and_exit_attributes() {
        let r = only_reveals(
            r#"<click animation="scale" duration="500" delay="100" ease="ease-out" x="-20" opacity="0.5" exit-animation="fade" exit-y="10px" class="big">A</click>"#,
        );
        let attrs = &r[0].attrs;
        assert_eq!(attrs.enter.layer.animation.as_deref(), Some("scale"));
        assert_eq!(attrs.enter.layer.duration, Some(500));
        assert_eq!(attrs.enter.layer.delay, Some(100));
        assert_eq!(attrs.enter.layer.ease.as_deref(), Some("ease-out"));
        assert_eq!(attrs.enter.transform.x.as_deref(), Some("-20"));
        assert_eq!(attrs.enter.transform.opacity.as_deref(), Some("0.5"));
        assert_eq!(attrs.exit.layer.animation.as_deref(), Some("fade"));
        assert_eq!(attrs.exit.transform.y.as_deref(), Some("10px"));
        assert_eq!(attrs.class.as_deref(), Some("big"));
    }

    #[test]
    fn test_invalid_numeric_attribute_is_diagnosed() {
        let parsed = parse_clicks(r#"<click duration="slow" x="far">A</click>"#);
        let r: Vec<_> = reveals(&parsed.nodes).collect();
        assert_eq!(r[0].attrs.enter.layer.duration, None);
        assert_eq!(r[0].attrs.enter.transform.x, None);
        assert_eq!(parsed.diagnostics.len(), 2);
        assert!(parsed
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::InvalidAttribute));
    }

    #[test]
    fn test_malformed_ranges() {
        let parsed = parse_clicks("<click at=\"4-2\">A</click>\n<click at=\"soon\">B</click>");
        let r: Vec<_> = reveals(&parsed.nodes).collect();
        assert_eq!(r[0].spec, StepSpec::Explicit { step: 4 });
        assert_eq!(r[1].spec, StepSpec::Sequential);
        let kinds: Vec<_> = parsed.diagnostics.iter().map(|d| (d.kind, d.line)).collect();
        assert_eq!(
            kinds,
            vec![(DiagnosticKind::MalformedRange, 0), (DiagnosticKind::MalformedRange, 1)]
        );
    }

    #[test]
    fn test_nested_reveal_is_flattened() {
        let r = only_reveals("<click>outer <click>inner</click> tail</click>");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].content, "outer inner tail");
    }

    #[test]
    fn test_bulk_clicks_split_on_paragraphs() {
        let r = only_reveals("<clicks animation=\"slide-up\">\n\nFirst\n\nSecond\n\n\nThird\n\n</clicks>");
        let contents: Vec<_> = r.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["First", "Second", "Third"]);
        assert!(r.iter().all(|n| n.spec == StepSpec::Sequential));
        assert!(r
            .iter()
            .all(|n| n.attrs.enter.layer.animation.as_deref() == Some("slide-up")));
        assert_eq!(r[1].line, 4);
    }

    #[test]
    fn test_bulk_clicks_list_stays_one_paragraph() {
        let r = only_reveals("<clicks>\n\n- one\n- two\n\n</clicks>");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].content, "- one\n- two");
    }

    #[test]
    fn test_unterminated_tag_is_literal() {
        let parsed = parse_clicks("Intro\n<click>never closed");
        assert!(reveals(&parsed.nodes).next().is_none());
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::UnterminatedTag);
        assert_eq!(parsed.diagnostics[0].line, 1);
        assert_eq!(
            parsed.nodes,
            vec![Node::Text("Intro\n&lt;click&gt;never closed".to_string())]
        );
    }

    #[test]
    fn test_stray_closing_tag_is_literal() {
        let parsed = parse_clicks("text</after>");
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::StrayClosingTag);
        assert_eq!(parsed.nodes, vec![Node::Text("text&lt;/after&gt;".to_string())]);
    }

    #[test]
    fn test_inner_unterminated_tag_inside_closed_outer() {
        let parsed = parse_clicks("<click>a <after>b</click>");
        let r: Vec<_> = reveals(&parsed.nodes).collect();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].content, "a &lt;after&gt;b");
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::UnterminatedTag);
    }

    #[test]
    fn test_code_protection() {
        let parsed = parse_clicks("Use `<click>` here\n```html\n<click>Example</click>\n```");
        assert!(reveals(&parsed.nodes).next().is_none());
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn test_inline_detection() {
        let r = only_reveals("Text <click>inline</click>\n<click>block</click>");
        assert!(r[0].inline);
        assert!(!r[1].inline);
    }

    #[test]
    fn test_similar_tag_names_are_not_reveals() {
        assert!(only_reveals("<clickable>x</clickable><afterword>y</afterword>").is_empty());
    }

    #[test]
    fn test_custom_elements_with_click_prefix_are_content() {
        let body = "<click-counter start=\"3\"></click-counter>\n<after-image src=\"a.png\"/>";
        let parsed = parse_clicks(body);
        assert!(reveals(&parsed.nodes).next().is_none());
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.nodes, vec![Node::Text(body.to_string())]);
    }

    #[test]
    fn test_tag_name_boundaries() {
        let r = only_reveals("<click/><click at=\"2\">a</click ><after\nhide>b</after>");
        assert_eq!(r.len(), 3);
        assert_eq!(r[1].spec, StepSpec::Explicit { step: 2 });
        assert!(r[2].hide && r[2].after);
    }

    #[test]
    fn test_self_closing_tag_inside_reveal_stays_visible() {
        let r = only_reveals("<click>a <click/> b</click>");
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].content, "a &lt;click/&gt; b");
    }
}
