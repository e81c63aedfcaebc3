//! Markdown to HTML conversion.
//!
//! The deck builder only needs a pure `markdown -> html` function; the trait
//! keeps that seam open for alternative renderers (syntax highlighting,
//! test doubles).

use pulldown_cmark::{html, Options, Parser};

pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer with tables, strikethrough, task lists and footnotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmarkRenderer;

impl CmarkRenderer {
    fn options() -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        options
    }
}

impl MarkdownRenderer for CmarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Self::options());
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_markdown() {
        let html = CmarkRenderer.render("# Title\n\nSome **bold** text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_extensions_enabled() {
        let html = CmarkRenderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_markdown_inside_reveal_block() {
        let html = CmarkRenderer.render("<div class=\"click-reveal\">\n\n- item\n\n</div>\n");
        assert!(html.contains("<div class=\"click-reveal\">"));
        assert!(html.contains("<li>item</li>"));
        assert!(html.contains("</div>"));
    }

    #[test]
    fn test_code_block_keeps_tags_escaped() {
        let html = CmarkRenderer.render("```html\n<click>Example</click>\n```");
        assert!(html.contains("&lt;click&gt;Example&lt;/click&gt;"));
    }
}
