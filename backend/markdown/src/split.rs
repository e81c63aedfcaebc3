//! Slide splitting.
//!
//! Slides are separated by a line containing only `---`. A separator that is
//! immediately followed by `key: value` lines and another `---` opens a
//! frontmatter block for the next slide instead of producing an extra empty
//! slide. Separators inside fenced code never split.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::code_block::segments;

static DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---\s*$").unwrap());
static YAML_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][\w-]*\s*:(\s.*)?$").unwrap());

/// One slide's raw markup and its inclusive 0-based line span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSlide {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Split deck markup into raw slides. Always returns at least one slide.
pub fn split_slides(content: &str) -> Vec<RawSlide> {
    let lines: Vec<&str> = content.split('\n').collect();
    let fenced = fenced_lines(content, lines.len());

    let is_delim = |i: usize| !fenced[i] && DELIMITER.is_match(lines[i].trim_end_matches('\r'));

    let mut slides = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut i = 0;

    // Leading frontmatter belongs to the first slide.
    if !lines.is_empty() && is_delim(0) {
        if let Some(end) = frontmatter_end(&lines, 0, &is_delim) {
            current.extend_from_slice(&lines[0..=end]);
            i = end + 1;
        }
    }

    while i < lines.len() {
        if !is_delim(i) {
            current.push(lines[i]);
            i += 1;
            continue;
        }

        let end_line = if current.is_empty() { i } else { i - 1 };
        slides.push(RawSlide {
            content: current.join("\n"),
            start_line: start,
            end_line: end_line.max(start),
        });
        current.clear();

        match frontmatter_end(&lines, i, &is_delim) {
            Some(end) => {
                current.extend_from_slice(&lines[i..=end]);
                start = i;
                i = end + 1;
            }
            None => {
                start = i + 1;
                i += 1;
            }
        }
    }

    if !current.is_empty() || slides.is_empty() {
        slides.push(RawSlide {
            content: current.join("\n"),
            start_line: start,
            end_line: lines.len().saturating_sub(1).max(start),
        });
    }
    slides
}

/// If `lines[open]` starts a frontmatter block, the index of its closing `---`.
fn frontmatter_end(lines: &[&str], open: usize, is_delim: &impl Fn(usize) -> bool) -> Option<usize> {
    let mut saw_key = false;
    for j in open + 1..lines.len() {
        if is_delim(j) {
            return saw_key.then_some(j);
        }
        let line = lines[j].trim_end_matches('\r');
        if YAML_KEY.is_match(line) {
            saw_key = true;
        } else if line.trim().is_empty() || (saw_key && line.starts_with([' ', '\t', '-'])) {
            continue;
        } else {
            return None;
        }
    }
    None
}

/// Per-line flag: does the line sit inside a fenced code block.
fn fenced_lines(content: &str, count: usize) -> Vec<bool> {
    let mut flags = vec![false; count];
    for seg in segments(content).into_iter().filter(|s| s.code) {
        // Inline spans never contain a whole `---` line, so marking every
        // line a code segment touches is enough.
        let first = content[..seg.offset].matches('\n').count();
        let last = first + seg.text.trim_end_matches('\n').matches('\n').count();
        for flag in flags.iter_mut().take(last + 1).skip(first) {
            *flag = true;
        }
    }
    flags
}
