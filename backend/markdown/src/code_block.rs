//! Code Span Detection
//!
//! Markup transforms (click tags, regions, `cls=`) must never touch text that
//! the author wrote inside a fenced code block or an inline backtick span.
//! This module splits a source string into code and prose segments.

/// A contiguous piece of source that is either code or ordinary markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    /// Byte offset of `text` within the original source.
    pub offset: usize,
    pub code: bool,
}

/// Split `src` into alternating prose and code segments covering all of it.
pub fn segments(src: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    for (start, end, fenced) in fence_blocks(src) {
        if fenced {
            out.push(Segment {
                text: &src[start..end],
                offset: start,
                code: true,
            });
        } else {
            inline_segments(src, start, end, &mut out);
        }
    }
    out
}

/// Apply `f` to every prose segment, copying code segments verbatim.
pub fn map_prose(src: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(src.len());
    for seg in segments(src) {
        if seg.code {
            out.push_str(seg.text);
        } else {
            out.push_str(&f(seg.text));
        }
    }
    out
}

/// Opening fence on a line: fence char and run length.
fn fence_open(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let ch = rest.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let run = rest.chars().take_while(|c| *c == ch).count();
    if run < 3 {
        return None;
    }
    // A backtick fence's info string may not contain backticks.
    if ch == '`' && rest[run..].contains('`') {
        return None;
    }
    Some((ch, run))
}

fn fence_closes(line: &str, ch: char, len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= len && trimmed.chars().all(|c| c == ch)
}

/// Byte ranges of fenced (`true`) and unfenced (`false`) regions.
fn fence_blocks(src: &str) -> Vec<(usize, usize, bool)> {
    let mut blocks = Vec::new();
    let mut region_start = 0;
    let mut open: Option<(char, usize)> = None;
    let mut offset = 0;

    for line in src.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match open {
            None => {
                if let Some(fence) = fence_open(content) {
                    if line_start > region_start {
                        blocks.push((region_start, line_start, false));
                    }
                    region_start = line_start;
                    open = Some(fence);
                }
            }
            Some((ch, len)) => {
                if fence_closes(content, ch, len) {
                    blocks.push((region_start, offset, true));
                    region_start = offset;
                    open = None;
                }
            }
        }
    }

    if region_start < src.len() {
        blocks.push((region_start, src.len(), open.is_some()));
    }
    blocks
}

fn backtick_run(bytes: &[u8], at: usize) -> usize {
    bytes[at..].iter().take_while(|b| **b == b'`').count()
}

/// Split an unfenced region on inline code spans.
fn inline_segments<'a>(src: &'a str, start: usize, end: usize, out: &mut Vec<Segment<'a>>) {
    let bytes = src.as_bytes();
    let mut prose_start = start;
    let mut i = start;

    while i < end {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = backtick_run(&bytes[..end], i);
        match find_closing_run(src, i + run, end, run) {
            Some(close) => {
                if i > prose_start {
                    out.push(Segment {
                        text: &src[prose_start..i],
                        offset: prose_start,
                        code: false,
                    });
                }
                let code_end = close + run;
                out.push(Segment {
                    text: &src[i..code_end],
                    offset: i,
                    code: true,
                });
                i = code_end;
                prose_start = code_end;
            }
            None => i += run,
        }
    }

    if prose_start < end {
        out.push(Segment {
            text: &src[prose_start..end],
            offset: prose_start,
            code: false,
        });
    }
}

/// Find a backtick run of exactly `len` in `[from, end)`, stopping at a blank line.
fn find_closing_run(src: &str, from: usize, end: usize, len: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < end {
        match bytes[i] {
            b'`' => {
                let run = backtick_run(&bytes[..end], i);
                if run == len {
                    return Some(i);
                }
                i += run;
            }
            b'\n' => {
                let rest = &src[i + 1..end];
                let next_line = rest.split('\n').next().unwrap_or("");
                if next_line.trim().is_empty() && rest.contains('\n') {
                    return None;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}
