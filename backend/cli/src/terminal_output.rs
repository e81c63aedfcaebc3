//! Terminal output utilities: colored notes and plain tables.

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

/// Wrap `text` in `style` when color is enabled.
pub fn paint(style: &str, text: &str) -> String {
    if supports_color() {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

pub fn note_info(msg: &str) {
    println!("{} {msg}", paint(CYAN, "ℹ"));
}

pub fn note_warn(msg: &str) {
    println!("{} {msg}", paint(YELLOW, "⚠"));
}

pub fn note_success(msg: &str) {
    println!("{} {msg}", paint(GREEN, "✓"));
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

pub enum Align {
    Left,
    Right,
}

pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Left }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self { header: header.into(), align: Align::Right }
    }
}

/// Render rows under the given columns, widths fitted to the content.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.header.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(strip_ansi(cell).chars().count());
        }
    }

    let line = |cells: Vec<String>| format!("  {}\n", cells.join("  ").trim_end());

    let mut out = String::new();
    out.push_str(&line(
        columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| pad_cell(&col.header, *w, &col.align))
            .collect(),
    ));
    out.push_str(&line(widths.iter().map(|w| "-".repeat(*w)).collect()));
    for row in rows {
        out.push_str(&line(
            columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (col, w))| pad_cell(row.get(i).map(String::as_str).unwrap_or(""), *w, &col.align))
                .collect(),
        ));
    }
    out
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(strip_ansi(s).chars().count());
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Right => format!("{}{s}", " ".repeat(pad)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_aligned_table() {
        let cols = vec![Column::right("#"), Column::left("Title")];
        let rows = vec![
            vec!["1".to_string(), "Intro".to_string()],
            vec!["10".to_string(), "Wrap-up".to_string()],
        ];
        let table = render_table(&cols, &rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "   #  Title");
        assert_eq!(lines[1], "  --  -------");
        assert_eq!(lines[2], "   1  Intro");
        assert_eq!(lines[3], "  10  Wrap-up");
    }
}
