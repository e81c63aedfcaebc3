//! `stardeck check`: parse a deck and report its structure and authoring
//! problems without serving it.

use std::process::ExitCode;

use anyhow::{Context, Result};
use stardeck_core::Deck;
use stardeck_markdown::{load_deck, ParseOptions};

use crate::terminal_output::{note_success, note_warn, paint, render_table, Column, BOLD, DIM, RED};
use crate::CheckArgs;

pub fn run(args: &CheckArgs) -> Result<ExitCode> {
    Ok(if check(args)? { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Print the report; false when `--strict` and problems were found.
fn check(args: &CheckArgs) -> Result<bool> {
    let deck = load_deck(&args.slides, ParseOptions::default())
        .with_context(|| format!("Failed to load deck {}", args.slides.display()))?;

    print!("{}", render_report(&deck));

    let problems = deck.diagnostics().count();
    if problems == 0 {
        note_success(&format!("{} slides, no click markup problems", deck.len()));
        return Ok(true);
    }
    note_warn(&format!("{} slides, {problems} click markup problem(s)", deck.len()));
    Ok(!args.strict)
}

/// Slide table followed by one line per diagnostic (1-based lines).
pub fn render_report(deck: &Deck) -> String {
    let columns = [
        Column::right("#"),
        Column::left("Title"),
        Column::left("Layout"),
        Column::right("Steps"),
        Column::right("Problems"),
        Column::left("Lines"),
    ];
    let rows: Vec<Vec<String>> = deck
        .slides()
        .iter()
        .map(|s| {
            vec![
                (s.index + 1).to_string(),
                s.title.clone().unwrap_or_else(|| paint(DIM, "(untitled)")),
                s.layout(),
                s.max_step.to_string(),
                s.diagnostics.len().to_string(),
                format!("{}-{}", s.start_line + 1, s.end_line + 1),
            ]
        })
        .collect();

    let mut out = format!("{}\n\n", paint(BOLD, &deck.config.title));
    out.push_str(&render_table(&columns, &rows));

    let diagnostics: Vec<_> = deck.diagnostics().collect();
    if !diagnostics.is_empty() {
        out.push('\n');
        for d in diagnostics {
            let slide = d.slide.map(|s| (s + 1).to_string()).unwrap_or_else(|| "?".to_string());
            out.push_str(&format!(
                "  {} slide {slide}, line {}: {}\n",
                paint(RED, &format!("[{}]", d.kind)),
                d.line + 1,
                d.message
            ));
        }
    }
    out
}
