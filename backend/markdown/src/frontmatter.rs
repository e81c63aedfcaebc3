//! Per-slide frontmatter and speaker notes extraction.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use stardeck_core::{Diagnostic, DiagnosticKind, Frontmatter};

use crate::code_block::map_prose;

static NOTES_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--\s*notes\b(.*?)-->").unwrap());

/// A slide split into its frontmatter and body.
#[derive(Debug, Clone, Default)]
pub struct ParsedFrontmatter {
    pub frontmatter: Frontmatter,
    pub body: String,
    /// Line of the body's first line within the raw slide.
    pub body_line: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Split a leading `---` … `---` YAML block off a raw slide.
pub fn parse_frontmatter(raw: &str) -> ParsedFrontmatter {
    let lines: Vec<&str> = raw.split('\n').collect();
    let is_delim = |l: &str| l.trim_end() == "---";

    let close = match lines.first() {
        Some(first) if is_delim(first) => lines.iter().skip(1).position(|l| is_delim(l)).map(|p| p + 1),
        _ => None,
    };
    let Some(close) = close else {
        return ParsedFrontmatter {
            body: raw.to_string(),
            ..Default::default()
        };
    };

    let yaml = lines[1..close].join("\n");
    let body = lines[close + 1..].join("\n");
    let mut diagnostics = Vec::new();
    let frontmatter = match yaml_mapping(&yaml) {
        Ok(fm) => fm,
        Err(message) => {
            diagnostics.push(Diagnostic::new(0, DiagnosticKind::InvalidFrontmatter, message));
            Frontmatter::default()
        }
    };

    ParsedFrontmatter {
        frontmatter,
        body,
        body_line: close + 1,
        diagnostics,
    }
}

fn yaml_mapping(yaml: &str) -> Result<Frontmatter, String> {
    if yaml.trim().is_empty() {
        return Ok(Frontmatter::default());
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| format!("invalid frontmatter: {e}"))?;
    let serde_yaml::Value::Mapping(mapping) = value else {
        return Err("frontmatter must be a mapping of keys to values".to_string());
    };

    let mut out = BTreeMap::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            other => serde_yaml::to_string(&other)
                .map(|s| s.trim().to_string())
                .map_err(|e| e.to_string())?,
        };
        let value = serde_json::to_value(&value).map_err(|e| format!("frontmatter key '{key}': {e}"))?;
        out.insert(key, value);
    }
    Ok(Frontmatter(out))
}

/// Remove every `<!-- notes … -->` block from `content`, returning the
/// remaining markup and the joined notes text.
///
/// Removed blocks are replaced by as many newlines as they spanned, so line
/// numbers in the remaining markup still match the source.
pub fn extract_notes(content: &str) -> (String, Option<String>) {
    let mut notes = Vec::new();
    let stripped = map_prose(content, |prose| {
        NOTES_BLOCK
            .replace_all(prose, |caps: &regex::Captures| {
                let text = caps[1].trim();
                if !text.is_empty() {
                    notes.push(text.to_string());
                }
                "\n".repeat(caps[0].matches('\n').count())
            })
            .into_owned()
    });

    if notes.is_empty() {
        (stripped, None)
    } else {
        (stripped, Some(notes.join("\n\n")))
    }
}
