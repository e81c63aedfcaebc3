//! Source-level rewrites applied before click parsing: layout regions and
//! the `cls=` attribute alias. Both skip code.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::code_block::map_prose;

/// Tag names that become layout region containers.
pub const REGION_TAGS: &[&str] = &["left", "right", "top", "bottom", "main", "sidebar", "item", "step"];

static REGION_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(left|right|top|bottom|main|sidebar|item|step)(?:\s+class="([^"]*)")?\s*>"#).unwrap()
});
static REGION_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</(left|right|top|bottom|main|sidebar|item|step)\s*>").unwrap());
static CLS_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(<[A-Za-z][\w-]*\b[^>]*?\s)cls="#).unwrap());

/// Rewrite `<left>`, `<right>`, … into `sd-region` containers.
pub fn transform_regions(content: &str) -> String {
    map_prose(content, |prose| {
        let opened = REGION_OPEN.replace_all(prose, |caps: &regex::Captures| {
            let tag = &caps[1];
            let class = match caps.get(2).map(|m| m.as_str().trim()) {
                Some(extra) if !extra.is_empty() => format!("sd-region {extra}"),
                _ => "sd-region".to_string(),
            };
            format!(r#"<div class="{class}" data-region="{tag}">"#)
        });
        REGION_CLOSE.replace_all(&opened, "</div>").into_owned()
    })
}

/// Rewrite `cls="…"` in inline HTML tags to `class="…"`.
pub fn cls_to_class(content: &str) -> String {
    map_prose(content, |prose| {
        let mut out = prose.to_string();
        // A tag may carry several attributes before `cls`; loop until stable.
        loop {
            let next = CLS_ATTR.replace_all(&out, "${1}class=").into_owned();
            if next == out {
                return out;
            }
            out = next;
        }
    })
}
