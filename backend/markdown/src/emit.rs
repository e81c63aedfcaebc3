//! Reveal HTML emission.
//!
//! Wraps each resolved reveal element's markup in an element the client
//! runtime can toggle from the live `$clicks` signal. The output is still
//! markdown: block reveals are padded with blank lines so their content keeps
//! rendering as markdown inside the wrapper.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use stardeck_core::{AnimationDefaults, ResolvedReveal, RevealKind};

use crate::ir::{Motion, Node, RevealNode};

/// How reveal wrappers drive their animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// CSS classes toggled by `data-class:*` bindings.
    #[default]
    Css,
    /// `data-motion` descriptors for the motion runtime.
    Motion,
}

impl std::str::FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "css" => Ok(RenderMode::Css),
            "motion" => Ok(RenderMode::Motion),
            other => Err(format!("unknown render mode '{other}' (expected css or motion)")),
        }
    }
}

/// Emit a slide body with reveal wrappers.
///
/// `resolved` holds one entry per reveal node in document order. `base` is the
/// slide's cascaded animation layer (built-in, deck, slide) that element
/// attributes are layered over.
pub fn emit(nodes: &[Node], resolved: &[ResolvedReveal], base: &AnimationDefaults, mode: RenderMode) -> String {
    let mut out = String::new();
    let mut ordinal = 0;
    let mut i = 0;

    while i < nodes.len() {
        match &nodes[i] {
            Node::Text(text) => {
                out.push_str(text);
                i += 1;
            }
            Node::Reveal(node) => {
                let Some(reveal) = resolved.get(ordinal) else {
                    out.push_str(&node.content);
                    i += 1;
                    continue;
                };
                if let Some((partner_at, partner)) = swap_partner(nodes, i, node) {
                    let next = resolved.get(ordinal + 1).unwrap_or(reveal);
                    let tag = if node.inline { "span" } else { "div" };
                    open_block(&mut out, node.inline);
                    let sep = if node.inline { "" } else { "\n" };
                    let _ = write!(
                        out,
                        r#"<{tag} class="click-swap">{sep}{}{sep}{}{sep}</{tag}>"#,
                        wrapper(node, reveal, base, mode),
                        wrapper(partner, next, base, mode),
                    );
                    close_block(&mut out, node.inline);
                    ordinal += 2;
                    i = partner_at + 1;
                } else {
                    open_block(&mut out, node.inline);
                    out.push_str(&wrapper(node, reveal, base, mode));
                    close_block(&mut out, node.inline);
                    ordinal += 1;
                    i += 1;
                }
            }
        }
    }
    out
}

/// A hide element directly followed by an `<after>` forms a swap pair.
fn swap_partner<'a>(nodes: &'a [Node], at: usize, node: &RevealNode) -> Option<(usize, &'a RevealNode)> {
    if !node.hide || node.after {
        return None;
    }
    for (j, next) in nodes.iter().enumerate().skip(at + 1) {
        match next {
            Node::Text(t) if t.trim().is_empty() => continue,
            Node::Reveal(r) if r.after => return Some((j, r)),
            _ => return None,
        }
    }
    None
}

fn open_block(out: &mut String, inline: bool) {
    if !inline && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn close_block(out: &mut String, inline: bool) {
    if !inline {
        out.push('\n');
    }
}

fn wrapper(node: &RevealNode, reveal: &ResolvedReveal, base: &AnimationDefaults, mode: RenderMode) -> String {
    let tag = if node.inline { "span" } else { "div" };
    let (class, binding) = match reveal.kind {
        RevealKind::Show => (
            "click-reveal",
            format!(r#"data-class:revealed="$clicks >= {}""#, reveal.step),
        ),
        RevealKind::Hide => (
            "click-hide",
            format!(r#"data-class:click-hidden="$clicks >= {}""#, reveal.step),
        ),
        RevealKind::Range => {
            let until = reveal.until.unwrap_or(reveal.step);
            (
                "click-reveal",
                format!(
                    r#"data-class:revealed="$clicks >= {} &amp;&amp; $clicks &lt; {}""#,
                    reveal.step, until
                ),
            )
        }
    };
    let data_click = match reveal.until {
        Some(until) => format!("{}-{}", reveal.step, until),
        None => reveal.step.to_string(),
    };

    let mut classes = vec![class.to_string()];
    if let Some(extra) = &node.attrs.class {
        classes.push(escape_attr(extra));
    }

    let enter = Motion {
        layer: node.attrs.enter.layer.over(base),
        transform: node.attrs.enter.transform.clone(),
    };

    let mut attrs = String::new();
    // Hide elements always use the class toggle; they only ever disappear.
    if mode == RenderMode::Motion && reveal.kind != RevealKind::Hide {
        classes[0] = "click-motion".to_string();
        let signal = match reveal.until {
            Some(until) => format!("vis_{}_{}", reveal.step, until),
            None => format!("vis_{}", reveal.step),
        };
        let condition = match reveal.until {
            Some(until) => format!("$clicks >= {} &amp;&amp; $clicks &lt; {}", reveal.step, until),
            None => format!("$clicks >= {}", reveal.step),
        };
        let _ = write!(
            attrs,
            r#" data-computed:{signal}="{condition}" data-motion="{}""#,
            escape_attr(&motion_descriptor(&signal, &enter, &node.attrs.exit))
        );
    } else {
        let _ = write!(attrs, " {binding}");
        if let Some(animation) = &enter.layer.animation {
            let _ = write!(attrs, r#" data-animation="{}""#, escape_attr(animation));
        }
        if let Some(exit) = &node.attrs.exit.layer.animation {
            let _ = write!(attrs, r#" data-exit-animation="{}""#, escape_attr(exit));
        }
        let style = css_vars(&enter);
        if !style.is_empty() {
            let _ = write!(attrs, r#" style="{}""#, escape_attr(&style));
        }
    }

    if node.inline {
        format!(
            r#"<{tag} class="{}" data-click="{data_click}"{attrs}>{}</{tag}>"#,
            classes.join(" "),
            node.content
        )
    } else {
        format!(
            "<{tag} class=\"{}\" data-click=\"{data_click}\"{attrs}>\n\n{}\n\n</{tag}>",
            classes.join(" "),
            node.content.trim_matches('\n')
        )
    }
}

/// `data-motion` value: comma-separated `key:value` pairs.
fn motion_descriptor(signal: &str, enter: &Motion, exit: &Motion) -> String {
    let mut parts = vec!["type:visibility".to_string(), format!("signal:${signal}")];
    push_motion(&mut parts, "enter", enter);
    if !exit.is_empty() {
        push_motion(&mut parts, "exit", exit);
    }
    parts.join(", ")
}

fn push_motion(parts: &mut Vec<String>, prefix: &str, motion: &Motion) {
    // Explicit transforms replace the preset.
    if motion.transform.is_empty() {
        if let Some(preset) = &motion.layer.animation {
            parts.push(format!("{prefix}_preset:{preset}"));
        }
    } else {
        for (name, value) in motion.transform.fields() {
            parts.push(format!("{prefix}_{name}:{value}"));
        }
    }
    if let Some(duration) = motion.layer.duration {
        parts.push(format!("{prefix}_duration:{duration}"));
    }
    if let Some(delay) = motion.layer.delay {
        parts.push(format!("{prefix}_delay:{delay}"));
    }
    if let Some(ease) = &motion.layer.ease {
        parts.push(format!("{prefix}_ease:{ease}"));
    }
    if let Some(spring) = &motion.layer.spring {
        parts.push(format!("{prefix}_spring:{spring}"));
    }
}

fn css_vars(enter: &Motion) -> String {
    let mut vars = Vec::new();
    if let Some(duration) = enter.layer.duration {
        vars.push(format!("--click-duration: {duration}ms"));
    }
    if let Some(delay) = enter.layer.delay {
        vars.push(format!("--click-delay: {delay}ms"));
    }
    if let Some(ease) = &enter.layer.ease {
        vars.push(format!("--click-ease: {ease}"));
    }
    for (name, value) in enter.transform.fields() {
        let unit = match name {
            "x" | "y" if is_unitless(value) => "px",
            "rotate" if is_unitless(value) => "deg",
            _ => "",
        };
        vars.push(format!("--click-{name}: {value}{unit}"));
    }
    vars.join("; ")
}

fn is_unitless(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::click::parse_clicks;
    use crate::resolve::resolve;

    fn render(body: &str, mode: RenderMode) -> String {
        render_with(body, mode, &AnimationDefaults::builtin())
    }

    fn render_with(body: &str, mode: RenderMode, base: &AnimationDefaults) -> String {
        let parsed = parse_clicks(body);
        let resolution = resolve(&parsed.nodes);
        emit(&parsed.nodes, &resolution.reveals, base, mode)
    }

    #[test]
    fn test_css_show_wrapper() {
        let html = render("<click>Hello</click>", RenderMode::Css);
        assert!(html.contains(r#"class="click-reveal""#));
        assert!(html.contains(r#"data-click="1""#));
        assert!(html.contains(r#"data-class:revealed="$clicks >= 1""#));
        assert!(html.contains(r#"data-animation="fade""#));
        assert!(html.contains("--click-duration: 300ms"));
        assert!(html.contains("\n\nHello\n\n</div>"));
    }

    #[test]
    fn test_css_hide_wrapper() {
        let html = render("<click hide>Bye</click>", RenderMode::Css);
        assert!(html.contains(r#"class="click-hide""#));
        assert!(html.contains(r#"data-class:click-hidden="$clicks >= 1""#));
    }

    #[test]
    fn test_css_range_wrapper() {
        let html = render(r#"<click at="2-4">Window</click>"#, RenderMode::Css);
        assert!(html.contains(r#"data-click="2-4""#));
        assert!(html.contains("$clicks >= 2 &amp;&amp; $clicks &lt; 4"));
    }

    #[test]
    fn test_motion_wrapper() {
        let html = render(r#"<click animation="slide-up" exit-animation="fade">A</click>"#, RenderMode::Motion);
        assert!(html.contains(r#"class="click-motion""#));
        assert!(html.contains(r#"data-computed:vis_1="$clicks >= 1""#));
        assert!(html.contains("type:visibility, signal:$vis_1, enter_preset:slide-up, enter_duration:300"));
        assert!(html.contains("exit_preset:fade"));
    }

    #[test]
    fn test_motion_range_signal() {
        let html = render(r#"<click at="2-4">A</click>"#, RenderMode::Motion);
        assert!(html.contains("signal:$vis_2_4"));
    }

    #[test]
    fn test_motion_transforms_replace_preset() {
        let html = render(r#"<click x="-20" opacity="0">A</click>"#, RenderMode::Motion);
        assert!(html.contains("enter_x:-20, enter_opacity:0"));
        assert!(!html.contains("enter_preset"));
    }

    #[test]
    fn test_motion_hide_uses_class_toggle() {
        let html = render("<click hide>A</click>", RenderMode::Motion);
        assert!(html.contains(r#"class="click-hide""#));
        assert!(!html.contains("data-motion"));
    }

    #[test]
    fn test_animation_cascade() {
        let deck = AnimationDefaults {
            animation: Some("slide-up".into()),
            delay: Some(50),
            ..Default::default()
        };
        let slide = AnimationDefaults {
            duration: Some(800),
            ..Default::default()
        };
        let base = slide.over(&deck.over(&AnimationDefaults::builtin()));
        let html = render_with(r#"<click ease="ease-in">A</click>"#, RenderMode::Motion, &base);
        assert!(html.contains("enter_preset:slide-up"));
        assert!(html.contains("enter_duration:800"));
        assert!(html.contains("enter_delay:50"));
        assert!(html.contains("enter_ease:ease-in"));

        let overridden = render_with(r#"<click animation="scale">A</click>"#, RenderMode::Motion, &base);
        assert!(overridden.contains("enter_preset:scale"));
        assert!(overridden.contains("enter_duration:800"));
    }

    #[test]
    fn test_swap_container() {
        let html = render("<click hide>Old</click>\n<after>New</after>", RenderMode::Css);
        assert_eq!(html.matches(r#"class="click-swap""#).count(), 1);
        let swap = html.find("click-swap").unwrap();
        let hide = html.find("click-hide").unwrap();
        let after = html.find("New").unwrap();
        assert!(swap < hide && hide < after);
        assert!(html.contains(r#"data-class:revealed="$clicks >= 1""#));
    }

    #[test]
    fn test_no_swap_without_after() {
        let html = render("<click hide>Old</click>\n\nText\n<after>New</after>", RenderMode::Css);
        assert!(!html.contains("click-swap"));
    }

    #[test]
    fn test_inline_reveal_uses_span() {
        let html = render("Say <click>hello</click> there", RenderMode::Css);
        assert!(html.starts_with("Say <span class=\"click-reveal\""));
        assert!(html.ends_with(">hello</span> there"));
    }

    #[test]
    fn test_extra_class_and_css_transform_units() {
        let html = render(r#"<click class="big" x="10" rotate="45">A</click>"#, RenderMode::Css);
        assert!(html.contains(r#"class="click-reveal big""#));
        assert!(html.contains("--click-x: 10px"));
        assert!(html.contains("--click-rotate: 45deg"));
    }

    #[test]
    fn test_text_passes_through() {
        let html = render("# Title\n\nPlain text", RenderMode::Css);
        assert_eq!(html, "# Title\n\nPlain text");
    }

    #[test]
    fn test_render_mode_from_str() {
        assert_eq!("CSS".parse::<RenderMode>().unwrap(), RenderMode::Css);
        assert_eq!("motion".parse::<RenderMode>().unwrap(), RenderMode::Motion);
        assert!("flash".parse::<RenderMode>().is_err());
    }
}
