//! Slide layout wrapper.

use stardeck_core::Slide;

const IMAGE_LAYOUTS: &[&str] = &["image-left", "image-right", "hero", "caption"];

/// Map an authored asset path to the URL it is served under.
pub fn resolve_asset_url(raw: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with('/') || raw.starts_with("data:")
    {
        raw.to_string()
    } else if let Some(rest) = raw.strip_prefix("./") {
        format!("/{rest}")
    } else {
        format!("/{raw}")
    }
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;").replace('<', "&lt;")
}

/// Wrap a slide's rendered body in its layout container.
pub fn wrap_slide(slide: &Slide, deck_transition: &str) -> String {
    let layout = slide.layout();
    let mut classes = vec![
        format!("slide-{}", slide.index),
        format!("layout-{layout}"),
        format!("transition-{}", slide.transition(deck_transition)),
        "slide".to_string(),
    ];
    classes.extend(slide.classes());

    let mut style = String::new();
    if let Some(bg) = slide.background() {
        if bg.starts_with('#') || bg.starts_with("rgb") {
            style.push_str(&format!("background-color: {bg};"));
        } else {
            style.push_str(&format!(
                "background-image: url('{}'); background-size: cover; background-position: center;",
                resolve_asset_url(&bg)
            ));
        }
    }
    if layout == "grid" {
        if let Some(cols) = slide.frontmatter.get_u32("cols").filter(|c| *c > 0) {
            if !style.is_empty() {
                style.push(' ');
            }
            style.push_str(&format!("--grid-cols: {cols};"));
        }
    }

    let content = match slide.image() {
        Some(image) if IMAGE_LAYOUTS.contains(&layout.as_str()) => format!(
            "<div class=\"slot-image\" style=\"background-image: url('{}'); background-size: cover; background-position: center;\"></div><div class=\"slot-content\">{}</div>",
            escape_attr(&resolve_asset_url(&image)),
            slide.html
        ),
        _ => slide.html.clone(),
    };

    let style_attr = if style.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_attr(&style))
    };
    format!(
        "<div id=\"slide-{index}\" class=\"{}\"{style_attr} data-slide-index=\"{index}\">{content}</div>",
        escape_attr(&classes.join(" ")),
        index = slide.index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use stardeck_core::Frontmatter;

    fn slide(pairs: &[(&str, Value)]) -> Slide {
        Slide {
            frontmatter: Frontmatter(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()),
            ..Slide::plain(2, "<h1>Hi</h1>")
        }
    }

    #[test]
    fn test_asset_urls() {
        assert_eq!(resolve_asset_url("./bg.jpg"), "/bg.jpg");
        assert_eq!(resolve_asset_url("bg.jpg"), "/bg.jpg");
        assert_eq!(resolve_asset_url("/assets/bg.jpg"), "/assets/bg.jpg");
        assert_eq!(resolve_asset_url("https://x.io/a.png"), "https://x.io/a.png");
    }

    #[test]
    fn test_default_wrapper() {
        let html = wrap_slide(&slide(&[]), "fade");
        assert!(html.starts_with(r#"<div id="slide-2" class="slide-2 layout-default transition-fade slide" data-slide-index="2">"#));
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(!html.contains("style="));
    }

    #[test]
    fn test_layout_transition_and_classes() {
        let html = wrap_slide(
            &slide(&[
                ("layout", json!("cover")),
                ("transition", json!("slide-left")),
                ("class", json!("text-center dark")),
            ]),
            "fade",
        );
        assert!(html.contains(r#"class="slide-2 layout-cover transition-slide-left slide text-center dark""#));
    }

    #[test]
    fn test_background_color_and_image() {
        let color = wrap_slide(&slide(&[("background", json!("#1a1a2e"))]), "fade");
        assert!(color.contains(r#"style="background-color: #1a1a2e;""#));
        let image = wrap_slide(&slide(&[("background", json!("./stars.jpg"))]), "fade");
        assert!(image.contains("background-image: url('/stars.jpg')"));
    }

    #[test]
    fn test_image_layout_slots() {
        let html = wrap_slide(&slide(&[("layout", json!("image-left")), ("image", json!("cat.png"))]), "fade");
        assert!(html.contains(r#"<div class="slot-image""#));
        assert!(html.contains("url('/cat.png')"));
        assert!(html.contains(r#"<div class="slot-content"><h1>Hi</h1></div>"#));

        let plain = wrap_slide(&slide(&[("image", json!("cat.png"))]), "fade");
        assert!(!plain.contains("slot-image"));
    }

    #[test]
    fn test_grid_cols() {
        let html = wrap_slide(&slide(&[("layout", json!("grid")), ("cols", json!(3))]), "fade");
        assert!(html.contains("--grid-cols: 3;"));
        let ignored = wrap_slide(&slide(&[("cols", json!(3))]), "fade");
        assert!(!ignored.contains("--grid-cols"));
    }
}
