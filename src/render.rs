use crate::config::{LayoutConfig, RenderConfig};
use crate::ir::{FamilyGraph, Member};
use crate::layout::{ConnectorSegment, FamilyLayout, SegmentKind};
use crate::theme::Theme;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{3,4})\b").unwrap());

/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_FACTOR: f32 = 0.56;
const CARD_PADDING: f32 = 8.0;

pub fn render_svg(
    layout: &FamilyLayout,
    graph: &FamilyGraph,
    theme: &Theme,
    config: &LayoutConfig,
) -> String {
    let mut svg = String::new();
    let width = layout.width.max(layout.viewport_width).max(200.0);
    let height = layout.height.max(120.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"0 0 {width:.2} {height:.2}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<g class=\"connectors\">");
    for segment in layout.connectors.segments() {
        svg.push_str(&segment_svg(segment, theme));
    }
    svg.push_str("</g>");

    let mut drawn: HashSet<&str> = HashSet::new();
    for member in &graph.members {
        let Some(pos) = layout.position(&member.id) else {
            continue;
        };
        if !drawn.insert(member.id.as_str()) {
            continue;
        }
        svg.push_str(&member_card_svg(member, pos.x, pos.y, theme, config));
    }

    svg.push_str("</svg>");
    svg
}

fn segment_svg(segment: &ConnectorSegment, theme: &Theme) -> String {
    let class = match segment.kind {
        SegmentKind::Spouse => "spouse",
        SegmentKind::Stem => "stem",
        SegmentKind::Branch => "branch",
        SegmentKind::Drop => "drop",
    };
    format!(
        "<line class=\"{class}\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"square\"/>",
        segment.x1, segment.y1, segment.x2, segment.y2, theme.line_color, theme.line_width
    )
}

fn member_card_svg(member: &Member, cx: f32, cy: f32, theme: &Theme, config: &LayoutConfig) -> String {
    let w = config.node_width;
    let h = config.node_height;
    let x = cx - w / 2.0;
    let y = cy - h / 2.0;

    let mut card = format!("<g class=\"member\" data-id=\"{}\">", escape_xml(&member.id));
    card.push_str(&format!(
        "<rect x=\"{x:.2}\" y=\"{y:.2}\" width=\"{w:.2}\" height=\"{h:.2}\" rx=\"{r}\" ry=\"{r}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        theme.fill_for(member.gender),
        theme.card_border,
        r = theme.card_radius,
    ));

    let mut text_left = x + CARD_PADDING;
    if let Some(image) = member.image_ref.as_deref().filter(|s| !s.trim().is_empty()) {
        let size = (h - 2.0 * CARD_PADDING).max(0.0);
        card.push_str(&format!(
            "<image x=\"{:.2}\" y=\"{:.2}\" width=\"{size:.2}\" height=\"{size:.2}\" href=\"{}\" preserveAspectRatio=\"xMidYMid slice\"/>",
            x + CARD_PADDING,
            y + CARD_PADDING,
            escape_xml(image)
        ));
        text_left += size + CARD_PADDING / 2.0;
    }
    let text_right = x + w - CARD_PADDING;
    let text_x = (text_left + text_right) / 2.0;
    let available = (text_right - text_left).max(0.0);

    let name = ellipsize(&member.name, available, theme.font_size);
    let life_span = life_span(member);
    let name_y = if life_span.is_some() {
        cy - theme.font_size * 0.2
    } else {
        cy + theme.font_size * 0.35
    };
    card.push_str(&format!(
        "<text x=\"{text_x:.2}\" y=\"{name_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"600\" fill=\"{}\">{}</text>",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color,
        escape_xml(&name)
    ));
    if let Some(span) = life_span {
        let small = theme.font_size * 0.85;
        let span_y = name_y + small * 1.3;
        card.push_str(&format!(
            "<text x=\"{text_x:.2}\" y=\"{span_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{small:.1}\" fill=\"{}\">{}</text>",
            escape_xml(&theme.font_family),
            theme.secondary_text_color,
            escape_xml(&span)
        ));
    }
    card.push_str("</g>");
    card
}

/// Shortens `text` with a trailing ellipsis so it fits `max_width`.
fn ellipsize(text: &str, max_width: f32, font_size: f32) -> String {
    let glyph = (font_size * GLYPH_WIDTH_FACTOR).max(1.0);
    let max_chars = (max_width / glyph).floor() as usize;
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    if max_chars <= 1 {
        return "\u{2026}".to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.truncate(out.trim_end().len());
    out.push('\u{2026}');
    out
}

fn year_of(date: Option<&str>) -> Option<&str> {
    let date = date?;
    YEAR_RE
        .captures(date)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn life_span(member: &Member) -> Option<String> {
    let born = year_of(member.date_of_birth.as_deref());
    let died = year_of(member.date_of_death.as_deref());
    match (born, died) {
        (Some(born), Some(died)) => Some(format!("{born} \u{2013} {died}")),
        (Some(born), None) => Some(format!("b. {born}")),
        (None, Some(died)) => Some(format!("d. {died}")),
        (None, None) => None,
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

/// Scale from the SVG's own size to the configured raster box.
#[cfg_attr(not(feature = "png"), allow(dead_code))]
pub(crate) fn raster_scale(svg_width: f32, svg_height: f32, render_cfg: &RenderConfig) -> f32 {
    let by_width = render_cfg
        .width
        .filter(|w| *w > 0.0 && svg_width > 0.0)
        .map(|w| w / svg_width);
    let by_height = render_cfg
        .height
        .filter(|h| *h > 0.0 && svg_height > 0.0)
        .map(|h| h / svg_height);
    match (by_width, by_height) {
        (Some(w), Some(h)) => w.min(h),
        (Some(scale), None) | (None, Some(scale)) => scale,
        (None, None) => 1.0,
    }
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "sans-serif".to_string();
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size();
    let scale = raster_scale(size.width(), size.height(), render_cfg);
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate a {width}x{height} pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap_mut,
    );
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output is not available; rebuild with the `png` feature"
    ))
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
