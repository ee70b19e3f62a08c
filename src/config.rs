use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry of the family layout. Positions are member shape centers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub row_height: f32,
    /// Center-to-center distance between the two partners of a couple.
    pub partner_spacing: f32,
    /// Tidy-tree separation between units sharing a parent, in node widths.
    pub sibling_separation: f32,
    /// Tidy-tree separation between units of different parents, in node widths.
    pub subtree_separation: f32,
    /// Gap between the shape edges of two independent family trees.
    pub tree_gutter: f32,
    pub top_margin: f32,
    pub side_margin: f32,
    pub viewport_width: f32,
    pub fallback_spacing: f32,
    /// Grid used to group children under a shared couple-center.
    pub connector_key_quantum: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 120.0,
            node_height: 56.0,
            row_height: 140.0,
            partner_spacing: 160.0,
            sibling_separation: 1.4,
            subtree_separation: 2.0,
            tree_gutter: 80.0,
            top_margin: 60.0,
            side_margin: 80.0,
            viewport_width: 1200.0,
            fallback_spacing: 160.0,
            connector_key_quantum: 1.0,
        }
    }
}

/// Raster size for PNG output. With one side set the image scales to it and
/// keeps its aspect ratio; with both it fits inside the box. The SVG keeps
/// the drawing's own size either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<NumberOrString>,
    male_fill: Option<String>,
    female_fill: Option<String>,
    other_fill: Option<String>,
    unknown_fill: Option<String>,
    card_border: Option<String>,
    text_color: Option<String>,
    secondary_text_color: Option<String>,
    line_color: Option<String>,
    line_width: Option<NumberOrString>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f32),
    String(String),
}

impl NumberOrString {
    fn as_f32(&self) -> Option<f32> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().trim_end_matches("px").parse::<f32>().ok(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    node_width: Option<f32>,
    node_height: Option<f32>,
    row_height: Option<f32>,
    partner_spacing: Option<f32>,
    sibling_separation: Option<f32>,
    subtree_separation: Option<f32>,
    tree_gutter: Option<f32>,
    top_margin: Option<f32>,
    side_margin: Option<f32>,
    viewport_width: Option<f32>,
    fallback_spacing: Option<f32>,
    connector_key_quantum: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        apply_theme_variables(&mut config.theme, vars);
    }

    if let Some(layout) = parsed.layout {
        apply_layout_overrides(&mut config.layout, layout);
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = Some(v);
        }
        if let Some(v) = render.height {
            config.render.height = Some(v);
        }
    }

    Ok(config)
}

fn apply_theme_variables(theme: &mut Theme, vars: ThemeVariables) {
    if let Some(v) = vars.font_family {
        theme.font_family = v;
    }
    if let Some(v) = vars.font_size.as_ref().and_then(NumberOrString::as_f32) {
        theme.font_size = v;
    }
    if let Some(v) = vars.male_fill {
        theme.male_fill = v;
    }
    if let Some(v) = vars.female_fill {
        theme.female_fill = v;
    }
    if let Some(v) = vars.other_fill {
        theme.other_fill = v;
    }
    if let Some(v) = vars.unknown_fill {
        theme.unknown_fill = v;
    }
    if let Some(v) = vars.card_border {
        theme.card_border = v;
    }
    if let Some(v) = vars.text_color {
        theme.text_color = v;
    }
    if let Some(v) = vars.secondary_text_color {
        theme.secondary_text_color = v;
    }
    if let Some(v) = vars.line_color {
        theme.line_color = v;
    }
    if let Some(v) = vars.line_width.as_ref().and_then(NumberOrString::as_f32) {
        theme.line_width = v;
    }
    if let Some(v) = vars.background {
        theme.background = v;
    }
}

fn apply_layout_overrides(layout: &mut LayoutConfig, file: LayoutConfigFile) {
    if let Some(v) = file.node_width {
        layout.node_width = v;
    }
    if let Some(v) = file.node_height {
        layout.node_height = v;
    }
    if let Some(v) = file.row_height {
        layout.row_height = v;
    }
    if let Some(v) = file.partner_spacing {
        layout.partner_spacing = v;
    }
    if let Some(v) = file.sibling_separation {
        layout.sibling_separation = v;
    }
    if let Some(v) = file.subtree_separation {
        layout.subtree_separation = v;
    }
    if let Some(v) = file.tree_gutter {
        layout.tree_gutter = v;
    }
    if let Some(v) = file.top_margin {
        layout.top_margin = v;
    }
    if let Some(v) = file.side_margin {
        layout.side_margin = v;
    }
    if let Some(v) = file.viewport_width {
        layout.viewport_width = v;
    }
    if let Some(v) = file.fallback_spacing {
        layout.fallback_spacing = v;
    }
    if let Some(v) = file.connector_key_quantum {
        layout.connector_key_quantum = v;
    }
}
