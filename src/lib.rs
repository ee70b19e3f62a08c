#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config, parse_config};
pub use ir::{EdgeKind, FamilyGraph, Gender, Member, RelationshipEdge};
pub use layout::{
    ConnectorSegment, Connectors, FamilyLayout, LayoutError, Position, SegmentKind, compute_layout,
    derive_connectors,
};
pub use layout_dump::{LayoutDump, write_layout_dump};
pub use parser::parse_family;
pub use render::render_svg;
pub use theme::Theme;

/// Theme plus layout geometry for one-call rendering.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::classic()
    }
}

impl RenderOptions {
    pub fn classic() -> Self {
        Self {
            theme: Theme::classic(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn modern() -> Self {
        Self {
            theme: Theme::modern(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn with_viewport_width(mut self, width: f32) -> Self {
        self.layout.viewport_width = width;
        self
    }
}

/// Parses `input`, lays it out and renders it to an SVG string.
pub fn render_with_options(input: &str, options: RenderOptions) -> anyhow::Result<String> {
    let graph = parse_family(input)?;
    let layout = compute_layout(&graph, &options.layout);
    Ok(render_svg(&layout, &graph, &options.theme, &options.layout))
}

/// Parses `input` and returns its layout as pretty JSON.
pub fn layout_json(input: &str, layout_config: &LayoutConfig) -> anyhow::Result<String> {
    let graph = parse_family(input)?;
    let layout = compute_layout(&graph, layout_config);
    LayoutDump::from_layout(&layout, &graph).to_json()
}
