use family_tree_layout::{RenderOptions, layout_json, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyTreeOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    viewport_width: Option<f32>,
}

fn parse_options(options_json: Option<String>) -> Result<FamilyTreeOptions, JsValue> {
    match options_json {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<FamilyTreeOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        _ => Ok(FamilyTreeOptions::default()),
    }
}

fn build_render_options(options: FamilyTreeOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("modern") {
        RenderOptions::modern()
    } else {
        RenderOptions::classic()
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        render_options.theme.font_size = font_size;
    }
    if let Some(width) = options.viewport_width {
        render_options.layout.viewport_width = width;
    }

    render_options
}

#[wasm_bindgen]
pub fn render_family_tree_svg(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = build_render_options(parse_options(options_json)?);
    render_with_options(input, render_options).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn layout_family_tree_json(input: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = build_render_options(parse_options(options_json)?);
    layout_json(input, &render_options.layout).map_err(|error| JsValue::from_str(&error.to_string()))
}
