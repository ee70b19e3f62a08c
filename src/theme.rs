use crate::ir::Gender;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub male_fill: String,
    pub female_fill: String,
    pub other_fill: String,
    pub unknown_fill: String,
    pub card_border: String,
    pub card_radius: f32,
    pub text_color: String,
    pub secondary_text_color: String,
    pub line_color: String,
    pub line_width: f32,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            male_fill: "#DCEBFA".to_string(),
            female_fill: "#FBE1EA".to_string(),
            other_fill: "#E8F5E1".to_string(),
            unknown_fill: "#EFEFEF".to_string(),
            card_border: "#7A7A7A".to_string(),
            card_radius: 8.0,
            text_color: "#222222".to_string(),
            secondary_text_color: "#666666".to_string(),
            line_color: "#555555".to_string(),
            line_width: 1.5,
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            male_fill: "#EAF2FF".to_string(),
            female_fill: "#FFF0F5".to_string(),
            other_fill: "#F0FAF0".to_string(),
            unknown_fill: "#F8FAFF".to_string(),
            card_border: "#C7D2E5".to_string(),
            card_radius: 12.0,
            text_color: "#1C2430".to_string(),
            secondary_text_color: "#5B6B82".to_string(),
            line_color: "#7A8AA6".to_string(),
            line_width: 1.4,
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "modern" => Some(Self::modern()),
            "classic" | "default" | "base" => Some(Self::classic()),
            _ => None,
        }
    }

    pub fn fill_for(&self, gender: Gender) -> &str {
        match gender {
            Gender::Male => &self.male_fill,
            Gender::Female => &self.female_fill,
            Gender::Other => &self.other_fill,
            Gender::Unknown => &self.unknown_fill,
        }
    }
}
