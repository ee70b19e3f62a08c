use crate::ir::FamilyGraph;
use crate::layout::{ConnectorSegment, FamilyLayout};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub viewport_width: f32,
    pub fallback: bool,
    pub members: Vec<MemberDump>,
    pub couple_centers: Vec<CoupleCenterDump>,
    pub spouse_links: Vec<ConnectorSegment>,
    pub parent_child_links: Vec<ConnectorSegment>,
}

#[derive(Debug, Serialize)]
pub struct MemberDump {
    pub id: String,
    pub name: String,
    pub gender: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
pub struct CoupleCenterDump {
    pub unit: usize,
    pub x: f32,
    pub y: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &FamilyLayout, graph: &FamilyGraph) -> Self {
        let mut seen = HashSet::new();
        let members = graph
            .members
            .iter()
            .filter(|member| seen.insert(member.id.as_str()))
            .filter_map(|member| {
                let pos = layout.position(&member.id)?;
                Some(MemberDump {
                    id: member.id.clone(),
                    name: member.name.clone(),
                    gender: member.gender.as_str().to_string(),
                    x: pos.x,
                    y: pos.y,
                })
            })
            .collect();

        let couple_centers = layout
            .couple_centers
            .iter()
            .map(|(unit, pos)| CoupleCenterDump {
                unit: *unit,
                x: pos.x,
                y: pos.y,
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            viewport_width: layout.viewport_width,
            fallback: layout.fallback,
            members,
            couple_centers,
            spouse_links: layout.connectors.spouse_links.clone(),
            parent_child_links: layout.connectors.parent_child_links.clone(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_layout_dump(path: &Path, layout: &FamilyLayout, graph: &FamilyGraph) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, graph);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
