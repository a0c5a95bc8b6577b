use crate::config::LayoutOptions;
use crate::ir::NodeRef;
use crate::layout::priority::resolve_priority;
use crate::layout::{Bounds, LayoutResult, LayoutSource};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub source: LayoutSource,
    pub bounds: Option<Bounds>,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub level: Option<usize>,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub priority: i32,
}

impl LayoutDump {
    /// Nodes are listed in input order; duplicates and nodes without a position
    /// are left out.
    pub fn from_layout(result: &LayoutResult, nodes: &[NodeRef], options: &LayoutOptions) -> Self {
        let mut seen = HashSet::new();
        let nodes_out = nodes
            .iter()
            .filter(|node| seen.insert(node.id.as_str()))
            .filter_map(|node| {
                let point = result.get(&node.id)?;
                let size = node.size();
                Some(NodeDump {
                    id: node.id.clone(),
                    level: result.level(&node.id),
                    x: point.x,
                    y: point.y,
                    width: size.width,
                    height: size.height,
                    priority: resolve_priority(node, options),
                })
            })
            .collect();

        LayoutDump {
            source: result.source(),
            bounds: result.bounds(nodes),
            nodes: nodes_out,
        }
    }
}

pub fn write_layout_dump(
    path: &Path,
    result: &LayoutResult,
    nodes: &[NodeRef],
    options: &LayoutOptions,
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    write_layout_dump_to(BufWriter::new(file), result, nodes, options)
}

pub fn write_layout_dump_to<W: Write>(
    mut writer: W,
    result: &LayoutResult,
    nodes: &[NodeRef],
    options: &LayoutOptions,
) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(result, nodes, options);
    serde_json::to_writer_pretty(&mut writer, &dump)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
