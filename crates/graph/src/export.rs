use creatorgraph_common::{write_atomic, CreatorGraphError, OutputFormat, Result};
use std::path::Path;
use tracing::info;

use crate::assembler::AssembledGraph;
use crate::types::{GraphEdge, GraphExport, GraphNode};

/// Flat table columns; `z` is appended for 3D layouts
pub const CSV_HEADER: [&str; 8] = [
    "id",
    "title",
    "description",
    "thumbnail",
    "youtube_url",
    "cluster_id",
    "x",
    "y",
];

const NODE_SHAPE: &str = "circularImage";

/// Convert an assembled graph into the dashboard JSON shape
pub fn to_graph_export(graph: &AssembledGraph) -> GraphExport {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| GraphNode {
            id: node.record.id.clone(),
            label: node.record.title.clone(),
            image: node.record.thumbnail.clone().unwrap_or_default(),
            x: node.coordinate.x,
            y: node.coordinate.y,
            z: node.coordinate.z,
            subscribers: node.record.subscribers,
            cluster: node.cluster,
            title: node.record.tooltip(),
            shape: NODE_SHAPE.to_string(),
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .map(|edge| GraphEdge {
            source: edge.source_id.clone(),
            target: edge.target_id.clone(),
            weight: edge.weight,
            label: format!("{:.2}", edge.weight),
        })
        .collect();

    GraphExport { nodes, edges }
}

/// Write graph JSON atomically
pub fn write_graph_json(path: &Path, export: &GraphExport) -> Result<()> {
    let data = serde_json::to_vec_pretty(export)?;
    write_atomic(path, &data)?;
    info!(
        "Graph JSON saved: {} nodes, {} edges -> {}",
        export.nodes.len(),
        export.edges.len(),
        path.display()
    );
    Ok(())
}

/// Read a graph JSON artifact back
pub fn read_graph_json(path: &Path) -> Result<GraphExport> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Write the flat table atomically, rows ordered by cluster id
pub fn write_flat_csv(path: &Path, graph: &AssembledGraph) -> Result<()> {
    let three_d = graph.dims() == 3;
    let csv_err = |e: csv::Error| CreatorGraphError::export(format!("CSV write failed: {}", e));

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = CSV_HEADER.to_vec();
    if three_d {
        header.push("z");
    }
    writer.write_record(&header).map_err(csv_err)?;

    // stable sort: unclustered rows keep input order
    let mut rows: Vec<_> = graph.nodes.iter().collect();
    rows.sort_by_key(|node| node.cluster);

    for node in rows {
        let record = &node.record;
        let mut fields = vec![
            record.id.clone(),
            record.title.clone(),
            record.description.clone(),
            record.thumbnail.clone().unwrap_or_default(),
            record.external_link.clone().unwrap_or_default(),
            node.cluster.map(|c| c.to_string()).unwrap_or_default(),
            node.coordinate.x.to_string(),
            node.coordinate.y.to_string(),
        ];
        if three_d {
            fields.push(node.coordinate.z.unwrap_or_default().to_string());
        }
        writer.write_record(&fields).map_err(csv_err)?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| CreatorGraphError::export(format!("CSV flush failed: {}", e)))?;
    write_atomic(path, &data)?;

    info!(
        "Flat table saved: {} rows -> {}",
        graph.nodes.len(),
        path.display()
    );
    Ok(())
}

/// Write the artifact in the configured format
pub fn export(path: &Path, format: OutputFormat, graph: &AssembledGraph) -> Result<()> {
    match format {
        OutputFormat::Json => write_graph_json(path, &to_graph_export(graph)),
        OutputFormat::Csv => write_flat_csv(path, graph),
    }
}
