use creatorgraph_common::{AssemblyStrictness, CreatorGraphError, Result};
use creatorgraph_vector::Coordinate;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::types::{Record, SimilarityEdge};

/// Record joined with its layout
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledNode {
    pub record: Record,
    pub coordinate: Coordinate,
    pub cluster: Option<usize>,
}

/// Nodes and edges ready for export.
///
/// Every edge endpoint is a node id, no edge is a self-loop, and no
/// unordered pair appears twice.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssembledGraph {
    pub nodes: Vec<AssembledNode>,
    pub edges: Vec<SimilarityEdge>,
}

impl AssembledGraph {
    /// Coordinate dimensionality (0 for an empty graph)
    pub fn dims(&self) -> usize {
        self.nodes.first().map(|n| n.coordinate.dims()).unwrap_or(0)
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.record.id.as_str()).collect()
    }
}

/// Joins records, coordinates, cluster labels and edges
#[derive(Debug, Clone)]
pub struct GraphAssembler {
    strictness: AssemblyStrictness,
}

impl GraphAssembler {
    pub fn new(strictness: AssemblyStrictness) -> Self {
        Self { strictness }
    }

    /// Assemble the export structure.
    ///
    /// `labels` is `Some` when clustering is enabled; every kept node then
    /// carries a label. Records without layout data fail the assembly
    /// (`Strict`) or are dropped together with their edges (`Lenient`).
    pub fn assemble(
        &self,
        records: Vec<Record>,
        coordinates: &HashMap<String, Coordinate>,
        labels: Option<&HashMap<String, usize>>,
        edges: Vec<SimilarityEdge>,
    ) -> Result<AssembledGraph> {
        let total = records.len();
        let known: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
        if known.len() != total {
            return Err(CreatorGraphError::assembly(
                "Record ids are not unique; refusing to assemble",
            ));
        }

        // Step 1: nodes
        let mut nodes = Vec::with_capacity(total);
        let mut dims = None;
        for record in records {
            let Some(coordinate) = coordinates.get(&record.id).copied() else {
                self.reject(&record, "no coordinate")?;
                continue;
            };

            let cluster = match labels {
                Some(labels) => match labels.get(&record.id) {
                    Some(label) => Some(*label),
                    None => {
                        self.reject(&record, "no cluster label")?;
                        continue;
                    }
                },
                None => None,
            };

            match dims {
                None => dims = Some(coordinate.dims()),
                Some(d) if d != coordinate.dims() => {
                    return Err(CreatorGraphError::assembly(format!(
                        "Record '{}' has a {}D coordinate, expected {}D",
                        record.id,
                        coordinate.dims(),
                        d
                    )));
                }
                Some(_) => {}
            }

            if record.thumbnail.is_none() {
                debug!("Record '{}' has no thumbnail", record.id);
            }
            if record.external_link.is_none() {
                debug!("Record '{}' has no external link", record.id);
            }

            nodes.push(AssembledNode {
                record,
                coordinate,
                cluster,
            });
        }

        // Step 2: edges
        let kept: HashSet<&str> = nodes.iter().map(|n| n.record.id.as_str()).collect();
        let mut seen_pairs: HashSet<(String, String)> = HashSet::with_capacity(edges.len());
        let mut kept_edges = Vec::with_capacity(edges.len());
        let mut dropped_edges = 0usize;

        for edge in edges {
            let edge = SimilarityEdge::new(edge.source_id, edge.target_id, edge.weight);

            if edge.is_self_loop() {
                return Err(CreatorGraphError::assembly(format!(
                    "Self-loop edge on '{}'",
                    edge.source_id
                )));
            }
            if !edge.weight.is_finite() {
                return Err(CreatorGraphError::assembly(format!(
                    "Edge '{}' - '{}' has non-finite weight",
                    edge.source_id, edge.target_id
                )));
            }
            for endpoint in [&edge.source_id, &edge.target_id] {
                if !known.contains(endpoint) {
                    return Err(CreatorGraphError::assembly(format!(
                        "Edge references unknown record '{}'",
                        endpoint
                    )));
                }
            }

            if !kept.contains(edge.source_id.as_str()) || !kept.contains(edge.target_id.as_str()) {
                debug!(
                    "Dropping edge '{}' - '{}': endpoint not assembled",
                    edge.source_id, edge.target_id
                );
                dropped_edges += 1;
                continue;
            }

            if !seen_pairs.insert((edge.source_id.clone(), edge.target_id.clone())) {
                return Err(CreatorGraphError::assembly(format!(
                    "Duplicate edge '{}' - '{}'",
                    edge.source_id, edge.target_id
                )));
            }

            kept_edges.push(edge);
        }

        info!(
            "Assembled graph: {}/{} nodes, {} edges ({} dropped)",
            nodes.len(),
            total,
            kept_edges.len(),
            dropped_edges
        );

        Ok(AssembledGraph {
            nodes,
            edges: kept_edges,
        })
    }

    fn reject(&self, record: &Record, reason: &str) -> Result<()> {
        match self.strictness {
            AssemblyStrictness::Strict => Err(CreatorGraphError::assembly(format!(
                "Record '{}' has {}",
                record.id, reason
            ))),
            AssemblyStrictness::Lenient => {
                warn!("Dropping record '{}' ({}): {}", record.id, record.title, reason);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubscriberCount;

    fn record(id: &str) -> Record {
        Record {
            id: id.to_string(),
            title: id.to_uppercase(),
            description: "bio".to_string(),
            rich_text: None,
            thumbnail: None,
            external_link: None,
            subscribers: SubscriberCount::Unknown,
        }
    }

    fn coord(x: f64, y: f64) -> Coordinate {
        Coordinate { x, y, z: None }
    }

    fn coords(ids: &[&str]) -> HashMap<String, Coordinate> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), coord(i as f64, 0.0)))
            .collect()
    }

    #[test]
    fn test_assemble() {
        let graph = GraphAssembler::new(AssemblyStrictness::Strict)
            .assemble(
                vec![record("a"), record("b"), record("c")],
                &coords(&["a", "b", "c"]),
                None,
                vec![SimilarityEdge::new("b", "a", 0.9)],
            )
            .unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.dims(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source_id, "a");
        assert!(graph.nodes.iter().all(|n| n.cluster.is_none()));
    }

    #[test]
    fn test_missing_coordinate_strict_fails() {
        let err = GraphAssembler::new(AssemblyStrictness::Strict)
            .assemble(
                vec![record("a"), record("b")],
                &coords(&["a"]),
                None,
                vec![],
            )
            .unwrap_err();
        assert!(matches!(err, CreatorGraphError::Assembly(_)));
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_missing_coordinate_lenient_drops_node_and_edges() {
        let graph = GraphAssembler::new(AssemblyStrictness::Lenient)
            .assemble(
                vec![record("a"), record("b"), record("c")],
                &coords(&["a", "c"]),
                None,
                vec![
                    SimilarityEdge::new("a", "b", 0.8),
                    SimilarityEdge::new("a", "c", 0.7),
                ],
            )
            .unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges, vec![SimilarityEdge::new("a", "c", 0.7)]);
    }

    #[test]
    fn test_missing_label_when_clustering() {
        let labels: HashMap<String, usize> = [("a".to_string(), 0)].into_iter().collect();

        let err = GraphAssembler::new(AssemblyStrictness::Strict)
            .assemble(
                vec![record("a"), record("b")],
                &coords(&["a", "b"]),
                Some(&labels),
                vec![],
            )
            .unwrap_err();
        assert!(err.to_string().contains("no cluster label"));

        let graph = GraphAssembler::new(AssemblyStrictness::Lenient)
            .assemble(
                vec![record("a"), record("b")],
                &coords(&["a", "b"]),
                Some(&labels),
                vec![],
            )
            .unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.nodes[0].cluster, Some(0));
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = GraphAssembler::new(AssemblyStrictness::Lenient)
            .assemble(
                vec![record("a")],
                &coords(&["a"]),
                None,
                vec![SimilarityEdge::new("a", "a", 1.0)],
            )
            .unwrap_err();
        assert!(err.to_string().contains("Self-loop"));
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let err = GraphAssembler::new(AssemblyStrictness::Strict)
            .assemble(
                vec![record("a"), record("b")],
                &coords(&["a", "b"]),
                None,
                vec![
                    SimilarityEdge::new("a", "b", 0.9),
                    SimilarityEdge::new("b", "a", 0.9),
                ],
            )
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate edge"));
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let err = GraphAssembler::new(AssemblyStrictness::Lenient)
            .assemble(
                vec![record("a")],
                &coords(&["a"]),
                None,
                vec![SimilarityEdge::new("a", "zzz", 0.9)],
            )
            .unwrap_err();
        assert!(err.to_string().contains("unknown record 'zzz'"));
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let mut layout = coords(&["a"]);
        layout.insert(
            "b".to_string(),
            Coordinate {
                x: 0.0,
                y: 0.0,
                z: Some(1.0),
            },
        );
        let err = GraphAssembler::new(AssemblyStrictness::Strict)
            .assemble(vec![record("a"), record("b")], &layout, None, vec![])
            .unwrap_err();
        assert!(matches!(err, CreatorGraphError::Assembly(_)));
    }
}
