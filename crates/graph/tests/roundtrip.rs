use creatorgraph_common::{AssemblyStrictness, OutputFormat};
use creatorgraph_graph::{
    export, load_records, read_graph_json, GraphAssembler, SimilarityEdge, SubscriberCount,
};
use creatorgraph_vector::Coordinate;
use std::collections::HashMap;
use std::fs;

const CREATORS_CSV: &str = "\
id,title,description,thumbnail,youtube_url,subscribers
UC1,Alpha,\"Cooking, baking\",http://img/1,https://youtube.com/@alpha,\"1,200\"
UC2,Beta,Speedruns,,https://youtube.com/@beta,N/A
UC3,Gamma,Street food,http://img/3,,900
";

#[test]
fn test_csv_load_assemble_export_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("creators.csv");
    let output = dir.path().join("out").join("graph_data.json");
    fs::write(&input, CREATORS_CSV).unwrap();

    let records = load_records(&input).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].description, "Cooking, baking");
    assert_eq!(records[0].subscribers, SubscriberCount::Count(1200));
    assert_eq!(records[1].thumbnail, None);
    assert_eq!(records[2].external_link, None);

    let coordinates: HashMap<String, Coordinate> = [
        ("UC1", -4.0, 1.0),
        ("UC2", 8.5, 0.0),
        ("UC3", -3.5, 1.25),
    ]
    .into_iter()
    .map(|(id, x, y)| (id.to_string(), Coordinate { x, y, z: None }))
    .collect();
    let labels: HashMap<String, usize> = [("UC1", 0), ("UC2", 1), ("UC3", 0)]
        .into_iter()
        .map(|(id, l)| (id.to_string(), l))
        .collect();
    let edges = vec![SimilarityEdge::new("UC3", "UC1", 0.84375)];

    let graph = GraphAssembler::new(AssemblyStrictness::Strict)
        .assemble(records, &coordinates, Some(&labels), edges)
        .unwrap();
    export(&output, OutputFormat::Json, &graph).unwrap();

    let back = read_graph_json(&output).unwrap();
    assert_eq!(back.nodes.len(), 3);
    assert_eq!(back.edges.len(), 1);
    assert_eq!(back.edges[0].source, "UC1");
    assert_eq!(back.edges[0].target, "UC3");
    assert_eq!(back.edges[0].weight, 0.84375);
    assert_eq!(back.edges[0].label, "0.84");

    let beta = back.nodes.iter().find(|n| n.id == "UC2").unwrap();
    assert_eq!(beta.image, "");
    assert_eq!(beta.subscribers, SubscriberCount::Unknown);
    assert_eq!(beta.cluster, Some(1));
    assert_eq!(beta.x, 8.5);

    // no temp file left behind
    let leftovers: Vec<_> = fs::read_dir(output.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_csv_missing_required_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("creators.csv");
    fs::write(&input, "name,description\nAlpha,x\n").unwrap();

    let err = load_records(&input).unwrap_err();
    assert!(err.to_string().contains("missing required column 'id'"));
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_records(&dir.path().join("nope.json")).unwrap_err();
    assert_eq!(err.stage(), "load");
}

#[test]
fn test_similarity_weights_survive_json_round_trip() {
    use creatorgraph_graph::{write_graph_json, GraphEdge, GraphExport};
    use creatorgraph_vector::{similarity_matrix, EmbeddingMatrix};

    // non-dyadic cosine values, as produced by real embeddings
    let rows: Vec<Vec<f32>> = (0..40)
        .map(|i| {
            (0..16)
                .map(|d| ((i * 16 + d) as f32 * 0.7390851).sin())
                .collect()
        })
        .collect();
    let sim = similarity_matrix(&EmbeddingMatrix::from_rows(&rows).unwrap());

    let mut edges = Vec::new();
    for i in 0..rows.len() {
        for j in (i + 1)..rows.len() {
            let weight = sim[[i, j]];
            edges.push(GraphEdge {
                source: format!("n{:02}", i),
                target: format!("n{:02}", j),
                weight,
                label: format!("{:.2}", weight),
            });
        }
    }
    edges.push(GraphEdge {
        source: "x".to_string(),
        target: "y".to_string(),
        weight: 0.9856906946328695,
        label: "0.99".to_string(),
    });
    let written = GraphExport {
        nodes: vec![],
        edges,
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.json");
    write_graph_json(&path, &written).unwrap();
    let back = read_graph_json(&path).unwrap();

    assert_eq!(back.edges.len(), written.edges.len());
    for (a, b) in written.edges.iter().zip(&back.edges) {
        assert_eq!(
            a.weight.to_bits(),
            b.weight.to_bits(),
            "{} - {}: {} came back as {}",
            a.source,
            a.target,
            a.weight,
            b.weight
        );
    }
}
