//! creatorgraph records, graph assembly and export

mod assembler;
mod export;
mod loader;
mod types;

pub use assembler::{AssembledGraph, AssembledNode, GraphAssembler};
pub use export::{
    export, read_graph_json, to_graph_export, write_flat_csv, write_graph_json, CSV_HEADER,
};
pub use loader::{load_records, load_records_csv, load_records_json, parse_records_json};
pub use types::{GraphEdge, GraphExport, GraphNode, Record, SimilarityEdge, SubscriberCount};
