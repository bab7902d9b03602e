//! creatorgraph pipeline orchestration

pub mod workflow;

pub use workflow::{build_provider, check_records, run_pipeline, PipelineStep, PipelineSummary};
