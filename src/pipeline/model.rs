use std::path::Path;

use anyhow::Result;
use ort::execution_providers;
use ort::session::builder::GraphOptimizationLevel;
pub use ort::session::Session;
use tracing::debug;

pub fn initialize_model(model_file_path: &Path, threads: usize) -> Result<Session> {
    // Falls back to the CPU provider where XNNPACK is unavailable
    ort::init()
        .with_execution_providers([execution_providers::XNNPACKExecutionProvider::default().build()])
        .commit()?;

    debug!("Loading model {model_file_path:?} with {threads} threads");
    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(threads.max(1))?
        .commit_from_file(model_file_path)?;

    Ok(model)
}
