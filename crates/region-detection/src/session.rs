//! ONNX Runtime session creation for the diary table model

use crate::RegionDetectionError;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;

/// Environment variable overriding the intra-op thread count
pub const THREADS_ENV: &str = "DIARY_EXTRACT_THREADS";

/// Create a CPU-only session with graph optimizations enabled
pub fn create_cpu_only_session(model_path: &Path) -> Result<Session, RegionDetectionError> {
    if !model_path.exists() {
        return Err(RegionDetectionError::ModelNotFound(
            model_path.display().to_string(),
        ));
    }

    let num_threads = std::env::var(THREADS_ENV)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(num_cpus::get_physical);

    Session::builder()
        .map_err(|e| RegionDetectionError::ModelLoad(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| RegionDetectionError::ModelLoad(e.to_string()))?
        .with_intra_threads(num_threads)
        .map_err(|e| RegionDetectionError::ModelLoad(e.to_string()))?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .map_err(|e| RegionDetectionError::ModelLoad(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| {
            RegionDetectionError::ModelLoad(format!("{}: {e}", model_path.display()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let result = create_cpu_only_session(Path::new("nonexistent_diary_model.onnx"));
        assert!(matches!(
            result,
            Err(RegionDetectionError::ModelNotFound(_))
        ));
    }
}
