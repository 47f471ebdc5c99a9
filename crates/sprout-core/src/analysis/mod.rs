//! Asynchronous analysis-job lifecycle: submission, status polling, result
//! materialization, and in-memory queries over tracked jobs.

mod registry;
mod types;

pub use registry::{AnalysisRegistry, StatusCallback};
pub use types::{
    Alert, Analysis, AnalysisOverview, AnalysisResult, AnalysisStats, AnalysisStatus,
    AnalysisType, AttentionItem, AttentionKind, BatchAnalysisResponse, Severity, StatusUpdate,
    LOW_SCORE_THRESHOLD,
};
