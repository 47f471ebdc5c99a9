//! Analysis-domain data types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Score below which a completed analysis earns a `low_score` attention item.
pub const LOW_SCORE_THRESHOLD: f64 = 60.0;

/// Kind of analysis the service can run over a record window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Feeding,
    Sleep,
    Growth,
    Health,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::Feeding,
        AnalysisType::Sleep,
        AnalysisType::Growth,
        AnalysisType::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Feeding => "feeding",
            AnalysisType::Sleep => "sleep",
            AnalysisType::Growth => "growth",
            AnalysisType::Health => "health",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feeding" => Ok(AnalysisType::Feeding),
            "sleep" => Ok(AnalysisType::Sleep),
            "growth" => Ok(AnalysisType::Growth),
            "health" => Ok(AnalysisType::Health),
            other => Err(format!(
                "unknown analysis type '{other}' (expected feeding|sleep|growth|health)"
            )),
        }
    }
}

/// Lifecycle state of one analysis job.
///
/// `pending → analyzing → {completed | failed}`; `failed` is also forced
/// locally when a poll sequence exhausts its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Analyzing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    /// Terminal states stop the poll sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Analyzing => "analyzing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result payload the server attaches to a completed analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default)]
    pub insights: Vec<Value>,

    #[serde(default)]
    pub alerts: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// One tracked analysis job.
///
/// Insight and alert entries are kept as opaque JSON-encoded strings; only
/// attention-item derivation looks inside alerts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub baby_id: i64,
    pub analysis_type: AnalysisType,
    pub status: AnalysisStatus,

    /// Window the analysis covers; unknown when hydrated from a
    /// latest-analysis fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub alerts: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    /// Merge a completed result payload into this record.
    pub(crate) fn merge_result(&mut self, result: &AnalysisResult, now: DateTime<Utc>) {
        self.score = result.score;
        self.insights = result.insights.iter().map(Value::to_string).collect();
        self.alerts = result.alerts.iter().map(Value::to_string).collect();
        self.result = Some(result.clone());
        self.updated_at = now;
    }
}

// --- Wire payloads ---

/// Response to a job-creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAnalysisResponse {
    pub analysis_id: i64,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}

/// One status-poll response. `result` is present only when `completed`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: AnalysisStatus,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
}

/// Response to a latest-analysis lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestAnalysisResponse {
    pub analysis_id: i64,
    pub status: AnalysisStatus,
    #[serde(default)]
    pub result: Option<AnalysisResult>,
    pub created_at: DateTime<Utc>,
}

/// Aggregate statistics for one baby's analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub total: u32,
    pub completed: u32,
    pub pending: u32,
    pub failed: u32,
    #[serde(default)]
    pub average_score: Option<f64>,
}

/// Response to a batch-analysis request: one job id per analysis type.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchAnalysisResponse {
    #[serde(default)]
    pub analysis_ids: Vec<i64>,
}

/// Snapshot handed to status-update callbacks during polling.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: AnalysisStatus,
    pub progress: Option<u8>,
    pub message: Option<String>,
}

/// Local overview derived from the in-memory job table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOverview {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
    pub average_score: Option<f64>,
}

// --- Attention items ---

/// Alert severity, ranked for attention-item ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 3,
            Severity::Warning => 2,
            Severity::Info => 1,
            Severity::Unknown => 0,
        }
    }
}

/// Decoded alert record, as stored inside an analysis result.
#[derive(Debug, Clone, Deserialize)]
pub struct Alert {
    pub level: Severity,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionKind {
    Alert,
    LowScore,
}

/// One item a caregiver should look at, derived from completed analyses.
#[derive(Debug, Clone, Serialize)]
pub struct AttentionItem {
    pub kind: AttentionKind,
    pub title: String,
    pub description: String,
    pub level: Severity,
    pub analysis_type: AnalysisType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_terminality() {
        assert!(!AnalysisStatus::Pending.is_terminal());
        assert!(!AnalysisStatus::Analyzing.is_terminal());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Failed.is_terminal());
    }

    #[test]
    fn test_analysis_type_round_trip() {
        for kind in AnalysisType::ALL {
            assert_eq!(kind.as_str().parse::<AnalysisType>().unwrap(), kind);
        }
        assert!("weather".parse::<AnalysisType>().is_err());
    }

    #[test]
    fn test_severity_ranks() {
        assert!(Severity::Critical.rank() > Severity::Warning.rank());
        assert!(Severity::Warning.rank() > Severity::Info.rank());
        assert!(Severity::Info.rank() > Severity::Unknown.rank());
    }

    #[test]
    fn test_unknown_severity_deserializes() {
        let alert: Alert =
            serde_json::from_value(json!({"level": "catastrophic", "title": "x"})).unwrap();
        assert_eq!(alert.level, Severity::Unknown);
    }

    #[test]
    fn test_merge_result_encodes_entries() {
        let now = Utc::now();
        let mut analysis = Analysis {
            id: 1,
            baby_id: 7,
            analysis_type: AnalysisType::Feeding,
            status: AnalysisStatus::Completed,
            start_date: None,
            end_date: None,
            result: None,
            score: None,
            insights: vec![],
            alerts: vec![],
            created_at: now,
            updated_at: now,
        };
        let result = AnalysisResult {
            score: Some(82.0),
            insights: vec![json!({"text": "regular meals"})],
            alerts: vec![json!({"level": "info", "title": "ok"})],
            summary: None,
        };
        analysis.merge_result(&result, now);
        assert_eq!(analysis.score, Some(82.0));
        assert_eq!(analysis.insights.len(), 1);
        // Stored entries stay decodable.
        let alert: Alert = serde_json::from_str(&analysis.alerts[0]).unwrap();
        assert_eq!(alert.level, Severity::Info);
    }

    #[test]
    fn test_status_response_without_result() {
        let resp: StatusResponse =
            serde_json::from_value(json!({"status": "analyzing", "progress": 40})).unwrap();
        assert_eq!(resp.status, AnalysisStatus::Analyzing);
        assert_eq!(resp.progress, Some(40));
        assert!(resp.result.is_none());
    }
}
