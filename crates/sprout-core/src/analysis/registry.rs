//! The analysis-job registry and status poller.
//!
//! Owns every tracked analysis job plus the two bookkeeping structures
//! around polling: the set of ids under active polling and the timer table
//! that prevents duplicate concurrent pollers for one id. All shared state
//! sits behind one mutex with short, never-held-across-await critical
//! sections; poll sequences run as spawned tasks and re-check their timer
//! entry after every response, so a stopped sequence applies no further
//! bookkeeping even while its last attempt is still in flight.

use super::types::{
    Alert, Analysis, AnalysisOverview, AnalysisStats, AnalysisStatus, AnalysisType,
    AttentionItem, AttentionKind, BatchAnalysisResponse, CreateAnalysisResponse,
    LatestAnalysisResponse, Severity, StatusResponse, StatusUpdate, LOW_SCORE_THRESHOLD,
};
use crate::config::PollingConfig;
use crate::error::ApiError;
use crate::http::ApiClient;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Callback invoked with every intermediate status observed while polling.
pub type StatusCallback = Arc<dyn Fn(StatusUpdate) + Send + Sync>;

#[derive(Clone)]
pub struct AnalysisRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    client: ApiClient,
    max_poll_attempts: u32,
    poll_interval: Duration,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    /// Job table, ordered by id for deterministic iteration.
    jobs: BTreeMap<i64, Analysis>,
    /// Ids currently under active polling (liveness indicator only).
    analyzing: HashSet<i64>,
    /// Id → poll-start instant; the duplicate-poller guard.
    polling: HashMap<i64, Instant>,
    /// Last fetched aggregate statistics.
    stats: Option<AnalysisStats>,
}

impl AnalysisRegistry {
    pub fn new(client: ApiClient, polling: &PollingConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                max_poll_attempts: polling.max_attempts,
                poll_interval: polling.interval(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    // --- Submission and polling ---

    /// Create an analysis job server-side and start tracking it.
    ///
    /// The job is inserted as reported by the server (normally `pending`)
    /// and a poll sequence is spawned; the call returns immediately with the
    /// fresh record. There is deliberately no dedupe across submissions for
    /// the same (baby, type, range).
    pub async fn submit(
        &self,
        baby_id: i64,
        analysis_type: AnalysisType,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Analysis, ApiError> {
        let payload = json!({
            "baby_id": baby_id,
            "analysis_type": analysis_type.as_str(),
            "start_date": start_date.to_string(),
            "end_date": end_date.to_string(),
        });
        let created: CreateAnalysisResponse =
            self.inner.client.post("/analysis", Some(payload)).await?;

        let analysis = Analysis {
            id: created.analysis_id,
            baby_id,
            analysis_type,
            status: created.status,
            start_date: Some(start_date),
            end_date: Some(end_date),
            result: None,
            score: None,
            insights: Vec::new(),
            alerts: Vec::new(),
            created_at: created.created_at,
            updated_at: created.created_at,
        };

        {
            let mut state = self.inner.state.lock().unwrap();
            state.jobs.insert(analysis.id, analysis.clone());
            state.analyzing.insert(analysis.id);
            state.polling.insert(analysis.id, Instant::now());
        }
        tracing::info!(
            analysis = analysis.id,
            baby = baby_id,
            kind = %analysis_type,
            "analysis submitted"
        );

        let registry = self.clone();
        let id = analysis.id;
        tokio::spawn(async move {
            if let Err(err) = registry.run_poll_sequence(id, None).await {
                tracing::warn!(analysis = id, %err, "poll sequence ended in failure");
            }
        });

        Ok(analysis)
    }

    /// Start a poll sequence for an already-known job id.
    ///
    /// Starting a sequence for an id that already has a timer entry is a
    /// logged no-op.
    pub fn start_polling(&self, id: i64, callback: Option<StatusCallback>) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.polling.contains_key(&id) {
                tracing::debug!(analysis = id, "already polling; ignoring duplicate start");
                return;
            }
            state.polling.insert(id, Instant::now());
            state.analyzing.insert(id);
        }

        let registry = self.clone();
        tokio::spawn(async move {
            match registry.run_poll_sequence(id, callback).await {
                Ok(resp) => {
                    tracing::debug!(analysis = id, status = %resp.status, "poll sequence finished")
                }
                Err(err) => tracing::warn!(analysis = id, %err, "poll sequence ended in failure"),
            }
        });
    }

    /// Stop polling one id. The stored job's status is left untouched.
    pub fn stop_polling(&self, id: i64) {
        let mut state = self.inner.state.lock().unwrap();
        state.polling.remove(&id);
        state.analyzing.remove(&id);
    }

    /// Stop every active poll sequence.
    pub fn stop_all_polling(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.polling.clear();
        state.analyzing.clear();
    }

    pub fn is_polling(&self, id: i64) -> bool {
        self.inner.state.lock().unwrap().polling.contains_key(&id)
    }

    /// True while any job is under active polling.
    pub fn has_active(&self) -> bool {
        !self.inner.state.lock().unwrap().analyzing.is_empty()
    }

    /// Query job status until a terminal state or the attempt budget runs
    /// out, applying each observed update to the stored record.
    async fn run_poll_sequence(
        &self,
        id: i64,
        callback: Option<StatusCallback>,
    ) -> Result<StatusResponse, ApiError> {
        let max = self.inner.max_poll_attempts;
        let path = format!("/analysis/{id}/status");

        for attempt in 1..=max {
            let resp: StatusResponse = match self.inner.client.get(&path, None).await {
                Ok(resp) => resp,
                Err(err) => {
                    tracing::warn!(analysis = id, %err, "status query failed");
                    self.finalize_failure(id);
                    return Err(err);
                }
            };

            if resp.status.is_terminal() {
                self.finalize_terminal(id, &resp);
                return Ok(resp);
            }

            if !self.apply_intermediate(id, &resp, callback.as_deref()) {
                tracing::debug!(analysis = id, "poll sequence stopped; discarding update");
                return Ok(resp);
            }

            if attempt < max {
                tokio::time::sleep(self.inner.poll_interval).await;
            }
        }

        tracing::warn!(
            analysis = id,
            attempts = max,
            "poll budget exhausted without a terminal status"
        );
        self.finalize_failure(id);
        Err(ApiError::Transport {
            status: None,
            message: format!("analysis {id} did not reach a terminal status after {max} queries"),
        })
    }

    /// Apply a non-terminal update. Returns false when the sequence was
    /// stopped, in which case nothing is applied and no callback fires.
    fn apply_intermediate(
        &self,
        id: i64,
        resp: &StatusResponse,
        callback: Option<&(dyn Fn(StatusUpdate) + Send + Sync)>,
    ) -> bool {
        {
            let mut state = self.inner.state.lock().unwrap();
            if !state.polling.contains_key(&id) {
                return false;
            }
            if let Some(job) = state.jobs.get_mut(&id) {
                job.status = resp.status;
                job.updated_at = Utc::now();
            }
        }
        if let Some(callback) = callback {
            callback(StatusUpdate {
                status: resp.status,
                progress: resp.progress,
                message: resp.message.clone(),
            });
        }
        true
    }

    /// Record a terminal status and release both tracking entries.
    fn finalize_terminal(&self, id: i64, resp: &StatusResponse) {
        let now = Utc::now();
        let mut state = self.inner.state.lock().unwrap();
        if state.polling.remove(&id).is_none() {
            // Stopped while the final attempt was in flight.
            return;
        }
        state.analyzing.remove(&id);
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = resp.status;
            job.updated_at = now;
            if resp.status == AnalysisStatus::Completed {
                if let Some(result) = &resp.result {
                    job.merge_result(result, now);
                }
            }
        }
    }

    /// Force the stored job to `failed` after exhaustion or a transport
    /// failure, releasing both tracking entries.
    fn finalize_failure(&self, id: i64) {
        let mut state = self.inner.state.lock().unwrap();
        if state.polling.remove(&id).is_none() {
            return;
        }
        state.analyzing.remove(&id);
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = AnalysisStatus::Failed;
            job.updated_at = Utc::now();
        }
    }

    // --- In-memory queries ---

    pub fn job(&self, id: i64) -> Option<Analysis> {
        self.inner.state.lock().unwrap().jobs.get(&id).cloned()
    }

    pub fn jobs_for_baby(&self, baby_id: i64) -> Vec<Analysis> {
        let state = self.inner.state.lock().unwrap();
        state
            .jobs
            .values()
            .filter(|job| job.baby_id == baby_id)
            .cloned()
            .collect()
    }

    pub fn completed(&self) -> Vec<Analysis> {
        self.with_status(|status| status == AnalysisStatus::Completed)
    }

    /// Jobs still moving through the pipeline (pending or analyzing).
    pub fn in_flight(&self) -> Vec<Analysis> {
        self.with_status(|status| {
            matches!(status, AnalysisStatus::Pending | AnalysisStatus::Analyzing)
        })
    }

    pub fn failed(&self) -> Vec<Analysis> {
        self.with_status(|status| status == AnalysisStatus::Failed)
    }

    fn with_status(&self, predicate: impl Fn(AnalysisStatus) -> bool) -> Vec<Analysis> {
        let state = self.inner.state.lock().unwrap();
        state
            .jobs
            .values()
            .filter(|job| predicate(job.status))
            .cloned()
            .collect()
    }

    /// Most recently created completed analysis of the given type.
    pub fn latest_by_type(&self, analysis_type: AnalysisType) -> Option<Analysis> {
        let state = self.inner.state.lock().unwrap();
        state
            .jobs
            .values()
            .filter(|job| {
                job.analysis_type == analysis_type && job.status == AnalysisStatus::Completed
            })
            .max_by_key(|job| job.created_at)
            .cloned()
    }

    /// Counts and average score over one baby's tracked jobs.
    pub fn overview(&self, baby_id: i64) -> AnalysisOverview {
        let state = self.inner.state.lock().unwrap();
        let jobs: Vec<&Analysis> = state
            .jobs
            .values()
            .filter(|job| job.baby_id == baby_id)
            .collect();
        let scores: Vec<f64> = jobs.iter().filter_map(|job| job.score).collect();

        AnalysisOverview {
            total: jobs.len(),
            completed: jobs
                .iter()
                .filter(|job| job.status == AnalysisStatus::Completed)
                .count(),
            pending: jobs
                .iter()
                .filter(|job| {
                    matches!(
                        job.status,
                        AnalysisStatus::Pending | AnalysisStatus::Analyzing
                    )
                })
                .count(),
            failed: jobs
                .iter()
                .filter(|job| job.status == AnalysisStatus::Failed)
                .count(),
            average_score: if scores.is_empty() {
                None
            } else {
                Some(scores.iter().sum::<f64>() / scores.len() as f64)
            },
        }
    }

    /// Items a caregiver should look at, derived from completed analyses.
    ///
    /// Alert records that fail to decode are skipped, not fatal; one corrupt
    /// entry must not hide every valid item.
    pub fn attention_items(&self, baby_id: i64) -> Vec<AttentionItem> {
        let state = self.inner.state.lock().unwrap();
        let mut items = Vec::new();

        for job in state
            .jobs
            .values()
            .filter(|job| job.baby_id == baby_id && job.status == AnalysisStatus::Completed)
        {
            for encoded in &job.alerts {
                match serde_json::from_str::<Alert>(encoded) {
                    Ok(alert)
                        if matches!(alert.level, Severity::Critical | Severity::Warning) =>
                    {
                        items.push(AttentionItem {
                            kind: AttentionKind::Alert,
                            title: alert.title,
                            description: alert.description,
                            level: alert.level,
                            analysis_type: job.analysis_type,
                            score: None,
                        });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(analysis = job.id, %err, "skipping undecodable alert record")
                    }
                }
            }

            if let Some(score) = job.score {
                if score < LOW_SCORE_THRESHOLD {
                    items.push(AttentionItem {
                        kind: AttentionKind::LowScore,
                        title: format!("{} score is low", job.analysis_type),
                        description: format!("scored {score:.0}; worth a closer look"),
                        level: Severity::Warning,
                        analysis_type: job.analysis_type,
                        score: Some(score),
                    });
                }
            }
        }

        // Stable sort: ties keep encounter order.
        items.sort_by_key(|item| std::cmp::Reverse(item.level.rank()));
        items
    }

    /// Drop one stored job, or every stored job. Poll bookkeeping for
    /// dropped ids is released as well.
    pub fn clear(&self, id: Option<i64>) {
        let mut state = self.inner.state.lock().unwrap();
        match id {
            Some(id) => {
                state.jobs.remove(&id);
                state.analyzing.remove(&id);
                state.polling.remove(&id);
            }
            None => {
                state.jobs.clear();
                state.analyzing.clear();
                state.polling.clear();
            }
        }
    }

    // --- Remote lookups ---

    /// Latest server-side analysis of a type, fetched and cached when the
    /// local table has nothing. A not-found response means "no such job".
    pub async fn fetch_latest(
        &self,
        baby_id: i64,
        analysis_type: AnalysisType,
    ) -> Result<Option<Analysis>, ApiError> {
        if let Some(cached) = self.latest_by_type(analysis_type) {
            return Ok(Some(cached));
        }

        let params = json!({
            "baby_id": baby_id,
            "analysis_type": analysis_type.as_str(),
        });
        let resp: LatestAnalysisResponse =
            match self.inner.client.get("/analysis/latest", Some(params)).await {
                Ok(resp) => resp,
                Err(err) if err.is_not_found() => return Ok(None),
                Err(err) => return Err(err),
            };

        let Some(result) = resp.result else {
            return Ok(None);
        };

        let mut analysis = Analysis {
            id: resp.analysis_id,
            baby_id,
            analysis_type,
            status: resp.status,
            start_date: None,
            end_date: None,
            result: None,
            score: None,
            insights: Vec::new(),
            alerts: Vec::new(),
            created_at: resp.created_at,
            updated_at: resp.created_at,
        };
        analysis.merge_result(&result, resp.created_at);

        let mut state = self.inner.state.lock().unwrap();
        state.jobs.insert(analysis.id, analysis.clone());
        Ok(Some(analysis))
    }

    /// Fetch a tracked job's current server-side state and merge it into
    /// the stored record.
    pub async fn fetch_result(&self, id: i64) -> Result<Analysis, ApiError> {
        let resp: StatusResponse = self
            .inner
            .client
            .get(&format!("/analysis/{id}"), None)
            .await?;

        let now = Utc::now();
        let mut state = self.inner.state.lock().unwrap();
        let Some(job) = state.jobs.get_mut(&id) else {
            return Err(ApiError::NotFound {
                message: format!("analysis {id} is not tracked locally"),
            });
        };
        job.status = resp.status;
        job.updated_at = now;
        if let Some(result) = &resp.result {
            job.merge_result(result, now);
        }
        Ok(job.clone())
    }

    /// Fetch aggregate statistics for a baby, caching the snapshot.
    pub async fn fetch_stats(&self, baby_id: i64) -> Result<AnalysisStats, ApiError> {
        let stats: AnalysisStats = self
            .inner
            .client
            .get("/analysis/stats", Some(json!({"baby_id": baby_id})))
            .await?;
        self.inner.state.lock().unwrap().stats = Some(stats.clone());
        Ok(stats)
    }

    /// Last fetched statistics snapshot, if any.
    pub fn stats(&self) -> Option<AnalysisStats> {
        self.inner.state.lock().unwrap().stats.clone()
    }

    /// Kick off one analysis per type over a record window. Individual jobs
    /// are tracked when polled, not here.
    pub async fn submit_batch(
        &self,
        baby_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<BatchAnalysisResponse, ApiError> {
        let payload = json!({
            "baby_id": baby_id,
            "start_date": start_date.to_string(),
            "end_date": end_date.to_string(),
        });
        self.inner.client.post("/analysis/batch", Some(payload)).await
    }
}
