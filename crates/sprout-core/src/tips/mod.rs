//! Date-keyed advisory content with a 24-hour validity window.
//!
//! Tips are best-effort decoration: a caller asking for tips must never be
//! blocked by a failure, so every error path here degrades to an empty
//! sequence after the designed fallbacks (cache → fetch → generate).

use crate::error::ApiError;
use crate::http::ApiClient;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One advisory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTip {
    pub category: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct TipsResponse {
    #[serde(default)]
    tips: Vec<DailyTip>,
}

/// A bucket is valid from its date's midnight (UTC) for 24 hours.
///
/// Pure in its inputs so the window can be checked at fixed instants.
pub fn bucket_valid_at(date: NaiveDate, now: DateTime<Utc>) -> bool {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    now < start + Duration::hours(24)
}

#[derive(Clone)]
pub struct TipCache {
    inner: Arc<Inner>,
}

struct Inner {
    client: ApiClient,
    buckets: Mutex<HashMap<NaiveDate, Vec<DailyTip>>>,
}

impl TipCache {
    pub fn new(client: ApiClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                buckets: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn resolve(date: Option<NaiveDate>) -> NaiveDate {
        date.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Tips for a date (today when omitted): cached bucket if non-empty,
    /// otherwise fetched; a not-found fetch falls through to generation.
    /// Never fails; tip absence must not block a caller.
    pub async fn tips(&self, baby_id: i64, date: Option<NaiveDate>) -> Vec<DailyTip> {
        let date = Self::resolve(date);

        {
            let buckets = self.inner.buckets.lock().unwrap();
            if let Some(bucket) = buckets.get(&date) {
                if !bucket.is_empty() {
                    tracing::debug!(%date, count = bucket.len(), "serving tips from cache");
                    return bucket.clone();
                }
            }
        }

        let params = json!({"baby_id": baby_id, "date": date.to_string()});
        match self
            .inner
            .client
            .get::<TipsResponse>("/tips", Some(params))
            .await
        {
            Ok(resp) => {
                self.store(date, resp.tips.clone());
                resp.tips
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(%date, "no tips stored for date; generating");
                match self.generate(baby_id, Some(date)).await {
                    Ok(tips) => tips,
                    Err(err) => {
                        tracing::warn!(%date, %err, "tip generation failed; returning none");
                        Vec::new()
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%date, %err, "tip fetch failed; returning none");
                Vec::new()
            }
        }
    }

    /// Ask the service to synthesize fresh tips, overwriting the bucket for
    /// the resolved date. A not-found response (nothing to generate from
    /// yet) yields an empty sequence.
    pub async fn generate(
        &self,
        baby_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DailyTip>, ApiError> {
        let date = Self::resolve(date);
        let payload = json!({"baby_id": baby_id, "date": date.to_string()});

        match self
            .inner
            .client
            .post::<TipsResponse>("/tips/generate", Some(payload))
            .await
        {
            Ok(resp) => {
                self.store(date, resp.tips.clone());
                Ok(resp.tips)
            }
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    fn store(&self, date: NaiveDate, tips: Vec<DailyTip>) {
        self.inner.buckets.lock().unwrap().insert(date, tips);
    }

    /// Today's cached bucket, without fetching.
    pub fn today_tips(&self) -> Vec<DailyTip> {
        let today = Local::now().date_naive();
        self.inner
            .buckets
            .lock()
            .unwrap()
            .get(&today)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether any cached bucket is non-empty and still inside its
    /// 24-hour window.
    pub fn has_unexpired_tips(&self) -> bool {
        let now = Utc::now();
        let buckets = self.inner.buckets.lock().unwrap();
        buckets
            .iter()
            .any(|(date, tips)| !tips.is_empty() && bucket_valid_at(*date, now))
    }

    /// Drop one bucket, or the whole cache.
    pub fn clear(&self, date: Option<NaiveDate>) {
        let mut buckets = self.inner.buckets.lock().unwrap();
        match date {
            Some(date) => {
                buckets.remove(&date);
            }
            None => buckets.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::http::client::testing::{envelope_ok, status_response, MockTransport};
    use crate::http::{ApiClient, RequestDefaults, RequestSpec};
    use crate::http::RawResponse;
    use crate::platform::testing::recording_platform;
    use std::time::Duration as StdDuration;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn cache_with(
        script: impl Fn(&RequestSpec, u32) -> Result<RawResponse, ApiError> + Send + Sync + 'static,
    ) -> (TipCache, Arc<MockTransport>) {
        let transport = MockTransport::new(script);
        let (platform, _) = recording_platform(None);
        let client = ApiClient::with_transport(
            transport.clone(),
            platform,
            "sprout-api",
            RequestDefaults {
                timeout: StdDuration::from_secs(5),
                retry_budget: 0,
                retry_delay: StdDuration::from_millis(10),
            },
        );
        (TipCache::new(client), transport)
    }

    fn tips_body(titles: &[&str]) -> RawResponse {
        let tips: Vec<_> = titles
            .iter()
            .map(|t| json!({"category": "feeding", "title": t, "content": "…"}))
            .collect();
        envelope_ok(json!({"tips": tips}))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_second_call_hits_cache() {
        let (cache, transport) = cache_with(|_, _| Ok(tips_body(&["water first"])));

        let first = cache.tips(7, Some(date("2024-01-01"))).await;
        assert_eq!(first.len(), 1);
        let second = cache.tips(7, Some(date("2024-01-01"))).await;
        assert_eq!(second, first);
        // One remote fetch; the second call was served from the bucket.
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_found_falls_through_to_generate() {
        let (cache, transport) = cache_with(|spec, _| {
            if spec.path == "/tips" {
                Ok(status_response(404, "no tips for date"))
            } else {
                assert_eq!(spec.path, "/tips/generate");
                Ok(tips_body(&["fresh tip"]))
            }
        });

        let tips = cache.tips(7, Some(date("2024-01-01"))).await;
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].title, "fresh tip");
        assert_eq!(transport.seen_paths(), vec!["/tips", "/tips/generate"]);

        // The generated bucket is cached for the next call.
        let again = cache.tips(7, Some(date("2024-01-01"))).await;
        assert_eq!(again, tips);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_any_other_error_degrades_to_empty() {
        let (cache, _) = cache_with(|_, _| Ok(status_response(500, "boom")));
        let tips = cache.tips(7, Some(date("2024-01-01"))).await;
        assert!(tips.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generate_failure_during_fallback_degrades_to_empty() {
        let (cache, transport) = cache_with(|spec, _| {
            if spec.path == "/tips" {
                Ok(status_response(404, "no tips"))
            } else {
                Ok(status_response(500, "generator down"))
            }
        });
        let tips = cache.tips(7, Some(date("2024-01-01"))).await;
        assert!(tips.is_empty());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generate_overwrites_bucket() {
        let (cache, _) = cache_with(|spec, _| {
            if spec.path == "/tips" {
                Ok(tips_body(&["stale tip"]))
            } else {
                Ok(tips_body(&["regenerated tip"]))
            }
        });

        let day = date("2024-01-01");
        cache.tips(7, Some(day)).await;
        let regenerated = cache.generate(7, Some(day)).await.unwrap();
        assert_eq!(regenerated[0].title, "regenerated tip");

        // The cache now serves the regenerated bucket.
        let cached = cache.tips(7, Some(day)).await;
        assert_eq!(cached[0].title, "regenerated tip");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_generate_not_found_is_empty_not_error() {
        let (cache, _) = cache_with(|_, _| Ok(status_response(404, "nothing to generate from")));
        let tips = cache.generate(7, Some(date("2024-01-01"))).await.unwrap();
        assert!(tips.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_cached_bucket_refetches() {
        let (cache, transport) = cache_with(|_, index| {
            if index == 0 {
                Ok(tips_body(&[]))
            } else {
                Ok(tips_body(&["late arrival"]))
            }
        });

        let day = date("2024-01-01");
        assert!(cache.tips(7, Some(day)).await.is_empty());
        // An empty bucket is not a cache hit.
        let tips = cache.tips(7, Some(day)).await;
        assert_eq!(tips[0].title, "late arrival");
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_clear_single_bucket_and_all() {
        let (cache, transport) = cache_with(|_, _| Ok(tips_body(&["tip"])));

        cache.tips(7, Some(date("2024-01-01"))).await;
        cache.tips(7, Some(date("2024-01-02"))).await;
        assert_eq!(transport.calls(), 2);

        cache.clear(Some(date("2024-01-01")));
        cache.tips(7, Some(date("2024-01-02"))).await; // still cached
        assert_eq!(transport.calls(), 2);
        cache.tips(7, Some(date("2024-01-01"))).await; // refetched
        assert_eq!(transport.calls(), 3);

        cache.clear(None);
        cache.tips(7, Some(date("2024-01-02"))).await;
        assert_eq!(transport.calls(), 4);
    }

    #[test]
    fn test_bucket_validity_window() {
        let day = date("2024-01-01");
        assert!(bucket_valid_at(day, instant("2024-01-01T00:00:00Z")));
        assert!(bucket_valid_at(day, instant("2024-01-01T23:59:00Z")));
        assert!(!bucket_valid_at(day, instant("2024-01-02T00:00:00Z")));
        assert!(!bucket_valid_at(day, instant("2024-01-02T00:01:00Z")));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_has_unexpired_tips_ignores_empty_buckets() {
        let (cache, _) = cache_with(|_, _| Ok(tips_body(&[])));
        cache.tips(7, Some(Utc::now().date_naive())).await;
        assert!(!cache.has_unexpired_tips());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_has_unexpired_tips_sees_fresh_bucket() {
        let (cache, _) = cache_with(|_, _| Ok(tips_body(&["tip"])));
        // A bucket dated the current UTC day is always inside its window.
        cache.tips(7, Some(Utc::now().date_naive())).await;
        assert!(cache.has_unexpired_tips());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_today_tips_reads_local_bucket() {
        let (cache, _) = cache_with(|_, _| Ok(tips_body(&["tip"])));
        assert!(cache.today_tips().is_empty());
        // `tips` with no date and `today_tips` resolve the same local day.
        cache.tips(7, None).await;
        assert_eq!(cache.today_tips().len(), 1);
    }
}
