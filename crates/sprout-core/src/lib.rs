//! Sprout Core - Client data-access layer for the Sprout analysis service.
//!
//! The library issues requests over one of two interchangeable transport
//! channels, recovers from transient failures with bounded retry, tracks
//! long-running analysis jobs to completion via polling, and caches
//! time-bounded daily tips.
//!
//! # Architecture
//!
//! ```text
//! AnalysisRegistry / TipCache → ApiClient (retry) → Transport (gateway | direct) → classifier
//! ```
//!
//! Upper layers never touch a transport directly; every request goes through
//! the retry controller so backoff, classification, and the auth-expiry side
//! effects are uniform.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sprout_core::{Config, Platform, Sprout};
//!
//! #[tokio::main]
//! async fn main() -> sprout_core::Result<()> {
//!     let config = Config::load()?;
//!     let sprout = Sprout::new(config, platform);
//!
//!     let tips = sprout.tips().tips(baby_id, None).await;
//!     println!("{} tips today", tips.len());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod http;
pub mod platform;
pub mod tips;

// Re-exports for convenient access
pub use analysis::{
    Analysis, AnalysisOverview, AnalysisRegistry, AnalysisStats, AnalysisStatus, AnalysisType,
    AttentionItem, StatusUpdate,
};
pub use config::Config;
pub use error::{ApiError, ApiResult, ConfigError, Result, SproutError};
pub use http::{ApiClient, RequestSpec, Transport, Verb};
pub use platform::{CredentialStore, Navigator, NotificationSink, Platform};
pub use tips::{DailyTip, TipCache};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The assembled client - the main entry point.
///
/// Owns the configuration, the retry-controlled API client, the analysis
/// registry, and the tip cache. State lives here, not in process-wide
/// globals; lifecycle is construction to drop.
pub struct Sprout {
    config: Config,
    client: ApiClient,
    analysis: AnalysisRegistry,
    tips: TipCache,
}

impl Sprout {
    /// Assemble a client from configuration and host collaborators.
    pub fn new(config: Config, platform: Platform) -> Self {
        tracing::debug!("Initializing Sprout client v{}", VERSION);
        let client = ApiClient::from_config(&config, platform);
        let analysis = AnalysisRegistry::new(client.clone(), &config.polling);
        let tips = TipCache::new(client.clone());
        Self {
            config,
            client,
            analysis,
            tips,
        }
    }

    /// Assemble a client with configuration from the default location.
    pub fn with_defaults(platform: Platform) -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::new(config, platform))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn analysis(&self) -> &AnalysisRegistry {
        &self.analysis
    }

    pub fn tips(&self) -> &TipCache {
        &self.tips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::recording_platform;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_sprout_new() {
        let (platform, _) = recording_platform(None);
        let sprout = Sprout::new(Config::default(), platform);
        assert_eq!(sprout.config().polling.max_attempts, 30);
        assert!(!sprout.analysis().has_active());
        assert!(!sprout.tips().has_unexpired_tips());
    }
}
