//! HTTP layer: transport strategy, retry controller, response classifier.
//!
//! Layering is strict: callers use [`ApiClient`], the client drives one
//! [`Transport`], and every raw response passes through the classifier:
//!
//! ```text
//! Registry / TipCache → ApiClient (retry) → Transport (one attempt) → classify
//! ```

mod classify;
mod direct;
mod gateway;
mod transport;
mod types;

pub mod client;

pub use client::{ApiClient, RequestDefaults};
pub use direct::DirectTransport;
pub use gateway::GatewayTransport;
pub use transport::Transport;
pub use types::{ApiEnvelope, RawResponse, RequestSpec, Verb};
