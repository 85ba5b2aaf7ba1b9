//! attack_globe library: real-time attack telemetry feed.
//!
//! This library ingests attack-traffic events (source/target addresses and
//! byte counts), enriches both addresses with GeoIP location data, retains a
//! recent window of events per victim address, and fans every newly ingested
//! event out to all live websocket watchers of that address.
//!
//! # Example
//!
//! ```no_run
//! use attack_globe::{run_server, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     port: 8000,
//!     ..Default::default()
//! };
//!
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

pub mod config;
mod error_handling;
mod geoip;
pub mod initialization;
mod models;
mod pipeline;
mod registry;
mod server;
mod store;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{ErrorType, IngestError, IngestStats, InitializationError};
pub use geoip::{GeoIpMetadata, GeoResolver};
pub use models::{Event, GeoRecord, RawEvent};
pub use pipeline::IngestionPipeline;
pub use registry::{BroadcastOutcome, Subscriber, SubscriptionRegistry};
pub use run::run_server;
pub use server::{build_router, start_server, AppState};
pub use store::EventStore;

// Internal run module (wires the components together and serves)
mod run {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::Result;
    use chrono::{Duration, Utc};
    use log::{info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::config::{
        Config, DEFAULT_GEOIP_PATH, DEFAULT_WINDOW_MINUTES, RETENTION_SWEEP_INTERVAL,
    };
    use crate::error_handling::IngestStats;
    use crate::geoip::GeoResolver;
    use crate::pipeline::IngestionPipeline;
    use crate::registry::SubscriptionRegistry;
    use crate::server::{start_server, AppState};
    use crate::store::EventStore;

    impl AppState {
        /// Builds the process-wide component graph: store, registry, stats,
        /// and the pipeline that owns them, around an already-initialized
        /// geo resolver.
        pub fn new(geo: GeoResolver) -> Self {
            let store = Arc::new(EventStore::new());
            let registry = Arc::new(SubscriptionRegistry::new());
            let stats = Arc::new(IngestStats::new());
            let geo_metadata = geo.metadata().cloned();
            let pipeline = Arc::new(IngestionPipeline::new(
                Arc::clone(&store),
                Arc::clone(&registry),
                Arc::new(geo),
                Arc::clone(&stats),
            ));

            AppState {
                pipeline,
                store,
                registry,
                stats,
                geo_metadata,
                started_at: Instant::now(),
            }
        }
    }

    /// Initializes the geo resolver from the configured (or default)
    /// database path, degrading to a disabled resolver when no usable
    /// database is found.
    async fn init_geo(config: &Config) -> GeoResolver {
        let path = config
            .geoip
            .clone()
            .unwrap_or_else(|| Path::new(DEFAULT_GEOIP_PATH).to_path_buf());

        match GeoResolver::open(&path).await {
            Ok(resolver) => resolver,
            Err(e) => {
                warn!(
                    "GeoIP enrichment disabled: {:#}. Events will carry unresolved geo records.",
                    e
                );
                GeoResolver::disabled()
            }
        }
    }

    /// Runs the attack feed service until ctrl-c.
    ///
    /// Initializes the geo resolver, builds the store/registry/pipeline
    /// graph, optionally starts the retention sweeper, and serves the HTTP
    /// and websocket boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails
    /// while running. A missing GeoIP database is not an error; the service
    /// runs degraded instead.
    pub async fn run_server(config: Config) -> Result<()> {
        let geo = init_geo(&config).await;
        let state = AppState::new(geo);

        if config.retention_minutes > 0 {
            if config.retention_minutes < DEFAULT_WINDOW_MINUTES {
                anyhow::bail!(
                    "retention of {}m would truncate the default {}m query window",
                    config.retention_minutes,
                    DEFAULT_WINDOW_MINUTES
                );
            }
            info!(
                "retention sweeper enabled: events older than {}m are pruned",
                config.retention_minutes
            );
        } else {
            warn!("retention disabled: event memory grows unbounded for the process lifetime");
        }

        let shutdown = CancellationToken::new();

        let sweeper_task = if config.retention_minutes > 0 {
            let store = Arc::clone(&state.store);
            let retention = Duration::minutes(config.retention_minutes);
            let cancel = shutdown.child_token();
            Some(tokio::spawn(async move {
                let mut interval = tokio::time::interval(RETENTION_SWEEP_INTERVAL);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let removed = store.prune_older_than(Utc::now() - retention);
                            if removed > 0 {
                                info!("retention sweep pruned {} events", removed);
                            }
                        }
                        _ = cancel.cancelled() => {
                            break;
                        }
                    }
                }
            }))
        } else {
            None
        };

        let shutdown_on_signal = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown_on_signal.cancel();
            }
        });

        let result = start_server(&config, state, shutdown.clone()).await;

        shutdown.cancel();
        if let Some(task) = sweeper_task {
            let _ = task.await;
        }
        info!("attack feed stopped");

        result
    }
}
