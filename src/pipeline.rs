//! Ingestion orchestration: validate, enrich, stamp, retain, fan out.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::config::GEO_LOOKUP_TIMEOUT;
use crate::error_handling::{ErrorType, IngestError, IngestStats};
use crate::geoip::GeoResolver;
use crate::models::{Event, GeoRecord, RawEvent};
use crate::registry::SubscriptionRegistry;
use crate::store::EventStore;

/// The single writer of the event subsystem.
///
/// Every mutation of the store and every broadcast goes through
/// [`IngestionPipeline::ingest`], which serializes stamp, append, and
/// broadcast so queries and all subscribers observe one global per-process
/// order.
pub struct IngestionPipeline {
    store: Arc<EventStore>,
    registry: Arc<SubscriptionRegistry>,
    geo: Arc<GeoResolver>,
    stats: Arc<IngestStats>,
    /// Guards stamp + append + broadcast, and carries the previous stamp so
    /// timestamps never regress even if the wall clock does.
    write_gate: Mutex<DateTime<Utc>>,
}

impl IngestionPipeline {
    /// Creates a pipeline over the process-wide store, registry, and
    /// resolver.
    pub fn new(
        store: Arc<EventStore>,
        registry: Arc<SubscriptionRegistry>,
        geo: Arc<GeoResolver>,
        stats: Arc<IngestStats>,
    ) -> Self {
        IngestionPipeline {
            store,
            registry,
            geo,
            stats,
            write_gate: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Validates, enriches, stamps, retains, and broadcasts one raw event.
    ///
    /// On validation failure nothing is stored and nothing is broadcast.
    /// Geo enrichment cannot fail: an unresolvable address (or an
    /// unavailable database) yields a record with empty location fields.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] when an address does not parse or the byte
    /// count is negative.
    pub async fn ingest(&self, raw: RawEvent) -> Result<Event, IngestError> {
        let (source, target, bytes_sent) = match validate(&raw) {
            Ok(validated) => validated,
            Err(error) => {
                self.stats.increment_error(ErrorType::from(&error));
                log::debug!("rejected event: {}", error);
                return Err(error);
            }
        };

        let source_geo = self.resolve(source).await;
        let target_geo = self.resolve(target).await;

        // The gate spans stamping through broadcast: no event for any target
        // can interleave between another event's append and its fan-out.
        let mut last_stamp = self.write_gate.lock().await;
        let timestamp = Utc::now().max(*last_stamp);
        *last_stamp = timestamp;

        let event = self.store.append(Event {
            source_address: source,
            target_address: target,
            bytes_sent,
            attack_type: raw.attack_type,
            timestamp,
            source_geo,
            target_geo,
        });

        let outcome = self.registry.broadcast(target, &event).await;
        drop(last_stamp);

        self.stats.record_ingested();
        self.stats.record_deliveries(outcome.delivered);
        for _ in 0..outcome.failed {
            self.stats
                .increment_error(ErrorType::SubscriberDeliveryFailure);
        }

        log::debug!(
            "ingested {} -> {} ({} bytes, {} deliveries)",
            source,
            target,
            event.bytes_sent,
            outcome.delivered
        );
        Ok(event)
    }

    /// Geo lookup under a bounded wait.
    ///
    /// The lookup itself is an in-memory read, but the bound guarantees a
    /// stalled resolver can never wedge ingestion; on timeout the record
    /// degrades to unresolved.
    async fn resolve(&self, address: IpAddr) -> GeoRecord {
        let geo = Arc::clone(&self.geo);
        let lookup = tokio::task::spawn_blocking(move || geo.lookup(address));

        let record = match tokio::time::timeout(GEO_LOOKUP_TIMEOUT, lookup).await {
            Ok(Ok(record)) => record,
            Ok(Err(join_error)) => {
                log::warn!("GeoIP lookup task failed for {}: {}", address, join_error);
                GeoRecord::unresolved(&address)
            }
            Err(_) => {
                log::warn!(
                    "GeoIP lookup timed out for {} after {:?}",
                    address,
                    GEO_LOOKUP_TIMEOUT
                );
                self.stats.increment_error(ErrorType::GeoLookupTimeout);
                return GeoRecord::unresolved(&address);
            }
        };

        if self.geo.is_enabled() && record.is_unresolved() {
            self.stats.increment_error(ErrorType::GeoLookupMiss);
        }
        record
    }
}

fn validate(raw: &RawEvent) -> Result<(IpAddr, IpAddr, u64), IngestError> {
    let source: IpAddr = raw
        .source_address
        .trim()
        .parse()
        .map_err(|_| IngestError::InvalidSourceAddress(raw.source_address.clone()))?;
    let target: IpAddr = raw
        .target_address
        .trim()
        .parse()
        .map_err(|_| IngestError::InvalidTargetAddress(raw.target_address.clone()))?;
    if raw.bytes_sent < 0 {
        return Err(IngestError::NegativeBytes(raw.bytes_sent));
    }
    Ok((source, target, raw.bytes_sent as u64))
}
