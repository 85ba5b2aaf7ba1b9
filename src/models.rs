//! Core data model: raw wire events, enriched events, and geo records.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Best-effort geographic metadata for a single IP address.
///
/// All fields except `address` may be absent. Absence means the address could
/// not be resolved (or no database was loaded) -- it is never an error.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// The address the lookup was performed for.
    pub address: String,
    /// Latitude in decimal degrees, if resolved.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees, if resolved.
    pub longitude: Option<f64>,
    /// Country name, if resolved.
    pub country: Option<String>,
    /// City name, if resolved.
    pub city: Option<String>,
}

impl GeoRecord {
    /// A record carrying no location data, used when the address is
    /// unresolvable or the lookup database is unavailable.
    pub fn unresolved(address: &IpAddr) -> Self {
        GeoRecord {
            address: address.to_string(),
            latitude: None,
            longitude: None,
            country: None,
            city: None,
        }
    }

    /// True when no location field was resolved.
    pub fn is_unresolved(&self) -> bool {
        self.latitude.is_none()
            && self.longitude.is_none()
            && self.country.is_none()
            && self.city.is_none()
    }
}

/// An attack event as submitted by a collector, before validation and
/// enrichment.
///
/// Addresses arrive as strings and the byte count as a signed integer so the
/// boundary can reject malformed input with a validation error instead of a
/// framework-level deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Attack source address, textual form.
    pub source_address: String,
    /// Victim address, textual form.
    pub target_address: String,
    /// Traffic volume in bytes. Must be non-negative.
    pub bytes_sent: i64,
    /// Optional attack classifier or protocol name.
    #[serde(default)]
    pub attack_type: Option<String>,
}

/// A fully enriched attack event. Immutable after the pipeline builds it.
///
/// `timestamp` is server-authoritative and non-decreasing in insertion order
/// per process; both geo records are computed exactly once, at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Attack source address.
    pub source_address: IpAddr,
    /// Victim address the event is keyed by.
    pub target_address: IpAddr,
    /// Traffic volume in bytes.
    pub bytes_sent: u64,
    /// Optional attack classifier or protocol name.
    pub attack_type: Option<String>,
    /// Ingestion time, assigned by the pipeline.
    pub timestamp: DateTime<Utc>,
    /// Geo metadata for the source address.
    pub source_geo: GeoRecord,
    /// Geo metadata for the target address.
    pub target_geo: GeoRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_record_has_no_location_fields() {
        let addr: IpAddr = "203.0.113.9".parse().unwrap();
        let record = GeoRecord::unresolved(&addr);
        assert_eq!(record.address, "203.0.113.9");
        assert!(record.is_unresolved());
    }

    #[test]
    fn test_unresolved_record_ipv6() {
        let addr: IpAddr = "2001:db8::1".parse().unwrap();
        let record = GeoRecord::unresolved(&addr);
        assert_eq!(record.address, "2001:db8::1");
    }

    #[test]
    fn test_raw_event_attack_type_defaults_to_none() {
        let raw: RawEvent = serde_json::from_str(
            r#"{"source_address":"1.1.1.1","target_address":"2.2.2.2","bytes_sent":500}"#,
        )
        .unwrap();
        assert_eq!(raw.attack_type, None);
        assert_eq!(raw.bytes_sent, 500);
    }

    #[test]
    fn test_event_serializes_addresses_as_strings() {
        let source: IpAddr = "1.1.1.1".parse().unwrap();
        let target: IpAddr = "2.2.2.2".parse().unwrap();
        let event = Event {
            source_address: source,
            target_address: target,
            bytes_sent: 500,
            attack_type: Some("syn-flood".into()),
            timestamp: Utc::now(),
            source_geo: GeoRecord::unresolved(&source),
            target_geo: GeoRecord::unresolved(&target),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["source_address"], "1.1.1.1");
        assert_eq!(json["target_address"], "2.2.2.2");
        assert_eq!(json["attack_type"], "syn-flood");
        // Unresolved geo fields serialize as explicit nulls, not omissions.
        assert!(json["source_geo"]["latitude"].is_null());
        assert!(json["source_geo"]["country"].is_null());
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let source: IpAddr = "2001:db8::1".parse().unwrap();
        let target: IpAddr = "2.2.2.2".parse().unwrap();
        let event = Event {
            source_address: source,
            target_address: target,
            bytes_sent: 0,
            attack_type: None,
            timestamp: Utc::now(),
            source_geo: GeoRecord::unresolved(&source),
            target_geo: GeoRecord::unresolved(&target),
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
