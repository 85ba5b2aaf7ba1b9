//! GeoIP metadata structures.

use serde::Serialize;

/// Metadata about the loaded GeoIP database, surfaced by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GeoIpMetadata {
    /// Filesystem path the database was loaded from.
    pub source: String,
    /// Database build version (extracted from the database itself).
    pub version: String,
}
