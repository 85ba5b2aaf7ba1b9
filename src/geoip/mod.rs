//! GeoIP enrichment using a MaxMind GeoLite2 City database.
//!
//! The resolver is loaded once at startup from a local `.mmdb` file and
//! handed to the ingestion pipeline as an owned instance. A missing or
//! unreadable database degrades the resolver to disabled: every lookup then
//! returns an unresolved record, and ingestion keeps working.

mod init;
mod lookup;
mod types;

// Re-export public API
pub use types::GeoIpMetadata;

use maxminddb::Reader;

/// Resolves IP addresses to geographic metadata.
///
/// `lookup` is total: it never fails and never blocks on I/O (the database
/// is fully resident in memory). When no database is loaded, every lookup
/// yields an unresolved record.
#[derive(Debug)]
pub struct GeoResolver {
    reader: Option<Reader<Vec<u8>>>,
    metadata: Option<GeoIpMetadata>,
}

impl GeoResolver {
    /// A resolver with no database; every lookup degrades to unresolved.
    pub fn disabled() -> Self {
        GeoResolver {
            reader: None,
            metadata: None,
        }
    }

    /// True when a database is loaded and lookups can resolve.
    pub fn is_enabled(&self) -> bool {
        self.reader.is_some()
    }

    /// Metadata about the loaded database, if any.
    pub fn metadata(&self) -> Option<&GeoIpMetadata> {
        self.metadata.as_ref()
    }
}
