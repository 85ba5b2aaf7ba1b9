//! GeoIP database loading.

use std::path::Path;

use anyhow::{Context, Result};
use maxminddb::Reader;

use super::types::GeoIpMetadata;
use super::GeoResolver;

impl GeoResolver {
    /// Loads a GeoLite2 City database from a local `.mmdb` file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the MaxMind GeoLite2 City database file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as a
    /// MaxMind database. Callers that want degraded-but-running behavior
    /// should fall back to [`GeoResolver::disabled`] on error.
    pub async fn open(path: &Path) -> Result<Self> {
        log::info!("Loading GeoIP database from: {}", path.display());

        let db_bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read GeoIP database from {}", path.display()))?;

        let reader = Reader::from_source(db_bytes)
            .with_context(|| format!("Failed to parse GeoIP database from {}", path.display()))?;

        // MaxMind databases carry a build_epoch field in their metadata
        let metadata = GeoIpMetadata {
            source: path.display().to_string(),
            version: format!("build_{}", reader.metadata.build_epoch),
        };
        log::info!("GeoIP database ready ({})", metadata.version);

        Ok(GeoResolver {
            reader: Some(reader),
            metadata: Some(metadata),
        })
    }
}
