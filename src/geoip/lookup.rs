//! IP address lookup.

use std::net::IpAddr;

use maxminddb::Reader;

use super::GeoResolver;
use crate::models::GeoRecord;

impl GeoResolver {
    /// Looks up geographic metadata for an address.
    ///
    /// Total: never fails and has no side effects. Returns an unresolved
    /// record when no database is loaded or the database has no entry for
    /// the address.
    pub fn lookup(&self, address: IpAddr) -> GeoRecord {
        let Some(reader) = self.reader.as_ref() else {
            return GeoRecord::unresolved(&address);
        };

        lookup_city(reader, address).unwrap_or_else(|| GeoRecord::unresolved(&address))
    }
}

/// City-database lookup.
///
/// maxminddb 0.27 API: `lookup()` returns a `LookupResult`; `has_data()`
/// checks for an entry, `decode()` yields the City struct.
fn lookup_city(reader: &Reader<Vec<u8>>, address: IpAddr) -> Option<GeoRecord> {
    let result = match reader.lookup(address) {
        Ok(result) => result,
        Err(_) => return None,
    };

    if !result.has_data() {
        return None;
    }

    let city: maxminddb::geoip2::City = match result.decode() {
        Ok(Some(city)) => city,
        Ok(None) => return None,
        Err(_) => return None,
    };

    Some(GeoRecord {
        address: address.to_string(),
        latitude: city.location.latitude,
        longitude: city.location.longitude,
        country: city.country.names.english.map(|s| s.to_string()),
        city: city.city.names.english.map(|s| s.to_string()),
    })
}
