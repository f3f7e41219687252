//! Device-type to store-shard routing.

use std::collections::BTreeMap;
use std::fmt;

/// Device types known to the default deployment, with their default endpoints.
pub const DEFAULT_SHARDS: [(&str, &str); 4] = [
    ("idfa", "127.0.0.1:33013"),
    ("gaid", "127.0.0.1:33014"),
    ("adid", "127.0.0.1:33015"),
    ("dvid", "127.0.0.1:33016"),
];

/// Read-only mapping of device type to `host:port`.
///
/// Lookups are exact and case-sensitive. The table is built once at startup
/// and shared by every worker.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShardTable {
    endpoints: BTreeMap<String, String>,
}

impl ShardTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the endpoint for `device_type`.
    #[must_use]
    pub fn with_shard(mut self, device_type: impl Into<String>, addr: impl Into<String>) -> Self {
        self.endpoints.insert(device_type.into(), addr.into());
        self
    }

    /// Endpoint for `device_type`, or `None` if it has no shard.
    #[must_use]
    pub fn route(&self, device_type: &str) -> Option<&str> {
        self.endpoints.get(device_type).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.endpoints.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ShardTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            endpoints: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for ShardTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (device_type, addr) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{device_type}={addr}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_known_types() {
        let table: ShardTable = DEFAULT_SHARDS.into_iter().collect();
        assert_eq!(table.len(), 4);
        assert_eq!(table.route("idfa"), Some("127.0.0.1:33013"));
        assert_eq!(table.route("dvid"), Some("127.0.0.1:33016"));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let table = ShardTable::new().with_shard("idfa", "h:1");
        assert_eq!(table.route("IDFA"), None);
        assert_eq!(table.route("idfa "), None);
        assert_eq!(table.route("unknown"), None);
    }

    #[test]
    fn extends_beyond_four_entries() {
        let table: ShardTable = DEFAULT_SHARDS.into_iter().collect();
        let table = table.with_shard("oaid", "127.0.0.1:33017");
        assert_eq!(table.route("oaid"), Some("127.0.0.1:33017"));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn display_lists_shards_sorted() {
        let table = ShardTable::new().with_shard("gaid", "b:2").with_shard("adid", "a:1");
        assert_eq!(table.to_string(), "adid=a:1, gaid=b:2");
    }
}
