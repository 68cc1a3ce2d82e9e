//! Correlation state between DNS resolutions and later traffic.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use parking_lot::RwLock;

/// Maps resolved IPv4 addresses to the blocked domain that produced them.
///
/// Written by resolution completions, read by the packet path on every
/// non-DNS frame. One address maps to at most one domain; a later
/// resolution for a different domain overwrites (last write wins).
/// Entries live until [`clear`](Self::clear) at pipeline shutdown;
/// there is no expiry.
#[derive(Debug, Default)]
pub struct AttributionTable {
    entries: RwLock<HashMap<Ipv4Addr, String>>,
}

impl AttributionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the mapping for `ip`.
    pub fn record(&self, ip: Ipv4Addr, domain: impl Into<String>) {
        self.entries.write().insert(ip, domain.into());
    }

    /// Domain attributed to `ip`, if any. Never blocks beyond the
    /// lock's critical section.
    pub fn lookup(&self, ip: Ipv4Addr) -> Option<String> {
        self.entries.read().get(&ip).cloned()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of attributed addresses.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn should_return_recorded_domain() {
        let table = AttributionTable::new();
        table.record(ip("93.184.216.34"), "ads.example");

        assert_eq!(table.lookup(ip("93.184.216.34")).as_deref(), Some("ads.example"));
        assert_eq!(table.lookup(ip("1.2.3.4")), None);
    }

    #[test]
    fn should_overwrite_with_last_writer() {
        let table = AttributionTable::new();
        table.record(ip("93.184.216.34"), "first.example");
        table.record(ip("93.184.216.34"), "second.example");

        assert_eq!(
            table.lookup(ip("93.184.216.34")).as_deref(),
            Some("second.example")
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn should_be_empty_after_clear() {
        let table = AttributionTable::new();
        table.record(ip("1.1.1.1"), "a.example");
        table.record(ip("2.2.2.2"), "b.example");
        assert_eq!(table.len(), 2);

        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.lookup(ip("1.1.1.1")), None);
    }

    #[test]
    fn should_survive_concurrent_writers_and_readers() {
        let table = Arc::new(AttributionTable::new());
        let addr = ip("10.0.0.1");

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        table.record(addr, format!("domain{i}.example"));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if let Some(domain) = table.lookup(addr) {
                            // A reader must only ever observe a fully
                            // written entry.
                            assert!(domain.starts_with("domain"));
                            assert!(domain.ends_with(".example"));
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), 1);
    }
}
