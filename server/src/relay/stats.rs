use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Direction a datagram was forwarded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ClientToPrimary,
    PrimaryToClient,
    PrimaryToSecondary,
    SecondaryToPrimary,
}

/// Per-route datagram counters of one session.
#[derive(Debug, Default)]
pub struct RelayStats {
    client_to_primary: AtomicU64,
    primary_to_client: AtomicU64,
    primary_to_secondary: AtomicU64,
    secondary_to_primary: AtomicU64,
}

impl RelayStats {
    pub fn record(&self, route: Route) {
        let counter = match route {
            Route::ClientToPrimary => &self.client_to_primary,
            Route::PrimaryToClient => &self.primary_to_client,
            Route::PrimaryToSecondary => &self.primary_to_secondary,
            Route::SecondaryToPrimary => &self.secondary_to_primary,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            client_to_primary: self.client_to_primary.load(Ordering::Relaxed),
            primary_to_client: self.primary_to_client.load(Ordering::Relaxed),
            primary_to_secondary: self.primary_to_secondary.load(Ordering::Relaxed),
            secondary_to_primary: self.secondary_to_primary.load(Ordering::Relaxed),
        }
    }
}

/// Counter values at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub client_to_primary: u64,
    pub primary_to_client: u64,
    pub primary_to_secondary: u64,
    pub secondary_to_primary: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "client->primary={} primary->client={} primary->secondary={} secondary->primary={}",
            self.client_to_primary,
            self.primary_to_client,
            self.primary_to_secondary,
            self.secondary_to_primary
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_route_separately() {
        let stats = RelayStats::default();
        stats.record(Route::ClientToPrimary);
        stats.record(Route::ClientToPrimary);
        stats.record(Route::PrimaryToSecondary);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.client_to_primary, 2);
        assert_eq!(snapshot.primary_to_client, 0);
        assert_eq!(snapshot.primary_to_secondary, 1);
        assert_eq!(snapshot.secondary_to_primary, 0);
    }
}
