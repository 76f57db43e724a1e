//! Startup hydration of the order cache from storage.

use tracing::{info, warn};

use super::OrderCache;
use crate::storage::{OrderStore, StorageError};

/// Errors that abort hydration.
///
/// Per-identifier failures never abort; only failing to enumerate the
/// store does.
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("Failed to list stored orders: {0}")]
    List(#[source] StorageError),
}

/// Counts from one hydration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Identifiers cached.
    pub loaded: usize,
    /// Identifiers whose read or serialization failed.
    pub skipped: usize,
}

/// A cache that has been fully populated from storage.
///
/// Only [`hydrate`] produces one, and the query service can only be built
/// from one, so queries cannot start before hydration has finished.
#[derive(Debug, Clone)]
pub struct HydratedCache {
    cache: OrderCache,
    report: HydrationReport,
}

impl HydratedCache {
    /// Shared handle to the populated cache.
    pub fn cache(&self) -> &OrderCache {
        &self.cache
    }

    pub fn report(&self) -> HydrationReport {
        self.report
    }
}

/// Build a cache holding every aggregate currently in the store.
///
/// A failed read for one identifier is logged and skipped; that identifier
/// gets no entry and the remaining identifiers are still loaded.
#[tracing::instrument(name = "cache.hydrate", skip_all)]
pub async fn hydrate(store: &dyn OrderStore) -> Result<HydratedCache, HydrationError> {
    let identifiers = store.list_identifiers().await.map_err(HydrationError::List)?;

    let cache = OrderCache::new();
    let mut report = HydrationReport::default();

    for order_uid in identifiers {
        let order = match store.read(&order_uid).await {
            Ok(order) => order,
            Err(e) => {
                warn!(order_uid = %order_uid, error = %e, "Skipping order during hydration");
                report.skipped += 1;
                continue;
            }
        };

        match order.to_cached() {
            Ok(cached) => {
                cache.set(order_uid, cached);
                report.loaded += 1;
            }
            Err(e) => {
                warn!(order_uid = %order_uid, error = %e, "Skipping unserializable order during hydration");
                report.skipped += 1;
            }
        }
    }

    info!(
        loaded = report.loaded,
        skipped = report.skipped,
        "Order cache hydrated"
    );

    Ok(HydratedCache { cache, report })
}
