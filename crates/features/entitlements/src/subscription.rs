//! Active-subscription lookup per agency.

use crate::error::{EntitlementError, EntitlementErrorExt};
use crate::lookup::ReadThrough;
use crate::source::SubscriptionSource;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use tripdesk_domain::config::CacheConfig;
use tripdesk_domain::{AgencyId, Subscription};

/// Cached access to agencies' active subscriptions. Absent subscriptions are cached too.
#[derive(Debug)]
pub struct SubscriptionLookup<S> {
    source: S,
    cache: ReadThrough<AgencyId, Option<Subscription>>,
}

impl<S: SubscriptionSource> SubscriptionLookup<S> {
    pub fn new(source: S, config: CacheConfig) -> Self {
        Self { source, cache: ReadThrough::new(config) }
    }

    /// Returns the agency's active subscription, loading it from the source on a miss.
    ///
    /// A record that belongs to another agency is discarded.
    ///
    /// # Errors
    /// Returns [`EntitlementError`] when the subscription source fails. Failures are not cached.
    #[instrument(skip_all, fields(agency = %agency))]
    pub async fn fetch(
        &self,
        agency: &AgencyId,
    ) -> Result<Arc<Option<Subscription>>, EntitlementError> {
        self.cache
            .get_or_load(agency.clone(), async {
                let subscription = self
                    .source
                    .active_subscription(agency)
                    .await
                    .context("Fetching active subscription")?;

                match subscription {
                    Some(sub) if &sub.agency_id != agency => {
                        warn!(returned = %sub.agency_id, "Source returned a foreign subscription");
                        Ok(None)
                    },
                    other => {
                        debug!(plan = ?other.as_ref().and_then(|s| s.plan_id.as_ref()), "Subscription loaded");
                        Ok(other)
                    },
                }
            })
            .await
    }

    /// Drops the cached subscription of `agency`.
    pub async fn invalidate(&self, agency: &AgencyId) {
        self.cache.invalidate(agency).await;
    }
}
