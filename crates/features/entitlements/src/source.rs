//! Seams to the subscription and plan data services.

use crate::error::EntitlementError;
use std::future::Future;
use tripdesk_domain::{AgencyId, PlanRecord, Subscription};

/// Resolves an agency's active subscription.
pub trait SubscriptionSource: Send + Sync + 'static {
    /// `Ok(None)` when the agency has no active subscription.
    fn active_subscription(
        &self,
        agency: &AgencyId,
    ) -> impl Future<Output = Result<Option<Subscription>, EntitlementError>> + Send;
}

/// Lists the available plans with their raw module lists.
pub trait PlanSource: Send + Sync + 'static {
    fn plans(&self) -> impl Future<Output = Result<Vec<PlanRecord>, EntitlementError>> + Send;
}
