//! In-memory sources for seeding, local development and tests.

use crate::error::{EntitlementError, EntitlementErrorExt};
use crate::source::{PlanSource, SubscriptionSource};
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tripdesk_domain::{AgencyId, PlanRecord, Subscription};

/// Subscriptions keyed by agency. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemorySubscriptions {
    inner: Arc<RwLock<FxHashMap<AgencyId, Subscription>>>,
}

impl MemorySubscriptions {
    /// Stores `subscription`, replacing the agency's previous one.
    pub fn insert(&self, subscription: Subscription) {
        self.inner.write().insert(subscription.agency_id.clone(), subscription);
    }

    pub fn remove(&self, agency: &AgencyId) -> Option<Subscription> {
        self.inner.write().remove(agency)
    }
}

impl SubscriptionSource for MemorySubscriptions {
    async fn active_subscription(
        &self,
        agency: &AgencyId,
    ) -> Result<Option<Subscription>, EntitlementError> {
        Ok(self.inner.read().get(agency).cloned())
    }
}

/// A fixed list of plan records. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlans {
    inner: Arc<RwLock<Vec<PlanRecord>>>,
}

impl MemoryPlans {
    #[must_use]
    pub fn new(records: Vec<PlanRecord>) -> Self {
        Self { inner: Arc::new(RwLock::new(records)) }
    }

    /// Parses plan records in the plan service's JSON shape.
    ///
    /// # Errors
    /// Returns [`EntitlementError::Json`] if `json` is not an array of plan records.
    pub fn from_json(json: &str) -> Result<Self, EntitlementError> {
        let records: Vec<PlanRecord> = serde_json::from_str(json).context("Decoding plan records")?;
        Ok(Self::new(records))
    }

    /// Replaces every plan record.
    pub fn replace(&self, records: Vec<PlanRecord>) {
        *self.inner.write() = records;
    }
}

impl PlanSource for MemoryPlans {
    async fn plans(&self) -> Result<Vec<PlanRecord>, EntitlementError> {
        Ok(self.inner.read().clone())
    }
}
