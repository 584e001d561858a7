//! Plan catalog: validated plans indexed by id, behind a read-through cache.

use crate::error::{EntitlementError, EntitlementErrorExt};
use crate::lookup::ReadThrough;
use crate::source::PlanSource;
use fxhash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use tripdesk_domain::config::CacheConfig;
use tripdesk_domain::{ModuleKey, Plan, PlanId, PlanRecord};

/// The set of available plans, in source order.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
    index: FxHashMap<PlanId, usize>,
}

impl PlanCatalog {
    /// Validates raw plan records.
    ///
    /// Unknown module keys are dropped with a warning. When an id repeats, the first record wins.
    pub fn from_records(records: impl IntoIterator<Item = PlanRecord>) -> Self {
        let mut catalog = Self::default();

        for record in records {
            let (plan, unknown) = record.into_plan();
            if !unknown.is_empty() {
                warn!(plan = %plan.id, ?unknown, "Ignoring unknown module keys");
            }
            if catalog.index.contains_key(&plan.id) {
                warn!(plan = %plan.id, "Duplicate plan id, keeping the first record");
                continue;
            }
            catalog.index.insert(plan.id.clone(), catalog.plans.len());
            catalog.plans.push(plan);
        }

        catalog
    }

    #[must_use]
    pub fn find(&self, id: &PlanId) -> Option<&Plan> {
        self.index.get(id).map(|&i| &self.plans[i])
    }

    /// Plans that explicitly grant `key`, in catalog order.
    pub fn plans_granting(&self, key: ModuleKey) -> impl Iterator<Item = &Plan> {
        self.plans.iter().filter(move |plan| plan.grants(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Cached access to the plan catalog.
#[derive(Debug)]
pub struct PlanCatalogLookup<P> {
    source: P,
    cache: ReadThrough<(), PlanCatalog>,
}

impl<P: PlanSource> PlanCatalogLookup<P> {
    pub fn new(source: P, config: CacheConfig) -> Self {
        Self { source, cache: ReadThrough::new(config) }
    }

    /// Returns the catalog, loading it from the source on a miss.
    ///
    /// # Errors
    /// Returns [`EntitlementError`] when the plan source fails. Failures are not cached.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Arc<PlanCatalog>, EntitlementError> {
        self.cache
            .get_or_load((), async {
                let records = self.source.plans().await.context("Fetching plan catalog")?;
                let catalog = PlanCatalog::from_records(records);
                debug!(plans = catalog.len(), "Plan catalog loaded");
                Ok(catalog)
            })
            .await
    }

    /// Drops the cached catalog; the next fetch goes to the source.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
