#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tripdesk_domain::{AgencyId, PlanRecord, Subscription};
use tripdesk_entitlements::memory::{MemoryPlans, MemorySubscriptions};
use tripdesk_entitlements::{EntitlementError, PlanSource, SubscriptionSource};

pub fn plan(id: &str, modules: Option<&[&str]>) -> PlanRecord {
    PlanRecord {
        id: id.to_owned(),
        name: None,
        modules: modules.map(|keys| keys.iter().map(|k| (*k).to_owned()).collect()),
    }
}

pub fn standard_plans() -> Vec<PlanRecord> {
    vec![
        plan("starter", Some(&["leads", "tasks"])),
        plan("pro", Some(&["leads", "proposals", "tasks", "calendar", "financial"])),
        plan("legacy", Some(&[])),
    ]
}

/// Wraps an in-memory source with call counting, failure injection and an optional gate.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
    gate: Option<Arc<Semaphore>>,
}

impl Probe {
    /// A probe whose loads block until [`Probe::open`] is called.
    pub fn gated() -> Self {
        Self { gate: Some(Arc::new(Semaphore::new(0))), ..Self::default() }
    }

    pub fn open(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    async fn enter(&self) -> Result<(), EntitlementError> {
        if let Some(gate) = &self.gate {
            drop(gate.acquire().await.map_err(|e| EntitlementError::from(e.to_string()))?);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(EntitlementError::Source { message: "service unavailable".into(), context: None });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbedSubscriptions {
    pub store: MemorySubscriptions,
    pub probe: Probe,
}

impl SubscriptionSource for ProbedSubscriptions {
    async fn active_subscription(
        &self,
        agency: &AgencyId,
    ) -> Result<Option<Subscription>, EntitlementError> {
        self.probe.enter().await?;
        self.store.active_subscription(agency).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProbedPlans {
    pub store: MemoryPlans,
    pub probe: Probe,
}

impl PlanSource for ProbedPlans {
    async fn plans(&self) -> Result<Vec<PlanRecord>, EntitlementError> {
        self.probe.enter().await?;
        self.store.plans().await
    }
}
