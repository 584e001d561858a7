//! # Module Entitlements
//!
//! Decides which product modules an agency's users may use, based on the agency's subscription
//! plan.
//!
//! ## Architecture
//!
//! 1. **Sources ([`source`])**: seams to the subscription and plan data services.
//! 2. **Lookups ([`subscription`], [`catalog`])**: read-through caches over the sources.
//! 3. **Resolver ([`resolver`])**: a pure function from actor, subscription and catalog to a
//!    [`Grant`].
//! 4. **Sessions ([`session`])**: a per-actor reactive view exposing `has_access`,
//!    `allowed_modules` and `is_loading` without ever waiting on a load.
//!
//! ## Example
//!
//! ```rust
//! use tripdesk_domain::{Actor, ModuleKey, PlanId, PlanRecord, Subscription};
//! use tripdesk_entitlements::Entitlements;
//! use tripdesk_entitlements::memory::{MemoryPlans, MemorySubscriptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tripdesk_entitlements::EntitlementError> {
//! let subscriptions = MemorySubscriptions::default();
//! subscriptions.insert(Subscription::new("ag-1", Some(PlanId::from("starter"))));
//! let plans = MemoryPlans::new(vec![PlanRecord {
//!     id: "starter".to_owned(),
//!     name: None,
//!     modules: Some(vec!["leads".to_owned(), "tasks".to_owned()]),
//! }]);
//!
//! let entitlements = Entitlements::builder(subscriptions, plans).build();
//! let session = entitlements.session(Actor::member("ag-1"));
//! session.refresh().await?;
//!
//! assert!(session.has_access(ModuleKey::Leads));
//! assert!(!session.has_access(ModuleKey::Financial));
//! # Ok(())
//! # }
//! ```

pub mod catalog;
mod error;
mod lookup;
pub mod memory;
pub mod resolver;
pub mod session;
pub mod source;
pub mod subscription;

pub use crate::catalog::{PlanCatalog, PlanCatalogLookup};
pub use crate::error::{EntitlementError, EntitlementErrorExt};
pub use crate::lookup::Lookup;
pub use crate::resolver::{Grant, UnrestrictedReason, resolve};
pub use crate::session::{EntitlementSession, EntitlementSnapshot};
pub use crate::source::{PlanSource, SubscriptionSource};
pub use crate::subscription::SubscriptionLookup;

use std::sync::Arc;
use tracing::{debug, info};
use tripdesk_domain::config::{EntitlementsConfig, FallbackPolicy};
use tripdesk_domain::{Actor, AgencyId};

#[derive(Debug)]
pub(crate) struct EntitlementsInner<S, P> {
    pub(crate) subscriptions: SubscriptionLookup<S>,
    pub(crate) catalog: PlanCatalogLookup<P>,
    pub(crate) fallback: FallbackPolicy,
}

/// Entry point: owns the lookups and hands out per-actor sessions.
#[derive(Debug)]
pub struct Entitlements<S, P> {
    inner: Arc<EntitlementsInner<S, P>>,
}

impl<S, P> Clone for Entitlements<S, P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: SubscriptionSource, P: PlanSource> Entitlements<S, P> {
    /// Creates a new [`EntitlementsBuilder`] over the given sources.
    pub fn builder(subscriptions: S, plans: P) -> EntitlementsBuilder<S, P> {
        EntitlementsBuilder { subscriptions, plans, config: EntitlementsConfig::default() }
    }

    /// Starts a session for `actor`. Nothing is loaded until [`EntitlementSession::refresh`].
    pub fn session(&self, actor: Actor) -> EntitlementSession<S, P> {
        EntitlementSession::new(self, actor)
    }

    /// Loads the inputs for `actor` and resolves them in one step.
    ///
    /// # Errors
    /// Returns [`EntitlementError`] when a source fails.
    pub async fn grant_for(&self, actor: Actor) -> Result<Grant, EntitlementError> {
        let session = self.session(actor);
        session.refresh().await?;
        Ok(session.grant())
    }

    /// Forgets the cached subscription of `agency`, e.g. after a plan change.
    pub async fn invalidate_agency(&self, agency: &AgencyId) {
        debug!(%agency, "Invalidating cached subscription");
        self.inner.subscriptions.invalidate(agency).await;
    }

    /// Forgets the cached plan catalog, e.g. after plans were edited.
    pub fn invalidate_plans(&self) {
        debug!("Invalidating cached plan catalog");
        self.inner.catalog.invalidate();
    }

    #[must_use]
    pub fn fallback(&self) -> FallbackPolicy {
        self.inner.fallback
    }
}

/// Fluent builder for [`Entitlements`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug)]
pub struct EntitlementsBuilder<S, P> {
    subscriptions: S,
    plans: P,
    config: EntitlementsConfig,
}

impl<S: SubscriptionSource, P: PlanSource> EntitlementsBuilder<S, P> {
    /// Applies cache bounds and fallback policy from configuration.
    pub fn config(mut self, config: EntitlementsConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn fallback(mut self, policy: FallbackPolicy) -> Self {
        self.config.fallback = policy;
        self
    }

    pub fn build(self) -> Entitlements<S, P> {
        let Self { subscriptions, plans, config } = self;
        info!(fallback = ?config.fallback, "Entitlements initialized");

        Entitlements {
            inner: Arc::new(EntitlementsInner {
                subscriptions: SubscriptionLookup::new(subscriptions, config.subscriptions),
                catalog: PlanCatalogLookup::new(plans, config.plans),
                fallback: config.fallback,
            }),
        }
    }
}
