//! Per-actor reactive view over the two entitlement inputs.
//!
//! A session publishes the latest subscription and catalog lookups through `watch` channels.
//! Reads are synchronous and never wait for a load: while inputs are loading, answers come
//! from whatever is currently published.

use crate::catalog::PlanCatalog;
use crate::error::EntitlementError;
use crate::lookup::Lookup;
use crate::resolver::{Grant, resolve};
use crate::source::{PlanSource, SubscriptionSource};
use crate::{Entitlements, EntitlementsInner};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};
use tripdesk_domain::{Actor, Module, ModuleKey, Subscription};

type SubscriptionState = Lookup<Option<Subscription>>;
type CatalogState = Lookup<PlanCatalog>;

#[derive(Debug)]
struct Channels {
    subscription: watch::Sender<SubscriptionState>,
    catalog: watch::Sender<CatalogState>,
}

/// Entitlements of one actor.
///
/// Clones share the published inputs; each clone tracks changes independently.
#[derive(Debug)]
pub struct EntitlementSession<S, P> {
    actor: Actor,
    service: Arc<EntitlementsInner<S, P>>,
    channels: Arc<Channels>,
    subscription_rx: watch::Receiver<SubscriptionState>,
    catalog_rx: watch::Receiver<CatalogState>,
}

impl<S, P> Clone for EntitlementSession<S, P> {
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            service: Arc::clone(&self.service),
            channels: Arc::clone(&self.channels),
            subscription_rx: self.subscription_rx.clone(),
            catalog_rx: self.catalog_rx.clone(),
        }
    }
}

/// Point-in-time entitlement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementSnapshot {
    pub grant: Grant,
    /// A load of either input is still in flight, from this handle or any clone.
    pub is_loading: bool,
}

impl EntitlementSnapshot {
    #[must_use]
    pub const fn has_access(&self, key: ModuleKey) -> bool {
        self.grant.allows(key)
    }

    #[must_use]
    pub fn has_access_key(&self, key: &str) -> bool {
        self.grant.allows_key(key)
    }

    #[must_use]
    pub fn allowed_modules(&self) -> Vec<ModuleKey> {
        self.grant.allowed_modules()
    }

    #[must_use]
    pub fn allowed_registry(&self) -> Vec<&'static Module> {
        self.grant.allowed_registry()
    }
}

impl<S: SubscriptionSource, P: PlanSource> EntitlementSession<S, P> {
    pub(crate) fn new(service: &Entitlements<S, P>, actor: Actor) -> Self {
        let (subscription, subscription_rx) = watch::channel(SubscriptionState::idle());
        let (catalog, catalog_rx) = watch::channel(CatalogState::idle());

        Self {
            actor,
            service: Arc::clone(&service.inner),
            channels: Arc::new(Channels { subscription, catalog }),
            subscription_rx,
            catalog_rx,
        }
    }

    #[must_use]
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Loads both inputs concurrently and publishes the results.
    ///
    /// Inputs are flagged as loading for the duration. Elevated actors need no inputs and
    /// return immediately; an actor without an agency has no subscription to load.
    ///
    /// # Errors
    /// Returns the first source failure. The failed input keeps its previously published value
    /// and stops loading; the other input is still published.
    pub async fn refresh(&self) -> Result<(), EntitlementError> {
        if self.actor.elevated {
            debug!("Elevated actor, skipping entitlement inputs");
            return Ok(());
        }

        let channels = &self.channels;
        channels.subscription.send_modify(Lookup::start);
        channels.catalog.send_modify(Lookup::start);

        let subscription = async {
            match &self.actor.agency_id {
                Some(agency) => self.service.subscriptions.fetch(agency).await,
                None => Ok(Arc::new(None)),
            }
        };
        let (subscription, catalog) =
            tokio::join!(subscription, self.service.catalog.fetch());

        let subscription = publish(&channels.subscription, subscription);
        let catalog = publish(&channels.catalog, catalog);
        subscription.and(catalog)
    }

    /// The current decision, computed from the latest published inputs.
    #[must_use]
    pub fn snapshot(&self) -> EntitlementSnapshot {
        if self.actor.elevated {
            return EntitlementSnapshot {
                grant: resolve(&self.actor, None, None, self.service.fallback),
                is_loading: false,
            };
        }

        let subscription = self.channels.subscription.borrow();
        let catalog = self.channels.catalog.borrow();

        EntitlementSnapshot {
            grant: resolve(
                &self.actor,
                subscription.value().and_then(Option::as_ref),
                catalog.value(),
                self.service.fallback,
            ),
            is_loading: subscription.is_loading() || catalog.is_loading(),
        }
    }

    #[must_use]
    pub fn grant(&self) -> Grant {
        self.snapshot().grant
    }

    #[must_use]
    pub fn has_access(&self, key: ModuleKey) -> bool {
        self.snapshot().has_access(key)
    }

    /// Access check for an untyped key. Keys outside the module registry are denied.
    #[must_use]
    pub fn has_access_key(&self, key: &str) -> bool {
        self.snapshot().has_access_key(key)
    }

    #[must_use]
    pub fn allowed_modules(&self) -> Vec<ModuleKey> {
        self.snapshot().allowed_modules()
    }

    #[must_use]
    pub fn allowed_registry(&self) -> Vec<&'static Module> {
        self.snapshot().allowed_registry()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading
    }

    /// Waits until either input is republished since this handle last observed them.
    ///
    /// # Errors
    /// Returns [`EntitlementError::Internal`] if the publishing side is gone.
    pub async fn changed(&mut self) -> Result<(), EntitlementError> {
        let result = tokio::select! {
            r = self.subscription_rx.changed() => r,
            r = self.catalog_rx.changed() => r,
        };
        drop(self.subscription_rx.borrow_and_update());
        drop(self.catalog_rx.borrow_and_update());

        result.map_err(|e| EntitlementError::Internal {
            message: e.to_string().into(),
            context: Some("Entitlement inputs closed".into()),
        })
    }
}

fn publish<T>(
    channel: &watch::Sender<Lookup<T>>,
    result: Result<Arc<T>, EntitlementError>,
) -> Result<(), EntitlementError> {
    match result {
        Ok(value) => {
            channel.send_modify(|lookup| lookup.resolve(value));
            Ok(())
        },
        Err(err) => {
            warn!(error = %err, "Keeping previous entitlement input");
            channel.send_modify(Lookup::finish);
            Err(err)
        },
    }
}
