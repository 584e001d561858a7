//! # Entitlement Resolver
//!
//! Pure decision logic: given the actor, their agency's subscription and the plan catalog,
//! which modules may be used?
//!
//! ## Rules
//! 1. Elevated actors may use everything; no subscription or plan data is consulted.
//! 2. Otherwise the subscription's plan is looked up in the catalog.
//! 3. When no plan can be resolved, or the plan has no modules attached, the fallback policy
//!    applies. `AllowAll` keeps agencies provisioned before module gating fully usable.
//! 4. Otherwise access is membership in the plan's module set.
//!
//! String keys that are not in the module registry are never accessible.

use crate::catalog::PlanCatalog;
use tripdesk_domain::config::FallbackPolicy;
use tripdesk_domain::{Actor, Module, ModuleKey, ModuleSet, PlanModules, Subscription};

/// Why a grant is not restricted to a module set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnrestrictedReason {
    /// Platform operator.
    Elevated,
    /// The agency has no active subscription (or the actor no agency).
    NoSubscription,
    /// The subscription does not reference a plan.
    NoPlanAssigned,
    /// The plan catalog is not available yet.
    CatalogUnavailable,
    /// The referenced plan is not in the catalog.
    PlanNotFound,
    /// The plan has no module list attached.
    NoModulesAssigned,
}

/// Outcome of entitlement resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    /// Every registered module is accessible.
    Unrestricted(UnrestrictedReason),
    /// Exactly these modules are accessible.
    Restricted(ModuleSet),
}

impl Grant {
    #[must_use]
    pub const fn allows(self, key: ModuleKey) -> bool {
        match self {
            Self::Unrestricted(_) => true,
            Self::Restricted(set) => set.has(key),
        }
    }

    /// Like [`Grant::allows`] for an untyped key. Unknown keys are denied.
    #[must_use]
    pub fn allows_key(self, key: &str) -> bool {
        key.parse::<ModuleKey>().is_ok_and(|key| self.allows(key))
    }

    /// The accessible modules as a set.
    #[must_use]
    pub const fn modules(self) -> ModuleSet {
        match self {
            Self::Unrestricted(_) => ModuleSet::all(),
            Self::Restricted(set) => set,
        }
    }

    /// Accessible module keys, in registry order.
    #[must_use]
    pub fn allowed_modules(self) -> Vec<ModuleKey> {
        self.modules().keys().collect()
    }

    /// Registry entries of the accessible modules, in registry order.
    #[must_use]
    pub fn allowed_registry(self) -> Vec<&'static Module> {
        self.modules().keys().map(ModuleKey::module).collect()
    }

    #[must_use]
    pub const fn is_unrestricted(self) -> bool {
        matches!(self, Self::Unrestricted(_))
    }
}

/// Resolves what `actor` may access.
///
/// `subscription` is `None` when the agency has none or it has not been loaded yet; `catalog`
/// is `None` while the catalog is unavailable.
#[must_use]
pub fn resolve(
    actor: &Actor,
    subscription: Option<&Subscription>,
    catalog: Option<&PlanCatalog>,
    policy: FallbackPolicy,
) -> Grant {
    if actor.elevated {
        return Grant::Unrestricted(UnrestrictedReason::Elevated);
    }

    let modules = subscription
        .ok_or(UnrestrictedReason::NoSubscription)
        .and_then(|sub| sub.plan_id.as_ref().ok_or(UnrestrictedReason::NoPlanAssigned))
        .and_then(|plan_id| {
            let catalog = catalog.ok_or(UnrestrictedReason::CatalogUnavailable)?;
            catalog.find(plan_id).ok_or(UnrestrictedReason::PlanNotFound)
        })
        .and_then(|plan| match plan.modules {
            PlanModules::Unassigned => Err(UnrestrictedReason::NoModulesAssigned),
            PlanModules::Granted(set) => Ok(set),
        });

    match (modules, policy) {
        (Ok(set), _) => Grant::Restricted(set),
        (Err(reason), FallbackPolicy::AllowAll) => Grant::Unrestricted(reason),
        (Err(_), FallbackPolicy::DenyAll) => Grant::Restricted(ModuleSet::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripdesk_domain::{PlanId, PlanRecord};

    fn catalog() -> PlanCatalog {
        PlanCatalog::from_records([
            PlanRecord {
                id: "starter".to_owned(),
                name: Some("Starter".to_owned()),
                modules: Some(vec!["leads".to_owned(), "tasks".to_owned()]),
            },
            PlanRecord { id: "legacy".to_owned(), name: None, modules: Some(Vec::new()) },
            PlanRecord { id: "founders".to_owned(), name: None, modules: None },
        ])
    }

    fn subscribed(plan: Option<&str>) -> Subscription {
        Subscription::new("ag-1", plan.map(PlanId::from))
    }

    #[test]
    fn elevated_short_circuits() {
        let actor = Actor::operator(None);
        let grant = resolve(&actor, None, None, FallbackPolicy::DenyAll);
        assert_eq!(grant, Grant::Unrestricted(UnrestrictedReason::Elevated));
    }

    #[test]
    fn restricted_plan_grants_membership_only() {
        let actor = Actor::member("ag-1");
        let sub = subscribed(Some("starter"));
        let grant = resolve(&actor, Some(&sub), Some(&catalog()), FallbackPolicy::AllowAll);

        assert!(grant.allows(ModuleKey::Leads));
        assert!(grant.allows(ModuleKey::Tasks));
        assert!(!grant.allows(ModuleKey::Financial));
        assert_eq!(grant.allowed_modules(), vec![ModuleKey::Leads, ModuleKey::Tasks]);
    }

    #[test]
    fn fallback_reasons_are_reported() {
        let actor = Actor::member("ag-1");
        let catalog = catalog();
        let cases = [
            (None, Some(&catalog), UnrestrictedReason::NoSubscription),
            (Some(subscribed(None)), Some(&catalog), UnrestrictedReason::NoPlanAssigned),
            (Some(subscribed(Some("starter"))), None, UnrestrictedReason::CatalogUnavailable),
            (Some(subscribed(Some("gold"))), Some(&catalog), UnrestrictedReason::PlanNotFound),
            (Some(subscribed(Some("legacy"))), Some(&catalog), UnrestrictedReason::NoModulesAssigned),
            (Some(subscribed(Some("founders"))), Some(&catalog), UnrestrictedReason::NoModulesAssigned),
        ];

        for (sub, catalog, reason) in cases {
            let grant = resolve(&actor, sub.as_ref(), catalog, FallbackPolicy::AllowAll);
            assert_eq!(grant, Grant::Unrestricted(reason));
        }
    }

    #[test]
    fn deny_all_policy_closes_fallbacks() {
        let actor = Actor::member("ag-1");
        let sub = subscribed(Some("legacy"));
        let grant = resolve(&actor, Some(&sub), Some(&catalog()), FallbackPolicy::DenyAll);

        assert_eq!(grant, Grant::Restricted(ModuleSet::empty()));
        assert!(grant.allowed_modules().is_empty());
    }

    #[test]
    fn unknown_string_keys_fail_closed() {
        let open = Grant::Unrestricted(UnrestrictedReason::NoSubscription);
        assert!(open.allows_key("leads"));
        assert!(!open.allows_key("marketing"));
        assert!(!open.allows_key(""));
    }
}
