//! Plans and subscriptions as seen by the entitlement layer.
//!
//! Both are owned by the billing system; here they are read-only.

use crate::ids::{AgencyId, PlanId};
use crate::modules::{ModuleKey, ModuleSet};
use serde::{Deserialize, Serialize};

/// Modules attached to a plan.
///
/// `Unassigned` is kept distinct from `Granted(ModuleSet::empty())`: the first means the plan
/// predates module gating, the second that it grants nothing we recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanModules {
    #[default]
    Unassigned,
    Granted(ModuleSet),
}

impl PlanModules {
    /// Interprets a raw module list. Returns unknown keys alongside the result.
    ///
    /// A missing or empty list is `Unassigned`. A non-empty list is `Granted`, even when none of
    /// its entries are recognised.
    pub fn from_raw<S: AsRef<str>>(raw: Option<&[S]>) -> (Self, Vec<String>) {
        match raw {
            None | Some([]) => (Self::Unassigned, Vec::new()),
            Some(keys) => {
                let parsed = ModuleSet::parse_keys(keys);
                (Self::Granted(parsed.set), parsed.unknown)
            },
        }
    }

    #[must_use]
    pub const fn granted(self) -> Option<ModuleSet> {
        match self {
            Self::Unassigned => None,
            Self::Granted(set) => Some(set),
        }
    }
}

/// A billing plan, with module keys already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub name: Option<String>,
    pub modules: PlanModules,
}

impl Plan {
    /// Whether the plan explicitly grants `key`. `Unassigned` plans grant nothing explicitly.
    #[must_use]
    pub fn grants(&self, key: ModuleKey) -> bool {
        self.modules.granted().is_some_and(|set| set.has(key))
    }
}

/// A plan as delivered by the plan data service.
///
/// Unknown fields (pricing, Stripe ids, …) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub modules: Option<Vec<String>>,
}

impl PlanRecord {
    /// Converts into a [`Plan`], returning the module keys that were dropped.
    #[must_use]
    pub fn into_plan(self) -> (Plan, Vec<String>) {
        let (modules, unknown) = PlanModules::from_raw(self.modules.as_deref());
        (Plan { id: PlanId::new(self.id), name: self.name, modules }, unknown)
    }
}

/// The active subscription binding an agency to (at most) one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub agency_id: AgencyId,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
}

impl Subscription {
    pub fn new(agency_id: impl Into<AgencyId>, plan_id: Option<PlanId>) -> Self {
        Self { agency_id: agency_id.into(), plan_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_empty_lists_are_unassigned() {
        let none: Option<&[&str]> = None;
        assert_eq!(PlanModules::from_raw(none).0, PlanModules::Unassigned);
        assert_eq!(PlanModules::from_raw::<&str>(Some(&[][..])).0, PlanModules::Unassigned);
    }

    #[test]
    fn unrecognised_only_list_grants_nothing() {
        let (modules, unknown) = PlanModules::from_raw(Some(&["crm_v1"][..]));
        assert_eq!(modules, PlanModules::Granted(ModuleSet::empty()));
        assert_eq!(unknown, vec!["crm_v1".to_owned()]);
    }

    #[test]
    fn record_converts_and_reports_unknown_keys() {
        let record = PlanRecord {
            id: "pro".to_owned(),
            name: Some("Pro".to_owned()),
            modules: Some(vec!["leads".to_owned(), "tasks".to_owned(), "fleet".to_owned()]),
        };

        let (plan, unknown) = record.into_plan();
        assert_eq!(plan.id.as_str(), "pro");
        assert!(plan.grants(ModuleKey::Leads));
        assert!(plan.grants(ModuleKey::Tasks));
        assert!(!plan.grants(ModuleKey::Financial));
        assert_eq!(unknown, vec!["fleet".to_owned()]);
    }
}
