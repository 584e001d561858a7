//! The authenticated caller an entitlement decision is made for.

use crate::ids::AgencyId;
use serde::{Deserialize, Serialize};

/// Current caller. Supplied per request or session; never stored by the entitlement layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Platform operator (super-admin), exempt from tenant entitlements.
    #[serde(default)]
    pub elevated: bool,
    #[serde(default)]
    pub agency_id: Option<AgencyId>,
}

impl Actor {
    /// A regular member of `agency`.
    pub fn member(agency: impl Into<AgencyId>) -> Self {
        Self { elevated: false, agency_id: Some(agency.into()) }
    }

    /// A platform operator, optionally impersonating an agency.
    #[must_use]
    pub const fn operator(agency_id: Option<AgencyId>) -> Self {
        Self { elevated: true, agency_id }
    }

    /// A caller not yet attached to any agency.
    #[must_use]
    pub const fn unaffiliated() -> Self {
        Self { elevated: false, agency_id: None }
    }
}
