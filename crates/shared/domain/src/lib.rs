//! # Domain Models
//!
//! Pure domain types with minimal dependencies (`serde`, `bitflags`).
//! Keep it lean: no I/O, networking, or heavy logic, just data and simple helpers.

pub mod actor;
pub mod billing;
pub mod config;
pub mod ids;
pub mod modules;

pub use actor::Actor;
pub use billing::{Plan, PlanModules, PlanRecord, Subscription};
pub use ids::{AgencyId, PlanId};
pub use modules::{Module, ModuleKey, ModuleSet, REGISTRY};
