//! Kernel utilities shared across slices.
//! Keep this crate lightweight; it re-exports the domain and owns configuration loading.
//!
//! ## Config loading
//! ```rust,ignore
//! use tripdesk_kernel::config::load_config;
//! use tripdesk_kernel::domain::config::AppConfig;
//!
//! let cfg: AppConfig = load_config(Some("tripdesk")).unwrap();
//! ```
pub mod config;

pub use tripdesk_domain as domain;
