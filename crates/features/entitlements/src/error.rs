use std::borrow::Cow;

/// Errors raised while loading entitlement inputs.
///
/// Decisions themselves never fail: missing data resolves through the fallback policy.
#[tripdesk_derive::tripdesk_error]
pub enum EntitlementError {
    /// A subscription or plan source could not deliver data.
    #[error("Entitlement source failed{}: {message}", format_context(.context))]
    Source { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Plan payload is malformed{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal entitlement error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
