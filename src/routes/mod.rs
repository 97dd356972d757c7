//! Router Module Index
//!
//! Routes are grouped by the privilege they require. The grouping is for readability:
//! enforcement happens in each handler's guard extractor (`ActiveUser`,
//! `ActiveVerifiedUser`, `Superuser`), so a route cannot be exposed by mounting it in
//! the wrong module.

/// Routes accessible to anonymous callers.
pub mod public;

/// Routes requiring an active (and, for writes, verified) session.
pub mod authenticated;

/// Routes restricted to active superusers.
pub mod admin;
