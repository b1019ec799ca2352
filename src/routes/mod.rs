/// Router Module Index
///
/// Organizes the application's routing into security-segregated modules:
/// anonymous pages, and the admin area whose gated handlers reject
/// unauthenticated callers with a redirect to login.

/// Routes accessible to all visitors.
pub mod public;

/// The admin area: login plus the session-gated management pages.
pub mod admin;
