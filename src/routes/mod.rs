/// Router Module Index
///
/// Routing is split by access level. Access control is applied to a whole module with
/// an axum layer, never decided per handler, so a route cannot be exposed by accident.

/// Routes accessible to anonymous callers: account creation, login and every read.
pub mod public;

/// Routes wrapped in `auth_middleware`. Every handler receives a verified `AuthUser`.
pub mod authenticated;
