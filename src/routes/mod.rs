/// Router Module Index
///
/// Routing is split by the access level each endpoint requires. The split
/// is organizational: enforcement happens in the handler signatures (the
/// `AuthUser` extractor) and, for admin, in an explicit role check, so a
/// route cannot be wired up without its access control.

/// Routes accessible anonymously. The public listing enforces its
/// visibility filter at the repository level.
pub mod public;

/// Routes that require a valid bearer token via the `AuthUser` extractor.
pub mod authenticated;

/// Routes restricted to members with the 'admin' role.
pub mod admin;
