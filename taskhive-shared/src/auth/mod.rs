/// Authentication and authorization utilities
///
/// # Modules
///
/// - `identity`: external identity-provider assertion verification
/// - `session`: signed, short-lived session tokens
/// - `middleware`: request authentication shared by the API server
/// - `policy`: the authorization predicates behind every mutating endpoint

pub mod identity;
pub mod middleware;
pub mod policy;
pub mod session;
