//! Session and credential handling.
//!
//! Credentials are checked against the in-memory store, identities from the
//! Google provider are trusted as-is, and both paths end in the same signed
//! session cookie.

pub mod credentials;
pub mod handlers;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod recovery;
pub mod session;
pub mod store;

pub use middleware::{AuthUser, PageUser};
pub use session::{SessionIdentity, SessionService};
