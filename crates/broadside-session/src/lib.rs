//! User directory for Broadside.
//!
//! Keeps every registered player in memory: identity, credential, win
//! count and the connection they are currently reachable on. Nothing here
//! is persisted; a restart forgets everyone.
//!
//! # Key types
//!
//! - [`UserDirectory`]: register, look up, detach, record wins
//! - [`User`]: one registered player (or bot)
//! - [`SessionError`]: auth and lookup failures

mod directory;
mod error;
mod user;

pub use directory::UserDirectory;
pub use error::SessionError;
pub use user::User;
