//! Identity directory
//!
//! User records (id, display name, group memberships, active flag) and the
//! built-in groups, independent of how users authenticate.

pub mod directory;
pub mod errors;
pub mod types;

pub use directory::IdentityDirectory;
pub use errors::IdentityError;
pub use types::{Group, User, UserUpdate};
