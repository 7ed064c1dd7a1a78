//! Error types for the identity directory
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: String },

    /// Deactivation is terminal; a deactivated user cannot be reactivated.
    #[error("User {user_id} has been deactivated")]
    UserDeactivated { user_id: String },

    #[error("Credentials for {username} are already linked to user {user_id}")]
    CredentialsAlreadyLinked { username: String, user_id: String },

    #[error("User {user_id} is not active")]
    UserInactive { user_id: String },

    #[error("No user is linked to credentials for {username}")]
    NoUserForCredentials { username: String },
}

impl IdentityError {
    /// Check if this error indicates a user or group was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IdentityError::UserNotFound { .. }
                | IdentityError::GroupNotFound { .. }
                | IdentityError::NoUserForCredentials { .. }
        )
    }

    /// Check if this error indicates the user may not authenticate right now.
    pub fn is_inactive(&self) -> bool {
        matches!(
            self,
            IdentityError::UserInactive { .. } | IdentityError::UserDeactivated { .. }
        )
    }

    /// Check if this error indicates a conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            IdentityError::CredentialsAlreadyLinked { .. } | IdentityError::UserDeactivated { .. }
        )
    }
}

impl From<IdentityError> for crate::Error {
    fn from(err: IdentityError) -> Self {
        crate::Error::Identity(err)
    }
}
