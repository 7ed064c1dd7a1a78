//! In-memory user directory

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use tracing::{debug, info, warn};

use super::{
    errors::IdentityError,
    types::{Group, User, UserUpdate},
};
use crate::{Clock, Result, provider::Credentials, storage::StorageError};

/// Users and groups, independent of any credential mechanism.
///
/// Changes are in memory only until the
/// [`PersistenceCoordinator`](crate::persistence::PersistenceCoordinator)
/// flushes them.
#[derive(Debug)]
pub struct IdentityDirectory {
    clock: Arc<dyn Clock>,
    users: BTreeMap<String, User>,
    groups: BTreeMap<String, Group>,
}

impl IdentityDirectory {
    /// Create an empty directory with the built-in groups.
    pub fn initialize_empty(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            users: BTreeMap::new(),
            groups: Group::builtin()
                .into_iter()
                .map(|g| (g.id.clone(), g))
                .collect(),
        }
    }

    /// Rebuild a directory from persisted user records.
    ///
    /// Memberships in groups that no longer exist are dropped.
    ///
    /// # Errors
    /// [`StorageError::InvalidValue`] if two records share a user id.
    pub(crate) fn from_users(clock: Arc<dyn Clock>, users: Vec<User>) -> Result<Self> {
        let mut directory = Self::initialize_empty(clock);
        for mut user in users {
            if directory.users.contains_key(&user.id) {
                return Err(StorageError::InvalidValue {
                    reason: format!("duplicate user id '{}'", user.id),
                }
                .into());
            }
            let groups = &directory.groups;
            user.group_ids.retain(|group_id| {
                let known = groups.contains_key(group_id);
                if !known {
                    warn!(user_id = %user.id, group_id = %group_id, "Dropping unknown group membership");
                }
                known
            });
            directory.users.insert(user.id.clone(), user);
        }
        Ok(directory)
    }

    /// Create a new, inactive user with a fresh id.
    ///
    /// # Errors
    /// [`IdentityError::GroupNotFound`] if any group id is unknown.
    pub fn create_user<I, S>(&mut self, name: impl Into<String>, group_ids: I) -> Result<User>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group_ids = self.checked_groups(group_ids.into_iter().map(Into::into).collect())?;

        let id = loop {
            let candidate = uuid::Uuid::new_v4().simple().to_string();
            if !self.users.contains_key(&candidate) {
                break candidate;
            }
        };

        let user = User {
            id: id.clone(),
            name: name.into(),
            group_ids,
            is_active: false,
            created_at: self.clock.now(),
            deactivated_at: None,
            credentials: Vec::new(),
        };
        info!(user_id = %id, name = %user.name, "Created user");
        self.users.insert(id, user.clone());
        Ok(user)
    }

    /// Apply a partial update to an existing user.
    ///
    /// The update is validated in full before anything changes.
    ///
    /// # Errors
    /// - [`IdentityError::UserNotFound`] if the user does not exist
    /// - [`IdentityError::GroupNotFound`] for unknown group ids
    /// - [`IdentityError::UserDeactivated`] when reactivating a deactivated user
    pub fn update_user(&mut self, user_id: &str, update: UserUpdate) -> Result<User> {
        let group_ids = update
            .group_ids
            .map(|ids| self.checked_groups(ids))
            .transpose()?;
        let now = self.clock.now();
        let user = self.user_mut(user_id)?;

        if update.is_active == Some(true) && user.deactivated_at.is_some() {
            return Err(IdentityError::UserDeactivated {
                user_id: user_id.to_string(),
            }
            .into());
        }

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(group_ids) = group_ids {
            user.group_ids = group_ids;
        }
        match update.is_active {
            Some(true) if !user.is_active => {
                user.is_active = true;
                info!(user_id = %user_id, "Activated user");
            }
            Some(false) if user.deactivated_at.is_none() => {
                user.is_active = false;
                user.deactivated_at = Some(now);
                info!(user_id = %user_id, "Deactivated user");
            }
            _ => {}
        }

        debug!(user_id = %user_id, "Updated user");
        Ok(user.clone())
    }

    pub fn find_user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    /// All users, ordered by id.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn find_group(&self, group_id: &str) -> Option<&Group> {
        self.groups.get(group_id)
    }

    /// Link provider credentials to a user so they can log in as that user.
    ///
    /// Linking the same credentials to the same user again is a no-op.
    ///
    /// # Errors
    /// [`IdentityError::CredentialsAlreadyLinked`] if another user owns them.
    pub fn link_credentials(&mut self, user_id: &str, credentials: Credentials) -> Result<()> {
        if let Some(owner) = self.user_for_credentials(&credentials) {
            if owner.id == user_id {
                return Ok(());
            }
            return Err(IdentityError::CredentialsAlreadyLinked {
                username: credentials.username,
                user_id: owner.id.clone(),
            }
            .into());
        }

        let user = self.user_mut(user_id)?;
        debug!(user_id = %user_id, username = %credentials.username, "Linked credentials");
        user.credentials.push(credentials);
        Ok(())
    }

    /// Find the user that owns the given credentials.
    pub fn user_for_credentials(&self, credentials: &Credentials) -> Option<&User> {
        self.users
            .values()
            .find(|user| user.credentials.contains(credentials))
    }

    fn user_mut(&mut self, user_id: &str) -> std::result::Result<&mut User, IdentityError> {
        self.users
            .get_mut(user_id)
            .ok_or_else(|| IdentityError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    fn checked_groups(
        &self,
        group_ids: BTreeSet<String>,
    ) -> std::result::Result<BTreeSet<String>, IdentityError> {
        if let Some(unknown) = group_ids.iter().find(|id| !self.groups.contains_key(*id)) {
            return Err(IdentityError::GroupNotFound {
                group_id: unknown.clone(),
            });
        }
        Ok(group_ids)
    }
}
