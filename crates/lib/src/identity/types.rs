//! Core data types for the identity directory

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{GROUP_ID_ADMIN, GROUP_ID_READ_ONLY, GROUP_ID_USER},
    provider::Credentials,
};

/// A user record.
///
/// Users are created inactive, activated through an update, and never
/// deleted: deactivation is the terminal state. Fields are only changed by
/// [`IdentityDirectory`](super::IdentityDirectory) operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub(super) id: String,

    /// Display name
    pub(super) name: String,

    #[serde(default)]
    pub(super) group_ids: BTreeSet<String>,

    pub(super) is_active: bool,

    pub(super) created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) deactivated_at: Option<DateTime<Utc>>,

    /// Provider credentials that log in as this user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(super) credentials: Vec<Credentials>,
}

impl User {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_ids(&self) -> &BTreeSet<String> {
        &self.group_ids
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the user was deactivated, if ever.
    pub fn deactivated_at(&self) -> Option<DateTime<Utc>> {
        self.deactivated_at
    }

    pub fn credentials(&self) -> &[Credentials] {
        &self.credentials
    }

    pub fn in_group(&self, group_id: &str) -> bool {
        self.group_ids.contains(group_id)
    }

    pub fn is_admin(&self) -> bool {
        self.in_group(GROUP_ID_ADMIN)
    }
}

/// A group users can belong to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
}

impl Group {
    /// The groups every directory starts with.
    pub fn builtin() -> Vec<Group> {
        [
            (GROUP_ID_ADMIN, "Administrators"),
            (GROUP_ID_USER, "Users"),
            (GROUP_ID_READ_ONLY, "Read Only"),
        ]
        .into_iter()
        .map(|(id, name)| Group {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
    }
}

/// Partial update of a user's mutable fields. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub group_ids: Option<BTreeSet<String>>,
}

impl UserUpdate {
    pub fn activate() -> Self {
        Self {
            is_active: Some(true),
            ..Default::default()
        }
    }

    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_groups<I, S>(mut self, group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_ids = Some(group_ids.into_iter().map(Into::into).collect());
        self
    }
}
