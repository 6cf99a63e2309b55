use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::error::PermissionError;

pub type UserId = i64;
pub type GroupId = i64;

/// The verb portion of a permission code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    View,
    Change,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Add, Action::View, Action::Change, Action::Delete];

    pub fn verb(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::View => "view",
            Action::Change => "change",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

impl FromStr for Action {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.verb() == s)
            .ok_or_else(|| PermissionError::UnrecognizedAction(s.to_string()))
    }
}

/// A type of manageable entity.
///
/// The built-in kinds carry fixed templates. `Custom` kinds only become
/// usable once registered with a codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Document,
    Tag,
    Correspondent,
    DocumentType,
    StoragePath,
    SavedView,
    Task,
    UiSettings,
    Note,
    MailAccount,
    MailRule,
    User,
    Group,
    Admin,
    Custom(String),
}

impl ResourceKind {
    pub fn builtin() -> [ResourceKind; 14] {
        [
            ResourceKind::Document,
            ResourceKind::Tag,
            ResourceKind::Correspondent,
            ResourceKind::DocumentType,
            ResourceKind::StoragePath,
            ResourceKind::SavedView,
            ResourceKind::Task,
            ResourceKind::UiSettings,
            ResourceKind::Note,
            ResourceKind::MailAccount,
            ResourceKind::MailRule,
            ResourceKind::User,
            ResourceKind::Group,
            ResourceKind::Admin,
        ]
    }

    /// Stable name used in config files and on the command line.
    pub fn name(&self) -> &str {
        match self {
            ResourceKind::Document => "document",
            ResourceKind::Tag => "tag",
            ResourceKind::Correspondent => "correspondent",
            ResourceKind::DocumentType => "document_type",
            ResourceKind::StoragePath => "storage_path",
            ResourceKind::SavedView => "saved_view",
            ResourceKind::Task => "task",
            ResourceKind::UiSettings => "ui_settings",
            ResourceKind::Note => "note",
            ResourceKind::MailAccount => "mail_account",
            ResourceKind::MailRule => "mail_rule",
            ResourceKind::User => "user",
            ResourceKind::Group => "group",
            ResourceKind::Admin => "admin",
            ResourceKind::Custom(name) => name,
        }
    }

    /// Backend template for built-in kinds. The nouns differ from `name()`
    /// in places (`task` -> `paperlesstask`, `admin` -> `logentry`).
    pub fn builtin_template(&self) -> Option<&'static str> {
        let template = match self {
            ResourceKind::Document => "%s_document",
            ResourceKind::Tag => "%s_tag",
            ResourceKind::Correspondent => "%s_correspondent",
            ResourceKind::DocumentType => "%s_documenttype",
            ResourceKind::StoragePath => "%s_storagepath",
            ResourceKind::SavedView => "%s_savedview",
            ResourceKind::Task => "%s_paperlesstask",
            ResourceKind::UiSettings => "%s_uisettings",
            ResourceKind::Note => "%s_note",
            ResourceKind::MailAccount => "%s_mailaccount",
            ResourceKind::MailRule => "%s_mailrule",
            ResourceKind::User => "%s_user",
            ResourceKind::Group => "%s_group",
            ResourceKind::Admin => "%s_logentry",
            ResourceKind::Custom(_) => return None,
        };
        Some(template)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for ResourceKind {
    fn from(name: String) -> Self {
        ResourceKind::builtin()
            .into_iter()
            .find(|k| k.name() == name)
            .unwrap_or(ResourceKind::Custom(name))
    }
}

impl From<&str> for ResourceKind {
    fn from(name: &str) -> Self {
        ResourceKind::from(name.to_string())
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.name().to_string()
    }
}

impl FromStr for ResourceKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResourceKind::from(s))
    }
}

/// Snapshot of the authenticated user for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
}

impl Actor {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            is_superuser: false,
            groups: BTreeSet::new(),
        }
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = GroupId>) -> Self {
        self.groups = groups.into_iter().collect();
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

/// Users and groups explicitly granted one right on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub users: BTreeSet<UserId>,
    #[serde(default)]
    pub groups: BTreeSet<GroupId>,
}

impl RuleSet {
    pub fn admits(&self, actor: &Actor) -> bool {
        self.users.contains(&actor.id) || !self.groups.is_disjoint(&actor.groups)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

/// Per-object access control entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPermissions {
    #[serde(default)]
    pub view: RuleSet,
    #[serde(default)]
    pub change: RuleSet,
}

/// Anything that can be checked for object-level permissions.
pub trait AuthorizableObject {
    /// `None` means unowned, which everyone is treated as owning.
    fn owner(&self) -> Option<UserId>;

    fn permissions(&self) -> Option<&ObjectPermissions>;

    /// Server-computed hint that the current user may change the object.
    fn user_can_change(&self) -> bool {
        false
    }
}

/// A fetched resource as exchanged with the CRUD collaborators.
///
/// Fields beyond the permission-related ones are kept verbatim in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagedObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ObjectPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_can_change: Option<bool>,
    /// Write-side ACL payload; the backend turns it into `permissions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_permissions: Option<ObjectPermissions>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ManagedObject {
    pub fn owned_by(owner: UserId) -> Self {
        Self {
            owner: Some(owner),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

impl AuthorizableObject for ManagedObject {
    fn owner(&self) -> Option<UserId> {
        self.owner
    }

    fn permissions(&self) -> Option<&ObjectPermissions> {
        self.permissions.as_ref()
    }

    fn user_can_change(&self) -> bool {
        self.user_can_change.unwrap_or(false)
    }
}
