//! Roles, permissions and the static policy table.
//!
//! Both sets are closed: adding a role or a permission is a code change, and
//! the compiler checks that [`Role::permissions`] covers every role.
//!
//! All checks take `Option<Role>`. The role reaches the server as a string
//! claim inside the access token; a claim that does not parse into a known
//! [`Role`] becomes `None` and every check fails closed.
//!
//! # Policy
//!
//! | Permission | ADMIN | COORDINATOR | VIEWER |
//! |---|---|---|---|
//! | VIEW_DASHBOARD | ✓ | ✓ | ✓ |
//! | VIEW_REPORTS | ✓ | ✓ | ✓ |
//! | MANAGE_COLLABORATORS | ✓ | ✓ | ✗ |
//! | MANAGE_TRAININGS | ✓ | ✓ | ✗ |
//! | UPLOAD_DOCUMENTS | ✓ | ✓ | ✗ |
//! | MANAGE_COURSES | ✓ | ✗ | ✗ |
//! | MANAGE_COACHES | ✓ | ✗ | ✗ |
//! | MANAGE_USERS | ✓ | ✗ | ✗ |
//! | MANAGE_SYSTEM_CONFIG | ✓ | ✗ | ✗ |
//! | MANAGE_CITIES_REGIONS | ✓ | ✗ | ✗ |
//! | MANAGE_INSPECTIONS | ✓ | ✗ | ✗ |
//!
//! # Example
//!
//! ```ignore
//! use heightcert_core::permissions::{Permission, Role, has_permission, can_coordinate};
//!
//! let role: Option<Role> = "COORDINATOR".parse().ok();
//! assert!(has_permission(role, Permission::ManageTrainings));
//! assert!(!has_permission(role, Permission::ManageCourses));
//! assert!(can_coordinate(role));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse-grained identity classification of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Coordinator,
    Viewer,
}

/// Named capability gating a specific mutation or view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ViewDashboard,
    ViewReports,
    ManageCollaborators,
    ManageTrainings,
    UploadDocuments,
    ManageCourses,
    ManageCoaches,
    ManageUsers,
    ManageSystemConfig,
    ManageCitiesRegions,
    ManageInspections,
}

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

const COORDINATOR_PERMISSIONS: &[Permission] = &[
    Permission::ViewDashboard,
    Permission::ViewReports,
    Permission::ManageCollaborators,
    Permission::ManageTrainings,
    Permission::UploadDocuments,
];

const VIEWER_PERMISSIONS: &[Permission] = &[Permission::ViewDashboard, Permission::ViewReports];

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Coordinator, Role::Viewer];

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Coordinator => "COORDINATOR",
            Role::Viewer => "VIEWER",
        }
    }

    /// Permissions held by this role. Static data, never mutated.
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Admin => ADMIN_PERMISSIONS,
            Role::Coordinator => COORDINATOR_PERMISSIONS,
            Role::Viewer => VIEWER_PERMISSIONS,
        }
    }

    pub fn has(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "COORDINATOR" => Ok(Role::Coordinator),
            "VIEWER" => Ok(Role::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::ViewDashboard,
        Permission::ViewReports,
        Permission::ManageCollaborators,
        Permission::ManageTrainings,
        Permission::UploadDocuments,
        Permission::ManageCourses,
        Permission::ManageCoaches,
        Permission::ManageUsers,
        Permission::ManageSystemConfig,
        Permission::ManageCitiesRegions,
        Permission::ManageInspections,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Permission::ViewDashboard => "VIEW_DASHBOARD",
            Permission::ViewReports => "VIEW_REPORTS",
            Permission::ManageCollaborators => "MANAGE_COLLABORATORS",
            Permission::ManageTrainings => "MANAGE_TRAININGS",
            Permission::UploadDocuments => "UPLOAD_DOCUMENTS",
            Permission::ManageCourses => "MANAGE_COURSES",
            Permission::ManageCoaches => "MANAGE_COACHES",
            Permission::ManageUsers => "MANAGE_USERS",
            Permission::ManageSystemConfig => "MANAGE_SYSTEM_CONFIG",
            Permission::ManageCitiesRegions => "MANAGE_CITIES_REGIONS",
            Permission::ManageInspections => "MANAGE_INSPECTIONS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True iff `role` is known and the policy grants it `permission`.
pub fn has_permission(role: Option<Role>, permission: Permission) -> bool {
    role.is_some_and(|role| role.has(permission))
}

/// True iff at least one of `permissions` is granted.
pub fn has_any_permission(role: Option<Role>, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| has_permission(role, *p))
}

/// True iff every one of `permissions` is granted.
pub fn has_all_permissions(role: Option<Role>, permissions: &[Permission]) -> bool {
    permissions.iter().all(|p| has_permission(role, *p))
}

pub fn is_admin(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin))
}

pub fn can_coordinate(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin | Role::Coordinator))
}

pub fn can_view(role: Option<Role>) -> bool {
    matches!(role, Some(Role::Admin | Role::Coordinator | Role::Viewer))
}

/// Effective permission list for `role`, empty for an unknown role.
pub fn permissions_for(role: Option<Role>) -> &'static [Permission] {
    role.map(Role::permissions).unwrap_or(&[])
}
