//! Permission keys and the default catalogue seeded for new users.
//!
//! Permissions are stored as per-user settings. A key is granted when its
//! value equals [`GRANTED`].

/// Setting value marking a permission as granted.
pub const GRANTED: &str = "1";

/// Setting value marking a permission as withheld.
pub const WITHHELD: &str = "0";

/// The four permission keys guarding one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionSet {
    /// Read access.
    pub view: &'static str,
    /// Create access.
    pub add: &'static str,
    /// Modify access.
    pub update: &'static str,
    /// Remove access.
    pub delete: &'static str,
}

impl PermissionSet {
    /// Keys in catalogue order.
    pub const fn keys(&self) -> [&'static str; 4] {
        [self.view, self.add, self.update, self.delete]
    }
}

/// Resources guarded by the permission model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// System users.
    SystemUsers,
    /// Per-user settings, including permissions.
    SystemSettings,
    /// Clients.
    Clients,
    /// Client projects.
    ClientProjects,
    /// Time entries.
    Timings,
}

impl Resource {
    /// Every resource, in catalogue order.
    pub const ALL: [Self; 5] = [
        Self::SystemUsers,
        Self::SystemSettings,
        Self::Clients,
        Self::ClientProjects,
        Self::Timings,
    ];

    /// Permission keys guarding the resource.
    pub const fn permissions(self) -> PermissionSet {
        match self {
            Self::SystemUsers => PermissionSet {
                view: "system.users.view",
                add: "system.users.add",
                update: "system.users.update",
                delete: "system.users.delete",
            },
            Self::SystemSettings => PermissionSet {
                view: "system.settings.view",
                add: "system.settings.add",
                update: "system.settings.update",
                delete: "system.settings.delete",
            },
            Self::Clients => PermissionSet {
                view: "clients.view",
                add: "clients.add",
                update: "clients.update",
                delete: "clients.delete",
            },
            Self::ClientProjects => PermissionSet {
                view: "clientprojects.view",
                add: "clientprojects.add",
                update: "clientprojects.update",
                delete: "clientprojects.delete",
            },
            Self::Timings => PermissionSet {
                view: "timings.view",
                add: "timings.add",
                update: "timings.update",
                delete: "timings.delete",
            },
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::SystemUsers => "system users",
            Self::SystemSettings => "system settings",
            Self::Clients => "clients",
            Self::ClientProjects => "client projects",
            Self::Timings => "timings",
        }
    }
}

/// Catalogue entry seeded for every new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPermission {
    /// Setting key.
    pub key: &'static str,
    /// Human readable description stored alongside the setting.
    pub description: String,
    /// Initial value.
    pub value: &'static str,
}

/// The twenty default permissions, all granted.
pub fn default_catalogue() -> Vec<DefaultPermission> {
    Resource::ALL
        .into_iter()
        .flat_map(|resource| {
            let [view, add, update, delete] = resource.permissions().keys();
            let label = resource.label();
            [
                (view, format!("view {label}")),
                (add, format!("add {label}")),
                (update, format!("update {label}")),
                (delete, format!("delete {label}")),
            ]
        })
        .map(|(key, description)| DefaultPermission {
            key,
            description,
            value: GRANTED,
        })
        .collect()
}
