//! In-memory durable store implementing every repository port.
//!
//! Integer identifiers come from one shared sequence. Foreign keys are
//! enforced the way a relational schema would: inserts must reference
//! existing rows, and clients or projects that are still referenced cannot
//! be deleted. Email addresses are unique.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::ListPlan;
use tracing::debug;

use crate::domain::ports::{
    ClientProjectRepository, ClientRepository, RepositoryError, SystemUserRepository,
    TimingRepository, UserReferences, UserSettingRepository,
};
use crate::domain::{
    Client, ClientProject, SystemUser, SystemUserId, SystemUserSetting, Timing, TimingView,
};

#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    clients: BTreeMap<i64, Client>,
    projects: BTreeMap<i64, ClientProject>,
    timings: BTreeMap<i64, Timing>,
    users: Vec<SystemUser>,
    settings: BTreeMap<i64, SystemUserSetting>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user(&self, id: &SystemUserId) -> Option<&SystemUser> {
        self.users.iter().find(|user| user.id.as_ref() == Some(id))
    }

    fn require_user(&self, id: Option<&SystemUserId>) -> Result<(), RepositoryError> {
        match id {
            Some(id) if self.user(id).is_some() => Ok(()),
            Some(id) => Err(RepositoryError::query(format!("system user {id} does not exist"))),
            None => Err(RepositoryError::query("system user id is null")),
        }
    }

    fn view_of(&self, id: i64, timing: &Timing) -> Option<TimingView> {
        let project = self.projects.get(&timing.client_project_id)?;
        let client = self.clients.get(&project.client_id)?;
        Some(TimingView {
            id,
            client_project: project.name.clone(),
            client: client.title.clone(),
            title: timing.title.clone(),
            description: timing.description.clone(),
            start: timing.start?,
            end: timing.end?,
            status: timing.status,
        })
    }
}

/// Repository adapter keeping every table in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables
            .read()
            .map_err(|_| RepositoryError::connection("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables
            .write()
            .map_err(|_| RepositoryError::connection("store lock poisoned"))
    }
}

#[async_trait]
impl ClientRepository for InMemoryStore {
    async fn insert_client(&self, client: &Client) -> Result<Client, RepositoryError> {
        let mut tables = self.write()?;
        let id = tables.next_id();
        let stored = Client {
            id: Some(id),
            ..client.clone()
        };
        tables.clients.insert(id, stored.clone());
        debug!(id, "client inserted");
        Ok(stored)
    }

    async fn update_client(&self, client: &Client) -> Result<Option<Client>, RepositoryError> {
        let mut tables = self.write()?;
        let Some(slot) = client.id.and_then(|id| tables.clients.get_mut(&id)) else {
            return Ok(None);
        };
        *slot = client.clone();
        Ok(Some(slot.clone()))
    }

    async fn delete_client(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut tables = self.write()?;
        if tables
            .projects
            .values()
            .any(|project| project.client_id == id)
        {
            return Err(RepositoryError::query(format!(
                "client {id} is still referenced by projects"
            )));
        }
        Ok(tables.clients.remove(&id).is_some())
    }

    async fn find_client(&self, id: i64) -> Result<Option<Client>, RepositoryError> {
        Ok(self.read()?.clients.get(&id).cloned())
    }

    async fn list_clients(&self, plan: &ListPlan) -> Result<Vec<Client>, RepositoryError> {
        Ok(plan.apply(self.read()?.clients.values().cloned()))
    }
}

#[async_trait]
impl ClientProjectRepository for InMemoryStore {
    async fn insert_project(
        &self,
        project: &ClientProject,
    ) -> Result<ClientProject, RepositoryError> {
        let mut tables = self.write()?;
        if !tables.clients.contains_key(&project.client_id) {
            return Err(RepositoryError::query(format!(
                "client {} does not exist",
                project.client_id
            )));
        }
        let id = tables.next_id();
        let stored = ClientProject {
            id: Some(id),
            ..project.clone()
        };
        tables.projects.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_project(
        &self,
        project: &ClientProject,
    ) -> Result<Option<ClientProject>, RepositoryError> {
        let mut tables = self.write()?;
        let Some(slot) = project.id.and_then(|id| tables.projects.get_mut(&id)) else {
            return Ok(None);
        };
        slot.name.clone_from(&project.name);
        slot.is_active = project.is_active;
        Ok(Some(slot.clone()))
    }

    async fn delete_project(&self, id: i64) -> Result<bool, RepositoryError> {
        let mut tables = self.write()?;
        if tables
            .timings
            .values()
            .any(|timing| timing.client_project_id == id)
        {
            return Err(RepositoryError::query(format!(
                "client project {id} is still referenced by timings"
            )));
        }
        Ok(tables.projects.remove(&id).is_some())
    }

    async fn find_project(&self, id: i64) -> Result<Option<ClientProject>, RepositoryError> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn list_projects(
        &self,
        plan: &ListPlan,
    ) -> Result<Vec<ClientProject>, RepositoryError> {
        Ok(plan.apply(self.read()?.projects.values().cloned()))
    }

    async fn projects_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<ClientProject>, RepositoryError> {
        Ok(self
            .read()?
            .projects
            .values()
            .filter(|project| project.client_id == client_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TimingRepository for InMemoryStore {
    async fn insert_timing(&self, timing: &Timing) -> Result<Timing, RepositoryError> {
        let mut tables = self.write()?;
        if !tables.projects.contains_key(&timing.client_project_id) {
            return Err(RepositoryError::query(format!(
                "client project {} does not exist",
                timing.client_project_id
            )));
        }
        tables.require_user(timing.system_user_id.as_ref())?;
        let id = tables.next_id();
        let stored = Timing {
            id: Some(id),
            ..timing.clone()
        };
        tables.timings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_timing(&self, timing: &Timing) -> Result<Option<Timing>, RepositoryError> {
        let mut tables = self.write()?;
        let Some(slot) = timing.id.and_then(|id| tables.timings.get_mut(&id)) else {
            return Ok(None);
        };
        slot.title.clone_from(&timing.title);
        slot.description.clone_from(&timing.description);
        slot.start = timing.start;
        slot.end = timing.end;
        slot.status = timing.status;
        Ok(Some(slot.clone()))
    }

    async fn delete_timing(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.write()?.timings.remove(&id).is_some())
    }

    async fn find_timing(&self, id: i64) -> Result<Option<Timing>, RepositoryError> {
        Ok(self.read()?.timings.get(&id).cloned())
    }

    async fn list_timings(&self, plan: &ListPlan) -> Result<Vec<TimingView>, RepositoryError> {
        let tables = self.read()?;
        let views: Vec<TimingView> = tables
            .timings
            .iter()
            .filter_map(|(id, timing)| tables.view_of(*id, timing))
            .collect();
        Ok(plan.apply(views))
    }

    async fn timings_for_project(
        &self,
        client_project_id: i64,
    ) -> Result<Vec<Timing>, RepositoryError> {
        Ok(self
            .read()?
            .timings
            .values()
            .filter(|timing| timing.client_project_id == client_project_id)
            .cloned()
            .collect())
    }

    async fn timings_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Timing>, RepositoryError> {
        Ok(self
            .read()?
            .timings
            .values()
            .filter(|timing| {
                timing.start.is_some_and(|start| start >= from)
                    && timing.end.is_some_and(|end| end <= to)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SystemUserRepository for InMemoryStore {
    async fn insert_user(&self, user: &SystemUser) -> Result<SystemUser, RepositoryError> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|other| other.email == user.email) {
            return Err(RepositoryError::query("email address already in use"));
        }
        let stored = SystemUser {
            id: Some(user.id.clone().unwrap_or_else(SystemUserId::random)),
            ..user.clone()
        };
        tables.users.push(stored.clone());
        Ok(stored)
    }

    async fn update_user(
        &self,
        user: &SystemUser,
    ) -> Result<Option<SystemUser>, RepositoryError> {
        let mut tables = self.write()?;
        if tables
            .users
            .iter()
            .any(|other| other.email == user.email && other.id != user.id)
        {
            return Err(RepositoryError::query("email address already in use"));
        }
        let Some(slot) = tables
            .users
            .iter_mut()
            .find(|stored| user.id.is_some() && stored.id == user.id)
        else {
            return Ok(None);
        };
        *slot = user.clone();
        Ok(Some(slot.clone()))
    }

    async fn delete_user(&self, id: &SystemUserId) -> Result<bool, RepositoryError> {
        let mut tables = self.write()?;
        let references = UserReferences {
            settings: count_settings(&tables, id),
            timings: count_timings(&tables, id),
        };
        if references != UserReferences::default() {
            return Err(RepositoryError::query(format!(
                "system user {id} is still referenced"
            )));
        }
        let before = tables.users.len();
        tables.users.retain(|user| user.id.as_ref() != Some(id));
        Ok(tables.users.len() != before)
    }

    async fn find_user(&self, id: &SystemUserId) -> Result<Option<SystemUser>, RepositoryError> {
        Ok(self.read()?.user(id).cloned())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<SystemUser>, RepositoryError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list_users(&self, plan: &ListPlan) -> Result<Vec<SystemUser>, RepositoryError> {
        Ok(plan.apply(self.read()?.users.iter().cloned()))
    }

    async fn count_user_references(
        &self,
        id: &SystemUserId,
    ) -> Result<UserReferences, RepositoryError> {
        let tables = self.read()?;
        Ok(UserReferences {
            settings: count_settings(&tables, id),
            timings: count_timings(&tables, id),
        })
    }
}

fn count_settings(tables: &Tables, id: &SystemUserId) -> u64 {
    let count = tables
        .settings
        .values()
        .filter(|setting| setting.system_user_id.as_ref() == Some(id))
        .count();
    u64::try_from(count).unwrap_or(u64::MAX)
}

fn count_timings(tables: &Tables, id: &SystemUserId) -> u64 {
    let count = tables
        .timings
        .values()
        .filter(|timing| timing.system_user_id.as_ref() == Some(id))
        .count();
    u64::try_from(count).unwrap_or(u64::MAX)
}

#[async_trait]
impl UserSettingRepository for InMemoryStore {
    async fn upsert_setting(
        &self,
        setting: &SystemUserSetting,
    ) -> Result<SystemUserSetting, RepositoryError> {
        let mut tables = self.write()?;
        tables.require_user(setting.system_user_id.as_ref())?;
        let existing = tables
            .settings
            .values()
            .find(|stored| {
                stored.system_user_id == setting.system_user_id && stored.key == setting.key
            })
            .cloned();
        // An existing (user, key) row only takes the new value.
        let stored = match existing {
            Some(current) => SystemUserSetting {
                value: setting.value.clone(),
                ..current
            },
            None => SystemUserSetting {
                id: Some(tables.next_id()),
                ..setting.clone()
            },
        };
        let Some(id) = stored.id else {
            return Err(RepositoryError::query("stored setting has no identifier"));
        };
        tables.settings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_setting(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.write()?.settings.remove(&id).is_some())
    }

    async fn find_setting(&self, id: i64) -> Result<Option<SystemUserSetting>, RepositoryError> {
        Ok(self.read()?.settings.get(&id).cloned())
    }

    async fn settings_for_user(
        &self,
        user: &SystemUserId,
    ) -> Result<Vec<SystemUserSetting>, RepositoryError> {
        Ok(self
            .read()?
            .settings
            .values()
            .filter(|setting| setting.system_user_id.as_ref() == Some(user))
            .cloned()
            .collect())
    }

    async fn find_setting_by_key(
        &self,
        user: &SystemUserId,
        key: &str,
    ) -> Result<Option<SystemUserSetting>, RepositoryError> {
        Ok(self
            .read()?
            .settings
            .values()
            .find(|setting| setting.system_user_id.as_ref() == Some(user) && setting.key == key)
            .cloned())
    }
}
