//! Csv backed user registries.
//!
//! All three tables are loaded at startup and served from memory. Every
//! mutation is written through to disk before the in memory copy changes.

use std::path::{Path, PathBuf};

use merkaz_lib::users::{Role, Status};
use tokio::sync::RwLock;

use crate::error;
use crate::net::error as net_error;

pub mod table;

pub use table::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registry {
    Authorized,
    Pending,
    Denied,
}

impl Registry {
    pub fn file_name(&self) -> &'static str {
        match self {
            Registry::Authorized => "auth_users.csv",
            Registry::Pending => "new_users.csv",
            Registry::Denied => "denied_users.csv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Registry::Authorized => "authorized",
            Registry::Pending => "pending",
            Registry::Denied => "denied",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email is already registered")]
    AlreadyExists,

    #[error("user not found in {} registry", .0.as_str())]
    NotFound(Registry),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<StoreError> for net_error::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists => net_error::Error::api((
                net_error::UserKind::AlreadyExists,
                "This email is already registered, pending approval, or has been denied."
            )),
            StoreError::NotFound(registry) => net_error::Error::api(match registry {
                Registry::Authorized => net_error::UserKind::NotFound,
                Registry::Pending => net_error::UserKind::PendingNotFound,
                Registry::Denied => net_error::UserKind::DeniedNotFound,
            }),
            StoreError::Io(err) => err.into(),
            StoreError::Csv(err) => err.into(),
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    authorized: Vec<UserRecord>,
    pending: Vec<UserRecord>,
    denied: Vec<UserRecord>,
}

impl Tables {
    fn get(&self, registry: Registry) -> &Vec<UserRecord> {
        match registry {
            Registry::Authorized => &self.authorized,
            Registry::Pending => &self.pending,
            Registry::Denied => &self.denied,
        }
    }

    fn get_mut(&mut self, registry: Registry) -> &mut Vec<UserRecord> {
        match registry {
            Registry::Authorized => &mut self.authorized,
            Registry::Pending => &mut self.pending,
            Registry::Denied => &mut self.denied,
        }
    }

    fn registry_of(&self, email: &str) -> Option<Registry> {
        [Registry::Authorized, Registry::Pending, Registry::Denied]
            .into_iter()
            .find(|registry| self.get(*registry).iter().any(|v| v.email == email))
    }
}

#[derive(Debug)]
pub struct UserStore {
    dir: PathBuf,
    tables: RwLock<Tables>,
}

impl UserStore {
    pub fn load(dir: PathBuf) -> error::Result<Self> {
        let mut tables = Tables::default();

        for registry in [Registry::Authorized, Registry::Pending, Registry::Denied] {
            let path = dir.join(registry.file_name());

            *tables.get_mut(registry) = table::load(&path).map_err(|err| error::Error::new()
                .kind("UserTableLoad")
                .message(format!("failed to load user table \"{}\"", path.display()))
                .source(err))?;
        }

        tracing::debug!(
            "loaded users. authorized: {} pending: {} denied: {}",
            tables.authorized.len(),
            tables.pending.len(),
            tables.denied.len(),
        );

        Ok(UserStore {
            dir,
            tables: RwLock::new(tables),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, registry: Registry) -> PathBuf {
        self.dir.join(registry.file_name())
    }

    pub async fn find(&self, email: &str) -> Option<UserRecord> {
        let reader = self.tables.read().await;

        reader.authorized.iter()
            .find(|v| v.email == email)
            .cloned()
    }

    pub async fn registry_of(&self, email: &str) -> Option<Registry> {
        self.tables.read().await.registry_of(email)
    }

    pub async fn list(&self, registry: Registry) -> Vec<UserRecord> {
        self.tables.read().await.get(registry).clone()
    }

    pub async fn admin_emails(&self) -> Vec<String> {
        let reader = self.tables.read().await;

        reader.authorized.iter()
            .filter(|v| v.role == Role::Admin)
            .map(|v| v.email.clone())
            .collect()
    }

    /// adds a pending registration with an already hashed password
    pub async fn register(&self, email: &str, hash: String) -> Result<(), StoreError> {
        let mut writer = self.tables.write().await;

        if writer.registry_of(email).is_some() {
            return Err(StoreError::AlreadyExists);
        }

        let mut pending = writer.pending.clone();
        pending.push(UserRecord {
            email: email.to_owned(),
            password: hash,
            role: Role::User,
            status: Status::Active,
        });

        table::persist(&self.path(Registry::Pending), &pending).await?;

        writer.pending = pending;

        Ok(())
    }

    async fn transfer(
        &self,
        email: &str,
        from: Registry,
        to: Registry,
    ) -> Result<UserRecord, StoreError> {
        let mut writer = self.tables.write().await;

        let mut source = writer.get(from).clone();
        let Some(index) = source.iter().position(|v| v.email == email) else {
            return Err(StoreError::NotFound(from));
        };

        let mut record = source.remove(index);

        if to == Registry::Authorized {
            record.status = Status::Active;
        }

        let mut dest = writer.get(to).clone();
        dest.retain(|v| v.email != email);
        dest.push(record.clone());

        // destination first so a failure in between leaves a duplicate
        // instead of losing the user
        table::persist(&self.path(to), &dest).await?;
        table::persist(&self.path(from), &source).await?;

        *writer.get_mut(to) = dest;
        *writer.get_mut(from) = source;

        tracing::info!("moved \"{email}\" from {} to {}", from.as_str(), to.as_str());

        Ok(record)
    }

    pub async fn approve(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.transfer(email, Registry::Pending, Registry::Authorized).await
    }

    pub async fn deny(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.transfer(email, Registry::Pending, Registry::Denied).await
    }

    pub async fn re_pend(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.transfer(email, Registry::Denied, Registry::Pending).await
    }

    async fn update_authorized<F>(&self, email: &str, cb: F) -> Result<UserRecord, StoreError>
    where
        F: FnOnce(&mut UserRecord)
    {
        let mut writer = self.tables.write().await;

        let mut authorized = writer.authorized.clone();
        let Some(record) = authorized.iter_mut().find(|v| v.email == email) else {
            return Err(StoreError::NotFound(Registry::Authorized));
        };

        cb(record);

        let updated = record.clone();

        table::persist(&self.path(Registry::Authorized), &authorized).await?;

        writer.authorized = authorized;

        Ok(updated)
    }

    pub async fn toggle_role(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.update_authorized(email, |record| {
            record.role = record.role.toggled();
        }).await
    }

    pub async fn toggle_status(&self, email: &str) -> Result<UserRecord, StoreError> {
        self.update_authorized(email, |record| {
            record.status = record.status.toggled();
        }).await
    }

    /// adds an administrator only when no authorized users exist. returns
    /// true if the administrator was created
    pub async fn ensure_admin(&self, email: &str, hash: String) -> Result<bool, StoreError> {
        let mut writer = self.tables.write().await;

        if !writer.authorized.is_empty() {
            return Ok(false);
        }

        if let Some(registry) = writer.registry_of(email) {
            tracing::warn!(
                "bootstrap admin \"{email}\" is already in the {} registry",
                registry.as_str()
            );

            return Ok(false);
        }

        let authorized = vec![UserRecord {
            email: email.to_owned(),
            password: hash,
            role: Role::Admin,
            status: Status::Active,
        }];

        table::persist(&self.path(Registry::Authorized), &authorized).await?;

        writer.authorized = authorized;

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::load(dir.path().to_path_buf()).unwrap();

        (dir, store)
    }

    #[tokio::test]
    async fn register_approve_flow() {
        let (dir, store) = store();

        store.register("new@example.com", String::from("hash")).await.unwrap();

        assert_eq!(store.registry_of("new@example.com").await, Some(Registry::Pending));
        assert!(store.find("new@example.com").await.is_none());
        assert!(matches!(
            store.register("new@example.com", String::from("other")).await,
            Err(StoreError::AlreadyExists)
        ));

        let record = store.approve("new@example.com").await.unwrap();

        assert_eq!(record.status, Status::Active);
        assert_eq!(store.registry_of("new@example.com").await, Some(Registry::Authorized));
        assert!(store.list(Registry::Pending).await.is_empty());

        let reloaded = UserStore::load(dir.path().to_path_buf()).unwrap();

        assert_eq!(reloaded.find("new@example.com").await.unwrap().password, "hash");
        assert!(reloaded.list(Registry::Pending).await.is_empty());
    }

    #[tokio::test]
    async fn deny_and_re_pend() {
        let (_dir, store) = store();

        store.register("maybe@example.com", String::from("hash")).await.unwrap();
        store.deny("maybe@example.com").await.unwrap();

        assert_eq!(store.registry_of("maybe@example.com").await, Some(Registry::Denied));
        assert!(matches!(
            store.register("maybe@example.com", String::from("hash")).await,
            Err(StoreError::AlreadyExists)
        ));
        assert!(matches!(
            store.approve("maybe@example.com").await,
            Err(StoreError::NotFound(Registry::Pending))
        ));

        store.re_pend("maybe@example.com").await.unwrap();

        assert_eq!(store.registry_of("maybe@example.com").await, Some(Registry::Pending));
        assert!(matches!(
            store.re_pend("maybe@example.com").await,
            Err(StoreError::NotFound(Registry::Denied))
        ));
    }

    #[tokio::test]
    async fn toggles_and_admins() {
        let (_dir, store) = store();

        assert!(store.ensure_admin("admin@example.com", String::from("hash")).await.unwrap());
        assert!(!store.ensure_admin("other@example.com", String::from("hash")).await.unwrap());
        assert_eq!(store.admin_emails().await, vec![String::from("admin@example.com")]);

        let record = store.toggle_role("admin@example.com").await.unwrap();

        assert_eq!(record.role, Role::User);
        assert!(store.admin_emails().await.is_empty());

        let record = store.toggle_status("admin@example.com").await.unwrap();

        assert_eq!(record.status, Status::Inactive);
        assert_eq!(store.find("admin@example.com").await.unwrap().status, Status::Inactive);
        assert!(matches!(
            store.toggle_role("missing@example.com").await,
            Err(StoreError::NotFound(Registry::Authorized))
        ));
    }
}
