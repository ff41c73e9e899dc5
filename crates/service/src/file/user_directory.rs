use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::storage::json_snapshot_store::JsonSnapshotStore;
use crate::users::directory_store::UserDirectoryStore;

/// Persisted user record. `created_at` is stamped once at creation and is
/// never touched by updates.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub created_at: DateTime<Utc>,
    pub display_name: String,
    pub email: String,
}

/// Caller-supplied fields for create/update. On update, an empty field means
/// "leave the stored value alone".
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserInput {
    pub display_name: String,
    pub email: String,
}

/// Full table keyed by allocated identifier.
pub type UserTable = HashMap<String, User>;

/// File-backed user directory persisted as a single JSON snapshot.
///
/// Identifiers are the decimal rendering of a counter that only ever grows
/// and is persisted with the table, so an identifier is never reused, not
/// even after deletion or a process restart.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<JsonSnapshotStore<User>>,
}

impl UserStore {
    /// Initialize the store from the given file path. Seeds an empty
    /// snapshot if the file is missing.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonSnapshotStore::<User>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// Allocate the next identifier and insert a new user.
    pub async fn create(&self, input: UserInput) -> Result<String, ServiceError> {
        self.store
            .update(|snapshot| {
                snapshot.increment += 1;
                let id = snapshot.increment.to_string();
                let user = User {
                    created_at: Utc::now(),
                    display_name: input.display_name,
                    email: input.email,
                };
                snapshot.list.insert(id.clone(), user);
                Ok(id)
            })
            .await
    }

    /// Fetch one user by identifier.
    pub async fn get(&self, id: &str) -> Result<User, ServiceError> {
        let snapshot = self.store.read().await?;
        snapshot
            .list
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("user"))
    }

    /// Return an owned copy of the full table.
    pub async fn get_all(&self) -> Result<UserTable, ServiceError> {
        Ok(self.store.read().await?.list)
    }

    /// Partial update: non-empty input fields overwrite, empty fields keep
    /// the stored values.
    pub async fn update(&self, id: &str, input: UserInput) -> Result<(), ServiceError> {
        self.store
            .update(|snapshot| {
                let user = snapshot
                    .list
                    .get_mut(id)
                    .ok_or_else(|| ServiceError::not_found("user"))?;
                if !input.display_name.is_empty() {
                    user.display_name = input.display_name;
                }
                if !input.email.is_empty() {
                    user.email = input.email;
                }
                Ok(())
            })
            .await
    }

    /// Remove a user; deleting an absent identifier is an error.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.store
            .update(|snapshot| {
                snapshot
                    .list
                    .remove(id)
                    .map(|_| ())
                    .ok_or_else(|| ServiceError::not_found("user"))
            })
            .await
    }
}

#[async_trait::async_trait]
impl UserDirectoryStore for UserStore {
    async fn create(&self, input: UserInput) -> Result<String, ServiceError> {
        self.create(input).await
    }
    async fn get(&self, id: &str) -> Result<User, ServiceError> {
        self.get(id).await
    }
    async fn get_all(&self) -> Result<UserTable, ServiceError> {
        self.get_all().await
    }
    async fn update(&self, id: &str, input: UserInput) -> Result<(), ServiceError> {
        self.update(id, input).await
    }
    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tmp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("user_directory_{}.json", Uuid::new_v4()))
    }

    fn input(name: &str, email: &str) -> UserInput {
        UserInput { display_name: name.into(), email: email.into() }
    }

    #[tokio::test]
    async fn user_store_basic_crud() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;

        // initially empty
        assert_eq!(store.get_all().await?.len(), 0);

        // create and fetch
        let id = store.create(input("Alice", "alice@example.com")).await?;
        let user = store.get(&id).await?;
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.email, "alice@example.com");

        // list
        let id2 = store.create(input("Bob", "bob@example.com")).await?;
        let all = store.get_all().await?;
        assert_eq!(all.len(), 2);
        assert!(all.contains_key(&id) && all.contains_key(&id2));

        // delete
        store.delete(&id2).await?;
        assert_eq!(store.get_all().await?.len(), 1);

        // reload store from disk to ensure persistence
        let store2 = UserStore::new(&tmp).await?;
        let all2 = store2.get_all().await?;
        assert_eq!(all2.len(), 1);
        assert_eq!(all2.get(&id).unwrap().display_name, "Alice");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn reads_are_idempotent() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;
        let id = store.create(input("Alice", "alice@example.com")).await?;

        let first = store.get(&id).await?;
        let second = store.get(&id).await?;
        assert_eq!(first, second);

        let all_first = store.get_all().await?;
        let all_second = store.get_all().await?;
        assert_eq!(all_first, all_second);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn partial_update_keeps_untouched_fields() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;
        let id = store.create(input("A", "a@x.com")).await?;
        let created = store.get(&id).await?;

        // only the display name changes, email stays
        store.update(&id, input("B", "")).await?;
        let user = store.get(&id).await?;
        assert_eq!(user.display_name, "B");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.created_at, created.created_at);

        // only the email changes, name stays
        store.update(&id, input("", "b@x.com")).await?;
        let user = store.get(&id).await?;
        assert_eq!(user.display_name, "B");
        assert_eq!(user.email, "b@x.com");
        assert_eq!(user.created_at, created.created_at);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn absent_id_is_not_found() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;

        assert!(matches!(store.get("42").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            store.update("42", input("A", "a@x.com")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(store.delete("42").await, Err(ServiceError::NotFound(_))));

        // create and get_all are unaffected by the identifier's absence
        let id = store.create(input("Alice", "alice@example.com")).await?;
        assert_eq!(store.get_all().await?.len(), 1);
        assert_ne!(id, "42");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn delete_then_get_and_double_delete() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;
        let id = store.create(input("Alice", "alice@example.com")).await?;

        store.delete(&id).await?;
        assert!(matches!(store.get(&id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(store.delete(&id).await, Err(ServiceError::NotFound(_))));

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn identifiers_stay_unique_after_restart() -> Result<(), anyhow::Error> {
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;
        let first = store.create(input("Alice", "alice@example.com")).await?;
        store.delete(&first).await?;

        // a fresh store on the same file continues the allocation sequence
        let reopened = UserStore::new(&tmp).await?;
        let second = reopened.create(input("Bob", "bob@example.com")).await?;
        assert_ne!(first, second);
        assert!(second.parse::<u64>()? > first.parse::<u64>()?);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_creates_lose_nothing() -> Result<(), anyhow::Error> {
        const K: usize = 16;
        let tmp = tmp_path();
        let store = UserStore::new(&tmp).await?;

        let mut handles = Vec::with_capacity(K);
        for i in 0..K {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create(UserInput {
                        display_name: format!("user-{i}"),
                        email: format!("user-{i}@example.com"),
                    })
                    .await
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let id = handle.await??;
            assert!(ids.insert(id), "identifier allocated twice");
        }
        assert_eq!(ids.len(), K);
        assert_eq!(store.get_all().await?.len(), K);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
