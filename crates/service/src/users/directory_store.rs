use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::file::user_directory::{User, UserInput, UserTable};

/// Trait abstraction for user directory storage (CRUD over user records).
/// Implementations can be file-backed, database-backed, or remote KV.
#[async_trait]
pub trait UserDirectoryStore: Send + Sync {
    async fn create(&self, input: UserInput) -> Result<String, ServiceError>;
    async fn get(&self, id: &str) -> Result<User, ServiceError>;
    async fn get_all(&self) -> Result<UserTable, ServiceError>;
    async fn update(&self, id: &str, input: UserInput) -> Result<(), ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
}
