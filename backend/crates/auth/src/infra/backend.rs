//! Runtime-selected user storage

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_id::UserId, user_password::UserPassword};
use crate::error::AuthResult;
use crate::infra::memory::MemoryUserRepository;
use crate::infra::postgres::PgUserRepository;

/// PostgreSQL when a database is configured, memory otherwise
#[derive(Clone)]
pub enum UserBackend {
    Postgres(PgUserRepository),
    Memory(MemoryUserRepository),
}

impl UserBackend {
    pub fn name(&self) -> &'static str {
        match self {
            UserBackend::Postgres(_) => "postgres",
            UserBackend::Memory(_) => "memory",
        }
    }
}

impl From<PgUserRepository> for UserBackend {
    fn from(repo: PgUserRepository) -> Self {
        UserBackend::Postgres(repo)
    }
}

impl From<MemoryUserRepository> for UserBackend {
    fn from(repo: MemoryUserRepository) -> Self {
        UserBackend::Memory(repo)
    }
}

impl UserRepository for UserBackend {
    async fn create(&self, user: &User) -> AuthResult<()> {
        match self {
            UserBackend::Postgres(r) => r.create(user).await,
            UserBackend::Memory(r) => r.create(user).await,
        }
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        match self {
            UserBackend::Postgres(r) => r.find_by_id(user_id).await,
            UserBackend::Memory(r) => r.find_by_id(user_id).await,
        }
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        match self {
            UserBackend::Postgres(r) => r.find_by_email(email).await,
            UserBackend::Memory(r) => r.find_by_email(email).await,
        }
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        match self {
            UserBackend::Postgres(r) => r.exists_by_email(email).await,
            UserBackend::Memory(r) => r.exists_by_email(email).await,
        }
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        password: &UserPassword,
    ) -> AuthResult<bool> {
        match self {
            UserBackend::Postgres(r) => r.update_password(user_id, password).await,
            UserBackend::Memory(r) => r.update_password(user_id, password).await,
        }
    }
}
