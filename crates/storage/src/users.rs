//! Users, roles and sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::user::{
    Role, RoleRepository, SessionRepository, User, UserFilter, UserRepository, UserSession,
};
use domain::{ListQuery, Page, RepositoryResult};

use crate::document::{Column, Document, PgStore};
use crate::error::db_error;

pub type PgUserRepository = PgStore<User>;
pub type PgRoleRepository = PgStore<Role>;
pub type PgSessionRepository = PgStore<UserSession>;

impl Document for User {
    const TABLE: &'static str = "users";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("email", Column::text(self.email())),
            ("role_id", Column::Text(self.role_id().map(|r| r.to_string()))),
            ("is_active", Column::Bool(self.is_active())),
        ]
    }
}

#[async_trait]
impl UserRepository for PgStore<User> {
    async fn list(&self, query: &ListQuery<UserFilter>) -> RepositoryResult<Page<User>> {
        self.select()
            .filter_opt("is_active = {}", query.filter.is_active, Column::Bool)
            .filter_opt("role_id = {}", query.filter.role_id.as_ref(), |r| {
                Column::text(r.as_str())
            })
            .order_by("email")
            .fetch_page(self.pool(), query.offset, query.limit)
            .await
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.select()
            .filter("email = {}", Column::text(email))
            .fetch_optional(self.pool())
            .await
    }
}

impl Document for Role {
    const TABLE: &'static str = "roles";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![("name", Column::text(self.name()))]
    }
}

#[async_trait]
impl RoleRepository for PgStore<Role> {
    async fn list(&self) -> RepositoryResult<Vec<Role>> {
        self.select().order_by("name").fetch_all(self.pool()).await
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Role>> {
        self.select()
            .filter("name = {}", Column::text(name))
            .fetch_optional(self.pool())
            .await
    }
}

impl Document for UserSession {
    const TABLE: &'static str = "user_sessions";

    fn columns(&self) -> Vec<(&'static str, Column)> {
        vec![
            ("user_id", Column::text(self.user_id().as_str())),
            ("token_hash", Column::text(self.token_hash())),
            ("refresh_token_hash", Column::text(self.refresh_token_hash())),
            ("is_active", Column::Bool(self.is_active())),
            ("expires_at", Column::time(self.expires_at())),
        ]
    }
}

#[async_trait]
impl SessionRepository for PgStore<UserSession> {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> RepositoryResult<Option<UserSession>> {
        self.select()
            .filter("token_hash = {}", Column::text(token_hash))
            .fetch_optional(self.pool())
            .await
    }

    async fn find_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
    ) -> RepositoryResult<Option<UserSession>> {
        self.select()
            .filter("refresh_token_hash = {}", Column::text(refresh_token_hash))
            .fetch_optional(self.pool())
            .await
    }

    async fn find_active_for_user(&self, user_id: &UserId) -> RepositoryResult<Vec<UserSession>> {
        self.select()
            .filter("user_id = {}", Column::text(user_id.as_str()))
            .condition("is_active")
            .fetch_all(self.pool())
            .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at < $1")
            .bind(now)
            .execute(self.pool())
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }
}
