//! User, role and session persistence contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{RoleId, UserId};
use serde::{Deserialize, Serialize};

use crate::memory::MemoryStore;
use crate::repository::{ListQuery, Page, Repository, RepositoryResult};

use super::{Role, User, UserSession};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub is_active: Option<bool>,
    pub role_id: Option<RoleId>,
}

#[async_trait]
pub trait UserRepository: Repository<User> {
    /// By email.
    async fn list(&self, query: &ListQuery<UserFilter>) -> RepositoryResult<Page<User>>;

    /// `email` is matched as stored (lowercase).
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

#[async_trait]
pub trait RoleRepository: Repository<Role> {
    /// By name.
    async fn list(&self) -> RepositoryResult<Vec<Role>>;

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Role>>;
}

#[async_trait]
pub trait SessionRepository: Repository<UserSession> {
    async fn find_by_token_hash(&self, token_hash: &str)
    -> RepositoryResult<Option<UserSession>>;

    async fn find_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
    ) -> RepositoryResult<Option<UserSession>>;

    /// Sessions of the user not yet logged out.
    async fn find_active_for_user(&self, user_id: &UserId) -> RepositoryResult<Vec<UserSession>>;

    /// Removes sessions whose expiry is before `now`; returns how many.
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64>;
}

pub type InMemoryUserRepository = MemoryStore<User>;
pub type InMemoryRoleRepository = MemoryStore<Role>;
pub type InMemorySessionRepository = MemoryStore<UserSession>;

#[async_trait]
impl UserRepository for MemoryStore<User> {
    async fn list(&self, query: &ListQuery<UserFilter>) -> RepositoryResult<Page<User>> {
        let filter = &query.filter;
        let mut users = self
            .filter(|u| {
                filter.is_active.is_none_or(|a| u.is_active() == a)
                    && filter
                        .role_id
                        .as_ref()
                        .is_none_or(|r| u.role_id() == Some(r))
            })
            .await;
        users.sort_by(|a, b| a.email().cmp(b.email()));
        Ok(Page::from_vec(users, query.offset, query.limit))
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self.find_first(|u| u.email() == email).await)
    }
}

#[async_trait]
impl RoleRepository for MemoryStore<Role> {
    async fn list(&self) -> RepositoryResult<Vec<Role>> {
        let mut roles = self.filter(|_| true).await;
        roles.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(roles)
    }

    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Role>> {
        Ok(self.find_first(|r| r.name() == name).await)
    }
}

#[async_trait]
impl SessionRepository for MemoryStore<UserSession> {
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> RepositoryResult<Option<UserSession>> {
        Ok(self.find_first(|s| s.token_hash() == token_hash).await)
    }

    async fn find_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
    ) -> RepositoryResult<Option<UserSession>> {
        Ok(self
            .find_first(|s| s.refresh_token_hash() == refresh_token_hash)
            .await)
    }

    async fn find_active_for_user(&self, user_id: &UserId) -> RepositoryResult<Vec<UserSession>> {
        Ok(self
            .filter(|s| s.user_id() == user_id && s.is_active())
            .await)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepositoryResult<u64> {
        let removed = self.remove_where(|s| s.expires_at() < now).await;
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::ClientInfo;
    use chrono::Duration;
    use common::SessionId;

    #[tokio::test]
    async fn delete_expired_keeps_live_sessions() {
        let repo = InMemorySessionRepository::new();
        let now = Utc::now();
        for (hash, expires_at) in [
            ("old", now - Duration::seconds(1)),
            ("live", now + Duration::hours(1)),
        ] {
            let session = UserSession::open(
                SessionId::generate(),
                UserId::from("user_1"),
                hash.to_string(),
                format!("{hash}-refresh"),
                expires_at,
                ClientInfo::default(),
                now,
            );
            repo.insert(&session).await.unwrap();
        }

        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.find_by_token_hash("old").await.unwrap().is_none());
        assert!(repo.find_by_refresh_hash("live-refresh").await.unwrap().is_some());
        assert_eq!(repo.delete_expired(now).await.unwrap(), 0);
    }
}
