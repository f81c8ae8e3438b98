//! User service: registration, login sessions and access checks.

use std::sync::Arc;

use auth::{AuthError, Claims, JwtService, PasswordService, TokenKind, TokenPair, hash_token};
use common::{Clock, Context, RoleId, SessionId, UserId};
use event_bus::EventPublisher;
use serde::Deserialize;

use crate::aggregate::Aggregate;
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::repository::{ListQuery, Page, Repository};

use super::events::SessionEventData;
use super::{
    Action, ClientInfo, Resource, Role, RoleRepository, SessionRepository, User, UserError,
    UserEvent, UserFilter, UserRepository, UserSession, WAITSTAFF, default_roles,
    normalize_email,
};

pub const SERVICE_NAME: &str = "user";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    /// Defaults to waitstaff.
    #[serde(default)]
    pub role: Option<String>,
}

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub session_id: SessionId,
    pub tokens: TokenPair,
}

/// The caller behind a valid access token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub session: UserSession,
    pub claims: Claims,
}

impl Authenticated {
    pub fn can_access(&self, resource: Resource, action: Action) -> bool {
        self.user.can_access(resource, action)
    }
}

#[derive(Clone)]
pub struct UserService {
    users: CommandHandler<User, dyn UserRepository>,
    sessions: CommandHandler<UserSession, dyn SessionRepository>,
    roles: Arc<dyn RoleRepository>,
    jwt: JwtService,
    passwords: PasswordService,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        sessions: Arc<dyn SessionRepository>,
        jwt: JwtService,
        passwords: PasswordService,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users: CommandHandler::new(
                SERVICE_NAME,
                users,
                Arc::clone(&publisher),
                Arc::clone(&clock),
            ),
            sessions: CommandHandler::new(SERVICE_NAME, sessions, publisher, clock),
            roles,
            jwt,
            passwords,
        }
    }

    fn repository(&self) -> &Arc<dyn UserRepository> {
        self.users.repository()
    }

    // Argon2 is CPU-bound; both calls run on the blocking pool.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let passwords = self.passwords.clone();
        let (password, hash) = (password.to_owned(), hash.to_owned());
        tokio::task::spawn_blocking(move || passwords.compare(&password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    async fn role_by_id(&self, ctx: &Context, id: &RoleId) -> Result<Option<Role>, DomainError> {
        Ok(ctx.run(self.roles.find(id)).await??)
    }

    /// Loads the user's role onto it.
    async fn resolve(&self, ctx: &Context, user: User) -> Result<User, DomainError> {
        let role = match user.role_id() {
            Some(id) => self.role_by_id(ctx, id).await?,
            None => None,
        };
        Ok(user.with_role(role))
    }

    /// Inserts the default role catalogue, skipping names that exist.
    /// Returns the roles inserted.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn seed_default_roles(&self, ctx: &Context) -> Result<Vec<Role>, DomainError> {
        let mut inserted = Vec::new();
        for role in default_roles(self.users.now()) {
            if ctx.run(self.roles.find_by_name(role.name())).await??.is_some() {
                continue;
            }
            ctx.check()?;
            self.roles.insert(&role).await?;
            inserted.push(role);
        }
        if !inserted.is_empty() {
            tracing::info!(count = inserted.len(), "default roles seeded");
        }
        Ok(inserted)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_roles(&self, ctx: &Context) -> Result<Vec<Role>, DomainError> {
        Ok(ctx.run(self.roles.list()).await??)
    }

    #[tracing::instrument(skip(self, ctx, cmd), fields(email = %cmd.email))]
    pub async fn register(
        &self,
        ctx: &Context,
        cmd: RegisterUser,
    ) -> Result<CommandResult<User>, DomainError> {
        let email = normalize_email(&cmd.email)?;
        self.passwords.validate(&cmd.password)?;

        if ctx.run(self.repository().find_by_email(&email)).await??.is_some() {
            return Err(UserError::EmailTaken { email }.into());
        }

        let role_name = cmd.role.as_deref().unwrap_or(WAITSTAFF);
        let role = ctx
            .run(self.roles.find_by_name(role_name))
            .await??
            .ok_or_else(|| UserError::RoleNotFound {
                role: role_name.to_string(),
            })?;

        let password_hash = self.hash_password(&cmd.password).await?;
        let (user, events) = User::create(&email, password_hash, Some(role), self.users.now())?;
        let result = self.users.create(ctx, user, events).await?;
        tracing::info!(user_id = %result.aggregate.id(), "user registered");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_user(&self, ctx: &Context, id: &UserId) -> Result<User, DomainError> {
        let user = self.users.load(ctx, id).await?;
        self.resolve(ctx, user).await
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_users(
        &self,
        ctx: &Context,
        query: ListQuery<UserFilter>,
    ) -> Result<Page<User>, DomainError> {
        Ok(ctx.run(self.repository().list(&query)).await??)
    }

    /// Verifies the password and opens a session.
    ///
    /// Unknown email, wrong password and inactive account all fail with the
    /// same `InvalidCredentials` error.
    #[tracing::instrument(skip(self, ctx, password, client))]
    pub async fn login(
        &self,
        ctx: &Context,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> Result<LoginResult, DomainError> {
        let email = email.trim().to_lowercase();
        let Some(user) = ctx.run(self.repository().find_by_email(&email)).await?? else {
            tracing::info!("login rejected: unknown email");
            return Err(AuthError::InvalidCredentials.into());
        };
        if !user.is_active() || !self.verify_password(password, user.password_hash()).await? {
            tracing::info!(user_id = %user.id(), "login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }
        let user = self.resolve(ctx, user).await?;

        let session_id = SessionId::generate();
        let tokens = self.jwt.generate_pair(
            user.id(),
            &session_id,
            user.role().map(|r| r.name()),
        )?;

        let session = UserSession::open(
            session_id.clone(),
            user.id().clone(),
            hash_token(&tokens.access_token),
            hash_token(&tokens.refresh_token),
            tokens.refresh_expires_at,
            client,
            self.sessions.now(),
        );
        self.sessions.create(ctx, session, Vec::new()).await?;

        let result = self
            .users
            .execute(ctx, user.id(), |u, now| u.record_login(&session_id, now))
            .await?;
        tracing::info!(user_id = %user.id(), session_id = %session_id, "user logged in");

        Ok(LoginResult {
            user: result.aggregate.with_role(user.role().cloned()),
            session_id,
            tokens,
        })
    }

    /// Resolves an access token to its still-valid session and active user.
    #[tracing::instrument(skip(self, ctx, access_token))]
    pub async fn validate_access(
        &self,
        ctx: &Context,
        access_token: &str,
    ) -> Result<Authenticated, DomainError> {
        let claims = self.jwt.validate_kind(access_token, TokenKind::Access)?;

        let session = ctx
            .run(self.sessions.repository().find_by_token_hash(&hash_token(access_token)))
            .await??
            .ok_or(AuthError::InvalidToken)?;
        if !session.is_valid_session(self.sessions.now()) {
            return Err(AuthError::TokenExpired.into());
        }
        if session.user_id() != &claims.user_id() {
            return Err(AuthError::InvalidToken.into());
        }

        let user = self.get_user(ctx, session.user_id()).await?;
        if !user.is_active() {
            return Err(UserError::Inactive.into());
        }

        Ok(Authenticated {
            user,
            session,
            claims,
        })
    }

    /// Fails with `unauthorized` unless the user's role grants the action.
    pub fn authorize(
        &self,
        user: &User,
        resource: Resource,
        action: Action,
    ) -> Result<(), DomainError> {
        if user.can_access(resource, action) {
            return Ok(());
        }
        tracing::info!(user_id = %user.id(), %resource, %action, "access denied");
        Err(UserError::Forbidden { resource, action }.into())
    }

    /// Rotates both tokens of the session behind `refresh_token`.
    #[tracing::instrument(skip(self, ctx, refresh_token))]
    pub async fn refresh(
        &self,
        ctx: &Context,
        refresh_token: &str,
    ) -> Result<TokenPair, DomainError> {
        self.jwt.validate_kind(refresh_token, TokenKind::Refresh)?;

        let session = ctx
            .run(
                self.sessions
                    .repository()
                    .find_by_refresh_hash(&hash_token(refresh_token)),
            )
            .await??
            .ok_or(AuthError::InvalidToken)?;
        if !session.is_valid_session(self.sessions.now()) {
            return Err(AuthError::TokenExpired.into());
        }

        let user = self.get_user(ctx, session.user_id()).await?;
        if !user.is_active() {
            return Err(UserError::Inactive.into());
        }

        let tokens = self
            .jwt
            .generate_pair(user.id(), session.id(), user.role().map(|r| r.name()))?;
        let access_hash = hash_token(&tokens.access_token);
        let refresh_hash = hash_token(&tokens.refresh_token);
        let expires_at = tokens.refresh_expires_at;

        self.sessions
            .execute(ctx, session.id(), |s, now| {
                s.rotate(access_hash, refresh_hash, expires_at, now)
                    .map(|_| Vec::new())
            })
            .await?;
        tracing::info!(session_id = %session.id(), "session refreshed");
        Ok(tokens)
    }

    /// Ends the session behind `access_token`. Logging out twice is not an
    /// error.
    #[tracing::instrument(skip(self, ctx, access_token))]
    pub async fn logout(&self, ctx: &Context, access_token: &str) -> Result<(), DomainError> {
        let session = ctx
            .run(self.sessions.repository().find_by_token_hash(&hash_token(access_token)))
            .await??
            .ok_or(AuthError::InvalidToken)?;

        self.sessions
            .execute(ctx, session.id(), |s, now| {
                let events = if s.revoke(now) {
                    vec![UserEvent::UserLoggedOut(SessionEventData {
                        user_id: s.user_id().clone(),
                        session_id: s.id().clone(),
                        at: now,
                    })]
                } else {
                    Vec::new()
                };
                Ok(events)
            })
            .await?;
        tracing::info!(session_id = %session.id(), "user logged out");
        Ok(())
    }

    async fn revoke_sessions(&self, ctx: &Context, user_id: &UserId) -> Result<usize, DomainError> {
        let active = ctx
            .run(self.sessions.repository().find_active_for_user(user_id))
            .await??;
        let count = active.len();
        for session in active {
            self.sessions
                .execute(ctx, session.id(), |s, now| {
                    s.revoke(now);
                    Ok(Vec::new())
                })
                .await?;
        }
        Ok(count)
    }

    /// Checks the current password, stores the new one and ends every
    /// open session.
    #[tracing::instrument(skip(self, ctx, current, new_password))]
    pub async fn change_password(
        &self,
        ctx: &Context,
        id: &UserId,
        current: &str,
        new_password: &str,
    ) -> Result<CommandResult<User>, DomainError> {
        let user = self.users.load(ctx, id).await?;
        if !self.verify_password(current, user.password_hash()).await? {
            return Err(AuthError::InvalidCredentials.into());
        }
        self.passwords.validate(new_password)?;
        let password_hash = self.hash_password(new_password).await?;

        let result = self
            .users
            .execute(ctx, id, |u, now| u.set_password_hash(password_hash, now))
            .await?;
        let revoked = self.revoke_sessions(ctx, id).await?;
        tracing::info!(user_id = %id, revoked, "password changed");
        Ok(result)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn assign_role(
        &self,
        ctx: &Context,
        id: &UserId,
        role_name: &str,
    ) -> Result<CommandResult<User>, DomainError> {
        let role = ctx
            .run(self.roles.find_by_name(role_name))
            .await??
            .ok_or_else(|| UserError::RoleNotFound {
                role: role_name.to_string(),
            })?;
        self.users
            .execute(ctx, id, |u, now| {
                u.assign_role(role, now);
                Ok(Vec::new())
            })
            .await
    }

    /// Disables the account and revokes its sessions.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn deactivate(
        &self,
        ctx: &Context,
        id: &UserId,
    ) -> Result<CommandResult<User>, DomainError> {
        let result = self
            .users
            .execute(ctx, id, |u, now| Ok(u.deactivate(now)))
            .await?;
        let revoked = self.revoke_sessions(ctx, id).await?;
        tracing::info!(user_id = %id, revoked, "user deactivated");
        Ok(result)
    }

    /// Deletes sessions past their expiry; returns how many.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn cleanup_expired_sessions(&self, ctx: &Context) -> Result<u64, DomainError> {
        let now = self.sessions.now();
        let removed = ctx
            .run(self.sessions.repository().delete_expired(now))
            .await??;
        metrics::counter!("sessions_cleaned_total").increment(removed);
        if removed > 0 {
            tracing::info!(removed, "expired sessions cleaned up");
        }
        Ok(removed)
    }
}
