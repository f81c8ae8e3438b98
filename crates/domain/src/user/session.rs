//! Login sessions.

use chrono::{DateTime, Utc};
use common::{SessionId, UserId, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;

use super::{UserError, UserEvent};

/// An authenticated client, referenced by the digests of its tokens.
///
/// Valid while active and `now < expiresAt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    id: SessionId,

    #[serde(default)]
    version: Version,

    user_id: UserId,

    token_hash: String,

    refresh_token_hash: String,

    expires_at: DateTime<Utc>,

    #[serde(default)]
    ip_address: String,

    #[serde(default)]
    user_agent: String,

    is_active: bool,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Aggregate for UserSession {
    type Id = SessionId;
    type Event = UserEvent;
    type Error = UserError;

    fn aggregate_type() -> &'static str {
        "UserSession"
    }

    fn id(&self) -> &SessionId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

/// Where a login came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
}

impl UserSession {
    pub fn open(
        id: SessionId,
        user_id: UserId,
        token_hash: String,
        refresh_token_hash: String,
        expires_at: DateTime<Utc>,
        client: ClientInfo,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            version: Version::initial(),
            user_id,
            token_hash,
            refresh_token_hash,
            expires_at,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }

    pub fn refresh_token_hash(&self) -> &str {
        &self.refresh_token_hash
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_valid_session(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Like [`is_valid_session`](Self::is_valid_session), with the reason.
    pub fn is_valid(&self, now: DateTime<Utc>) -> Result<(), UserError> {
        if !self.is_active {
            return Err(UserError::SessionRevoked);
        }
        if self.is_expired(now) {
            return Err(UserError::SessionExpired);
        }
        Ok(())
    }

    /// Logs the session out. Returns false if it already was.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.updated_at = now;
        true
    }

    /// Swaps in a fresh token pair and extends the expiry.
    pub fn rotate(
        &mut self,
        token_hash: String,
        refresh_token_hash: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), UserError> {
        self.is_valid(now)?;
        self.token_hash = token_hash;
        self.refresh_token_hash = refresh_token_hash;
        self.expires_at = expires_at;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::{Classify, ErrorKind};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn session(expires_at: DateTime<Utc>) -> UserSession {
        UserSession::open(
            SessionId::generate(),
            UserId::from("user_1"),
            "a".into(),
            "r".into(),
            expires_at,
            ClientInfo::default(),
            now() - Duration::hours(1),
        )
    }

    #[test]
    fn expired_session_is_invalid() {
        let s = session(now() - Duration::seconds(1));
        assert!(s.is_active());
        assert!(s.is_expired(now()));
        assert!(!s.is_valid_session(now()));

        let err = s.is_valid(now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "session has expired");
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let s = session(now());
        assert!(!s.is_valid_session(now()));
        assert!(s.is_valid_session(now() - Duration::seconds(1)));
    }

    #[test]
    fn revoke_then_rotate_fails() {
        let mut s = session(now() + Duration::hours(1));
        assert!(s.revoke(now()));
        assert!(!s.revoke(now()));
        assert!(!s.is_valid_session(now()));

        let err = s
            .rotate("a2".into(), "r2".into(), now() + Duration::hours(2), now())
            .unwrap_err();
        assert!(matches!(err, UserError::SessionRevoked));
    }

    #[test]
    fn rotate_extends_expiry() {
        let mut s = session(now() + Duration::minutes(5));
        s.rotate("a2".into(), "r2".into(), now() + Duration::days(7), now())
            .unwrap();
        assert_eq!(s.token_hash(), "a2");
        assert_eq!(s.refresh_token_hash(), "r2");
        assert_eq!(s.expires_at(), now() + Duration::days(7));
    }
}
