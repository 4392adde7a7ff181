//! Server-side session storage
//!
//! `take` reads and clears a session in one step. The login callback relies
//! on it: two callbacks racing on one session cannot both see the pending
//! state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::session::{SessionId, SessionState};

/// Session storage failures
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored session state is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current state; missing or expired sessions are `Anonymous`.
    async fn load(&self, id: &SessionId) -> Result<SessionState, SessionStoreError>;

    /// Persist `state` and refresh the expiry. Saving `Anonymous` deletes.
    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionStoreError>;

    /// Atomically read and delete.
    async fn take(&self, id: &SessionId) -> Result<SessionState, SessionStoreError>;

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError>;

    /// Delete expired sessions, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionStoreError>;
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    state: serde_json::Value,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_state(self) -> Result<SessionState, SessionStoreError> {
        if self.expires_at <= Utc::now() {
            return Ok(SessionState::Anonymous);
        }
        Ok(serde_json::from_value(self.state)?)
    }
}

/// Postgres-backed session store (`sessions` table)
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PgSessionStore {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn load(&self, id: &SessionId) -> Result<SessionState, SessionStoreError> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT state, expires_at FROM sessions WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => row.into_state(),
            None => Ok(SessionState::Anonymous),
        }
    }

    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionStoreError> {
        if *state == SessionState::Anonymous {
            return self.delete(id).await;
        }

        sqlx::query(
            r#"
            INSERT INTO sessions (id, state, expires_at, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (id) DO UPDATE
            SET state = EXCLUDED.state,
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            "#,
        )
        .bind(id.as_str())
        .bind(serde_json::to_value(state)?)
        .bind(Utc::now() + self.ttl)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, id: &SessionId) -> Result<SessionState, SessionStoreError> {
        let row: Option<SessionRow> =
            sqlx::query_as("DELETE FROM sessions WHERE id = $1 RETURNING state, expires_at")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => row.into_state(),
            None => Ok(SessionState::Anonymous),
        }
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// In-process session store for tests and single-node local runs
/// (`SESSION_STORE=memory`). Sessions do not survive a restart.
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, (SessionState, DateTime<Utc>)>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

fn live(entry: Option<(SessionState, DateTime<Utc>)>) -> SessionState {
    match entry {
        Some((state, expires_at)) if expires_at > Utc::now() => state,
        _ => SessionState::Anonymous,
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<SessionState, SessionStoreError> {
        Ok(live(self.sessions.lock().await.get(id).cloned()))
    }

    async fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.lock().await;
        if *state == SessionState::Anonymous {
            sessions.remove(id);
        } else {
            sessions.insert(id.clone(), (state.clone(), Utc::now() + self.ttl));
        }
        Ok(())
    }

    async fn take(&self, id: &SessionId) -> Result<SessionState, SessionStoreError> {
        Ok(live(self.sessions.lock().await.remove(id)))
    }

    async fn delete(&self, id: &SessionId) -> Result<(), SessionStoreError> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionStoreError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        let now = Utc::now();
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}
