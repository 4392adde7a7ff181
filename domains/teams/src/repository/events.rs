//! Event repository (read-only)

use async_trait::async_trait;
use codejam_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::EventStore;
use crate::domain::entities::Event;

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Event>, RepositoryError> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, title, status, created_on FROM events WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }
}
