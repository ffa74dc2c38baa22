use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    entities::{event, ticket_type},
    errors::ServiceError,
};

/// Read-only catalog access. Editing events and ticket types happens in an
/// external admin system; buyers only need to browse.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_events(
        &self,
    ) -> Result<Vec<(event::Model, Vec<ticket_type::Model>)>, ServiceError> {
        Ok(event::Entity::find()
            .find_with_related(ticket_type::Entity)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get_event(
        &self,
        event_id: Uuid,
    ) -> Result<(event::Model, Vec<ticket_type::Model>), ServiceError> {
        let mut results = event::Entity::find_by_id(event_id)
            .find_with_related(ticket_type::Entity)
            .all(&*self.db)
            .await?;

        results
            .pop()
            .ok_or_else(|| ServiceError::NotFound("Event not found".to_string()))
    }
}
