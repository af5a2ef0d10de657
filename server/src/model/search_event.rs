use chrono::{DateTime, Utc};
use entity::{prelude::*, search_event};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use crate::error::AppResult;

/// A raw event enriched with a category label by the pipeline. Only built
/// from well-formed classification results; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub category: Option<String>,
    pub device_id: Option<i32>,
}

pub struct SearchEventCtrl;

impl SearchEventCtrl {
    /// Persist one batch of classified events as a single insert
    /// statement.
    pub async fn insert_classified(
        conn: &DatabaseConnection,
        events: Vec<ClassifiedEvent>,
    ) -> AppResult<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let count = events.len();
        let models: Vec<search_event::ActiveModel> = events
            .into_iter()
            .map(|event| search_event::ActiveModel {
                id: ActiveValue::NotSet,
                query: ActiveValue::Set(event.query),
                timestamp: ActiveValue::Set(event.timestamp),
                category: ActiveValue::Set(event.category),
                device_id: ActiveValue::Set(event.device_id),
            })
            .collect();

        SearchEvent::insert_many(models).exec(conn).await?;

        Ok(count)
    }

    /// All stored events for a category, ordered by insertion identity.
    pub async fn all_by_category(
        conn: &DatabaseConnection,
        category: &str,
    ) -> AppResult<Vec<search_event::Model>> {
        let events = SearchEvent::find()
            .filter(search_event::Column::Category.eq(category))
            .order_by_asc(search_event::Column::Id)
            .all(conn)
            .await?;

        Ok(events)
    }

    pub async fn all_since(
        conn: &DatabaseConnection,
        start: DateTime<Utc>,
    ) -> AppResult<Vec<search_event::Model>> {
        let events = SearchEvent::find()
            .filter(search_event::Column::Timestamp.gte(start))
            .all(conn)
            .await?;

        Ok(events)
    }
}
