use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "device")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub fingerprint: String,
    pub platform: String,
    pub browser: String,
    pub name: String,
    pub user: String,
    pub created_at: DateTimeUtc,
    pub last_seen: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::search_event::Entity")]
    SearchEvent,
}

impl Related<super::search_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SearchEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
