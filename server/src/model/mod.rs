pub mod device;
pub mod search_event;

use sea_orm::{ConnectionTrait, DbErr, Schema};

/// Create the tables on first boot. The server targets a single SQLite
/// file, so schema setup happens in-process rather than through a
/// migration tool.
pub async fn init_schema(conn: &impl ConnectionTrait) -> Result<(), DbErr> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut device_table = schema.create_table_from_entity(entity::prelude::Device);
    conn.execute(device_table.if_not_exists())
        .await?;

    let mut event_table = schema.create_table_from_entity(entity::prelude::SearchEvent);
    conn.execute(event_table.if_not_exists())
        .await?;

    Ok(())
}
