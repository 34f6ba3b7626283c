//! MongoDB Index Initialization
//!
//! Creates indexes for all collections on application startup. The unique
//! indexes back the name uniqueness of users, roles and timezones.

use mongodb::{Database, IndexModel, bson::{doc, Document}, options::IndexOptions};
use tracing::info;

/// Initialize all MongoDB indexes
pub async fn initialize_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    info!("Initializing MongoDB indexes...");

    create_unique_index(db, "users", "user_name").await?;
    create_unique_index(db, "user_roles", "role").await?;
    create_unique_index(db, "timezones", "timezone").await?;
    create_history_indexes(db, "user_role_history").await?;
    create_history_indexes(db, "user_active_history").await?;

    info!("MongoDB indexes initialized successfully");
    Ok(())
}

async fn create_unique_index(
    db: &Database,
    collection: &str,
    field: &str,
) -> Result<(), mongodb::error::Error> {
    let mut keys = Document::new();
    keys.insert(field, 1);

    db.collection::<Document>(collection)
        .create_index(
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    info!(collection, field, "Created unique index");
    Ok(())
}

async fn create_history_indexes(db: &Database, collection: &str) -> Result<(), mongodb::error::Error> {
    db.collection::<Document>(collection)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "user_id": 1, "changed_at": -1 })
                .build(),
        )
        .await?;

    info!(collection, "Created history indexes");
    Ok(())
}
